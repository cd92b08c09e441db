//! Work order lifecycle with tasks, equipment, staffing and reports.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{
    AgentDirectory, AuditLog, ChefAssertion, ClientRepository, ReferenceRepository,
    TravauxLifecycle, TravauxRepository,
};
use crate::domain::validation::{optional_text, required, required_text};
use crate::domain::{
    AUDIT_TRAVAUX, AgentAssignment, AgentAssignmentInput, AuditAction, AuditEntry, Caller,
    DemandeStatus, Error, NewAgentAssignment, NewDemande, NewTache, NewTravaux,
    NewTravauxMateriel, Rating, Rendu, RenduBook, RenduInput, RenduOwner, Responsable,
    ResponsableInput, ResponsableRole, Satisfaction, SatisfactionInput, Tache, TacheInput,
    Travaux, TravauxEtat, TravauxFilter, TravauxInput, TravauxMateriel, TravauxMaterielInput,
    TravauxMaterielPatch, TravauxPriorite, TravauxRelations, best_effort,
};

/// Collaborators of [`TravauxService`].
#[derive(Clone)]
pub struct TravauxServiceDeps {
    pub travaux: Arc<dyn TravauxRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub references: Arc<dyn ReferenceRepository>,
    pub agents: Arc<dyn AgentDirectory>,
    pub chef: Arc<dyn ChefAssertion>,
    pub audit: Arc<dyn AuditLog>,
    pub rendus: RenduBook,
}

/// Implements [`TravauxLifecycle`].
#[derive(Clone)]
pub struct TravauxService {
    deps: TravauxServiceDeps,
}

impl TravauxService {
    pub fn new(deps: TravauxServiceDeps) -> Self {
        Self { deps }
    }

    async fn find(&self, id: i32) -> Result<Travaux, Error> {
        self.deps
            .travaux
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("travaux {id} not found")))
    }

    async fn audit(&self, entry: AuditEntry) {
        best_effort("audit", self.deps.audit.record(&entry)).await;
    }

    /// Give a work order raised without a demande one on its site's client.
    async fn attach_demande(&self, travaux: &mut Travaux) {
        let Some(site_id) = travaux.site_id else {
            return;
        };
        let Some(site) = best_effort("auto demande site", self.deps.clients.find_site(site_id))
            .await
            .flatten()
        else {
            warn!(travaux_id = travaux.id, site_id, "no site for auto demande");
            return;
        };
        let demande = NewDemande {
            client_id: site.client_id,
            site_id: Some(site_id),
            titre: travaux.titre.clone(),
            description: travaux
                .description
                .clone()
                .unwrap_or_else(|| travaux.titre.clone()),
            status: DemandeStatus::EnCours,
        };
        if let Some(created) = best_effort(
            "auto demande",
            self.deps.travaux.link_new_demande(travaux.id, &demande),
        )
        .await
        {
            info!(travaux_id = travaux.id, demande_id = created.id, "auto demande linked");
            travaux.demande_id = Some(created.id);
        }
    }
}

fn positive_quantity(quantite: Option<i32>) -> Result<Option<i32>, Error> {
    match quantite {
        Some(value) if value <= 0 => Err(Error::invalid_request("quantite must be positive")),
        other => Ok(other),
    }
}

fn non_blank_title(titre: Option<String>) -> Result<Option<String>, Error> {
    titre.map(|titre| required_text("titre", Some(titre))).transpose()
}

#[async_trait]
impl TravauxLifecycle for TravauxService {
    async fn list_travaux(&self, filter: TravauxFilter) -> Result<Vec<Travaux>, Error> {
        Ok(self.deps.travaux.list(&filter).await?)
    }

    async fn get_travaux(&self, id: i32) -> Result<Travaux, Error> {
        self.find(id).await
    }

    async fn travaux_relations(&self, id: i32) -> Result<TravauxRelations, Error> {
        let travaux = self.find(id).await?;
        let doe = match travaux.doe_id {
            Some(doe_id) => self.deps.references.find_doe(doe_id).await?,
            None => None,
        };
        let affaire = match travaux.affaire_id {
            Some(affaire_id) => self.deps.references.find_affaire(affaire_id).await?,
            None => None,
        };
        let site = match travaux.site_id {
            Some(site_id) => self.deps.clients.find_site(site_id).await?,
            None => None,
        };
        let repo = &self.deps.travaux;
        Ok(TravauxRelations {
            doe,
            affaire,
            site,
            demandes: repo.linked_demandes(id).await?,
            taches: repo.list_taches(id).await?,
            materiels: repo.list_materiels(id).await?,
            agents: repo.list_agents(id).await?,
            responsables: repo.list_responsables(id).await?,
            rendus: self.deps.rendus.list(RenduOwner::Travaux(id)).await?,
            satisfaction: repo.find_satisfaction(id).await?,
            travaux,
        })
    }

    async fn create_travaux(&self, caller: &Caller, input: TravauxInput) -> Result<Travaux, Error> {
        let titre = required_text("titre", input.titre)?;
        let site_id = match (input.site_id, input.doe_id) {
            (Some(site_id), _) => Some(site_id),
            (None, Some(doe_id)) => self
                .deps
                .references
                .find_doe(doe_id)
                .await?
                .and_then(|doe| doe.site_id),
            (None, None) => None,
        };
        let travaux = NewTravaux {
            titre,
            description: optional_text(input.description),
            etat: input.etat.unwrap_or(TravauxEtat::AFaire),
            priorite: input.priorite.unwrap_or(TravauxPriorite::Normale),
            date_debut: input.date_debut,
            date_fin: input.date_fin,
            date_echeance: input.date_echeance,
            doe_id: input.doe_id,
            affaire_id: input.affaire_id,
            site_id,
            demande_id: input.demande_id,
            ticket_id: input.ticket_id,
        };

        let mut created = self.deps.travaux.create(&travaux).await?;
        if created.demande_id.is_none() {
            self.attach_demande(&mut created).await;
        }
        self.audit(
            AuditEntry::new(AUDIT_TRAVAUX, created.id, AuditAction::Create).by(caller.email()),
        )
        .await;
        Ok(created)
    }

    async fn update_travaux(
        &self,
        caller: &Caller,
        id: i32,
        input: TravauxInput,
    ) -> Result<Travaux, Error> {
        if input == TravauxInput::default() {
            return Err(Error::invalid_request("no fields to update"));
        }
        let patch = TravauxInput {
            titre: non_blank_title(input.titre)?,
            ..input
        };
        let updated = self
            .deps
            .travaux
            .update(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found(format!("travaux {id} not found")))?;
        self.audit(AuditEntry::new(AUDIT_TRAVAUX, id, AuditAction::Update).by(caller.email()))
            .await;
        Ok(updated)
    }

    async fn delete_travaux(&self, caller: &Caller, id: i32) -> Result<(), Error> {
        if !self.deps.travaux.delete(id).await? {
            return Err(Error::not_found(format!("travaux {id} not found")));
        }
        self.audit(AuditEntry::new(AUDIT_TRAVAUX, id, AuditAction::Delete).by(caller.email()))
            .await;
        Ok(())
    }

    async fn list_taches(&self, id: i32) -> Result<Vec<Tache>, Error> {
        self.find(id).await?;
        Ok(self.deps.travaux.list_taches(id).await?)
    }

    async fn create_tache(&self, id: i32, input: TacheInput) -> Result<Tache, Error> {
        let titre = required_text("titre", input.titre)?;
        self.find(id).await?;
        let tache = NewTache {
            travaux_id: id,
            titre,
            description: optional_text(input.description),
            etat: input.etat.unwrap_or(TravauxEtat::AFaire),
            date_echeance: input.date_echeance,
        };
        Ok(self.deps.travaux.create_tache(&tache).await?)
    }

    async fn update_tache(&self, id: i32, tache_id: i32, input: TacheInput) -> Result<Tache, Error> {
        let patch = TacheInput {
            titre: non_blank_title(input.titre)?,
            ..input
        };
        self.deps
            .travaux
            .update_tache(id, tache_id, &patch)
            .await?
            .ok_or_else(|| Error::not_found(format!("tache {tache_id} not found on travaux {id}")))
    }

    async fn delete_tache(&self, id: i32, tache_id: i32) -> Result<(), Error> {
        if self.deps.travaux.delete_tache(id, tache_id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "tache {tache_id} not found on travaux {id}"
            )))
        }
    }

    async fn list_materiels(&self, id: i32) -> Result<Vec<TravauxMateriel>, Error> {
        self.find(id).await?;
        Ok(self.deps.travaux.list_materiels(id).await?)
    }

    async fn add_materiel(
        &self,
        id: i32,
        input: TravauxMaterielInput,
    ) -> Result<TravauxMateriel, Error> {
        let materiel_id = required("materiel_id", input.materiel_id)?;
        let quantite = positive_quantity(input.quantite)?.unwrap_or(1);
        self.find(id).await?;
        let link = NewTravauxMateriel {
            travaux_id: id,
            materiel_id,
            quantite,
            commentaire: optional_text(input.commentaire),
        };
        Ok(self.deps.travaux.add_materiel(&link).await?)
    }

    async fn update_materiel(
        &self,
        id: i32,
        link_id: i32,
        input: TravauxMaterielInput,
    ) -> Result<TravauxMateriel, Error> {
        let patch = TravauxMaterielPatch {
            quantite: positive_quantity(input.quantite)?,
            commentaire: optional_text(input.commentaire),
        };
        self.deps
            .travaux
            .update_materiel(id, link_id, &patch)
            .await?
            .ok_or_else(|| {
                Error::not_found(format!("materiel link {link_id} not found on travaux {id}"))
            })
    }

    async fn delete_materiel(&self, id: i32, link_id: i32) -> Result<(), Error> {
        if self.deps.travaux.delete_materiel(id, link_id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "materiel link {link_id} not found on travaux {id}"
            )))
        }
    }

    async fn list_agents(&self, id: i32) -> Result<Vec<AgentAssignment>, Error> {
        self.find(id).await?;
        Ok(self.deps.travaux.list_agents(id).await?)
    }

    async fn add_agent(
        &self,
        id: i32,
        input: AgentAssignmentInput,
    ) -> Result<AgentAssignment, Error> {
        let matricule = required_text("matricule", input.matricule)?;
        self.find(id).await?;
        if self.deps.agents.find_by_matricule(&matricule).await?.is_none() {
            return Err(Error::not_found(format!("agent {matricule} not found")));
        }
        let assignment = NewAgentAssignment {
            parent_id: id,
            matricule,
            date_debut: input.date_debut,
            date_fin: input.date_fin,
        };
        Ok(self.deps.travaux.add_agent(&assignment).await?)
    }

    async fn remove_agent(&self, id: i32, matricule: &str) -> Result<(), Error> {
        if self.deps.travaux.remove_agent(id, matricule).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "agent {matricule} is not assigned to travaux {id}"
            )))
        }
    }

    async fn list_responsables(&self, id: i32) -> Result<Vec<Responsable>, Error> {
        self.find(id).await?;
        Ok(self.deps.travaux.list_responsables(id).await?)
    }

    async fn add_responsable(
        &self,
        id: i32,
        input: ResponsableInput,
    ) -> Result<Responsable, Error> {
        let matricule = required_text("matricule", input.matricule)?;
        self.find(id).await?;
        self.deps.chef.assert_chef(&matricule).await?;
        let role = input.role.unwrap_or(ResponsableRole::Secondaire);
        Ok(self
            .deps
            .travaux
            .add_responsable(id, &matricule, role)
            .await?)
    }

    async fn remove_responsable(&self, id: i32, matricule: &str) -> Result<(), Error> {
        if self.deps.travaux.remove_responsable(id, matricule).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "agent {matricule} is not responsable of travaux {id}"
            )))
        }
    }

    async fn list_rendus(&self, id: i32) -> Result<Vec<Rendu>, Error> {
        self.find(id).await?;
        self.deps.rendus.list(RenduOwner::Travaux(id)).await
    }

    async fn get_rendu(&self, id: i32, rendu_id: i32) -> Result<Rendu, Error> {
        self.deps.rendus.get(RenduOwner::Travaux(id), rendu_id).await
    }

    async fn create_rendu(&self, id: i32, input: RenduInput) -> Result<Rendu, Error> {
        self.find(id).await?;
        self.deps.rendus.create(RenduOwner::Travaux(id), input).await
    }

    async fn update_rendu(&self, id: i32, rendu_id: i32, input: RenduInput) -> Result<Rendu, Error> {
        self.deps
            .rendus
            .update(RenduOwner::Travaux(id), rendu_id, input)
            .await
    }

    async fn delete_rendu(&self, id: i32, rendu_id: i32) -> Result<(), Error> {
        self.deps
            .rendus
            .delete(RenduOwner::Travaux(id), rendu_id)
            .await
    }

    async fn save_satisfaction(
        &self,
        caller: &Caller,
        id: i32,
        input: SatisfactionInput,
    ) -> Result<Satisfaction, Error> {
        let rating = Rating::parse(input.rating.as_ref())?;
        self.find(id).await?;
        if !self.deps.travaux.is_client_user(id, caller.user_id).await? {
            return Err(Error::forbidden(
                "only the client of this work order can rate it",
            ));
        }
        Ok(self
            .deps
            .travaux
            .upsert_satisfaction(id, rating.value(), optional_text(input.commentaire))
            .await?)
    }

    async fn get_satisfaction(&self, id: i32) -> Result<Option<Satisfaction>, Error> {
        self.find(id).await?;
        Ok(self.deps.travaux.find_satisfaction(id).await?)
    }
}

#[cfg(test)]
#[path = "travaux_service_tests.rs"]
mod tests;
