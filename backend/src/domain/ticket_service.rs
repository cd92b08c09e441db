//! Ticket lifecycle: creation, updates, take-over and staffing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::identity::resolve_matricule;
use crate::domain::ports::{
    AgentDirectory, AuditLog, ChefAssertion, ClientRepository, InterventionRepository,
    ReferenceRepository, TicketLifecycle, TicketRepository,
};
use crate::domain::validation::{optional_text, required, required_text};
use crate::domain::{
    AUDIT_TICKET, AgentAssignment, AgentAssignmentInput, Assignment, AuditAction, AuditEntry,
    Caller, Error, InterventionFilter, JustificationInput, NewAgentAssignment, NewResponsableChange,
    NewTicket, Rating, Responsable, ResponsableChange, ResponsableInput, ResponsableRole,
    Satisfaction, SatisfactionInput, TakeOutcome, Ticket, TicketEtat, TicketFilter, TicketInput,
    TicketPatch, TicketRelations, best_effort,
};

/// Collaborators of [`TicketService`].
#[derive(Clone)]
pub struct TicketServiceDeps {
    pub tickets: Arc<dyn TicketRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub interventions: Arc<dyn InterventionRepository>,
    pub references: Arc<dyn ReferenceRepository>,
    pub agents: Arc<dyn AgentDirectory>,
    pub chef: Arc<dyn ChefAssertion>,
    pub audit: Arc<dyn AuditLog>,
}

/// Implements [`TicketLifecycle`].
#[derive(Clone)]
pub struct TicketService {
    deps: TicketServiceDeps,
}

impl TicketService {
    pub fn new(deps: TicketServiceDeps) -> Self {
        Self { deps }
    }

    async fn find(&self, id: i32) -> Result<Ticket, Error> {
        self.deps
            .tickets
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("ticket {id} not found")))
    }

    async fn record_change(
        &self,
        ticket_id: i32,
        old_matricule: Option<String>,
        new_matricule: Option<String>,
        changed_by: Option<&str>,
    ) {
        let change = NewResponsableChange {
            ticket_id,
            old_matricule,
            new_matricule,
            changed_by: changed_by.map(str::to_owned),
        };
        best_effort(
            "responsable history",
            self.deps.tickets.record_responsable_change(&change),
        )
        .await;
    }

    async fn audit(&self, entry: AuditEntry) {
        best_effort("audit", self.deps.audit.record(&entry)).await;
    }
}

fn validate_patch(patch: TicketPatch) -> Result<TicketPatch, Error> {
    if patch.is_empty() {
        return Err(Error::invalid_request("no fields to update"));
    }
    let titre = match patch.titre {
        Some(titre) => Some(required_text("titre", Some(titre))?),
        None => None,
    };
    Ok(TicketPatch {
        titre,
        responsable: optional_text(patch.responsable),
        ..patch
    })
}

#[async_trait]
impl TicketLifecycle for TicketService {
    async fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<Ticket>, Error> {
        Ok(self.deps.tickets.list(&filter).await?)
    }

    async fn get_ticket(&self, id: i32) -> Result<Ticket, Error> {
        self.find(id).await
    }

    async fn ticket_relations(&self, id: i32) -> Result<TicketRelations, Error> {
        let ticket = self.find(id).await?;
        let doe = match ticket.doe_id {
            Some(doe_id) => self.deps.references.find_doe(doe_id).await?,
            None => None,
        };
        let affaire = match ticket.affaire_id {
            Some(affaire_id) => self.deps.references.find_affaire(affaire_id).await?,
            None => None,
        };
        let site = match ticket.site_id {
            Some(site_id) => self.deps.clients.find_site(site_id).await?,
            None => None,
        };
        let demande = match ticket.demande_id {
            Some(demande_id) => self.deps.clients.find_demande(demande_id).await?,
            None => None,
        };
        let interventions = self
            .deps
            .interventions
            .list(&InterventionFilter {
                ticket_id: Some(id),
                ..InterventionFilter::default()
            })
            .await?;
        Ok(TicketRelations {
            doe,
            affaire,
            site,
            demande,
            interventions,
            documents: self.deps.tickets.documents(id).await?,
            images: self.deps.tickets.images(id).await?,
            responsables: self.deps.tickets.list_responsables(id).await?,
            agents: self.deps.tickets.list_agents(id).await?,
            satisfaction: self.deps.tickets.find_satisfaction(id).await?,
            ticket,
        })
    }

    async fn create_ticket(&self, caller: &Caller, input: TicketInput) -> Result<Ticket, Error> {
        let titre = required_text("titre", input.titre)?;
        let doe_id = required("doe_id", input.doe_id)?;
        let affaire_id = required("affaire_id", input.affaire_id)?;
        let site_id = match input.site_id {
            Some(site_id) => Some(site_id),
            None => self
                .deps
                .references
                .find_doe(doe_id)
                .await?
                .and_then(|doe| doe.site_id),
        };

        let ticket = NewTicket {
            titre,
            description: optional_text(input.description),
            etat: input.etat.unwrap_or(TicketEtat::PasCommence),
            doe_id: Some(doe_id),
            affaire_id: Some(affaire_id),
            site_id,
            demande_id: input.demande_id,
            responsable: optional_text(input.responsable),
            date_debut: input.date_debut,
            date_fin: input.date_fin,
        };
        let created = self.deps.tickets.create(&ticket).await?;
        self.audit(AuditEntry::new(AUDIT_TICKET, created.id, AuditAction::Create).by(caller.email()))
            .await;
        Ok(created)
    }

    async fn update_ticket(
        &self,
        caller: &Caller,
        id: i32,
        patch: TicketPatch,
    ) -> Result<Ticket, Error> {
        let patch = validate_patch(patch)?;
        let update = self
            .deps
            .tickets
            .update(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found(format!("ticket {id} not found")))?;

        if update.responsable_changed() {
            self.record_change(
                id,
                update.previous.responsable.clone(),
                update.current.responsable.clone(),
                caller.email(),
            )
            .await;
        }
        self.audit(AuditEntry::new(AUDIT_TICKET, id, AuditAction::Update).by(caller.email()))
            .await;
        Ok(update.current)
    }

    async fn delete_ticket(
        &self,
        caller: &Caller,
        id: i32,
        input: JustificationInput,
    ) -> Result<(), Error> {
        let justification = required_text("justification", input.justification)?;
        let ticket = self.find(id).await?;

        // The trail must survive the row, so a failed audit aborts the delete.
        let entry = AuditEntry::new(AUDIT_TICKET, id, AuditAction::Delete)
            .by(caller.email())
            .with_details(json!({
                "justification": justification,
                "titre": ticket.titre,
                "demande_id": ticket.demande_id,
            }));
        self.deps.audit.record(&entry).await?;

        if self.deps.tickets.delete(id).await? {
            info!(ticket_id = id, "ticket deleted");
            Ok(())
        } else {
            Err(Error::not_found(format!("ticket {id} not found")))
        }
    }

    async fn take_ticket(&self, caller: &Caller, id: i32) -> Result<TakeOutcome, Error> {
        if caller.email().is_none() {
            return Err(Error::invalid_request("an e-mail is required to take a ticket"));
        }
        let matricule = resolve_matricule(caller, self.deps.agents.as_ref())
            .await?
            .ok_or_else(|| {
                Error::invalid_request("no agent matricule is associated with this account")
            })?;
        let ticket = self.find(id).await?;
        if ticket.etat == TicketEtat::Termine {
            return Err(Error::conflict("ticket is already closed"));
        }

        if ticket.responsable.as_deref() == Some(matricule.as_str()) {
            return Ok(TakeOutcome {
                assignment: Assignment::Primary,
                ticket,
                responsable: None,
            });
        }

        let claimed = if ticket.responsable.is_none() {
            self.deps.tickets.claim_primary(id, &matricule).await?
        } else {
            None
        };
        if let Some(claimed) = claimed {
            self.record_change(id, None, Some(matricule.clone()), caller.email())
                .await;
            self.audit(
                AuditEntry::new(AUDIT_TICKET, id, AuditAction::TakePrimary)
                    .by(caller.email())
                    .with_details(json!({ "matricule": matricule })),
            )
            .await;
            return Ok(TakeOutcome {
                assignment: Assignment::Primary,
                ticket: claimed,
                responsable: None,
            });
        }

        let responsable = self
            .deps
            .tickets
            .add_responsable(id, &matricule, ResponsableRole::Secondaire)
            .await?;
        self.audit(
            AuditEntry::new(AUDIT_TICKET, id, AuditAction::TakeSecondary)
                .by(caller.email())
                .with_details(json!({ "matricule": matricule })),
        )
        .await;
        let ticket = self.find(id).await?;
        Ok(TakeOutcome {
            assignment: Assignment::Secondary,
            ticket,
            responsable: Some(responsable),
        })
    }

    async fn save_satisfaction(
        &self,
        caller: &Caller,
        id: i32,
        input: SatisfactionInput,
    ) -> Result<Satisfaction, Error> {
        let rating = Rating::parse(input.rating.as_ref())?;
        self.find(id).await?;
        if !self.deps.tickets.is_client_user(id, caller.user_id).await? {
            return Err(Error::forbidden(
                "only the client of this ticket can rate it",
            ));
        }
        Ok(self
            .deps
            .tickets
            .upsert_satisfaction(id, rating.value(), optional_text(input.commentaire))
            .await?)
    }

    async fn get_satisfaction(&self, id: i32) -> Result<Option<Satisfaction>, Error> {
        self.find(id).await?;
        Ok(self.deps.tickets.find_satisfaction(id).await?)
    }

    async fn list_agents(&self, id: i32) -> Result<Vec<AgentAssignment>, Error> {
        self.find(id).await?;
        Ok(self.deps.tickets.list_agents(id).await?)
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
        Ok(self.deps.tickets.add_agent(&assignment).await?)
    }

    async fn remove_agent(&self, id: i32, matricule: &str) -> Result<(), Error> {
        if self.deps.tickets.remove_agent(id, matricule).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "agent {matricule} is not assigned to ticket {id}"
            )))
        }
    }

    async fn list_responsables(&self, id: i32) -> Result<Vec<Responsable>, Error> {
        self.find(id).await?;
        Ok(self.deps.tickets.list_responsables(id).await?)
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
            .tickets
            .add_responsable(id, &matricule, role)
            .await?)
    }

    async fn remove_responsable(&self, id: i32, matricule: &str) -> Result<(), Error> {
        if self.deps.tickets.remove_responsable(id, matricule).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "agent {matricule} is not responsable of ticket {id}"
            )))
        }
    }

    async fn responsable_history(&self, id: i32) -> Result<Vec<ResponsableChange>, Error> {
        self.find(id).await?;
        Ok(self.deps.tickets.responsable_history(id).await?)
    }
}

#[cfg(test)]
#[path = "ticket_service_tests.rs"]
mod tests;
