//! Client portal service: registration, sites and the demande lifecycle.
//!
//! Non-admin callers only ever see the clients they own, represent by
//! e-mail, or are delegated to. A demande becomes immutable once converted
//! into a ticket; deletion is soft and always audited.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::identity::resolve_matricule;
use crate::domain::ports::{
    AgentDirectory, AuditLog, ClientPortal, ClientRepository, PasswordHasher, ReferenceRepository,
    TicketRepository, TravauxRepository,
};
use crate::domain::validation::{optional_text, required, required_text};
use crate::domain::{
    AUDIT_DEMANDE, AuditAction, AuditEntry, Caller, Client, ConversionOutcome, ConversionResult,
    DeletedDemande, Demande, DemandeFilter, DemandeInput, DemandePatch, DemandeQuery,
    DemandeStatus, DemandeStatusInput, Error, JustificationInput, NewClientAccount, NewDemande,
    NewSite, NewTicket, ROLE_CLIENT, RegisterClientRequest, RegistrationOutcome, Site, SiteInput,
    SitePatch, SiteRelations, SoftDeleteOutcome, TicketEtat, TicketFilter, TravauxFilter,
    best_effort,
};

/// Collaborators of [`ClientPortalService`].
#[derive(Clone)]
pub struct ClientPortalDeps {
    pub clients: Arc<dyn ClientRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub travaux: Arc<dyn TravauxRepository>,
    pub references: Arc<dyn ReferenceRepository>,
    pub agents: Arc<dyn AgentDirectory>,
    pub audit: Arc<dyn AuditLog>,
    pub hasher: Arc<dyn PasswordHasher>,
}

/// Implements [`ClientPortal`].
#[derive(Clone)]
pub struct ClientPortalService {
    deps: ClientPortalDeps,
}

/// Clients visible to a caller.
enum ClientScope {
    All,
    Only(Vec<i32>),
}

impl ClientScope {
    fn allows(&self, client_id: i32) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&client_id),
        }
    }
}

impl ClientPortalService {
    pub fn new(deps: ClientPortalDeps) -> Self {
        Self { deps }
    }

    async fn scope(&self, caller: &Caller) -> Result<ClientScope, Error> {
        if caller.is_admin() {
            return Ok(ClientScope::All);
        }
        let email = caller.email().unwrap_or_default();
        let ids = self
            .deps
            .clients
            .accessible_client_ids(caller.user_id, email)
            .await?;
        Ok(ClientScope::Only(ids))
    }

    /// Scope of a non-admin caller that must be linked to some client.
    async fn require_scope(&self, caller: &Caller) -> Result<ClientScope, Error> {
        let scope = self.scope(caller).await?;
        if matches!(&scope, ClientScope::Only(ids) if ids.is_empty()) {
            return Err(Error::forbidden("no client is associated with this account"));
        }
        Ok(scope)
    }

    async fn ensure_access(&self, caller: &Caller, client_id: i32) -> Result<(), Error> {
        if self.require_scope(caller).await?.allows(client_id) {
            Ok(())
        } else {
            Err(Error::forbidden("this record belongs to another client"))
        }
    }

    /// Client a write should target: admins name it, others use their own.
    async fn target_client(&self, caller: &Caller, requested: Option<i32>) -> Result<i32, Error> {
        match self.require_scope(caller).await? {
            ClientScope::All => required("client_id", requested),
            ClientScope::Only(ids) => match requested {
                Some(id) if ids.contains(&id) => Ok(id),
                Some(_) => Err(Error::forbidden("this record belongs to another client")),
                None => ids
                    .first()
                    .copied()
                    .ok_or_else(|| Error::forbidden("no client is associated with this account")),
            },
        }
    }

    async fn find_site(&self, id: i32) -> Result<Site, Error> {
        self.deps
            .clients
            .find_site(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("site {id} not found")))
    }

    async fn find_demande(&self, id: i32) -> Result<Demande, Error> {
        self.deps
            .clients
            .find_demande(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("demande {id} not found")))
    }

    async fn ensure_site_of(&self, site_id: i32, client_id: i32) -> Result<(), Error> {
        let site = self.find_site(site_id).await?;
        if site.client_id == client_id {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "site {site_id} does not belong to client {client_id}"
            )))
        }
    }

    async fn audit(&self, entry: AuditEntry) {
        best_effort("audit", self.deps.audit.record(&entry)).await;
    }
}

fn ensure_editable(demande: &Demande) -> Result<(), Error> {
    if let Some(ticket_id) = demande.ticket_id {
        return Err(Error::conflict("demande already converted to a ticket")
            .with_details(json!({ "ticket_id": ticket_id })));
    }
    if demande.status == DemandeStatus::Supprimee {
        return Err(Error::conflict("demande has been deleted"));
    }
    Ok(())
}

/// Present text must not be blank.
fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>, Error> {
    match value {
        Some(text) => required_text(field, Some(text)).map(Some),
        None => Ok(None),
    }
}

#[async_trait]
impl ClientPortal for ClientPortalService {
    async fn register_client(&self, request: RegisterClientRequest) -> Result<Client, Error> {
        let email = required_text("email", request.email)?;
        let password = request
            .password
            .filter(|password| !password.is_empty())
            .ok_or_else(|| Error::invalid_request("password is required"))?;
        let nom_societe = required_text("nom_societe", request.nom_societe)?;
        let password_hash = self
            .deps
            .hasher
            .hash(&password)
            .map_err(|err| Error::internal(err.to_string()))?;

        let account = NewClientAccount {
            email,
            password_hash,
            roles: vec![ROLE_CLIENT.to_owned()],
            nom_societe,
            representant_nom: optional_text(request.representant_nom),
            representant_tel: optional_text(request.representant_tel),
            adresse_id: request.adresse_id,
            commentaire: optional_text(request.commentaire),
        };
        match self.deps.clients.register_client(&account).await? {
            RegistrationOutcome::Registered(client) => Ok(client),
            RegistrationOutcome::EmailTaken => {
                Err(Error::conflict("a user with this email already exists"))
            }
        }
    }

    async fn list_clients(&self) -> Result<Vec<Client>, Error> {
        Ok(self.deps.clients.list_clients().await?)
    }

    async fn list_sites(&self, caller: &Caller) -> Result<Vec<Site>, Error> {
        let client_ids = match self.scope(caller).await? {
            ClientScope::All => None,
            ClientScope::Only(ids) if ids.is_empty() => return Ok(Vec::new()),
            ClientScope::Only(ids) => Some(ids),
        };
        Ok(self.deps.clients.list_sites(client_ids).await?)
    }

    async fn get_site(&self, caller: &Caller, id: i32) -> Result<Site, Error> {
        let scope = self.require_scope(caller).await?;
        let site = self.find_site(id).await?;
        if scope.allows(site.client_id) {
            Ok(site)
        } else {
            Err(Error::forbidden("this site belongs to another client"))
        }
    }

    async fn create_site(&self, caller: &Caller, input: SiteInput) -> Result<Site, Error> {
        let nom = required_text("nom", input.nom)?;
        let client_id = self.target_client(caller, input.client_id).await?;
        let site = NewSite {
            client_id,
            nom,
            commentaire: optional_text(input.commentaire),
        };
        Ok(self.deps.clients.create_site(&site).await?)
    }

    async fn update_site(&self, caller: &Caller, id: i32, input: SiteInput) -> Result<Site, Error> {
        self.get_site(caller, id).await?;
        let patch = SitePatch {
            nom: non_blank("nom", input.nom)?,
            commentaire: optional_text(input.commentaire),
        };
        self.deps
            .clients
            .update_site(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found(format!("site {id} not found")))
    }

    async fn delete_site(&self, caller: &Caller, id: i32) -> Result<(), Error> {
        self.get_site(caller, id).await?;
        if self.deps.clients.delete_site(id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!("site {id} not found")))
        }
    }

    async fn site_relations(&self, caller: &Caller, id: i32) -> Result<SiteRelations, Error> {
        let site = self.get_site(caller, id).await?;
        let client = self.deps.clients.find_client(site.client_id).await?;
        let demandes = self
            .deps
            .clients
            .list_demandes(&DemandeFilter {
                site_id: Some(id),
                ..DemandeFilter::default()
            })
            .await?;
        let tickets = self
            .deps
            .tickets
            .list(&TicketFilter {
                site_id: Some(id),
                ..TicketFilter::default()
            })
            .await?;
        let travaux = self
            .deps
            .travaux
            .list(&TravauxFilter {
                site_id: Some(id),
                ..TravauxFilter::default()
            })
            .await?;
        Ok(SiteRelations {
            site,
            client,
            demandes,
            tickets,
            travaux,
        })
    }

    async fn list_demandes(
        &self,
        caller: &Caller,
        query: DemandeQuery,
    ) -> Result<Vec<Demande>, Error> {
        let status = optional_text(query.status)
            .map(|raw| raw.parse::<DemandeStatus>())
            .transpose()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let client_ids = match self.scope(caller).await? {
            ClientScope::All => None,
            ClientScope::Only(ids) if ids.is_empty() => return Ok(Vec::new()),
            ClientScope::Only(ids) => Some(ids),
        };
        let filter = DemandeFilter {
            client_ids,
            status,
            client_id: query.client_id,
            site_id: query.site_id,
        };
        Ok(self.deps.clients.list_demandes(&filter).await?)
    }

    async fn get_demande(&self, caller: &Caller, id: i32) -> Result<Demande, Error> {
        let demande = self.find_demande(id).await?;
        self.ensure_access(caller, demande.client_id).await?;
        Ok(demande)
    }

    async fn create_demande(&self, caller: &Caller, input: DemandeInput) -> Result<Demande, Error> {
        let titre = required_text("titre", input.titre)?;
        let description = required_text("description", input.description)?;

        let requested_client = match (caller.is_admin(), input.client_id, input.site_id) {
            (true, None, Some(site_id)) => Some(self.find_site(site_id).await?.client_id),
            (_, requested, _) => requested,
        };
        let client_id = self.target_client(caller, requested_client).await?;
        if let Some(site_id) = input.site_id {
            self.ensure_site_of(site_id, client_id).await?;
        }

        let demande = NewDemande {
            client_id,
            site_id: input.site_id,
            titre,
            description,
            status: DemandeStatus::EnAttente,
        };
        Ok(self.deps.clients.create_demande(&demande).await?)
    }

    async fn update_demande(
        &self,
        caller: &Caller,
        id: i32,
        input: DemandeInput,
    ) -> Result<Demande, Error> {
        let demande = self.find_demande(id).await?;
        ensure_editable(&demande)?;
        self.ensure_access(caller, demande.client_id).await?;

        let patch = DemandePatch {
            site_id: input.site_id,
            titre: non_blank("titre", input.titre)?,
            description: non_blank("description", input.description)?,
        };
        if let Some(site_id) = patch.site_id {
            self.ensure_site_of(site_id, demande.client_id).await?;
        }

        if let Some(updated) = self.deps.clients.update_demande(id, &patch).await? {
            return Ok(updated);
        }
        // Lost a race with conversion or deletion.
        ensure_editable(&self.find_demande(id).await?)?;
        Err(Error::not_found(format!("demande {id} not found")))
    }

    async fn update_demande_status(
        &self,
        caller: &Caller,
        id: i32,
        input: DemandeStatusInput,
    ) -> Result<Demande, Error> {
        let raw = required_text("status", input.status)?;
        let status = DemandeStatus::normalize(&raw).map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "allowed": ["En_attente", "En_cours", "Traitee", "Rejetee", "Annule"],
            }))
        })?;
        let demande = self.find_demande(id).await?;
        ensure_editable(&demande)?;

        let commentaire = if status.records_reason() {
            optional_text(input.commentaire)
        } else {
            None
        };
        let updated = self
            .deps
            .clients
            .set_demande_status(id, status, commentaire.clone())
            .await?
            .ok_or_else(|| Error::not_found(format!("demande {id} not found")))?;

        self.audit(
            AuditEntry::new(AUDIT_DEMANDE, id, AuditAction::StatusChange)
                .by(caller.email())
                .with_details(json!({
                    "from": demande.status,
                    "to": status,
                    "commentaire": commentaire,
                })),
        )
        .await;
        Ok(updated)
    }

    async fn delete_demande(
        &self,
        caller: &Caller,
        id: i32,
        input: JustificationInput,
    ) -> Result<(), Error> {
        let justification = required_text("justification", input.justification)?;
        let demande = self.find_demande(id).await?;
        self.ensure_access(caller, demande.client_id).await?;

        let audit = AuditEntry::new(AUDIT_DEMANDE, id, AuditAction::Delete)
            .by(caller.email())
            .with_details(json!({
                "justification": justification,
                "titre": demande.titre,
                "previous_status": demande.status,
            }));
        match self
            .deps
            .clients
            .soft_delete_demande(id, &justification, &audit)
            .await?
        {
            SoftDeleteOutcome::Deleted(_) => Ok(()),
            SoftDeleteOutcome::NotFound => Err(Error::not_found(format!("demande {id} not found"))),
            SoftDeleteOutcome::Converted { ticket_id } => {
                Err(Error::conflict("demande already converted to a ticket")
                    .with_details(json!({ "ticket_id": ticket_id })))
            }
            SoftDeleteOutcome::AlreadyDeleted => {
                Err(Error::conflict("demande has already been deleted"))
            }
        }
    }

    async fn list_deleted_demandes(&self) -> Result<Vec<DeletedDemande>, Error> {
        Ok(self.deps.clients.list_deleted_demandes().await?)
    }

    async fn restore_demande(&self, caller: &Caller, id: i32) -> Result<Demande, Error> {
        let demande = self.find_demande(id).await?;
        if demande.status != DemandeStatus::Supprimee {
            return Err(Error::conflict("only deleted demandes can be restored"));
        }
        let restored = self
            .deps
            .clients
            .restore_demande(id)
            .await?
            .ok_or_else(|| Error::conflict("only deleted demandes can be restored"))?;
        self.audit(AuditEntry::new(AUDIT_DEMANDE, id, AuditAction::Restore).by(caller.email()))
            .await;
        Ok(restored)
    }

    async fn convert_to_ticket(
        &self,
        caller: &Caller,
        id: i32,
    ) -> Result<ConversionResult, Error> {
        let demande = self.find_demande(id).await?;
        ensure_editable(&demande)?;

        let responsable = resolve_matricule(caller, self.deps.agents.as_ref()).await?;
        let doe = match demande.site_id {
            Some(site_id) => self.deps.references.find_doe_for_site(site_id).await?,
            None => None,
        };
        let ticket = NewTicket {
            titre: demande.titre.clone(),
            description: Some(demande.description.clone()),
            etat: TicketEtat::PasCommence,
            doe_id: doe.as_ref().map(|doe| doe.id),
            affaire_id: doe.as_ref().and_then(|doe| doe.affaire_id),
            site_id: demande.site_id,
            demande_id: Some(id),
            responsable,
            date_debut: None,
            date_fin: None,
        };

        match self.deps.clients.convert_demande(id, &ticket).await? {
            ConversionOutcome::Converted(result) => {
                self.audit(
                    AuditEntry::new(AUDIT_DEMANDE, id, AuditAction::Convert)
                        .by(caller.email())
                        .with_details(json!({ "ticket_id": result.ticket.id })),
                )
                .await;
                Ok(result)
            }
            ConversionOutcome::NotFound => Err(Error::not_found(format!("demande {id} not found"))),
            ConversionOutcome::AlreadyConverted { ticket_id } => {
                Err(Error::conflict("demande already converted to a ticket")
                    .with_details(json!({ "ticket_id": ticket_id })))
            }
            ConversionOutcome::Deleted => Err(Error::conflict("demande has been deleted")),
        }
    }
}

#[cfg(test)]
#[path = "client_portal_service_tests.rs"]
mod tests;
