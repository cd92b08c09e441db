//! Port for clients, sites and demandes.
use async_trait::async_trait;

use crate::domain::{
    Client, ConversionOutcome, DeletedDemande, Demande, DemandeFilter, DemandePatch,
    DemandeStatus, NewClientAccount, NewDemande, NewSite, NewTicket, RegistrationOutcome, Site,
    SitePatch, SoftDeleteOutcome, AuditEntry,
};

use super::PersistenceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Create the user account and its client in one transaction.
    async fn register_client(
        &self,
        account: &NewClientAccount,
    ) -> Result<RegistrationOutcome, PersistenceError>;

    async fn list_clients(&self) -> Result<Vec<Client>, PersistenceError>;

    async fn find_client(&self, id: i32) -> Result<Option<Client>, PersistenceError>;

    /// Clients reachable by a user: owned, represented by e-mail, or delegated.
    async fn accessible_client_ids(
        &self,
        user_id: i32,
        email: &str,
    ) -> Result<Vec<i32>, PersistenceError>;

    /// Sites of the given clients, or every site for `None`.
    async fn list_sites(&self, client_ids: Option<Vec<i32>>)
    -> Result<Vec<Site>, PersistenceError>;

    async fn find_site(&self, id: i32) -> Result<Option<Site>, PersistenceError>;

    async fn create_site(&self, site: &NewSite) -> Result<Site, PersistenceError>;

    async fn update_site(&self, id: i32, patch: &SitePatch)
    -> Result<Option<Site>, PersistenceError>;

    async fn delete_site(&self, id: i32) -> Result<bool, PersistenceError>;

    async fn list_demandes(&self, filter: &DemandeFilter) -> Result<Vec<Demande>, PersistenceError>;

    async fn find_demande(&self, id: i32) -> Result<Option<Demande>, PersistenceError>;

    async fn create_demande(&self, demande: &NewDemande) -> Result<Demande, PersistenceError>;

    /// Update an editable demande.
    ///
    /// Returns `None` when the row is missing, converted or soft-deleted.
    async fn update_demande(
        &self,
        id: i32,
        patch: &DemandePatch,
    ) -> Result<Option<Demande>, PersistenceError>;

    /// Set the status; `commentaire` replaces the comment when present.
    async fn set_demande_status(
        &self,
        id: i32,
        status: DemandeStatus,
        commentaire: Option<String>,
    ) -> Result<Option<Demande>, PersistenceError>;

    /// Lock the row, append `audit`, then mark it `Supprimee`.
    async fn soft_delete_demande(
        &self,
        id: i32,
        justification: &str,
        audit: &AuditEntry,
    ) -> Result<SoftDeleteOutcome, PersistenceError>;

    async fn list_deleted_demandes(&self) -> Result<Vec<DeletedDemande>, PersistenceError>;

    /// Move a soft-deleted demande back to `EnCours` and clear its
    /// justification.
    ///
    /// Returns `None` when the row is missing or no longer soft-deleted.
    async fn restore_demande(&self, id: i32) -> Result<Option<Demande>, PersistenceError>;

    /// Lock the demande, create its ticket and stamp the link.
    ///
    /// When `ticket.responsable` is set the agent is also recorded as the
    /// `Primaire` responsable and as a ticket agent.
    async fn convert_demande(
        &self,
        id: i32,
        ticket: &NewTicket,
    ) -> Result<ConversionOutcome, PersistenceError>;
}
