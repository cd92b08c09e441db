//! Port for tickets and their assignments.
use async_trait::async_trait;

use crate::domain::{
    AgentAssignment, DocumentMeta, ImageMeta, NewAgentAssignment, NewResponsableChange,
    NewTicket, Responsable, ResponsableChange, ResponsableRole, Satisfaction, Ticket,
    TicketFilter, TicketPatch, TicketUpdate,
};

use super::PersistenceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Tickets matching every present filter, newest first.
    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, PersistenceError>;

    async fn find(&self, id: i32) -> Result<Option<Ticket>, PersistenceError>;

    async fn create(&self, ticket: &NewTicket) -> Result<Ticket, PersistenceError>;

    /// Read, lock and update in one transaction.
    async fn update(
        &self,
        id: i32,
        patch: &TicketPatch,
    ) -> Result<Option<TicketUpdate>, PersistenceError>;

    async fn delete(&self, id: i32) -> Result<bool, PersistenceError>;

    /// Set the primary responsable only if none is set.
    ///
    /// Returns the updated ticket when this call won the claim.
    async fn claim_primary(
        &self,
        id: i32,
        matricule: &str,
    ) -> Result<Option<Ticket>, PersistenceError>;

    async fn record_responsable_change(
        &self,
        change: &NewResponsableChange,
    ) -> Result<(), PersistenceError>;

    /// Newest first.
    async fn responsable_history(&self, id: i32)
    -> Result<Vec<ResponsableChange>, PersistenceError>;

    async fn list_responsables(&self, id: i32) -> Result<Vec<Responsable>, PersistenceError>;

    /// Insert or re-tag a responsable.
    async fn add_responsable(
        &self,
        id: i32,
        matricule: &str,
        role: ResponsableRole,
    ) -> Result<Responsable, PersistenceError>;

    async fn remove_responsable(&self, id: i32, matricule: &str)
    -> Result<bool, PersistenceError>;

    async fn list_agents(&self, id: i32) -> Result<Vec<AgentAssignment>, PersistenceError>;

    async fn add_agent(
        &self,
        assignment: &NewAgentAssignment,
    ) -> Result<AgentAssignment, PersistenceError>;

    async fn remove_agent(&self, id: i32, matricule: &str) -> Result<bool, PersistenceError>;

    async fn find_satisfaction(&self, id: i32) -> Result<Option<Satisfaction>, PersistenceError>;

    async fn upsert_satisfaction(
        &self,
        id: i32,
        rating: i16,
        commentaire: Option<String>,
    ) -> Result<Satisfaction, PersistenceError>;

    /// Whether `user_id` is the account of the ticket's client.
    async fn is_client_user(&self, id: i32, user_id: i32) -> Result<bool, PersistenceError>;

    async fn documents(&self, id: i32) -> Result<Vec<DocumentMeta>, PersistenceError>;

    async fn images(&self, id: i32) -> Result<Vec<ImageMeta>, PersistenceError>;
}
