//! Driving port for the ticket lifecycle.
use async_trait::async_trait;

use crate::domain::{
    AgentAssignment, AgentAssignmentInput, Caller, Error, JustificationInput, Responsable,
    ResponsableChange, ResponsableInput, Satisfaction, SatisfactionInput, TakeOutcome, Ticket,
    TicketFilter, TicketInput, TicketPatch, TicketRelations,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketLifecycle: Send + Sync {
    async fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<Ticket>, Error>;

    async fn get_ticket(&self, id: i32) -> Result<Ticket, Error>;

    async fn ticket_relations(&self, id: i32) -> Result<TicketRelations, Error>;

    async fn create_ticket(&self, caller: &Caller, input: TicketInput) -> Result<Ticket, Error>;

    async fn update_ticket(&self, caller: &Caller, id: i32, patch: TicketPatch)
    -> Result<Ticket, Error>;

    async fn delete_ticket(
        &self,
        caller: &Caller,
        id: i32,
        input: JustificationInput,
    ) -> Result<(), Error>;

    async fn take_ticket(&self, caller: &Caller, id: i32) -> Result<TakeOutcome, Error>;

    async fn save_satisfaction(
        &self,
        caller: &Caller,
        id: i32,
        input: SatisfactionInput,
    ) -> Result<Satisfaction, Error>;

    async fn get_satisfaction(&self, id: i32) -> Result<Option<Satisfaction>, Error>;

    async fn list_agents(&self, id: i32) -> Result<Vec<AgentAssignment>, Error>;

    async fn add_agent(&self, id: i32, input: AgentAssignmentInput)
    -> Result<AgentAssignment, Error>;

    async fn remove_agent(&self, id: i32, matricule: &str) -> Result<(), Error>;

    async fn list_responsables(&self, id: i32) -> Result<Vec<Responsable>, Error>;

    async fn add_responsable(&self, id: i32, input: ResponsableInput)
    -> Result<Responsable, Error>;

    async fn remove_responsable(&self, id: i32, matricule: &str) -> Result<(), Error>;

    async fn responsable_history(&self, id: i32) -> Result<Vec<ResponsableChange>, Error>;
}
