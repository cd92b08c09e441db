//! Port for interventions, their calendar and equipment.
use async_trait::async_trait;

use crate::domain::{
    CalendarEntry, Intervention, InterventionEvent, InterventionFilter, InterventionInput,
    MaterielUsage, NewIntervention,
};

use super::PersistenceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterventionRepository: Send + Sync {
    async fn list(&self, filter: &InterventionFilter)
    -> Result<Vec<Intervention>, PersistenceError>;

    async fn find(&self, id: i32) -> Result<Option<Intervention>, PersistenceError>;

    async fn create(&self, intervention: &NewIntervention)
    -> Result<Intervention, PersistenceError>;

    async fn replace(
        &self,
        id: i32,
        intervention: &NewIntervention,
    ) -> Result<Option<Intervention>, PersistenceError>;

    /// Apply the present fields only.
    async fn patch(
        &self,
        id: i32,
        patch: &InterventionInput,
    ) -> Result<Option<Intervention>, PersistenceError>;

    async fn delete(&self, id: i32) -> Result<bool, PersistenceError>;

    /// Calendar records, optionally limited to the given responsables.
    async fn calendar(
        &self,
        matricules: Option<Vec<String>>,
    ) -> Result<Vec<CalendarEntry>, PersistenceError>;

    async fn events(&self, id: i32) -> Result<Vec<InterventionEvent>, PersistenceError>;

    /// Equipment linked directly to the intervention.
    async fn direct_materiels(&self, id: i32) -> Result<Vec<MaterielUsage>, PersistenceError>;

    /// Equipment requested for the intervention or its parent ticket.
    async fn requested_materiels(
        &self,
        id: i32,
        ticket_id: i32,
    ) -> Result<Vec<MaterielUsage>, PersistenceError>;
}

/// Projects an intervention onto per-agent calendar events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterventionEventSync: Send + Sync {
    /// Upsert one event per agent of the parent ticket; returns the count.
    async fn sync(&self, intervention: &Intervention) -> Result<usize, PersistenceError>;
}
