//! Driving port for interventions.
use async_trait::async_trait;

use crate::domain::{
    CalendarEntry, CalendarQuery, Error, Intervention, InterventionEvent, InterventionFilter,
    InterventionInput, InterventionRelations, MaterielUsage, Rendu, RenduInput,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterventionScheduling: Send + Sync {
    async fn list_interventions(&self, filter: InterventionFilter)
    -> Result<Vec<Intervention>, Error>;

    async fn get_intervention(&self, id: i32) -> Result<Intervention, Error>;

    async fn calendar(&self, query: CalendarQuery) -> Result<Vec<CalendarEntry>, Error>;

    async fn create_intervention(&self, input: InterventionInput) -> Result<Intervention, Error>;

    async fn replace_intervention(&self, id: i32, input: InterventionInput)
    -> Result<Intervention, Error>;

    async fn patch_intervention(&self, id: i32, input: InterventionInput)
    -> Result<Intervention, Error>;

    async fn delete_intervention(&self, id: i32) -> Result<(), Error>;

    async fn events(&self, id: i32) -> Result<Vec<InterventionEvent>, Error>;

    async fn materiels(&self, id: i32) -> Result<Vec<MaterielUsage>, Error>;

    async fn intervention_relations(&self, id: i32) -> Result<InterventionRelations, Error>;

    async fn list_rendus(&self, id: i32) -> Result<Vec<Rendu>, Error>;

    async fn get_rendu(&self, id: i32, rendu_id: i32) -> Result<Rendu, Error>;

    async fn create_rendu(&self, id: i32, input: RenduInput) -> Result<Rendu, Error>;

    async fn update_rendu(&self, id: i32, rendu_id: i32, input: RenduInput)
    -> Result<Rendu, Error>;

    async fn delete_rendu(&self, id: i32, rendu_id: i32) -> Result<(), Error>;
}
