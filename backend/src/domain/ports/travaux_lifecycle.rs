//! Driving port for work orders.
use async_trait::async_trait;

use crate::domain::{
    AgentAssignment, AgentAssignmentInput, Caller, Error, Rendu, RenduInput, Responsable,
    ResponsableInput, Satisfaction, SatisfactionInput, Tache, TacheInput, Travaux, TravauxFilter,
    TravauxInput, TravauxMateriel, TravauxMaterielInput, TravauxRelations,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TravauxLifecycle: Send + Sync {
    async fn list_travaux(&self, filter: TravauxFilter) -> Result<Vec<Travaux>, Error>;

    async fn get_travaux(&self, id: i32) -> Result<Travaux, Error>;

    async fn travaux_relations(&self, id: i32) -> Result<TravauxRelations, Error>;

    async fn create_travaux(&self, caller: &Caller, input: TravauxInput) -> Result<Travaux, Error>;

    async fn update_travaux(&self, caller: &Caller, id: i32, input: TravauxInput)
    -> Result<Travaux, Error>;

    async fn delete_travaux(&self, caller: &Caller, id: i32) -> Result<(), Error>;

    async fn list_taches(&self, id: i32) -> Result<Vec<Tache>, Error>;

    async fn create_tache(&self, id: i32, input: TacheInput) -> Result<Tache, Error>;

    async fn update_tache(&self, id: i32, tache_id: i32, input: TacheInput)
    -> Result<Tache, Error>;

    async fn delete_tache(&self, id: i32, tache_id: i32) -> Result<(), Error>;

    async fn list_materiels(&self, id: i32) -> Result<Vec<TravauxMateriel>, Error>;

    async fn add_materiel(&self, id: i32, input: TravauxMaterielInput)
    -> Result<TravauxMateriel, Error>;

    async fn update_materiel(
        &self,
        id: i32,
        link_id: i32,
        input: TravauxMaterielInput,
    ) -> Result<TravauxMateriel, Error>;

    async fn delete_materiel(&self, id: i32, link_id: i32) -> Result<(), Error>;

    async fn list_agents(&self, id: i32) -> Result<Vec<AgentAssignment>, Error>;

    async fn add_agent(&self, id: i32, input: AgentAssignmentInput)
    -> Result<AgentAssignment, Error>;

    async fn remove_agent(&self, id: i32, matricule: &str) -> Result<(), Error>;

    async fn list_responsables(&self, id: i32) -> Result<Vec<Responsable>, Error>;

    async fn add_responsable(&self, id: i32, input: ResponsableInput)
    -> Result<Responsable, Error>;

    async fn remove_responsable(&self, id: i32, matricule: &str) -> Result<(), Error>;

    async fn list_rendus(&self, id: i32) -> Result<Vec<Rendu>, Error>;

    async fn get_rendu(&self, id: i32, rendu_id: i32) -> Result<Rendu, Error>;

    async fn create_rendu(&self, id: i32, input: RenduInput) -> Result<Rendu, Error>;

    async fn update_rendu(&self, id: i32, rendu_id: i32, input: RenduInput)
    -> Result<Rendu, Error>;

    async fn delete_rendu(&self, id: i32, rendu_id: i32) -> Result<(), Error>;

    async fn save_satisfaction(
        &self,
        caller: &Caller,
        id: i32,
        input: SatisfactionInput,
    ) -> Result<Satisfaction, Error>;

    async fn get_satisfaction(&self, id: i32) -> Result<Option<Satisfaction>, Error>;
}
