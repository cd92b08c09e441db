//! Port for work orders and their children.
use async_trait::async_trait;

use crate::domain::{
    AgentAssignment, Demande, NewAgentAssignment, NewDemande, NewTache, NewTravaux,
    NewTravauxMateriel, Responsable, ResponsableRole, Satisfaction, Tache, TacheInput, Travaux,
    TravauxFilter, TravauxInput, TravauxMateriel, TravauxMaterielPatch,
};

use super::PersistenceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TravauxRepository: Send + Sync {
    async fn list(&self, filter: &TravauxFilter) -> Result<Vec<Travaux>, PersistenceError>;

    async fn find(&self, id: i32) -> Result<Option<Travaux>, PersistenceError>;

    async fn create(&self, travaux: &NewTravaux) -> Result<Travaux, PersistenceError>;

    /// Apply the present fields only.
    async fn update(
        &self,
        id: i32,
        patch: &TravauxInput,
    ) -> Result<Option<Travaux>, PersistenceError>;

    async fn delete(&self, id: i32) -> Result<bool, PersistenceError>;

    /// Insert a demande, link it and point the work order at it, atomically.
    async fn link_new_demande(
        &self,
        travaux_id: i32,
        demande: &NewDemande,
    ) -> Result<Demande, PersistenceError>;

    async fn linked_demandes(&self, travaux_id: i32) -> Result<Vec<Demande>, PersistenceError>;

    async fn list_taches(&self, travaux_id: i32) -> Result<Vec<Tache>, PersistenceError>;

    async fn create_tache(&self, tache: &NewTache) -> Result<Tache, PersistenceError>;

    async fn update_tache(
        &self,
        travaux_id: i32,
        tache_id: i32,
        patch: &TacheInput,
    ) -> Result<Option<Tache>, PersistenceError>;

    async fn delete_tache(&self, travaux_id: i32, tache_id: i32)
    -> Result<bool, PersistenceError>;

    async fn list_materiels(&self, travaux_id: i32)
    -> Result<Vec<TravauxMateriel>, PersistenceError>;

    async fn add_materiel(
        &self,
        materiel: &NewTravauxMateriel,
    ) -> Result<TravauxMateriel, PersistenceError>;

    async fn update_materiel(
        &self,
        travaux_id: i32,
        link_id: i32,
        patch: &TravauxMaterielPatch,
    ) -> Result<Option<TravauxMateriel>, PersistenceError>;

    async fn delete_materiel(&self, travaux_id: i32, link_id: i32)
    -> Result<bool, PersistenceError>;

    async fn list_agents(&self, travaux_id: i32)
    -> Result<Vec<AgentAssignment>, PersistenceError>;

    async fn add_agent(
        &self,
        assignment: &NewAgentAssignment,
    ) -> Result<AgentAssignment, PersistenceError>;

    async fn remove_agent(&self, travaux_id: i32, matricule: &str)
    -> Result<bool, PersistenceError>;

    async fn list_responsables(&self, travaux_id: i32)
    -> Result<Vec<Responsable>, PersistenceError>;

    async fn add_responsable(
        &self,
        travaux_id: i32,
        matricule: &str,
        role: ResponsableRole,
    ) -> Result<Responsable, PersistenceError>;

    async fn remove_responsable(
        &self,
        travaux_id: i32,
        matricule: &str,
    ) -> Result<bool, PersistenceError>;

    async fn find_satisfaction(
        &self,
        travaux_id: i32,
    ) -> Result<Option<Satisfaction>, PersistenceError>;

    async fn upsert_satisfaction(
        &self,
        travaux_id: i32,
        rating: i16,
        commentaire: Option<String>,
    ) -> Result<Satisfaction, PersistenceError>;

    /// Whether `user_id` is the client account of the ticket the work order
    /// points at through `travaux.ticket_id`.
    async fn is_client_user(&self, travaux_id: i32, user_id: i32)
    -> Result<bool, PersistenceError>;
}
