//! Driving port for client accounts, sites and demandes.
use async_trait::async_trait;

use crate::domain::{
    Caller, Client, ConversionResult, DeletedDemande, Demande, DemandeInput, DemandeQuery,
    DemandeStatusInput, Error, JustificationInput, RegisterClientRequest, Site, SiteInput,
    SiteRelations,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientPortal: Send + Sync {
    async fn register_client(&self, request: RegisterClientRequest) -> Result<Client, Error>;

    async fn list_clients(&self) -> Result<Vec<Client>, Error>;

    async fn list_sites(&self, caller: &Caller) -> Result<Vec<Site>, Error>;

    async fn get_site(&self, caller: &Caller, id: i32) -> Result<Site, Error>;

    async fn create_site(&self, caller: &Caller, input: SiteInput) -> Result<Site, Error>;

    async fn update_site(&self, caller: &Caller, id: i32, input: SiteInput)
    -> Result<Site, Error>;

    async fn delete_site(&self, caller: &Caller, id: i32) -> Result<(), Error>;

    async fn site_relations(&self, caller: &Caller, id: i32) -> Result<SiteRelations, Error>;

    async fn list_demandes(&self, caller: &Caller, query: DemandeQuery)
    -> Result<Vec<Demande>, Error>;

    async fn get_demande(&self, caller: &Caller, id: i32) -> Result<Demande, Error>;

    async fn create_demande(&self, caller: &Caller, input: DemandeInput)
    -> Result<Demande, Error>;

    async fn update_demande(
        &self,
        caller: &Caller,
        id: i32,
        input: DemandeInput,
    ) -> Result<Demande, Error>;

    async fn update_demande_status(
        &self,
        caller: &Caller,
        id: i32,
        input: DemandeStatusInput,
    ) -> Result<Demande, Error>;

    async fn delete_demande(
        &self,
        caller: &Caller,
        id: i32,
        input: JustificationInput,
    ) -> Result<(), Error>;

    async fn list_deleted_demandes(&self) -> Result<Vec<DeletedDemande>, Error>;

    async fn restore_demande(&self, caller: &Caller, id: i32) -> Result<Demande, Error>;

    async fn convert_to_ticket(&self, caller: &Caller, id: i32)
    -> Result<ConversionResult, Error>;
}
