//! Port for intervention and work order reports.
use async_trait::async_trait;

use crate::domain::{NewRendu, Rendu, RenduOwner, RenduPatch};

use super::PersistenceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenduRepository: Send + Sync {
    /// Insert the rendu, its images, link rows and document rows atomically.
    async fn create(&self, owner: RenduOwner, rendu: &NewRendu) -> Result<Rendu, PersistenceError>;

    async fn list(&self, owner: RenduOwner) -> Result<Vec<Rendu>, PersistenceError>;

    async fn find(&self, owner: RenduOwner, rendu_id: i32)
    -> Result<Option<Rendu>, PersistenceError>;

    /// Update text fields and append images atomically.
    async fn update(
        &self,
        owner: RenduOwner,
        rendu_id: i32,
        patch: &RenduPatch,
    ) -> Result<Option<Rendu>, PersistenceError>;

    /// Remove images, link rows, document rows and the rendu atomically.
    async fn delete(&self, owner: RenduOwner, rendu_id: i32) -> Result<bool, PersistenceError>;
}
