//! Ports for accounts, agents and reference data.
use async_trait::async_trait;

use crate::domain::{Affaire, Agent, Doe, UserAccount};

use super::PersistenceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, PersistenceError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<UserAccount>, PersistenceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn find_by_matricule(&self, matricule: &str) -> Result<Option<Agent>, PersistenceError>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Agent>, PersistenceError>;

    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Agent>, PersistenceError>;

    async fn has_fonction(&self, matricule: &str, fonction: &str)
    -> Result<bool, PersistenceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn find_doe(&self, id: i32) -> Result<Option<Doe>, PersistenceError>;

    /// First DOE registered for a site.
    async fn find_doe_for_site(&self, site_id: i32) -> Result<Option<Doe>, PersistenceError>;

    async fn find_affaire(&self, id: i32) -> Result<Option<Affaire>, PersistenceError>;
}
