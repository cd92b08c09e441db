//! Cross-cutting collaborators: audit trail, password hashing, chef checks.
use async_trait::async_trait;

use crate::domain::{Agent, AuditEntry, Error};

use super::{PersistenceError, define_port_error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), PersistenceError>;
}

define_port_error! {
    /// Failures raised by password hashers.
    pub enum PasswordHashError {
        Hash { message: String } => "password hashing failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Never errors; malformed hashes simply fail verification.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Checks that an agent may be made responsable of a ticket or work order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChefAssertion: Send + Sync {
    /// The agent when eligible; 404 when unknown, 403 when not a chef.
    async fn assert_chef(&self, matricule: &str) -> Result<Agent, Error>;
}
