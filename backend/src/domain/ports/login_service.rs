//! Driving port for login use-cases.
//!
//! Inbound adapters call it to authenticate credentials without importing
//! the persistence or hashing infrastructure, so handler tests can use a
//! mock.

use async_trait::async_trait;

use crate::domain::{Caller, Error, LoginCredentials};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the caller identity to store.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Caller, Error>;
}
