//! Password login against stored account hashes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{AccountRepository, AgentDirectory, LoginService, PasswordHasher};
use crate::domain::{Caller, Error, LoginCredentials, best_effort};

/// `LoginService` verifying passwords with a [`PasswordHasher`].
///
/// The caller identity carries the matricule of the agent linked to the
/// account, by user id first and then by e-mail.
#[derive(Clone)]
pub struct PasswordLoginService {
    accounts: Arc<dyn AccountRepository>,
    agents: Arc<dyn AgentDirectory>,
    hasher: Arc<dyn PasswordHasher>,
}

impl PasswordLoginService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        agents: Arc<dyn AgentDirectory>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            accounts,
            agents,
            hasher,
        }
    }

    async fn linked_matricule(&self, user_id: i32, email: &str) -> Option<String> {
        let by_id = best_effort("agent lookup", self.agents.find_by_user_id(user_id))
            .await
            .flatten();
        let agent = match by_id {
            Some(agent) => Some(agent),
            None => best_effort("agent lookup", self.agents.find_by_email(email))
                .await
                .flatten(),
        };
        agent.map(|agent| agent.matricule)
    }
}

#[async_trait]
impl LoginService for PasswordLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Caller, Error> {
        let invalid = || Error::unauthorized("invalid credentials");
        let account = self
            .accounts
            .find_by_email(credentials.email())
            .await?
            .ok_or_else(invalid)?;
        if !self
            .hasher
            .verify(credentials.password(), &account.password_hash)
        {
            debug!(user_id = account.id, "password mismatch");
            return Err(invalid());
        }

        let caller = Caller::new(account.id, account.email.clone(), account.roles);
        Ok(match self.linked_matricule(account.id, &account.email).await {
            Some(matricule) => caller.with_matricule(matricule),
            None => caller,
        })
    }
}
