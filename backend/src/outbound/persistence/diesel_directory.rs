//! PostgreSQL-backed account, agent and reference lookups.
//!
//! E-mail lookups compare `lower()` of both sides so they hit the
//! `users_email_lower_idx` index.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    AccountRepository, AgentDirectory, PersistenceError, ReferenceRepository,
};
use crate::domain::{Affaire, Agent, Doe, UserAccount};
use crate::query_optional;

use super::diesel_helpers::{lower, map_diesel_error, map_pool_error};
use super::models::{AffaireRow, AgentRow, DoeRow, UserRow};
use super::pool::DbPool;
use super::schema::{affaire, agent, agent_fonction, doe, users};

/// Login accounts from `users`.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, PersistenceError> {
        query_optional!(
            self,
            users::table,
            lower(users::email).eq(email.trim().to_lowercase()),
            UserRow,
            |row| Ok(UserAccount::from(row))
        )
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserAccount>, PersistenceError> {
        query_optional!(self, users::table, users::id.eq(id), UserRow, |row| Ok(
            UserAccount::from(row)
        ))
    }
}

/// Agents from `agent` and `agent_fonction`.
#[derive(Clone)]
pub struct DieselAgentDirectory {
    pool: DbPool,
}

impl DieselAgentDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentDirectory for DieselAgentDirectory {
    async fn find_by_matricule(&self, matricule: &str) -> Result<Option<Agent>, PersistenceError> {
        query_optional!(
            self,
            agent::table,
            agent::matricule.eq(matricule),
            AgentRow,
            |row| Ok(Agent::from(row))
        )
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Agent>, PersistenceError> {
        query_optional!(
            self,
            agent::table,
            lower(agent::email.assume_not_null()).eq(email.trim().to_lowercase()),
            AgentRow,
            |row| Ok(Agent::from(row))
        )
    }

    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Agent>, PersistenceError> {
        query_optional!(
            self,
            agent::table,
            agent::user_id.eq(user_id),
            AgentRow,
            |row| Ok(Agent::from(row))
        )
    }

    async fn has_fonction(
        &self,
        matricule: &str,
        fonction: &str,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            agent_fonction::table
                .filter(agent_fonction::matricule.eq(matricule))
                .filter(lower(agent_fonction::fonction).eq(fonction.trim().to_lowercase())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}

/// DOE and affaire lookups.
#[derive(Clone)]
pub struct DieselReferenceRepository {
    pool: DbPool,
}

impl DieselReferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for DieselReferenceRepository {
    async fn find_doe(&self, id: i32) -> Result<Option<Doe>, PersistenceError> {
        query_optional!(self, doe::table, doe::id.eq(id), DoeRow, |row| Ok(Doe::from(
            row
        )))
    }

    async fn find_doe_for_site(&self, site_id: i32) -> Result<Option<Doe>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DoeRow> = doe::table
            .filter(doe::site_id.eq(site_id))
            .order_by(doe::id.asc())
            .select(DoeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Doe::from))
    }

    async fn find_affaire(&self, id: i32) -> Result<Option<Affaire>, PersistenceError> {
        query_optional!(
            self,
            affaire::table,
            affaire::id.eq(id),
            AffaireRow,
            |row| Ok(Affaire::from(row))
        )
    }
}
