//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types; validation and authorization stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Locked transactions**: flows that read then write the same row
//!   (demande deletion and conversion, ticket updates) run inside one
//!   transaction holding `SELECT ... FOR UPDATE`.
//! - **Typed errors**: Diesel and pool failures map onto
//!   [`PersistenceError`](crate::domain::ports::PersistenceError).
//!
//! # Example
//!
//! ```ignore
//! use fieldops::outbound::persistence::{DbPool, DieselTicketRepository, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/fieldops");
//! let pool = DbPool::new(config).await?;
//! let tickets = DieselTicketRepository::new(pool);
//! ```

mod diesel_audit_log;
mod diesel_client_repository;
mod diesel_directory;
pub(crate) mod diesel_helpers;
mod diesel_intervention_repository;
mod diesel_messaging_repository;
mod diesel_rendu_repository;
mod diesel_ticket_repository;
mod diesel_travaux_repository;
mod models;
mod pool;
mod schema;

pub use diesel_audit_log::DieselAuditLog;
pub use diesel_client_repository::DieselClientRepository;
pub use diesel_directory::{
    DieselAccountRepository, DieselAgentDirectory, DieselReferenceRepository,
};
pub use diesel_intervention_repository::{
    DieselInterventionEventSync, DieselInterventionRepository,
};
pub use diesel_messaging_repository::DieselMessagingRepository;
pub use diesel_rendu_repository::DieselRenduRepository;
pub use diesel_ticket_repository::DieselTicketRepository;
pub use diesel_travaux_repository::DieselTravauxRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
