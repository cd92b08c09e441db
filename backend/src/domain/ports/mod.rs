//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (repositories and collaborators) are implemented by the
//! outbound adapters. Driving ports are implemented by the domain services
//! and called by the HTTP handlers. Test builds get `mockall` doubles for
//! every trait.

mod macros;
pub(crate) use macros::define_port_error;

mod client_portal;
mod client_repository;
mod collaborators;
mod directory;
mod intervention_repository;
mod intervention_scheduling;
mod login_service;
mod messaging;
mod messaging_repository;
mod persistence_error;
mod rendu_repository;
mod ticket_lifecycle;
mod ticket_repository;
mod travaux_lifecycle;
mod travaux_repository;

pub use client_portal::ClientPortal;
#[cfg(test)]
pub use client_portal::MockClientPortal;
pub use client_repository::ClientRepository;
#[cfg(test)]
pub use client_repository::MockClientRepository;
pub use collaborators::{AuditLog, ChefAssertion, PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use collaborators::{MockAuditLog, MockChefAssertion, MockPasswordHasher};
pub use directory::{AccountRepository, AgentDirectory, ReferenceRepository};
#[cfg(test)]
pub use directory::{MockAccountRepository, MockAgentDirectory, MockReferenceRepository};
pub use intervention_repository::{InterventionEventSync, InterventionRepository};
#[cfg(test)]
pub use intervention_repository::{MockInterventionEventSync, MockInterventionRepository};
pub use intervention_scheduling::InterventionScheduling;
#[cfg(test)]
pub use intervention_scheduling::MockInterventionScheduling;
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use messaging::Messaging;
#[cfg(test)]
pub use messaging::MockMessaging;
#[cfg(test)]
pub use messaging_repository::MockMessagingRepository;
pub use messaging_repository::MessagingRepository;
pub use persistence_error::PersistenceError;
#[cfg(test)]
pub use rendu_repository::MockRenduRepository;
pub use rendu_repository::RenduRepository;
#[cfg(test)]
pub use ticket_lifecycle::MockTicketLifecycle;
pub use ticket_lifecycle::TicketLifecycle;
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::TicketRepository;
#[cfg(test)]
pub use travaux_lifecycle::MockTravauxLifecycle;
pub use travaux_lifecycle::TravauxLifecycle;
#[cfg(test)]
pub use travaux_repository::MockTravauxRepository;
pub use travaux_repository::TravauxRepository;
