//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod clients;
pub mod demandes;
pub mod error;
pub mod health;
pub mod interventions;
pub mod messaging;
pub mod routes;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod travaux;

pub use error::ApiResult;
