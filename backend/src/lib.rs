//! Field-service operations backend.
//!
//! Hexagonal layout: [`domain`] holds entities, services and ports;
//! [`inbound`] exposes them over HTTP; [`outbound`] implements the driven
//! ports with PostgreSQL and Argon2.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
