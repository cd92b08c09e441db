//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ClientPortal, InterventionScheduling, LoginService, Messaging, TicketLifecycle,
    TravauxLifecycle,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use fieldops::inbound::http::state::HttpState;
///
/// fn tickets_of(state: &HttpState) {
///     let _tickets = state.tickets.clone();
/// }
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub clients: Arc<dyn ClientPortal>,
    pub tickets: Arc<dyn TicketLifecycle>,
    pub travaux: Arc<dyn TravauxLifecycle>,
    pub interventions: Arc<dyn InterventionScheduling>,
    pub messaging: Arc<dyn Messaging>,
}
