//! Shared helpers for the Diesel adapter integration suites.
//!
//! Every file under `backend/tests/` builds as its own crate, so the suites
//! pull these helpers in with `mod support;` rather than through the library.

pub mod cluster_skip;
pub mod embedded_postgres;
pub mod pg_embed;
pub mod seed;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{TestDatabase, setup_database};

/// Render a `postgres` error with its SQLSTATE and server message.
///
/// The plain `Display` output collapses server errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}
