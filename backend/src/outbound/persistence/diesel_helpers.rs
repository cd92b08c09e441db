//! Shared helpers and macros for the Diesel adapters.
//!
//! - Pool and Diesel error mapping onto [`PersistenceError`].
//! - Parsing of text status columns.
//! - Declarative macros for the common "find one" and "list" query shapes.

use std::str::FromStr;

use tracing::debug;

use crate::domain::UnknownStatus;
use crate::domain::ports::PersistenceError;

use super::pool::PoolError;

/// Map pool failures onto connection errors.
pub fn map_pool_error(error: PoolError) -> PersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            PersistenceError::connection(message)
        }
    }
}

/// Map Diesel failures onto persistence errors.
///
/// Foreign key, not-null and check violations are input problems and map to
/// [`PersistenceError::Constraint`]; unique violations map to
/// [`PersistenceError::Duplicate`].
pub fn map_diesel_error(error: diesel::result::Error) -> PersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            error = %error,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => PersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => PersistenceError::query("database query error"),
        DieselError::DatabaseError(kind, info) => {
            let subject = info
                .constraint_name()
                .map_or_else(|| info.message().to_owned(), str::to_owned);
            match kind {
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation => PersistenceError::constraint(subject),
                DatabaseErrorKind::UniqueViolation => PersistenceError::duplicate(subject),
                DatabaseErrorKind::ClosedConnection => {
                    PersistenceError::connection("database connection error")
                }
                _ => PersistenceError::query("database error"),
            }
        }
        _ => PersistenceError::query("database error"),
    }
}

diesel::define_sql_function! {
    /// SQL `lower()`, for case-insensitive e-mail matches.
    fn lower(text: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

/// Single boolean produced by `SELECT EXISTS (...) AS allowed`.
#[derive(diesel::QueryableByName)]
pub(crate) struct AllowedRow {
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub allowed: bool,
}

/// Parse a status column into its closed vocabulary.
pub fn parse_text<T>(raw: &str) -> Result<T, PersistenceError>
where
    T: FromStr<Err = UnknownStatus>,
{
    raw.parse()
        .map_err(|err: UnknownStatus| PersistenceError::query(err.to_string()))
}

/// Convert every row, failing on the first invalid one.
pub fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, PersistenceError>
where
    T: TryFrom<R, Error = PersistenceError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Find at most one row and convert it.
///
/// Acquires a connection, filters, selects the row type and maps errors.
#[macro_export]
macro_rules! query_optional {
    (
        $self:ident,
        $table:expr,
        $filter:expr,
        $row_type:ty,
        $converter:expr
    ) => {{
        use diesel::prelude::*;
        use diesel_async::RunQueryDsl;
        use $crate::outbound::persistence::diesel_helpers::map_diesel_error;
        use $crate::outbound::persistence::diesel_helpers::map_pool_error;

        let mut conn = $self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<$row_type> = $table
            .filter($filter)
            .select(<$row_type>::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map($converter).transpose()
    }};
}
