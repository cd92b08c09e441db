//! Error shared by every persistence port.

use crate::domain::Error;

use super::define_port_error;

define_port_error! {
    /// Failures raised by persistence adapters.
    pub enum PersistenceError {
        /// No connection could be obtained.
        Connection { message: String } => "database connection failed: {message}",
        /// The statement failed for a reason the caller cannot fix.
        Query { message: String } => "database query failed: {message}",
        /// Foreign key, not-null or check constraint violated by the input.
        Constraint { message: String } => "constraint violated: {message}",
        /// Unique constraint violated.
        Duplicate { message: String } => "duplicate record: {message}",
    }
}

impl From<PersistenceError> for Error {
    fn from(error: PersistenceError) -> Self {
        match error {
            PersistenceError::Connection { message } => {
                Error::service_unavailable(format!("database unavailable: {message}"))
            }
            PersistenceError::Query { message } => {
                Error::internal(format!("database error: {message}"))
            }
            PersistenceError::Constraint { .. } => Error::invalid_request("invalid data"),
            PersistenceError::Duplicate { .. } => Error::conflict("record already exists"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(PersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(PersistenceError::query("syntax"), ErrorCode::InternalError)]
    #[case(PersistenceError::constraint("ticket_doe_id_fkey"), ErrorCode::InvalidRequest)]
    #[case(PersistenceError::duplicate("users_email"), ErrorCode::Conflict)]
    fn maps_to_domain_codes(#[case] error: PersistenceError, #[case] expected: ErrorCode) {
        assert_eq!(Error::from(error).code(), expected);
    }

    #[rstest]
    fn constraint_details_are_not_leaked() {
        let error = Error::from(PersistenceError::constraint("ticket_doe_id_fkey"));
        assert_eq!(error.message(), "invalid data");
    }
}
