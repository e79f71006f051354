//! Shared Diesel error mapping onto [`StorageError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::StorageError;

use super::pool::PoolError;

const UNNAMED_CONSTRAINT: &str = "unknown";

/// Map pool checkout failures to connection errors.
pub(super) fn map_pool_error(error: PoolError) -> StorageError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StorageError::connection(message)
        }
    }
}

/// Map Diesel errors, keeping constraint violations distinguishable so
/// services can translate them into domain errors.
pub(super) fn map_diesel_error(error: DieselError) -> StorageError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StorageError::unique_violation(info.constraint_name().unwrap_or(UNNAMED_CONSTRAINT))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            StorageError::foreign_key_violation(
                info.constraint_name().unwrap_or(UNNAMED_CONSTRAINT),
            )
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StorageError::connection("database connection error")
        }
        DieselError::NotFound => StorageError::query("record not found"),
        DieselError::QueryBuilderError(_) => StorageError::query("database query error"),
        DieselError::AlreadyInTransaction | DieselError::NotInTransaction => {
            StorageError::query("transaction state error")
        }
        _ => StorageError::query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    struct Info(Option<&'static str>);

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "constraint failed"
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.0
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info(constraint)))
    }

    #[rstest]
    #[case(
        database_error(DatabaseErrorKind::UniqueViolation, Some("users_email_key")),
        StorageError::unique_violation("users_email_key")
    )]
    #[case(
        database_error(DatabaseErrorKind::ForeignKeyViolation, Some("posts_author_id_fkey")),
        StorageError::foreign_key_violation("posts_author_id_fkey")
    )]
    #[case(
        database_error(DatabaseErrorKind::UniqueViolation, None),
        StorageError::unique_violation("unknown")
    )]
    #[case(
        database_error(DatabaseErrorKind::ClosedConnection, None),
        StorageError::connection("database connection error")
    )]
    #[case(DieselError::NotFound, StorageError::query("record not found"))]
    fn diesel_errors_map_to_storage_errors(
        #[case] error: DieselError,
        #[case] expected: StorageError,
    ) {
        assert_eq!(map_diesel_error(error), expected);
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let err = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(err, StorageError::connection("timed out"));
    }
}
