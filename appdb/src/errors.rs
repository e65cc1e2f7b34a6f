use crate::db::errors::DbError;
use thiserror::Error as ThisError;

/// Top-level error for the binary and the setup functions in the crate root.
///
/// Repository calls return [`DbError`] directly; this type wraps it alongside configuration
/// and startup failures.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Configuration is missing or inconsistent
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Generic internal failure during setup
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config { message: message.into() }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(DbError::from(err))
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::Internal {
            operation: format!("run migrations: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::config("pool.max_connections must be at least 1").to_string(),
            "Invalid configuration: pool.max_connections must be at least 1"
        );
        assert_eq!(
            Error::Internal {
                operation: "connect".to_string()
            }
            .to_string(),
            "Failed to connect"
        );
    }

    #[test]
    fn test_sqlx_errors_keep_their_category() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Database(DbError::NotFound)));
    }
}
