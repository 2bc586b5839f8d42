//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use syncline_domain::SyncError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSyncError {
    fn into_sync(self) -> SyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for SqlError {
    fn into_sync(self) -> SyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => SyncError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        SyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        SyncError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        SyncError::Database("foreign key constraint violation".into())
                    }
                    _ => SyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => SyncError::Database("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SyncError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => SyncError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                SyncError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => {
                SyncError::Database(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => SyncError::Database("invalid SQL query".into()),
            other => SyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(SyncError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(SyncError::Database(format!("failed to (de)serialize column: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for HttpError {
    fn into_sync(self) -> SyncError {
        if self.is_timeout() {
            return SyncError::ProviderUnavailable("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SyncError::ProviderUnavailable("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return SyncError::ProviderUnavailable(format!(
                "HTTP {} {}",
                code,
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        SyncError::ProviderUnavailable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
