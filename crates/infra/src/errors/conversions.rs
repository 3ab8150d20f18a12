//! Conversions from external infrastructure errors into domain errors.

use erpsync_domain::ErpSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// SQLITE_CONSTRAINT_UNIQUE
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
/// SQLITE_CONSTRAINT_PRIMARYKEY
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
/// SQLITE_CONSTRAINT_FOREIGNKEY
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ErpSyncError);

impl From<InfraError> for ErpSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ErpSyncError> for InfraError {
    fn from(value: ErpSyncError) -> Self {
        InfraError(value)
    }
}

trait IntoErpSyncError {
    fn into_erpsync(self) -> ErpSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ErpSyncError */
/* -------------------------------------------------------------------------- */

impl IntoErpSyncError for SqlError {
    fn into_erpsync(self) -> ErpSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => ErpSyncError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        ErpSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, SQLITE_CONSTRAINT_UNIQUE)
                    | (ErrorCode::ConstraintViolation, SQLITE_CONSTRAINT_PRIMARYKEY) => {
                        ErpSyncError::UniqueViolation(constraint_detail(&message, "unique constraint"))
                    }
                    (ErrorCode::ConstraintViolation, SQLITE_CONSTRAINT_FOREIGNKEY) => {
                        ErpSyncError::ForeignKeyViolation(constraint_detail(
                            &message,
                            "foreign key constraint",
                        ))
                    }
                    _ => ErpSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => ErpSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                ErpSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                ErpSyncError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidParameterName(parameter_name) => {
                ErpSyncError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => ErpSyncError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => ErpSyncError::Database("invalid SQL query".into()),
            other => ErpSyncError::Database(other.to_string()),
        }
    }
}

fn constraint_detail(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_erpsync())
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(ErpSyncError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ErpSyncError */
/* -------------------------------------------------------------------------- */

impl IntoErpSyncError for HttpError {
    fn into_erpsync(self) -> ErpSyncError {
        if self.is_timeout() {
            return ErpSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ErpSyncError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => ErpSyncError::Auth(message),
                404 => ErpSyncError::NotFound(message),
                429 => ErpSyncError::Network(message),
                400..=499 => ErpSyncError::Validation(message),
                _ => ErpSyncError::Network(message),
            };
        }

        if self.is_builder() {
            return ErpSyncError::Internal(format!("invalid HTTP request: {self}"));
        }

        ErpSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_erpsync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
