//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use watchpost_domain::WatchpostError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub WatchpostError);

impl From<InfraError> for WatchpostError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<WatchpostError> for InfraError {
    fn from(value: WatchpostError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoWatchpostError {
    fn into_watchpost(self) -> WatchpostError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → WatchpostError */
/* -------------------------------------------------------------------------- */

impl IntoWatchpostError for SqlError {
    fn into_watchpost(self) -> WatchpostError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => WatchpostError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        WatchpostError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => WatchpostError::Database(format!(
                        "constraint violation (code {}): {}",
                        err.extended_code, message
                    )),
                    _ => WatchpostError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => WatchpostError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                WatchpostError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                WatchpostError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidQuery => WatchpostError::Database("invalid SQL query".into()),
            other => WatchpostError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_watchpost())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → WatchpostError */
/* -------------------------------------------------------------------------- */

impl IntoWatchpostError for r2d2::Error {
    fn into_watchpost(self) -> WatchpostError {
        WatchpostError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_watchpost())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → WatchpostError */
/* -------------------------------------------------------------------------- */

impl IntoWatchpostError for HttpError {
    fn into_watchpost(self) -> WatchpostError {
        if self.is_timeout() {
            WatchpostError::Network("request timed out".into())
        } else if self.is_connect() {
            WatchpostError::Network(format!("connection failed: {self}"))
        } else if self.is_decode() {
            WatchpostError::Network(format!("failed to decode response body: {self}"))
        } else if self.is_builder() {
            WatchpostError::InvalidInput(format!("invalid request: {self}"))
        } else {
            WatchpostError::Network(self.to_string())
        }
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_watchpost())
    }
}
