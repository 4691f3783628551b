//! Conversions from external infrastructure errors into domain errors.

use postdeck_domain::PostdeckError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PostdeckError);

impl From<InfraError> for PostdeckError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PostdeckError> for InfraError {
    fn from(value: PostdeckError) -> Self {
        InfraError(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPostdeckError {
    fn into_postdeck(self) -> PostdeckError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → PostdeckError */
/* -------------------------------------------------------------------------- */

impl IntoPostdeckError for SqlError {
    fn into_postdeck(self) -> PostdeckError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => PostdeckError::Storage("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        PostdeckError::Storage("database is locked".into())
                    }
                    ErrorCode::DiskFull => PostdeckError::Storage("storage quota exceeded".into()),
                    ErrorCode::ReadOnly => PostdeckError::Storage("database is read-only".into()),
                    ErrorCode::CannotOpen => {
                        PostdeckError::Storage(format!("unable to open database: {message}"))
                    }
                    _ => PostdeckError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => PostdeckError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                PostdeckError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                PostdeckError::Storage(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => PostdeckError::Storage(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => PostdeckError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_postdeck())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PostdeckError */
/* -------------------------------------------------------------------------- */

impl IntoPostdeckError for HttpError {
    fn into_postdeck(self) -> PostdeckError {
        if self.is_timeout() {
            return PostdeckError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return PostdeckError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => PostdeckError::NotFound(message),
                400..=499 => PostdeckError::Validation(message),
                _ => PostdeckError::Network(message),
            };
        }

        if self.is_decode() {
            return PostdeckError::Network(format!("invalid HTTP response body: {self}"));
        }

        PostdeckError::Network(format!("HTTP error: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_postdeck())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → PostdeckError */
/* -------------------------------------------------------------------------- */

impl IntoPostdeckError for std::io::Error {
    fn into_postdeck(self) -> PostdeckError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => PostdeckError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                PostdeckError::Storage(format!("permission denied: {self}"))
            }
            _ => PostdeckError::Storage(format!("I/O error: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_postdeck())
    }
}

/* -------------------------------------------------------------------------- */
/* serde / config formats → PostdeckError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(PostdeckError::Storage(format!("invalid JSON record: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(PostdeckError::Config(format!("invalid TOML: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
