use std::fmt::Display;

use log::{error, warn};
use thiserror::Error;
use validator::ValidationErrors;

use crate::{DatabaseError, PrimaryKey};

pub type LibraryResult<T> = Result<T, LibraryError>;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// A field violates its constraints, or references a row that doesn't exist
    #[error("{0}")]
    Invalid(String),
    /// The id in the path and the id of the record are not the same
    #[error("Id {path} does not match the id {body} of the record")]
    IdMismatch { path: PrimaryKey, body: PrimaryKey },
    /// The caller is neither the owner of the resource nor an admin
    #[error("Insufficient privileges")]
    Forbidden,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl From<ValidationErrors> for LibraryError {
    fn from(value: ValidationErrors) -> Self {
        Self::Invalid(value.to_string())
    }
}

/// Helper trait to reduce boilerplate
pub(crate) trait Reference<T> {
    /// Turns a missing referenced row into a validation error
    fn referenced(self, resource: &'static str) -> LibraryResult<T>;
}

impl<T> Reference<T> for Result<T, DatabaseError> {
    fn referenced(self, resource: &'static str) -> LibraryResult<T> {
        self.map_err(|e| match e {
            DatabaseError::NotFound { .. } => {
                LibraryError::Invalid(format!("The referenced {resource} does not exist"))
            }
            e => e.into(),
        })
    }
}

/// Helper trait to log failed operations with the id they concern
pub(crate) trait LogFailure {
    fn log_failure(self, operation: &str, id: impl Display) -> Self;
}

impl<T> LogFailure for Result<T, DatabaseError> {
    fn log_failure(self, operation: &str, id: impl Display) -> Self {
        match &self {
            Err(e @ DatabaseError::Internal(_)) => error!("Could not {operation} {id}: {e}"),
            Err(e) => warn!("Could not {operation} {id}: {e}"),
            Ok(_) => {}
        }

        self
    }
}
