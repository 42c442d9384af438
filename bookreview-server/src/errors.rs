use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bookreview_domain::{AuthError, DatabaseError, LibraryError, PrimaryKey};
use log::error;
use thiserror::Error;
use validator::ValidationErrors;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Invalid(String),
    #[error("The id in the path does not match the id of the record")]
    IdMismatch,
    #[error("Missing authorization")]
    MissingAuthorization,
    #[error("Authorization must be Bearer")]
    InvalidAuthorization,
    #[error("Session does not exist")]
    Unauthenticated,
    #[error("Insufficient privileges")]
    Forbidden,
    #[error("{resource} with that {identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{resource} {id} was modified by someone else")]
    Modified {
        resource: &'static str,
        id: PrimaryKey,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("An admin already exists")]
    AdminExists,
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Invalid(_)
            | Self::IdMismatch
            | Self::InvalidAuthorization
            | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::MissingAuthorization | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::Modified { .. } | Self::AdminExists => {
                StatusCode::CONFLICT
            }
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        if let Self::Unknown(detail) = &self {
            error!("Request failed: {}", detail);
            return (status, "Internal server error").into_response();
        }

        (status, self.to_string()).into_response()
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(value: ValidationErrors) -> Self {
        Self::Invalid(value.to_string())
    }
}

impl From<LibraryError> for ServerError {
    fn from(value: LibraryError) -> Self {
        match value {
            LibraryError::Invalid(message) => Self::Invalid(message),
            LibraryError::IdMismatch { .. } => Self::IdMismatch,
            LibraryError::Forbidden => Self::Forbidden,
            LibraryError::Db(e) => e.into(),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::AdminExists => Self::AdminExists,
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            DatabaseError::Modified { resource, id } => Self::Modified { resource, id },
            e => Self::Unknown(e.to_string()),
        }
    }
}
