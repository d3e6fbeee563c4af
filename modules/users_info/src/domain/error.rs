use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Every failure the user pipeline can produce. The REST layer maps each
/// variant to exactly one status code; see [`DomainError::status`].
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("{message}")]
    Database {
        message: String,
        #[source]
        cause: Option<anyhow::Error>,
    },

    #[error("{}", not_found_message(resource, id.as_deref()))]
    NotFound {
        resource: String,
        id: Option<String>,
    },

    #[error("{message}")]
    Conflict {
        message: String,
        details: Option<Value>,
    },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },
}

fn not_found_message(resource: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{resource} with id {id} not found"),
        None => format!("{resource} not found"),
    }
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            cause: None,
        }
    }

    pub fn database_with_cause(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self::Database {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.to_string()),
        }
    }

    pub fn not_found_resource(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict_with_details(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized() -> Self {
        Self::unauthorized_with("Unauthorized")
    }

    pub fn unauthorized_with(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden() -> Self {
        Self::forbidden_with("Forbidden")
    }

    pub fn forbidden_with(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Caller-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wire name used in the `error` field of response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Database { .. } => "DatabaseError",
            Self::NotFound { .. } => "NotFoundError",
            Self::Conflict { .. } => "ConflictError",
            Self::Unauthorized { .. } => "UnauthorizedError",
            Self::Forbidden { .. } => "ForbiddenError",
        }
    }

    /// Expected, caller-correctable failures. Database failures are not.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Database { .. })
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Validation { details, .. } | Self::Conflict { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Database { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }
}
