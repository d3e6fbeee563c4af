use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsersInfoError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error")]
    Internal,
}

impl From<crate::domain::error::DomainError> for UsersInfoError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            e @ NotFound { .. } => Self::NotFound(e.message()),
            Conflict { message, .. } => Self::Conflict(message),
            Validation { message, .. } => Self::Validation(message),
            Unauthorized { message } => Self::Unauthorized(message),
            Forbidden { message } => Self::Forbidden(message),
            Database { .. } => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn database_errors_are_opaque() {
        let e: UsersInfoError =
            DomainError::database_with_cause("Failed to create user", anyhow::anyhow!("disk I/O"))
                .into();
        assert_eq!(e, UsersInfoError::Internal);
        assert_eq!(e.to_string(), "Internal error");
    }

    #[test]
    fn operational_errors_keep_their_message() {
        let e: UsersInfoError = DomainError::not_found("User", 7).into();
        assert_eq!(e, UsersInfoError::NotFound("User with id 7 not found".into()));

        let e: UsersInfoError = DomainError::conflict("User with this email already exists").into();
        assert_eq!(
            e,
            UsersInfoError::Conflict("User with this email already exists".into())
        );
    }
}
