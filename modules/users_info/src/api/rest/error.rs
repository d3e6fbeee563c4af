use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::domain::error::DomainError;

/// Wire shape shared by every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Error kind, e.g. `ValidationError`.
    pub error: String,
    pub message: String,
    pub status_code: u16,
    /// RFC 3339, UTC.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code: status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

/// `DomainError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError {
    inner: DomainError,
    expose_internal: bool,
}

impl ApiError {
    pub fn new(inner: DomainError) -> Self {
        Self {
            inner,
            expose_internal: false,
        }
    }

    /// Add the internal cause chain to 5xx bodies (development only).
    pub fn expose_internal(mut self, yes: bool) -> Self {
        self.expose_internal = yes;
        self
    }

    pub fn domain(&self) -> &DomainError {
        &self.inner
    }

    /// A body axum could not parse as JSON.
    pub fn from_json_rejection(rejection: JsonRejection) -> Self {
        Self::new(DomainError::validation_with_details(
            "Invalid JSON body",
            json!({ "reason": rejection.body_text() }),
        ))
    }

    fn body(&self) -> ErrorBody {
        let e = &self.inner;
        let status = e.status();
        let body = ErrorBody::new(status, e.kind(), e.message());

        if status.is_server_error() {
            let chain = e.cause().map(|c| format!("{c:#}"));
            tracing::error!(
                kind = e.kind(),
                message = %e.message(),
                cause = chain.as_deref().unwrap_or("none"),
                "request failed with an internal error"
            );
            let details = match chain {
                Some(cause) if self.expose_internal => Some(json!({ "cause": cause })),
                _ => None,
            };
            body.with_details(details)
        } else {
            tracing::warn!(kind = e.kind(), message = %e.message(), status = status.as_u16(), "request rejected");
            body.with_details(e.details().cloned())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.inner.status();
        let mut resp = (status, Json(self.body())).into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn json_of(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_details() {
        let err = DomainError::validation_with_details(
            "Data validation error",
            json!({"fields": {"name": ["too short"]}}),
        );
        let resp = ApiError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = json_of(resp).await;
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["message"], "Data validation error");
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["details"]["fields"]["name"][0], "too short");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn not_found_and_conflict_bodies() {
        let body = json_of(ApiError::from(DomainError::not_found("User", 9)).into_response()).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "User with id 9 not found");
        assert!(body.get("details").is_none());

        let body = json_of(
            ApiError::from(DomainError::conflict_with_details(
                "Database already contains users",
                json!({"existingCount": 10}),
            ))
            .into_response(),
        )
        .await;
        assert_eq!(body["error"], "ConflictError");
        assert_eq!(body["details"]["existingCount"], 10);
    }

    #[tokio::test]
    async fn database_cause_is_hidden_by_default() {
        let err = DomainError::database_with_cause(
            "Failed to create user",
            anyhow::anyhow!("SQLITE_BUSY: database is locked"),
        );
        let resp = ApiError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_of(resp).await;
        assert_eq!(body["error"], "DatabaseError");
        assert_eq!(body["message"], "Failed to create user");
        assert!(body.get("details").is_none());
        assert!(!body.to_string().contains("SQLITE_BUSY"));
    }

    #[tokio::test]
    async fn database_cause_exposed_in_development() {
        let err = DomainError::database_with_cause(
            "Failed to create user",
            anyhow::anyhow!("SQLITE_BUSY: database is locked"),
        );
        let body = json_of(ApiError::new(err).expose_internal(true).into_response()).await;
        assert_eq!(body["message"], "Failed to create user");
        assert!(body["details"]["cause"]
            .as_str()
            .unwrap()
            .contains("SQLITE_BUSY"));
    }

    #[tokio::test]
    async fn auth_errors() {
        let resp = ApiError::from(DomainError::unauthorized()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp = ApiError::from(DomainError::forbidden()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
