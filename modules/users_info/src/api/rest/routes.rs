use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::rest::{dto, error, handlers};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// Per-router context handed to every handler.
#[derive(Clone)]
pub struct RestState {
    pub service: Arc<Service>,
    pub expose_internal_errors: bool,
}

impl RestState {
    pub fn new(service: Arc<Service>, expose_internal_errors: bool) -> Self {
        Self {
            service,
            expose_internal_errors,
        }
    }

    pub(crate) fn fail(&self, e: DomainError) -> error::ApiError {
        error::ApiError::new(e).expose_internal(self.expose_internal_errors)
    }
}

/// OpenAPI description of the `/users` routes.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_users,
        handlers::create_user,
        handlers::clear_users,
        handlers::search_users,
        handlers::seed_users,
        handlers::get_user,
    ),
    components(schemas(
        dto::UserDto,
        dto::CreateUserReq,
        dto::BulkResultDto,
        error::ErrorBody
    )),
    tags((name = "users", description = "User directory"))
)]
pub struct UsersApiDoc;

/// The module's routes. `/users/search` and `/users/seed` are static and
/// take precedence over `/users/{id}`.
pub fn router(state: RestState) -> Router {
    Router::new()
        .route(
            "/users",
            get(handlers::list_users)
                .post(handlers::create_user)
                .delete(handlers::clear_users),
        )
        .route("/users/search", get(handlers::search_users))
        .route("/users/seed", post(handlers::seed_users))
        .route("/users/{id}", get(handlers::get_user))
        .layer(Extension(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = UsersApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for p in ["/users", "/users/search", "/users/seed", "/users/{id}"] {
            assert!(paths.iter().any(|k| k == p), "missing {p}");
        }
        let users = &doc.paths.paths["/users"];
        assert!(users.get.is_some());
        assert!(users.post.is_some());
        assert!(users.delete.is_some());
    }
}
