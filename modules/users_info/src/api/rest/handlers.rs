use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use crate::api::rest::dto::{BulkResultDto, CreateUserReq, SearchParams, UserDto};
use crate::api::rest::error::{ApiError, ErrorBody};
use crate::api::rest::routes::RestState;

type ApiResult<T> = Result<T, ApiError>;

fn to_dtos(users: Vec<crate::contract::model::User>) -> Vec<UserDto> {
    users.into_iter().map(UserDto::from).collect()
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    operation_id = "users_info.list_users",
    responses(
        (status = 200, description = "All users ordered by id", body = [UserDto]),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn list_users(Extension(state): Extension<RestState>) -> ApiResult<Json<Vec<UserDto>>> {
    info!("Listing users");
    let users = state.service.list_users().await.map_err(|e| state.fail(e))?;
    Ok(Json(to_dtos(users)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "users_info.create_user",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created user", body = UserDto),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 409, description = "Email or username already taken", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn create_user(
    Extension(state): Extension<RestState>,
    payload: Result<Json<CreateUserReq>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let Json(req) = payload.map_err(ApiError::from_json_rejection)?;
    info!(email = ?req.email, username = ?req.username, "Creating user");

    let user = state
        .service
        .create_user(req.into())
        .await
        .map_err(|e| state.fail(e))?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// Remove every user
#[utoipa::path(
    delete,
    path = "/users",
    tag = "users",
    operation_id = "users_info.clear_users",
    responses(
        (status = 200, description = "Number of removed users", body = BulkResultDto),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn clear_users(Extension(state): Extension<RestState>) -> ApiResult<Json<BulkResultDto>> {
    info!("Clearing users");
    let outcome = state.service.clear_all().await.map_err(|e| state.fail(e))?;
    Ok(Json(outcome.into()))
}

/// Search users by name
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "users",
    operation_id = "users_info.search_users",
    params(SearchParams),
    responses(
        (status = 200, description = "Users whose name contains q", body = [UserDto]),
        (status = 400, description = "Missing or invalid q", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn search_users(
    Extension(state): Extension<RestState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<UserDto>>> {
    info!(q = ?params.q, "Searching users");
    let users = state
        .service
        .search_users(params.q.as_deref())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(to_dtos(users)))
}

/// Import users from the external directory
#[utoipa::path(
    post,
    path = "/users/seed",
    tag = "users",
    operation_id = "users_info.seed_users",
    responses(
        (status = 201, description = "Seed completed", body = BulkResultDto),
        (status = 409, description = "Store is not empty", body = ErrorBody),
        (status = 500, description = "Source unreachable or write failed", body = ErrorBody)
    )
)]
pub async fn seed_users(
    Extension(state): Extension<RestState>,
) -> ApiResult<(StatusCode, Json<BulkResultDto>)> {
    info!("Seeding users");
    let outcome = state
        .service
        .seed_from_source()
        .await
        .map_err(|e| state.fail(e))?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// Get user by id
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users_info.get_user",
    params(("id" = String, Path, description = "Positive integer user id")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 400, description = "Invalid id", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn get_user(
    Extension(state): Extension<RestState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDto>> {
    info!(%id, "Getting user");
    let user = state.service.get_user(&id).await.map_err(|e| state.fail(e))?;
    Ok(Json(UserDto::from(user)))
}
