use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::contract::model::{ClearOutcome, CreateUserInput, SeedOutcome, User};

/// REST DTO for user representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// REST DTO for creating a new user. Presence and format are checked by the
/// domain, so every field is optional at this layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    #[schema(example = "Jane Roe", min_length = 2, max_length = 100)]
    pub name: Option<String>,
    #[schema(example = "jane@example.com", max_length = 255)]
    pub email: Option<String>,
    #[schema(example = "jane_roe", min_length = 3, max_length = 50, pattern = "^[A-Za-z0-9_-]+$")]
    pub username: Option<String>,
    #[schema(max_length = 20)]
    pub phone: Option<String>,
    #[schema(example = "https://example.com", max_length = 255)]
    pub website: Option<String>,
    #[schema(max_length = 100)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Substring of the user name, 1-100 characters after trimming.
    pub q: Option<String>,
}

/// `{message, count}` returned by seed and clear.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkResultDto {
    pub message: String,
    pub count: u64,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            phone: user.phone,
            website: user.website,
            company: user.company,
            created_at: user.created_at,
        }
    }
}

impl From<CreateUserReq> for CreateUserInput {
    fn from(req: CreateUserReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            username: req.username,
            phone: req.phone,
            website: req.website,
            company: req.company,
        }
    }
}

impl From<SeedOutcome> for BulkResultDto {
    fn from(o: SeedOutcome) -> Self {
        Self {
            message: o.message,
            count: o.count,
        }
    }
}

impl From<ClearOutcome> for BulkResultDto {
    fn from(o: ClearOutcome) -> Self {
        Self {
            message: o.message,
            count: o.count,
        }
    }
}
