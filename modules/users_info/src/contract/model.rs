use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted user record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Untrusted create request as received from a caller. Every field may be
/// missing; validation decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub company: Option<String>,
}

/// Validated and normalized user data ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub company: Option<String>,
}

/// Result of a successful bulk seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    pub message: String,
    pub count: u64,
}

/// Result of clearing the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOutcome {
    pub message: String,
    pub count: u64,
}
