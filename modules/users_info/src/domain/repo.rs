use async_trait::async_trait;
use thiserror::Error;

use crate::contract::model::{NewUser, User};

/// Store-level failure as seen by the domain.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A UNIQUE constraint rejected the write. `constraint` names the
    /// violated column(s), e.g. `users.email`.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepoError {
    pub fn unique(constraint: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint: constraint.into(),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// All users ordered by id.
    async fn find_all(&self) -> RepoResult<Vec<User>>;
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Users whose name contains `fragment`, ordered by id.
    async fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<User>>;
    /// Insert one user; the store assigns `id` and `created_at`.
    async fn insert(&self, user: NewUser) -> RepoResult<User>;
    /// Insert all users or none.
    async fn insert_many(&self, users: Vec<NewUser>) -> RepoResult<Vec<User>>;
    /// Remove every user; returns how many were removed.
    async fn delete_all(&self) -> RepoResult<u64>;
    async fn count(&self) -> RepoResult<u64>;
    /// Cheap liveness round-trip to the store.
    async fn ping(&self) -> RepoResult<()>;
}
