use async_trait::async_trait;

use crate::contract::{
    error::UsersInfoError,
    model::{ClearOutcome, CreateUserInput, SeedOutcome, User},
};

/// Public API trait for the users_info module that other modules can use
#[async_trait]
pub trait UsersInfoApi: Send + Sync {
    /// Get a user by its id as received from the caller (validated here).
    async fn get_user(&self, id: &str) -> Result<User, UsersInfoError>;

    /// All users ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, UsersInfoError>;

    /// Users whose name contains `query`.
    async fn search_users(&self, query: &str) -> Result<Vec<User>, UsersInfoError>;

    async fn create_user(&self, input: CreateUserInput) -> Result<User, UsersInfoError>;

    /// Import the external directory into an empty store.
    async fn seed_users(&self) -> Result<SeedOutcome, UsersInfoError>;

    async fn clear_users(&self) -> Result<ClearOutcome, UsersInfoError>;
}
