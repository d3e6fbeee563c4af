use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UsersInfoApi,
    error::UsersInfoError,
    model::{ClearOutcome, CreateUserInput, SeedOutcome, User},
};
use crate::domain::service::Service;

/// Local implementation of the UsersInfoApi trait that delegates to the domain service
pub struct UsersInfoLocalClient {
    service: Arc<Service>,
}

impl UsersInfoLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UsersInfoApi for UsersInfoLocalClient {
    async fn get_user(&self, id: &str) -> Result<User, UsersInfoError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<User>, UsersInfoError> {
        self.service.list_users().await.map_err(Into::into)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>, UsersInfoError> {
        self.service
            .search_users(Some(query))
            .await
            .map_err(Into::into)
    }

    async fn create_user(&self, input: CreateUserInput) -> Result<User, UsersInfoError> {
        self.service.create_user(input).await.map_err(Into::into)
    }

    async fn seed_users(&self) -> Result<SeedOutcome, UsersInfoError> {
        self.service.seed_from_source().await.map_err(Into::into)
    }

    async fn clear_users(&self) -> Result<ClearOutcome, UsersInfoError> {
        self.service.clear_all().await.map_err(Into::into)
    }
}
