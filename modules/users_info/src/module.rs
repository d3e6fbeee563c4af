use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes::{self, RestState};
use crate::config::UsersInfoConfig;
use crate::contract::client::UsersInfoApi;
use crate::domain::error::DomainError;
use crate::domain::ports::SeedSource;
use crate::domain::service::Service;
use crate::gateways::local::UsersInfoLocalClient;
use crate::infra::seed::HttpSeedSource;
use crate::infra::storage::{migrations::Migrator, SeaOrmUsersRepository};

/// The users_info module, ready to serve.
///
/// Only obtainable through [`UsersInfo::init`] (or its variants), which run
/// the schema migrations first, so a router built from it never talks to an
/// unmigrated store.
#[derive(Clone)]
pub struct UsersInfo {
    service: Arc<Service>,
    config: UsersInfoConfig,
}

impl UsersInfo {
    /// Migrate the store behind `db` and wire the service with the HTTP seed source.
    pub async fn init(db: &db::DbHandle, cfg: UsersInfoConfig) -> anyhow::Result<Self> {
        let seed = HttpSeedSource::from_str_url(
            &cfg.seed_source_url,
            Duration::from_secs(cfg.seed_timeout_secs),
        )
        .context("Failed to build seed source client")?;
        Self::init_with_seed_source(db.sea(), cfg, Arc::new(seed)).await
    }

    /// Same as [`UsersInfo::init`] with a caller-supplied seed source.
    pub async fn init_with_seed_source(
        conn: DatabaseConnection,
        cfg: UsersInfoConfig,
        seed: Arc<dyn SeedSource>,
    ) -> anyhow::Result<Self> {
        info!("Initializing users_info module");
        debug!(
            "Loaded users_info config: seed_source_url={}, seed_timeout_secs={}",
            cfg.seed_source_url, cfg.seed_timeout_secs
        );

        info!("Running users_info database migrations");
        Migrator::up(&conn, None)
            .await
            .context("users_info migrations failed")?;
        info!("Users database migrations completed successfully");

        let repo = SeaOrmUsersRepository::new(conn);
        let service = Service::new(Arc::new(repo), seed);

        Ok(Self {
            service: Arc::new(service),
            config: cfg,
        })
    }

    /// REST routes of the module.
    pub fn router(&self) -> axum::Router {
        info!("Registering users_info REST routes");
        routes::router(RestState::new(
            self.service.clone(),
            self.config.expose_internal_errors,
        ))
    }

    pub fn openapi() -> utoipa::openapi::OpenApi {
        use utoipa::OpenApi;
        routes::UsersApiDoc::openapi()
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn UsersInfoApi> {
        Arc::new(UsersInfoLocalClient::new(self.service.clone()))
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn config(&self) -> &UsersInfoConfig {
        &self.config
    }

    /// Store round-trip for the health endpoint.
    pub async fn health(&self) -> Result<(), DomainError> {
        self.service.health().await
    }
}
