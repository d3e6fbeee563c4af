use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// A user record as published by the external directory. Only the fields the
/// import needs are kept; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExternalUser {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub company: Option<ExternalCompany>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExternalCompany {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum SeedSourceError {
    #[error("seed source timed out")]
    Timeout,

    #[error("seed source answered with HTTP {0}")]
    Status(u16),

    #[error("seed source request failed: {0}")]
    Transport(String),

    #[error("seed source returned an unreadable body: {0}")]
    Decode(String),
}

/// Outbound port: where seed data comes from.
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn fetch_users(&self) -> Result<Vec<ExternalUser>, SeedSourceError>;
}
