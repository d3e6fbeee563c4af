//! Database handle for the user directory service.
//!
//! Wraps a pooled SQLite connection (SQLx) and exposes it as a SeaORM
//! `DatabaseConnection`. Connection knobs are applied through typed
//! `SqliteConnectOptions` rather than by rewriting the DSN.
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> db::Result<()> {
//!     use db::{ConnectOpts, DbHandle};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!     db.ping().await?;
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod sqlite_path;

use std::str::FromStr;
use std::time::Duration;

use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub use errors::unique_violation;
pub use sqlite_path::{absolutize_sqlite_dsn, is_memory_dsn};

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Unsupported database engine: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Sqlite,
}

/// Connection options.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// SQLite busy timeout (ignored for in-memory databases).
    pub sqlite_busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create the database file if missing.
    pub create_if_missing: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            acquire_timeout: Some(Duration::from_secs(30)),
            sqlite_busy_timeout: Some(Duration::from_millis(DEFAULT_SQLITE_BUSY_TIMEOUT_MS)),
            create_if_missing: true,
        }
    }
}

const DEFAULT_SQLITE_BUSY_TIMEOUT_MS: u64 = 5000;

/// Main handle.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    pool: SqlitePool,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else if s.starts_with("postgres://")
            || s.starts_with("postgresql://")
            || s.starts_with("mysql://")
        {
            Err(DbError::Unsupported(dsn.to_string()))
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        let memory = is_memory_dsn(dsn);

        let mut conn_opts = SqliteConnectOptions::from_str(dsn)?
            .create_if_missing(opts.create_if_missing)
            .foreign_keys(true);
        if memory {
            conn_opts = conn_opts.journal_mode(SqliteJournalMode::Delete);
        } else {
            conn_opts = conn_opts.journal_mode(SqliteJournalMode::Wal);
            if let Some(t) = opts.sqlite_busy_timeout {
                conn_opts = conn_opts.busy_timeout(t);
            }
        }

        let mut pool_opts = SqlitePoolOptions::new();
        if memory {
            // Every connection to `:memory:` is a separate database, so the pool
            // must hold exactly one connection and never recycle it.
            pool_opts = pool_opts
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else if let Some(n) = opts.max_conns {
            pool_opts = pool_opts.max_connections(n);
        }
        if let Some(t) = opts.acquire_timeout {
            pool_opts = pool_opts.acquire_timeout(t);
        }

        let pool = pool_opts.connect_with(conn_opts).await?;
        let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());

        tracing::debug!(dsn = %dsn, memory, "sqlite pool ready");

        Ok(Self {
            engine,
            pool,
            dsn: dsn.to_string(),
            sea,
        })
    }

    /// Round-trip a trivial statement to prove the pool is usable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Graceful pool close. (Dropping the pool also closes it; this just makes it explicit.)
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the backend.
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Get the DSN used for this connection.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn sqlx_sqlite(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get SeaORM connection (clone; cheap handle).
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }
}
