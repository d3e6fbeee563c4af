use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig, HealthProbe};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbHandle};
use runtime::{AppConfig, CliArgs};
use tokio_util::sync::CancellationToken;
use users_info::{config::UsersInfoConfig, UsersInfo};

/// User directory server: REST API, UI and health endpoint over SQLite
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "User directory server: REST API, UI and health endpoint over SQLite")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Console log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

/// `/health` probe backed by the users store.
struct StoreProbe(UsersInfo);

#[async_trait::async_trait]
impl HealthProbe for StoreProbe {
    async fn check(&self) -> Result<()> {
        self.0.health().await.map_err(anyhow::Error::new)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    if let Some(path) = cli.config.as_deref() {
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }
    }

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("users-server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn connect_opts(config: &AppConfig) -> ConnectOpts {
    ConnectOpts {
        max_conns: config.database.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: config
            .database
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms))),
        create_if_missing: true,
    }
}

/// Configured DSN with relative SQLite paths resolved against `home_dir`.
fn resolve_dsn(config: &AppConfig, base_dir: &Path, create_dirs: bool) -> Result<String> {
    let raw = config.database.url.trim();
    if raw.is_empty() {
        bail!("Database URL not configured");
    }
    DbHandle::detect(raw)?;
    Ok(db::absolutize_sqlite_dsn(raw, base_dir, create_dirs)?)
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let host = match config.server.host.as_str() {
        "localhost" => "127.0.0.1",
        other => other,
    };
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid server.host '{}'", config.server.host))?;
    Ok(SocketAddr::new(ip, config.server.port))
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let addr = bind_addr(&config)?;
    let dsn = resolve_dsn(&config, &config.home_dir(), true)?;
    tracing::info!("Connecting to database: {}", dsn);
    let db = DbHandle::connect(&dsn, connect_opts(&config))
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected DB backend: {:?}", db.engine());

    let users_cfg: UsersInfoConfig = config.module_config("users_info")?;
    let ingress_cfg: ApiIngressConfig = config.module_config("api_ingress")?;

    let users = UsersInfo::init(&db, users_cfg).await?;
    let ingress = ApiIngress::new(ingress_cfg, config.server.environment)
        .with_version(env!("CARGO_PKG_VERSION"));
    let router = ingress.build_router(
        users.router(),
        UsersInfo::openapi(),
        Arc::new(StoreProbe(users.clone())),
    )?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = wait_for_shutdown().await {
                tracing::warn!(error = %e, "shutdown: signal listener failed; falling back to ctrl_c()");
                let _ = tokio::signal::ctrl_c().await;
            }
            tracing::info!("shutdown: signal received");
            cancel.cancel();
        }
    });

    tracing::info!(environment = %config.server.environment, "Serving on http://{}", addr);
    ApiIngress::serve(router, addr, cancel).await?;

    db.close().await;
    tracing::info!("users-server stopped");
    Ok(())
}

async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    bind_addr(config)?;
    resolve_dsn(config, &config.home_dir(), false)?;
    config
        .module_config::<UsersInfoConfig>("users_info")
        .context("modules.users_info")?;
    config
        .module_config::<ApiIngressConfig>("api_ingress")
        .context("modules.api_ingress")?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
