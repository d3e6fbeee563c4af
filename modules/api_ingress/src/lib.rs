//! HTTP host for the user directory: assembles module routes with the
//! health endpoint, the UI page, the OpenAPI document and the middleware
//! stack, then serves the result until cancelled.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use runtime::Environment;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod error;
mod openapi;
pub mod rate_limit;
pub mod request_id;
pub mod security;
mod web;

pub use config::ApiIngressConfig;
pub use error::ErrorResponse;
pub use web::HealthProbe;

use rate_limit::RateLimiter;

/// Owns the ingress settings and the process start time used by `/health`.
pub struct ApiIngress {
    config: ApiIngressConfig,
    environment: Environment,
    version: String,
    started: Instant,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig, environment: Environment) -> Self {
        Self {
            config,
            environment,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started: Instant::now(),
        }
    }

    /// Version reported by `/health` and the OpenAPI document.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins: Vec<HeaderValue> = self
            .config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o.trim()) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        if origins.is_empty() {
            return None;
        }
        Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        )
    }

    /// Full application router: `api` plus host routes, wrapped in the middleware stack.
    ///
    /// Layers, outermost first: set/propagate `x-request-id`, trace span,
    /// request id into extensions, timeout, CORS, security headers, rate limit,
    /// body limit.
    pub fn build_router(
        &self,
        api: Router,
        openapi: utoipa::openapi::OpenApi,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Router> {
        tracing::debug!("Building ingress router");
        let cfg = &self.config;

        let health = Router::new()
            .route("/health", get(web::health_check))
            .with_state(web::HealthState {
                probe,
                started: self.started,
                environment: self.environment.to_string(),
                version: self.version.clone(),
            });

        let mut router = Router::new()
            .route("/", get(web::index))
            .merge(health)
            .merge(api);

        if cfg.enable_docs {
            let doc = openapi::finalize(openapi, &self.version);
            router = router.merge(openapi::routes(doc).context("OpenAPI document")?);
        }

        router = router.fallback(web::not_found);

        // Innermost first.
        router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));

        if cfg.rate_limit_max_requests > 0 {
            let limiter = Arc::new(RateLimiter::new(
                cfg.rate_limit_max_requests,
                Duration::from_secs(cfg.rate_limit_window_secs),
            ));
            router = router.layer(from_fn_with_state(limiter, rate_limit::enforce));
        }

        router = security::apply(router, self.environment.is_production());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }

        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            cfg.request_timeout_secs,
        )));
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    /// Bind `addr` and serve `router` until `cancel` fires.
    pub async fn serve(router: Router, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
    }
}
