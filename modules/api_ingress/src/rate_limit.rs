//! Fixed-window request limiter keyed by client address.
//!
//! Each client gets `max_requests` per window; the window starts with the
//! client's first request and is reset lazily once it has expired.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::error::ErrorResponse;

/// Expired entries are swept once the map grows past this size.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: DashMap::new(),
        }
    }

    /// Count one request from `client` at `now`.
    pub fn check(&self, client: &str, now: Instant) -> Decision {
        if self.clients.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut entry = self.clients.entry(client.to_owned()).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });
        let w = entry.value_mut();
        if now >= w.reset_at {
            *w = Window {
                count: 0,
                reset_at: now + self.window,
            };
        }

        if w.count >= self.max_requests {
            Decision::Limited {
                retry_after: w.reset_at.saturating_duration_since(now),
            }
        } else {
            w.count += 1;
            Decision::Allowed {
                remaining: self.max_requests - w.count,
            }
        }
    }

    /// Drop windows that have already expired.
    pub fn sweep(&self, now: Instant) {
        self.clients.retain(|_, w| now < w.reset_at);
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// First `x-forwarded-for` hop, then the peer address, then `"unknown"`.
fn client_key(req: &Request<Body>) -> String {
    if let Some(fwd) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return fwd.to_owned();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&req);
    match limiter.check(&client, Instant::now()) {
        Decision::Allowed { .. } => next.run(req).await,
        Decision::Limited { retry_after } => {
            tracing::warn!(%client, path = %req.uri().path(), "rate limit exceeded");
            let mut resp = ErrorResponse::too_many_requests().into_response();
            let secs = retry_after.as_secs().max(1);
            if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                resp.headers_mut().insert(header::RETRY_AFTER, v);
            }
            resp
        }
    }
}
