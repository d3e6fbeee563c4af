//! Shared fixtures for the users_info integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use users_info::config::UsersInfoConfig;
use users_info::domain::ports::{ExternalCompany, ExternalUser, SeedSource, SeedSourceError};
use users_info::UsersInfo;

/// Seed source serving a fixed list, or failing when `fail` is set.
pub struct StaticSeed {
    users: Vec<ExternalUser>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticSeed {
    pub fn with(users: Vec<ExternalUser>) -> Arc<Self> {
        Arc::new(Self {
            users,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            users: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeedSource for StaticSeed {
    async fn fetch_users(&self) -> Result<Vec<ExternalUser>, SeedSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(SeedSourceError::Timeout)
        } else {
            Ok(self.users.clone())
        }
    }
}

pub fn external(id: i64, name: &str, username: &str, email: &str) -> ExternalUser {
    ExternalUser {
        id,
        name: name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        phone: Some("1-770-736-8031 x56442".to_string()),
        website: Some("hildegard.org".to_string()),
        company: Some(ExternalCompany {
            name: format!("{name} Corp"),
        }),
    }
}

/// Three records shaped like the public JSONPlaceholder directory.
pub fn sample_directory() -> Vec<ExternalUser> {
    vec![
        external(1, "Leanne Graham", "Bret", "Sincere@april.biz"),
        external(2, "Ervin Howell", "Antonette", "Shanna@melissa.tv"),
        external(3, "Clementine Bauch", "Samantha", "Nathan@yesenia.net"),
    ]
}

/// A migrated module on a private in-memory database.
pub async fn module_with_seed(seed: Arc<dyn SeedSource>) -> UsersInfo {
    let db = db::DbHandle::connect("sqlite::memory:", db::ConnectOpts::default())
        .await
        .expect("in-memory sqlite");
    UsersInfo::init_with_seed_source(db.sea(), UsersInfoConfig::default(), seed)
        .await
        .expect("module init")
}

pub async fn module() -> UsersInfo {
    module_with_seed(StaticSeed::with(sample_directory())).await
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.expect("router call");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
