//! End-to-end tests for the users_info module.
//!
//! - Each test runs on a fresh in-memory SQLite DB with migrations applied.
//! - The REST layer is exercised through the module router with `oneshot`.
//! - The local client is checked against the same service.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::*;
use users_info::config::UsersInfoConfig;
use users_info::contract::model::{CreateUserInput, NewUser};
use users_info::contract::UsersInfoError;
use users_info::domain::error::DomainError;
use users_info::domain::repo::{RepoError, UsersRepository};
use users_info::infra::storage::SeaOrmUsersRepository;
use users_info::UsersInfo;

fn jane() -> serde_json::Value {
    json!({
        "name": "  Jane Roe ",
        "email": "  Jane.Roe@Example.COM ",
        "username": "jane_roe",
        "phone": "+1 555 0100",
        "website": "https://jane.example.com",
        "company": "Acme"
    })
}

#[tokio::test]
async fn create_then_get_returns_same_normalized_record() {
    let module = module().await;
    let router = module.router();

    let (status, created) = send(&router, post_json("/users", &jane())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Jane Roe");
    assert_eq!(created["email"], "jane.roe@example.com");
    assert_eq!(created["username"], "jane_roe");
    assert_eq!(created["company"], "Acme");
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);
    assert!(created["createdAt"].is_string());

    let (status, fetched) = send(&router, get(&format!("/users/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn blank_optional_fields_are_stored_as_null() {
    let router = module().await.router();
    let (status, created) = send(
        &router,
        post_json(
            "/users",
            &json!({"name": "Jo Ann", "email": "jo@example.com", "username": "joann", "website": "  ", "phone": null}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["website"].is_null());
    assert!(created["phone"].is_null());
    assert!(created["company"].is_null());
}

#[tokio::test]
async fn duplicate_email_in_any_case_conflicts() {
    let router = module().await.router();

    let (status, first) = send(&router, post_json("/users", &jane())).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut again = jane();
    again["email"] = json!("JANE.ROE@example.com");
    again["username"] = json!("someone_else");
    let (status, body) = send(&router, post_json("/users", &again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ConflictError");
    assert_eq!(body["message"], "User with this email already exists");
    assert_eq!(body["statusCode"], 409);

    let (_, all) = send(&router, get("/users")).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], first);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let router = module().await.router();
    send(&router, post_json("/users", &jane())).await;

    let mut again = jane();
    again["email"] = json!("other@example.com");
    let (status, body) = send(&router, post_json("/users", &again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User with this username already exists");
}

#[tokio::test]
async fn invalid_usernames_are_rejected_regardless_of_length() {
    let router = module().await.router();
    let too_long = "x".repeat(51);
    for username in ["jane roe", "jane!", " jane", "ab", too_long.as_str()] {
        let mut body = jane();
        body["username"] = json!(username);
        let (status, resp) = send(&router, post_json("/users", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{username:?}");
        assert_eq!(resp["error"], "ValidationError");
        assert_eq!(resp["message"], "Data validation error");
        assert!(resp["details"]["fields"]["username"].is_array());
    }
}

#[tokio::test]
async fn missing_fields_and_bad_json_are_validation_errors() {
    let router = module().await.router();

    let (status, body) = send(&router, post_json("/users", &json!({"name": "John Doe"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["fields"]["email"][0], "Email is required");

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["message"], "Invalid JSON body");
}

#[tokio::test]
async fn get_by_id_validation_and_not_found() {
    let router = module().await.router();

    for bad in ["0", "-1", "abc", "1.5"] {
        let (status, body) = send(&router, get(&format!("/users/{bad}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert_eq!(body["message"], "Invalid ID");
    }

    let (status, body) = send(&router, get("/users/123")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFoundError");
    assert_eq!(body["message"], "User with id 123 not found");
}

#[tokio::test]
async fn search_rules() {
    let router = module().await.router();
    send(&router, post_json("/users", &jane())).await;

    let (status, body) = send(&router, get("/users/search?q=Roe")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&router, get("/users/search?q=%20%20Jane%20")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&router, get("/users/search?q=nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    for q in ["", "%20%20%20"] {
        let (status, body) = send(&router, get(&format!("/users/search?q={q}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid search query");
    }

    let (status, body) = send(&router, get("/users/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Query parameter \"q\" is required");
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let router = module().await.router();
    send(&router, post_json("/users", &jane())).await;
    let (status, _) = send(
        &router,
        post_json(
            "/users",
            &json!({"name": "Ann_Lee 100%", "email": "ann@example.com", "username": "ann_lee"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&router, get("/users/search?q=_")).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Ann_Lee 100%"]);

    let (_, body) = send(&router, get("/users/search?q=%25")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&router, get("/users/search?q=J_ne")).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn seed_twice_then_clear() {
    let router = module().await.router();

    let (status, body) = send(&router, post_empty("/users/seed")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 3);
    assert_eq!(body["message"], "Database seeded successfully with 3 users");

    let (_, users) = send(&router, get("/users")).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[0]["username"], "Bret");
    assert_eq!(users[0]["company"], "Leanne Graham Corp");
    let ids: Vec<i64> = users.iter().map(|u| u["id"].as_i64().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let (status, body) = send(&router, post_empty("/users/seed")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Database already contains users");
    assert_eq!(body["details"]["existingCount"], 3);

    let (_, users) = send(&router, get("/users")).await;
    assert_eq!(users.as_array().unwrap().len(), 3);

    let (status, body) = send(&router, delete("/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["message"], "All 3 users cleared successfully");

    let (status, body) = send(&router, delete("/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "All 0 users cleared successfully", "count": 0}));
}

#[tokio::test]
async fn seeded_emails_are_canonical_and_unique_in_the_store() {
    let db = db::DbHandle::connect("sqlite::memory:", db::ConnectOpts::default())
        .await
        .unwrap();
    let module = UsersInfo::init_with_seed_source(
        db.sea(),
        UsersInfoConfig::default(),
        StaticSeed::with(sample_directory()),
    )
    .await
    .unwrap();
    module.service().seed_from_source().await.unwrap();

    let emails: Vec<String> = module
        .service()
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.email)
        .collect();
    assert_eq!(
        emails,
        ["sincere@april.biz", "shanna@melissa.tv", "nathan@yesenia.net"]
    );

    // The UNIQUE constraint alone must reject a write that skipped the pre-checks.
    let repo = SeaOrmUsersRepository::new(db.sea());
    let err = repo
        .insert(NewUser {
            name: "Leanne Again".into(),
            email: "sincere@april.biz".into(),
            username: "bret_again".into(),
            phone: None,
            website: None,
            company: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation { .. }), "{err:?}");
    assert_eq!(module.service().count_users().await.unwrap(), 3);
}

#[tokio::test]
async fn seed_source_failure_writes_nothing() {
    let seed = StaticSeed::failing();
    let module = module_with_seed(seed.clone()).await;
    let router = module.router();

    let (status, body) = send(&router, post_empty("/users/seed")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "DatabaseError");
    assert_eq!(body["message"], "Failed to seed database");
    assert!(body.get("details").is_none());
    assert_eq!(seed.calls(), 1);

    assert_eq!(module.service().count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn seed_with_duplicate_source_rows_is_all_or_nothing() {
    let mut dir = sample_directory();
    dir.push(external(4, "Copy Cat", "Bret", "copy@cat.io"));
    let module = module_with_seed(StaticSeed::with(dir)).await;

    let err = module.service().seed_from_source().await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict { .. }));
    assert_eq!(err.message(), "User with this username already exists");
    assert_eq!(module.service().count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn seed_is_blocked_by_a_single_existing_user() {
    let seed = StaticSeed::with(sample_directory());
    let module = module_with_seed(seed.clone()).await;
    let router = module.router();
    send(&router, post_json("/users", &jane())).await;

    let (status, body) = send(&router, post_empty("/users/seed")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["existingCount"], 1);
    assert_eq!(seed.calls(), 0, "source must not be contacted");
}

#[tokio::test]
async fn ids_are_not_reused_after_clear() {
    let router = module().await.router();
    let (_, first) = send(&router, post_json("/users", &jane())).await;
    send(&router, delete("/users")).await;
    let (_, second) = send(&router, post_json("/users", &jane())).await;
    assert!(second["id"].as_i64().unwrap() > first["id"].as_i64().unwrap());
}

#[tokio::test]
async fn local_client_maps_errors_to_contract() -> Result<()> {
    let module = module().await;
    let client = module.client();

    let created = client
        .create_user(CreateUserInput {
            name: Some("Local Person".into()),
            email: Some("local@example.com".into()),
            username: Some("local".into()),
            ..Default::default()
        })
        .await?;
    assert_eq!(client.get_user(&created.id.to_string()).await?, created);
    assert_eq!(client.search_users("Local").await?.len(), 1);
    assert_eq!(client.list_users().await?.len(), 1);

    assert!(matches!(
        client.get_user("999").await,
        Err(UsersInfoError::NotFound(_))
    ));
    assert!(matches!(
        client.get_user("zero").await,
        Err(UsersInfoError::Validation(_))
    ));

    assert!(matches!(
        client.seed_users().await,
        Err(UsersInfoError::Conflict(_))
    ));
    assert_eq!(client.clear_users().await?.count, 1);
    assert_eq!(client.seed_users().await?.count, 3);
    Ok(())
}

#[tokio::test]
async fn health_pings_the_store() {
    let module = module().await;
    module.health().await.expect("healthy store");
}
