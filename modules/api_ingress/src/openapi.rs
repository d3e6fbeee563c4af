use std::sync::Arc;

use axum::{http::header, response::IntoResponse, routing::get, Json, Router};
use utoipa::openapi::{InfoBuilder, OpenApi};

pub const API_TITLE: &str = "User Directory API";

/// Stamp the service title and version onto the merged module document.
pub fn finalize(mut doc: OpenApi, version: &str) -> OpenApi {
    doc.info = InfoBuilder::new()
        .title(API_TITLE)
        .version(version)
        .description(Some("REST API of the user directory service"))
        .build();
    doc
}

/// `GET /openapi.json`, serialized once and served as static JSON.
pub fn routes(doc: OpenApi) -> anyhow::Result<Router> {
    let value = Arc::new(serde_json::to_value(&doc)?);
    tracing::info!(
        paths = doc.paths.paths.len(),
        "Serving OpenAPI document at /openapi.json"
    );
    Ok(Router::new().route(
        "/openapi.json",
        get(move || {
            let v = value.clone();
            async move { ([(header::CACHE_CONTROL, "no-store")], Json((*v).clone())).into_response() }
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::OpenApiBuilder;

    #[test]
    fn finalize_sets_title_and_version() {
        let doc = finalize(OpenApiBuilder::new().build(), "1.2.3");
        assert_eq!(doc.info.title, API_TITLE);
        assert_eq!(doc.info.version, "1.2.3");
    }
}
