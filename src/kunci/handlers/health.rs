use axum::{
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::kunci::GIT_COMMIT_HASH;

/// `name:version:commit` identifier advertised in the `X-App` header.
fn app_identifier() -> String {
    format!(
        "{}:{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(GIT_COMMIT_HASH)
    )
}

fn short_commit(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

// axum handler for health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service name, version and build", body = String, content_type = "application/json"),
    ),
    tag = "health"
)]
pub async fn health() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    if let Ok(value) = app_identifier().parse() {
        headers.insert("X-App", value);
    }

    let body = Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "build": GIT_COMMIT_HASH,
    }));

    (headers, body)
}
