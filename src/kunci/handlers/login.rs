use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::auth::username::{normalize_username, validate_username};
use crate::auth::{AuthOutcome, AuthService};

#[derive(ToSchema, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authentication successful", body = String, content_type = "application/json"),
        (status = 401, description = "Invalid credentials or account temporarily locked", body = String),
        (status = 500, description = "Internal error", body = String),
    ),
    tag = "auth"
)]
// axum handler for login
#[instrument(skip_all)]
pub async fn login(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    // Any shape problem on the login path collapses into the generic
    // credentials error; the login endpoint leaks no validation detail.
    let Some(Json(request)) = payload else {
        return invalid_credentials();
    };

    if validate_username(&normalize_username(&request.username)).is_err() {
        return invalid_credentials();
    }

    match auth
        .authenticate(&request.username, request.password.expose_secret())
        .await
    {
        Ok(AuthOutcome::Authenticated { username }) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "authenticated": true,
                "username": username,
            })),
        ),
        Ok(AuthOutcome::InvalidCredentials) => invalid_credentials(),
        Ok(AuthOutcome::Locked) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "ok": false,
                "error": "Account temporarily locked",
            })),
        ),
        Err(err) => {
            error!("Authentication error: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": "Internal server error",
                })),
            )
        }
    }
}

fn invalid_credentials() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "ok": false,
            "error": "Invalid username or password",
        })),
    )
}
