use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::auth::{AuthService, RegisterOutcome};

#[derive(ToSchema, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = String, content_type = "application/json"),
        (status = 400, description = "Invalid username or weak password", body = String),
        (status = 409, description = "Username already exists", body = String),
        (status = 500, description = "Registration could not be completed", body = String),
    ),
    tag = "auth"
)]
// axum handler for registration
#[instrument(skip_all)]
pub async fn register(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return bad_request(json!({
                "body": ["Missing or malformed payload"],
            }));
        }
    };

    match auth
        .register(&request.username, request.password.expose_secret())
        .await
    {
        Ok(RegisterOutcome::Created { username }) => (
            StatusCode::CREATED,
            Json(json!({
                "ok": true,
                "username": username,
                "message": "User registered successfully",
            })),
        ),
        Ok(RegisterOutcome::InvalidUsername { details }) => bad_request(json!({
            "username": details,
        })),
        Ok(RegisterOutcome::WeakPassword(violation)) => bad_request(json!({
            "password": violation.details,
        })),
        Ok(RegisterOutcome::UsernameTaken) => (
            StatusCode::CONFLICT,
            Json(json!({
                "ok": false,
                "error": "Username already exists",
                "details": { "username": ["This username is already taken"] },
            })),
        ),
        Ok(RegisterOutcome::Failed) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "ok": false,
                "error": "Registration failed",
                "details": { "general": ["Please try again"] },
            })),
        ),
        Err(err) => {
            error!("Registration error: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": "Internal server error",
                    "details": { "general": ["Please try again later"] },
                })),
            )
        }
    }
}

fn bad_request(details: Value) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "ok": false,
            "error": "Invalid request",
            "details": details,
        })),
    )
}
