//! Miscellaneous handlers.

use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};

use crate::auth::CurrentUser;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint, unauthenticated.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Protected probe route; exercises the gate end to end.
pub async fn private_probe(CurrentUser(identity): CurrentUser) -> Json<Value> {
    Json(json!({ "message": format!("Welcome user {}", identity.id) }))
}
