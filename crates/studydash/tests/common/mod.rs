//! Test utilities and common setup.

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use studydash::api::{AppState, create_router};
use studydash::auth::{AuthConfig, AuthGate, Environment, FederatedClaims, FederatedVerifier};
use studydash::db::Database;
use studydash::user::{UserRepository, UserService};
use studydash::youtube::YouTubeClient;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Federated token the stub verifier accepts.
pub const FEDERATED_TOKEN: &str = "federated-ok";

/// Stand-in for the real federated verifier. Accepts exactly one opaque token
/// so tests can drive the secondary path without network access.
struct StubFederated;

#[async_trait]
impl FederatedVerifier for StubFederated {
    async fn verify(&self, token: &str) -> anyhow::Result<FederatedClaims> {
        if token == FEDERATED_TOKEN {
            Ok(FederatedClaims {
                sub: "fed-user-1".to_string(),
                email: Some("fed@example.com".to_string()),
                name: Some("Fed User".to_string()),
            })
        } else {
            bail!("unknown federated token")
        }
    }
}

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        environment: Environment::Development,
        ..AuthConfig::default()
    }
}

/// Create a test application with all services on an in-memory database.
pub async fn test_app() -> Router {
    let db = Database::in_memory().await.unwrap();

    let auth = AuthGate::new(test_auth_config(), Arc::new(StubFederated));
    let users = UserService::new(UserRepository::new(db.pool().clone()));
    let youtube = YouTubeClient::new(None).unwrap();

    create_router(AppState {
        auth,
        users,
        youtube,
    })
}

/// Sign up a fresh user through the API and return (user id, token).
pub async fn signup(app: &Router, username: &str, password: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/signup")
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_string(&json!({
                        "username": username,
                        "password": password,
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["user"]["id"].as_str().unwrap().to_string(),
        json["token"].as_str().unwrap().to_string(),
    )
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Build a GET request with an Authorization header.
pub fn authed_get(uri: &str, header_value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .header(header::AUTHORIZATION, header_value)
        .body(Body::empty())
        .unwrap()
}
