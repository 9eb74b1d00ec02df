//! Account and session handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::CurrentUser;
use crate::user::{ProfileUpdate, User};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountInfo {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: AccountInfo,
    pub token: String,
}

impl SessionResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            user: AccountInfo {
                id: user.id,
                username: user.username,
            },
            token,
        }
    }
}

/// Create an account and issue a first token.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.register(&request.username, &request.password).await?;
    let token = state.auth.issue_token(&user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(user, token)),
    ))
}

/// Verify credentials and issue a token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let user = state
        .users
        .verify_credentials(&request.username, &request.password)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    let token = state.auth.issue_token(&user.id)?;
    info!("user {} logged in", user.id);

    Ok(Json(SessionResponse::new(user, token)))
}

/// Echo the identity the gate attached to this request.
pub async fn me(CurrentUser(identity): CurrentUser) -> Json<Value> {
    Json(json!({ "user": identity }))
}

/// Fetch the caller's stored profile.
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .profile(&identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: User,
}

/// Update the caller's dashboard profile handles.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .users
        .update_profile(&identity.id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}
