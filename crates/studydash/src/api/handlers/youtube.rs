//! YouTube Data API proxy handlers. All require an authenticated caller.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use log::debug;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::auth::CurrentUser;
use crate::youtube::{validate_channel_id, validate_query};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_results", alias = "maxResults")]
    pub max_results: u8,
}

fn default_search_results() -> u8 {
    20
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    #[serde(default = "default_trending_category")]
    pub category: String,
    #[serde(default = "default_trending_results", alias = "maxResults")]
    pub max_results: u8,
}

fn default_trending_category() -> String {
    "Education".to_string()
}

fn default_trending_results() -> u8 {
    10
}

/// Search videos.
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let query = validate_query(&params.query)?;
    debug!("user {} searched for {query:?}", identity.id);

    let data = state.youtube.search(&query, params.max_results).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// Trending videos for a category keyword.
pub async fn trending(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(params): Query<TrendingParams>,
) -> ApiResult<Json<Value>> {
    debug!(
        "user {} requested trending for {:?}",
        identity.id, params.category
    );

    let data = state
        .youtube
        .trending(&params.category, params.max_results)
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": data,
        "category": params.category,
        "timeframe": "Last 30 days",
    })))
}

/// Channel details.
pub async fn channel(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(channel_id): Path<String>,
) -> ApiResult<Json<Value>> {
    validate_channel_id(&channel_id)?;
    debug!("user {} requested channel {channel_id}", identity.id);

    let data = state.youtube.channel(&channel_id).await?;
    let found = data["items"].as_array().is_some_and(|items| !items.is_empty());
    if !found {
        return Err(crate::youtube::YouTubeError::NotFound("Channel not found".to_string()).into());
    }

    Ok(Json(json!({ "success": true, "data": data })))
}

/// Proxy health: reports whether the upstream API key is configured.
pub async fn health(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "YouTube service is running",
        "data": {
            "apiKeyConfigured": state.youtube.api_key_configured(),
            "timestamp": Utc::now().to_rfc3339(),
            "userType": identity.auth_type,
        }
    }))
}
