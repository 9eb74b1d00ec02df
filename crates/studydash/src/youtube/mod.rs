//! Thin proxy client for the YouTube Data API v3.
//!
//! Items come back as the upstream JSON; this layer only authenticates the
//! caller, validates inputs and translates upstream failures.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use log::debug;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

fn channel_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^UC[A-Za-z0-9_-]{22}$").expect("static pattern"))
}

/// Upstream failures that deserve distinct status codes.
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("YouTube API key not configured")]
    MissingApiKey,

    #[error("YouTube API quota exceeded or invalid API key")]
    QuotaExceeded,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("YouTube service error: {0}")]
    Upstream(String),
}

/// Validate and normalize a search query.
pub fn validate_query(query: &str) -> Result<String, YouTubeError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(YouTubeError::BadRequest(
            "Search query is required and must be a non-empty string".to_string(),
        ));
    }
    if query.len() > 100 {
        return Err(YouTubeError::BadRequest(
            "Search query must be less than 100 characters".to_string(),
        ));
    }
    Ok(query.to_string())
}

/// Validate a channel ID ("UC" prefix, 24 characters total).
pub fn validate_channel_id(channel_id: &str) -> Result<(), YouTubeError> {
    if channel_id_pattern().is_match(channel_id) {
        Ok(())
    } else {
        Err(YouTubeError::BadRequest(
            "Invalid YouTube channel ID format".to_string(),
        ))
    }
}

fn clamp_results(requested: u8, cap: u8) -> u8 {
    requested.clamp(1, cap)
}

/// YouTube Data API client.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    api_key: Option<String>,
    http: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            api_key,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()?,
            base_url: API_BASE.to_string(),
        })
    }

    /// Whether an API key is configured (surfaced by the health endpoint).
    pub fn api_key_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn key(&self) -> Result<&str, YouTubeError> {
        self.api_key.as_deref().ok_or(YouTubeError::MissingApiKey)
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, YouTubeError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|err| YouTubeError::Upstream(err.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|err| YouTubeError::Upstream(err.to_string())),
            reqwest::StatusCode::FORBIDDEN => Err(YouTubeError::QuotaExceeded),
            reqwest::StatusCode::BAD_REQUEST => Err(YouTubeError::BadRequest(
                "Invalid search parameters".to_string(),
            )),
            status => Err(YouTubeError::Upstream(format!(
                "unexpected upstream status {status}"
            ))),
        }
    }

    /// Search videos by relevance.
    pub async fn search(&self, query: &str, max_results: u8) -> Result<Value, YouTubeError> {
        let key = self.key()?;
        let max = clamp_results(max_results, 50).to_string();
        debug!("youtube search: {query:?} (max {max})");

        self.get(
            "search",
            &[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", &max),
                ("order", "relevance"),
                ("key", key),
            ],
        )
        .await
    }

    /// Most-viewed videos for a category keyword over the last 30 days.
    pub async fn trending(&self, category: &str, max_results: u8) -> Result<Value, YouTubeError> {
        let key = self.key()?;
        let max = clamp_results(max_results, 25).to_string();
        let published_after = (Utc::now() - chrono::Duration::days(30))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        self.get(
            "search",
            &[
                ("part", "snippet"),
                ("q", category),
                ("type", "video"),
                ("maxResults", &max),
                ("order", "viewCount"),
                ("publishedAfter", &published_after),
                ("key", key),
            ],
        )
        .await
    }

    /// Channel details by ID. Returns the upstream response; the caller
    /// decides whether an empty item list is a 404.
    pub async fn channel(&self, channel_id: &str) -> Result<Value, YouTubeError> {
        let key = self.key()?;

        self.get(
            "channels",
            &[
                ("part", "snippet,statistics,contentDetails"),
                ("id", channel_id),
                ("key", key),
            ],
        )
        .await
    }
}
