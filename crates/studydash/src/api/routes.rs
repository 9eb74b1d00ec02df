//! API route definitions.

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use log::warn;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::gate_middleware;

use super::handlers;
use super::handlers::youtube as youtube_handlers;
use super::state::AppState;

/// Create the application router.
///
/// The gate applies uniformly to every protected route; public routes sit on
/// a sibling router without the layer.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let gate = state.auth.clone();

    let protected = Router::new()
        .route("/auth/me", get(handlers::me))
        .route(
            "/auth/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/private", get(handlers::private_probe))
        .route("/youtube/search", get(youtube_handlers::search))
        .route("/youtube/trending", get(youtube_handlers::trending))
        .route(
            "/youtube/channel/{channel_id}",
            get(youtube_handlers::channel),
        )
        .route("/youtube/health", get(youtube_handlers::health))
        .route_layer(middleware::from_fn_with_state(gate, gate_middleware));

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .auth
        .allowed_origins()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
