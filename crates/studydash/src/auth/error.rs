//! Gate rejection taxonomy.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Credential verification failures. Every variant is terminal for the
/// current request; the gate never retries.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Authorization header absent, or not a bearer credential.
    #[error("no bearer credential presented")]
    MissingCredential,

    /// Neither verifier accepted the token.
    #[error("credential rejected by both verifiers")]
    InvalidCredential {
        /// Verifier failure detail. The gate attaches this only in
        /// non-production deployments; it is always logged server-side.
        detail: Option<String>,
    },

    /// The self-issued token is authentic but past its expiry. The holder
    /// should re-authenticate, not be told the credential is forged.
    #[error("credential expired")]
    ExpiredCredential,

    /// The signing secret is not configured. An operator-facing deployment
    /// defect, not a per-request condition.
    #[error("signing secret not configured")]
    MisconfiguredServer,
}

/// Rejection response body.
#[derive(Debug, Serialize)]
pub struct RejectionBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            AuthError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized: No token provided",
                None,
            ),
            AuthError::InvalidCredential { detail } => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized: Invalid token",
                detail,
            ),
            AuthError::ExpiredCredential => (StatusCode::UNAUTHORIZED, "Token expired", None),
            AuthError::MisconfiguredServer => {
                log::error!("signing secret absent; rejecting request with 500");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server misconfiguration",
                    None,
                )
            }
        };

        let body = Json(RejectionBody {
            message: message.to_string(),
            detail,
        });

        (status, body).into_response()
    }
}
