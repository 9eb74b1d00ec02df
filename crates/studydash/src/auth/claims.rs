//! Identity claims produced by the credential verifiers.

use serde::{Deserialize, Serialize};

/// Claims embedded in a self-issued token, minted at login and checked by the
/// primary verifier. Never persisted server-side.
///
/// The wire payload is `{ id, exp }` plus an `iat` the issuer stamps; tokens
/// minted by earlier backend versions carry only `{ id, exp }`, so `iat`
/// stays optional on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfIssuedClaims {
    /// User ID.
    pub id: String,

    /// Issued at (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Claims extracted from a verified federated ID token. Issued and revoked by
/// the external identity provider; this system only verifies them.
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedClaims {
    /// Subject (provider-assigned user ID).
    pub sub: String,

    /// User's email, if the provider supplies one.
    #[serde(default)]
    pub email: Option<String>,

    /// User's display name, if the provider supplies one.
    #[serde(default)]
    pub name: Option<String>,
}

/// Which verifier produced an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Self-issued token verified against the process secret.
    Primary,
    /// Federated token verified against the provider's published keys.
    Secondary,
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthType::Primary => write!(f, "primary"),
            AuthType::Secondary => write!(f, "secondary"),
        }
    }
}

/// Normalized identity attached to the request after the gate accepts.
///
/// Lives in the request extensions for the remainder of request handling and
/// is dropped when the request completes.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedIdentity {
    /// Subject identifier.
    pub id: String,

    /// Email, present only for federated identities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name, present only for federated identities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Which verifier accepted the credential.
    #[serde(rename = "authType")]
    pub auth_type: AuthType,
}

impl AuthenticatedIdentity {
    pub fn from_self_issued(claims: SelfIssuedClaims) -> Self {
        Self {
            id: claims.id,
            email: None,
            name: None,
            auth_type: AuthType::Primary,
        }
    }

    pub fn from_federated(claims: FederatedClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            auth_type: AuthType::Secondary,
        }
    }
}
