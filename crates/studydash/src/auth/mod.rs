//! Unified credential verification gate.
//!
//! Two independent verifiers sit behind one coordinator: self-issued HS256
//! tokens minted by our own login endpoint, and federated ID tokens checked
//! against the external provider's published signing keys.

mod claims;
mod config;
mod error;
mod federated;
mod gate;

pub use claims::{AuthType, AuthenticatedIdentity, FederatedClaims, SelfIssuedClaims};
pub use config::{AuthConfig, ConfigValidationError, Environment};
pub use error::AuthError;
pub use federated::{FederatedDisabled, FederatedVerifier, FirebaseVerifier};
pub use gate::{AuthGate, CurrentUser, gate_middleware};
