//! The credential verification gate.
//!
//! Every protected request makes exactly one pass through the gate: extract
//! the bearer token, try the primary (self-issued) verifier, and only if that
//! fails for a reason other than expiry, try the secondary (federated)
//! verifier. The request proceeds with exactly one identity or not at all.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use log::warn;

use super::claims::{AuthenticatedIdentity, SelfIssuedClaims};
use super::config::AuthConfig;
use super::error::AuthError;
use super::federated::FederatedVerifier;

/// Extract the bearer token from an Authorization header value.
///
/// The scheme check is case-insensitive. A non-bearer scheme is treated the
/// same as an absent header: the caller has not presented a credential this
/// gate understands.
fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::MissingCredential)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredential);
    }

    let token = parts.next().ok_or(AuthError::MissingCredential)?;
    if token.is_empty() || parts.next().is_some() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Gate state shared across handlers. Holds only read-only configuration and
/// the injected federated verifier; no per-request state survives a request.
#[derive(Clone)]
pub struct AuthGate {
    config: Arc<AuthConfig>,
    decoding_key: Option<DecodingKey>,
    encoding_key: Option<EncodingKey>,
    federated: Arc<dyn FederatedVerifier>,
}

impl AuthGate {
    /// Build the gate from config. `env:VAR` secrets are resolved here so a
    /// test secret can be injected without touching the process environment.
    pub fn new(mut config: AuthConfig, federated: Arc<dyn FederatedVerifier>) -> Self {
        // A failed env: resolution means there is no usable secret; the
        // literal "env:VAR" string must never become the HMAC key.
        match config.resolve_jwt_secret() {
            Ok(resolved) => config.jwt_secret = resolved,
            Err(err) => {
                warn!("signing secret resolution failed: {err}");
                config.jwt_secret = None;
            }
        }

        let (decoding_key, encoding_key) = match config.jwt_secret.as_deref() {
            Some(secret) => (
                Some(DecodingKey::from_secret(secret.as_bytes())),
                Some(EncodingKey::from_secret(secret.as_bytes())),
            ),
            None => (None, None),
        };

        Self {
            config: Arc::new(config),
            decoding_key,
            encoding_key,
            federated,
        }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    /// Mint a self-issued token for a subject. Collaborator contract with the
    /// login endpoint: same secret and algorithm the primary verifier checks,
    /// subject and expiry embedded.
    pub fn issue_token(&self, subject: &str) -> Result<String, AuthError> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or(AuthError::MisconfiguredServer)?;

        let now = Utc::now();
        let claims = SelfIssuedClaims {
            id: subject.to_string(),
            iat: Some(now.timestamp()),
            exp: (now + Duration::hours(self.config.token_ttl_hours)).timestamp(),
        };

        encode(&Header::default(), &claims, key).map_err(|err| {
            warn!("token issuance failed: {err}");
            AuthError::MisconfiguredServer
        })
    }

    /// Primary verifier: HS256 signature and expiry against the process
    /// secret. Expiry is reported distinctly from every other invalidity.
    fn verify_primary(&self, token: &str) -> Result<SelfIssuedClaims, AuthError> {
        let key = self
            .decoding_key
            .as_ref()
            .ok_or(AuthError::MisconfiguredServer)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();

        match decode::<SelfIssuedClaims>(token, key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::ExpiredCredential),
                _ => Err(AuthError::InvalidCredential {
                    detail: Some(err.to_string()),
                }),
            },
        }
    }

    /// Run the full verification sequence for one request.
    ///
    /// Expiry of a self-issued token is terminal and never falls through to
    /// the secondary verifier: the holder should re-authenticate with this
    /// system, not be handed to the federated provider.
    pub async fn verify(
        &self,
        header_value: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let token = bearer_token(header_value.ok_or(AuthError::MissingCredential)?)?;

        let primary_failure = match self.verify_primary(token) {
            Ok(claims) => return Ok(AuthenticatedIdentity::from_self_issued(claims)),
            Err(AuthError::InvalidCredential { detail }) => {
                detail.unwrap_or_else(|| "invalid token".to_string())
            }
            Err(terminal) => return Err(terminal),
        };

        match self.federated.verify(token).await {
            Ok(claims) => Ok(AuthenticatedIdentity::from_federated(claims)),
            Err(secondary_failure) => {
                warn!(
                    "credential rejected by both verifiers: primary: {primary_failure}; secondary: {secondary_failure:#}"
                );
                let detail = self.config.is_development().then(|| {
                    format!("primary: {primary_failure}; secondary: {secondary_failure:#}")
                });
                Err(AuthError::InvalidCredential { detail })
            }
        }
    }
}

/// Identity attached by the gate, extracted in handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}

/// Gate middleware. On acceptance the identity rides in the request
/// extensions; on rejection the inner handler never runs.
pub async fn gate_middleware(
    State(gate): State<AuthGate>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let identity = gate.verify(header).await?;
    req.extensions_mut().insert(CurrentUser(identity));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{AuthType, FederatedClaims};
    use crate::auth::config::Environment;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TEST_SECRET: &str = "unit-test-secret-that-is-at-least-32-chars";

    /// Mock secondary verifier that records how often it is consulted.
    struct MockFederated {
        calls: AtomicUsize,
        accept: Option<FederatedClaims>,
    }

    impl MockFederated {
        fn accepting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                accept: Some(FederatedClaims {
                    sub: "fed-1".to_string(),
                    email: Some("fed@example.com".to_string()),
                    name: Some("Fed User".to_string()),
                }),
            }
        }

        fn rejecting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                accept: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FederatedVerifier for MockFederated {
        async fn verify(&self, _token: &str) -> anyhow::Result<FederatedClaims> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.accept {
                Some(claims) => Ok(claims.clone()),
                None => anyhow::bail!("provider says no"),
            }
        }
    }

    fn gate_with(federated: Arc<MockFederated>, environment: Environment) -> AuthGate {
        let config = AuthConfig {
            jwt_secret: Some(TEST_SECRET.to_string()),
            environment,
            ..AuthConfig::default()
        };
        AuthGate::new(config, federated)
    }

    fn token_with_exp(exp: i64) -> String {
        let claims = SelfIssuedClaims {
            id: "u1".to_string(),
            iat: Some(Utc::now().timestamp()),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token_valid() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token("bearer token123").unwrap(), "token123");
        assert_eq!(bearer_token("  BEARER\tt0k3n ").unwrap(), "t0k3n");
    }

    #[test]
    fn test_bearer_token_invalid() {
        let cases = ["", "Bearer", "Bearer ", "Basic xyz", "Bearer a b", "bear t"];
        for case in cases {
            assert!(
                matches!(bearer_token(case), Err(AuthError::MissingCredential)),
                "{case:?} should be rejected as missing"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_header_never_reaches_verifiers() {
        let federated = Arc::new(MockFederated::accepting());
        let gate = gate_with(federated.clone(), Environment::Production);

        let err = gate.verify(None).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
        assert_eq!(federated.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrong_scheme_rejected_as_missing() {
        let federated = Arc::new(MockFederated::accepting());
        let gate = gate_with(federated.clone(), Environment::Production);

        let err = gate.verify(Some("Basic xyz")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
        assert_eq!(federated.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_accepts_and_subject_round_trips() {
        let federated = Arc::new(MockFederated::accepting());
        let gate = gate_with(federated.clone(), Environment::Production);

        let token = gate.issue_token("u1").unwrap();
        let header = format!("Bearer {token}");

        let identity = gate.verify(Some(&header)).await.unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.auth_type, AuthType::Primary);
        assert_eq!(federated.calls(), 0);
    }

    #[tokio::test]
    async fn test_minimal_id_exp_payload_accepted() {
        // Tokens minted by earlier backend versions carry only { id, exp }.
        let federated = Arc::new(MockFederated::rejecting());
        let gate = gate_with(federated.clone(), Environment::Production);

        let token = encode(
            &Header::default(),
            &serde_json::json!({ "id": "u1", "exp": Utc::now().timestamp() + 3600 }),
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();
        let header = format!("Bearer {token}");

        let identity = gate.verify(Some(&header)).await.unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.auth_type, AuthType::Primary);
        assert_eq!(federated.calls(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_env_secret_is_misconfiguration() {
        // env: pointing at an unset variable must leave the gate keyless, not
        // signing with the literal "env:VAR" string.
        let config = AuthConfig {
            jwt_secret: Some("env:STUDYDASH_UNSET_GATE_SECRET_Z9".to_string()),
            ..AuthConfig::default()
        };
        let gate = AuthGate::new(config, Arc::new(MockFederated::rejecting()));

        let err = gate.issue_token("u1").unwrap_err();
        assert!(matches!(err, AuthError::MisconfiguredServer));

        let err = gate.verify(Some("Bearer whatever")).await.unwrap_err();
        assert!(matches!(err, AuthError::MisconfiguredServer));
    }

    #[tokio::test]
    async fn test_verification_is_idempotent() {
        let gate = gate_with(Arc::new(MockFederated::rejecting()), Environment::Production);

        let token = gate.issue_token("u1").unwrap();
        let header = format!("Bearer {token}");

        let first = gate.verify(Some(&header)).await.unwrap();
        let second = gate.verify(Some(&header)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.auth_type, second.auth_type);
    }

    #[tokio::test]
    async fn test_expired_token_is_terminal() {
        let federated = Arc::new(MockFederated::accepting());
        let gate = gate_with(federated.clone(), Environment::Production);

        // Past the default 60s validation leeway.
        let token = token_with_exp(Utc::now().timestamp() - 3600);
        let header = format!("Bearer {token}");

        let err = gate.verify(Some(&header)).await.unwrap_err();
        assert!(matches!(err, AuthError::ExpiredCredential));
        // Expiry must not fall through to the secondary verifier.
        assert_eq!(federated.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_primary_falls_through_to_secondary() {
        let federated = Arc::new(MockFederated::accepting());
        let gate = gate_with(federated.clone(), Environment::Production);

        let identity = gate.verify(Some("Bearer not.a.jwt")).await.unwrap();
        assert_eq!(identity.id, "fed-1");
        assert_eq!(identity.auth_type, AuthType::Secondary);
        assert_eq!(identity.email.as_deref(), Some("fed@example.com"));
        assert_eq!(federated.calls(), 1);
    }

    #[tokio::test]
    async fn test_both_failures_recorded_in_development() {
        let gate = gate_with(Arc::new(MockFederated::rejecting()), Environment::Development);

        let err = gate.verify(Some("Bearer not.a.jwt")).await.unwrap_err();
        match err {
            AuthError::InvalidCredential { detail: Some(detail) } => {
                assert!(detail.contains("primary:"), "{detail}");
                assert!(detail.contains("secondary:"), "{detail}");
                assert!(detail.contains("provider says no"), "{detail}");
            }
            other => panic!("expected detailed InvalidCredential, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_detail_withheld_in_production() {
        let gate = gate_with(Arc::new(MockFederated::rejecting()), Environment::Production);

        let err = gate.verify(Some("Bearer not.a.jwt")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential { detail: None }));
    }

    #[tokio::test]
    async fn test_missing_secret_is_misconfiguration() {
        let gate = AuthGate::new(AuthConfig::default(), Arc::new(MockFederated::rejecting()));

        let err = gate.verify(Some("Bearer whatever")).await.unwrap_err();
        assert!(matches!(err, AuthError::MisconfiguredServer));

        let err = gate.issue_token("u1").unwrap_err();
        assert!(matches!(err, AuthError::MisconfiguredServer));
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let gate = gate_with(Arc::new(MockFederated::rejecting()), Environment::Production);

        let mut token = gate.issue_token("u1").unwrap();
        // Flip the last signature character.
        let flipped = if token.ends_with('A') { 'B' } else { 'A' };
        token.pop();
        token.push(flipped);
        let header = format!("Bearer {token}");

        let err = gate.verify(Some(&header)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential { .. }));
    }
}
