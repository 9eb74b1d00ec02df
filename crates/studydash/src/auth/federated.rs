//! Secondary verifier: federated ID tokens checked against the identity
//! provider's published signing keys.
//!
//! The provider rotates its RS256 keys; we fetch the JWK set on demand and
//! cache decoding keys by `kid`. The fetch is the gate's only suspension
//! point and happens only when the cache is stale, so concurrent requests
//! keep verifying against cached keys.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use log::debug;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::claims::FederatedClaims;

/// Published JWK endpoint for Firebase securetoken signing keys.
const JWK_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// How long a fetched key set stays fresh.
const KEY_TTL: Duration = Duration::from_secs(3600);

/// Minimum spacing between refetches, so a stream of bad `kid`s cannot turn
/// into a fetch per request.
const REFRESH_BACKOFF: Duration = Duration::from_secs(60);

/// Verifies tokens minted by an external identity provider.
///
/// The gate consults this only after the primary verifier has rejected a
/// token for a reason other than expiry.
#[async_trait]
pub trait FederatedVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<FederatedClaims>;
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Firebase ID token verifier backed by the provider's rotating key set.
pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    http: reqwest::Client,
    jwk_url: String,
    keys: DashMap<String, Arc<DecodingKey>>,
    refreshed: Mutex<Option<Instant>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into();
        Ok(Self {
            issuer: format!("https://securetoken.google.com/{project_id}"),
            project_id,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .context("building key-fetch client")?,
            jwk_url: JWK_URL.to_string(),
            keys: DashMap::new(),
            refreshed: Mutex::new(None),
        })
    }

    async fn signing_key(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        let fresh = self
            .refreshed
            .lock()
            .await
            .is_some_and(|at| at.elapsed() < KEY_TTL);

        if fresh {
            if let Some(key) = self.keys.get(kid) {
                return Ok(key.value().clone());
            }
        }

        self.refresh().await?;

        self.keys
            .get(kid)
            .map(|entry| entry.value().clone())
            .with_context(|| format!("no signing key published for kid {kid}"))
    }

    /// Refetch the provider key set. The mutex collapses concurrent refreshes
    /// into one fetch; the backoff keeps unknown `kid`s from forcing one.
    async fn refresh(&self) -> Result<()> {
        let mut refreshed = self.refreshed.lock().await;
        if refreshed.is_some_and(|at| at.elapsed() < REFRESH_BACKOFF) {
            return Ok(());
        }

        debug!("refreshing federated signing keys from {}", self.jwk_url);
        let set: JwkSet = self
            .http
            .get(&self.jwk_url)
            .send()
            .await
            .context("fetching federated signing keys")?
            .error_for_status()
            .context("key endpoint returned an error")?
            .json()
            .await
            .context("parsing federated key set")?;

        self.keys.clear();
        for jwk in set.keys {
            if let Ok(key) = DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                self.keys.insert(jwk.kid, Arc::new(key));
            }
        }
        *refreshed = Some(Instant::now());

        Ok(())
    }
}

#[async_trait]
impl FederatedVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<FederatedClaims> {
        let header = decode_header(token).context("malformed token header")?;
        if header.alg != Algorithm::RS256 {
            bail!("unexpected signing algorithm {:?}", header.alg);
        }
        let kid = header.kid.context("token header missing kid")?;
        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.project_id]);

        let data =
            decode::<FederatedClaims>(token, &key, &validation).context("federated token rejected")?;
        Ok(data.claims)
    }
}

/// Placeholder used when no federated project is configured. Every token is
/// rejected, leaving the primary verifier as the only path in.
pub struct FederatedDisabled;

#[async_trait]
impl FederatedVerifier for FederatedDisabled {
    async fn verify(&self, _token: &str) -> Result<FederatedClaims> {
        bail!("federated verification is not configured")
    }
}
