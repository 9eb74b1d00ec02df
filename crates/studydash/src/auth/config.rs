//! Gate configuration.

use serde::{Deserialize, Serialize};

/// Deployment environment. Controls whether rejection bodies carry verifier
/// failure detail; everything else behaves identically in both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for self-issued tokens.
    /// Supports `env:VAR_NAME` indirection. REQUIRED.
    pub jwt_secret: Option<String>,

    /// Lifetime of self-issued tokens, in hours.
    pub token_ttl_hours: i64,

    /// Federated identity project ID. When unset the secondary verifier is
    /// disabled and only self-issued tokens are accepted.
    pub firebase_project_id: Option<String>,

    /// Deployment environment.
    pub environment: Environment,

    /// Allowed CORS origins.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No default secret - must be explicitly configured.
            jwt_secret: None,
            token_ttl_hours: 24,
            firebase_project_id: None,
            environment: Environment::Production,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    /// Whether rejection bodies may carry diagnostic detail.
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Resolve the signing secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration. Run at startup so a missing secret alerts
    /// the operator before the server accepts a single request.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let secret = self.resolve_jwt_secret()?;

        match secret {
            None => Err(ConfigValidationError::MissingJwtSecret),
            Some(secret) if secret.len() < 32 => Err(ConfigValidationError::JwtSecretTooShort),
            Some(_) => Ok(()),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Signing secret is required.
    MissingJwtSecret,
    /// Signing secret is too short (minimum 32 characters).
    JwtSecretTooShort,
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => {
                write!(
                    f,
                    "signing secret is required. Set STUDYDASH__AUTH__JWT_SECRET or auth.jwt_secret in the config file."
                )
            }
            Self::JwtSecretTooShort => {
                write!(f, "signing secret must be at least 32 characters long.")
            }
            Self::EnvVarNotFound(var) => {
                write!(
                    f,
                    "environment variable '{}' not found (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::EnvVarEmpty(var) => {
                write!(
                    f,
                    "environment variable '{}' is empty (referenced via env:{} in config).",
                    var, var
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}
