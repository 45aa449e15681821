//! Application configuration loaded from environment variables.
//!
//! All values are read once at startup; handlers only see the cached
//! `Config` inside the shared application state.

use std::env;

/// Which scheme `require_auth` uses to resolve the calling principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Delegated OAuth2/JWT verification against the identity provider.
    Oidc,
    /// Opaque session tokens looked up in the credential store.
    LegacySession,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS allow-listing
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Identity provider ---
    /// Issuer base URL of the trusted identity provider
    /// (e.g. `https://ecoquest.us.auth0.com`)
    pub auth_issuer: String,
    /// Expected audience of inbound access tokens
    pub auth_audience: String,
    /// Namespace prefix for custom claims (e.g. `https://ecoquest.app/`)
    pub auth_claim_namespace: String,
    /// Principal resolution scheme
    pub auth_mode: AuthMode,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let auth_mode = match env::var("AUTH_MODE").as_deref() {
            Ok("session") => AuthMode::LegacySession,
            Ok("oidc") | Err(_) => AuthMode::Oidc,
            Ok(other) => return Err(ConfigError::Invalid("AUTH_MODE", other.to_string())),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            auth_issuer: env::var("AUTH_ISSUER")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?,
            auth_audience: env::var("AUTH_AUDIENCE")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?,
            auth_claim_namespace: env::var("AUTH_CLAIM_NAMESPACE")
                .unwrap_or_else(|_| "https://ecoquest.app/".to_string()),
            auth_mode,
        })
    }

    /// Fixed config for tests; never reads the environment.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:8081".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            auth_issuer: "https://test.idp.example".to_string(),
            auth_audience: "https://api.ecoquest.test".to_string(),
            auth_claim_namespace: "https://ecoquest.app/".to_string(),
            auth_mode: AuthMode::Oidc,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
