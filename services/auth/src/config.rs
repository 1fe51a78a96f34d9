use lattice_core::config::Config;
use serde::Deserialize;

fn default_auth_port() -> u16 {
    3112
}

fn default_token_prefix() -> String {
    "lat".to_owned()
}

fn default_token_environment() -> String {
    "live".to_owned()
}

/// Auth service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing access tokens.
    pub jwt_access_secret: String,
    /// HMAC secret for signing refresh tokens. Must differ from the access
    /// secret so a token of one type can never validate as the other.
    pub jwt_refresh_secret: String,
    /// Cookie domain attribute (root domain, e.g. "example.com").
    pub cookie_domain: String,
    /// TCP port to listen on (default 3112). Env var: `AUTH_PORT`.
    #[serde(default = "default_auth_port")]
    pub auth_port: u16,
    /// Relying-party domain rendered into SIWE messages.
    pub siwe_domain: String,
    /// Relying-party URI rendered into SIWE messages.
    pub siwe_uri: String,
    /// Delivery endpoint for verification codes (email/SMS fan-out).
    pub notify_url: String,
    /// Prefix of generated personal access tokens (default "lat").
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,
    /// Environment segment of generated tokens (default "live").
    #[serde(default = "default_token_environment")]
    pub token_environment: String,
    #[serde(default)]
    pub oauth_github_client_id: Option<String>,
    #[serde(default)]
    pub oauth_github_client_secret: Option<String>,
    #[serde(default)]
    pub oauth_google_client_id: Option<String>,
    #[serde(default)]
    pub oauth_google_client_secret: Option<String>,
}

impl Config for AuthConfig {}
