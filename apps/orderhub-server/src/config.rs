//! Server configuration: defaults, YAML file, then environment
//! overrides, validated before anything binds a socket.

use std::net::SocketAddr;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use orderhub_auth::JwtConfig;
use orderhub_auth::validator::StaticPrincipal;
use orderhub_security::{RoleConfig, RoleConfigError};
use orders::DownstreamConfig;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Environment variable prefix; nested keys use `__`, e.g.
/// `ORDERHUB_SERVER__BIND_ADDR`.
const ENV_PREFIX: &str = "ORDERHUB_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid server.bind_addr '{value}': {reason}")]
    InvalidBindAddr { value: String, reason: String },

    #[error("invalid URL in {field}: '{value}'")]
    InvalidUrl { field: String, value: String },

    #[error("auth.roles: {0}")]
    Roles(#[from] RoleConfigError),

    #[error("auth.mode = jwt requires the auth.jwt section")]
    MissingJwtSection,

    #[error("auth.jwt requires hmac_secret or rsa_public_key_pem")]
    MissingJwtKey,

    #[error("auth.mode = static requires at least one auth.principals entry")]
    NoStaticPrincipals,
}

/// Which token validator the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Validate JWTs against the configured issuer and key.
    Jwt,
    /// Fixed token-to-principal list, for dev and tests.
    Static,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Tracing env-filter directive, overridable by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CorsConfig {
    /// Allowed origins: `["*"]` means any
    pub allowed_origins: Vec<String>,
    /// Allowed HTTP methods
    pub allowed_methods: Vec<String>,
    /// Allowed request headers; `["*"]` means any
    pub allowed_headers: Vec<String>,
    /// Response headers browsers may read. Must include the pagination
    /// metadata header or clients cannot page.
    pub exposed_headers: Vec<String>,
    /// Max age for preflight caching in seconds
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_owned()],
            allowed_methods: vec!["GET".to_owned(), "OPTIONS".to_owned()],
            allowed_headers: vec!["*".to_owned()],
            exposed_headers: vec![orderhub_pagination::PAGINATION_HEADER.to_owned()],
            max_age_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// JWT validation settings, required when `mode = jwt`.
    pub jwt: Option<JwtConfig>,
    /// Static principals, required when `mode = static`.
    #[serde(default)]
    pub principals: Vec<StaticPrincipal>,
    pub roles: RoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OboSettings {
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Seconds subtracted from a credential's expiry before it counts
    /// as expired.
    #[serde(default = "default_safety_margin_secs")]
    pub safety_margin_secs: u32,
    /// Total exchange attempts per flight.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_safety_margin_secs() -> u32 {
    120
}

fn default_max_attempts() -> u32 {
    2
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DemoConfig {
    /// Number of synthetic orders to seed the in-memory store with.
    pub seed_orders: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub obo: OboSettings,
    pub downstream: DownstreamConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Load configuration from the optional YAML file, then apply
    /// `ORDERHUB_`-prefixed environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source cannot be read or a
    /// required key is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        Ok(config)
    }

    /// Fail-fast validation, run before the listener binds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; the process should exit
    /// rather than start half-configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddr {
                value: self.server.bind_addr.clone(),
                reason: e.to_string(),
            })?;

        self.auth.roles.validate()?;

        match self.auth.mode {
            AuthMode::Jwt => {
                let jwt = self.auth.jwt.as_ref().ok_or(ConfigError::MissingJwtSection)?;
                if jwt.hmac_secret.is_none() && jwt.rsa_public_key_pem.is_none() {
                    return Err(ConfigError::MissingJwtKey);
                }
            }
            AuthMode::Static => {
                if self.auth.principals.is_empty() {
                    return Err(ConfigError::NoStaticPrincipals);
                }
            }
        }

        require_url("obo.token_endpoint", &self.obo.token_endpoint)?;
        require_url("downstream.base_url", &self.downstream.base_url)?;

        Ok(())
    }
}

fn require_url(field: &str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        field: field.to_owned(),
        value: value.to_owned(),
    })?;
    Ok(())
}
