//! Client configuration: defaults, JSON file, environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use reportdesk_auth::{CatalogError, RoleGroups, RouteCatalog};

pub const ENV_API_URL: &str = "REPORTDESK_API_URL";
pub const ENV_API_BASE: &str = "REPORTDESK_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "REPORTDESK_TIMEOUT_SECS";
pub const ENV_CREDENTIAL_TTL_DAYS: &str = "REPORTDESK_CREDENTIAL_TTL_DAYS";
pub const ENV_CREDENTIAL_PATH: &str = "REPORTDESK_CREDENTIAL_PATH";
pub const ENV_AUTH_SCHEME: &str = "REPORTDESK_AUTH_SCHEME";
pub const ENV_APP_TITLE: &str = "REPORTDESK_APP_TITLE";
pub const ENV_ROUTES: &str = "REPORTDESK_ROUTES";

/// Longest client-side lifetime accepted for a persisted credential.
pub const MAX_CREDENTIAL_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// How the credential is rendered into the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// The bare token, as the reporting server expects.
    #[default]
    Raw,
    /// `Bearer <token>`.
    Bearer,
}

impl AuthScheme {
    pub fn header_value(&self, token: &str) -> String {
        match self {
            AuthScheme::Raw => token.to_string(),
            AuthScheme::Bearer => format!("Bearer {token}"),
        }
    }
}

impl FromStr for AuthScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(AuthScheme::Raw),
            "bearer" => Ok(AuthScheme::Bearer),
            other => Err(format!("unknown auth scheme '{other}' (expected raw|bearer)")),
        }
    }
}

/// Everything the session pipeline needs to know about its deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:8080`.
    pub api_url: String,
    /// Path prefix every endpoint is mounted under.
    pub api_base: String,
    pub timeout_secs: u64,
    /// Storage key for the credential (browser storage, file record).
    pub credential_key: String,
    /// Client-side expiry horizon for a persisted credential.
    pub credential_ttl_days: i64,
    /// Where the file credential store keeps its record. Defaults to the
    /// platform data directory.
    pub credential_path: Option<PathBuf>,
    pub auth_scheme: AuthScheme,
    pub app_title: String,
    pub login_path: String,
    pub home_path: String,
    /// Paths reachable without a credential.
    pub whitelist: Vec<String>,
    pub role_groups: RoleGroups,
    /// Optional JSON route catalog replacing the built-in reporting routes.
    pub routes_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            api_base: "/api".to_string(),
            timeout_secs: 60,
            credential_key: "enterprise_report_token".to_string(),
            credential_ttl_days: 7,
            credential_path: None,
            auth_scheme: AuthScheme::Raw,
            app_title: "Enterprise Reports".to_string(),
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
            whitelist: vec!["/login".to_string()],
            role_groups: RoleGroups::default(),
            routes_path: None,
        }
    }
}

impl ClientConfig {
    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()
    }

    /// Reject values the session cannot work with.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(1..=MAX_CREDENTIAL_TTL_DAYS).contains(&self.credential_ttl_days) {
            return Err(ConfigError::Invalid {
                var: "credential_ttl_days",
                value: self.credential_ttl_days.to_string(),
                reason: format!("must be between 1 and {MAX_CREDENTIAL_TTL_DAYS} days"),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "timeout_secs",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Blank values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(base) = get(ENV_API_BASE) {
            self.api_base = base;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_positive(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = get(ENV_CREDENTIAL_TTL_DAYS) {
            let days = parse_positive::<i64>(ENV_CREDENTIAL_TTL_DAYS, &raw)?;
            if days > MAX_CREDENTIAL_TTL_DAYS {
                return Err(ConfigError::Invalid {
                    var: ENV_CREDENTIAL_TTL_DAYS,
                    value: raw,
                    reason: format!("must be at most {MAX_CREDENTIAL_TTL_DAYS} days"),
                });
            }
            self.credential_ttl_days = days;
        }
        if let Some(path) = get(ENV_CREDENTIAL_PATH) {
            self.credential_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = get(ENV_AUTH_SCHEME) {
            self.auth_scheme = raw.parse().map_err(|reason| ConfigError::Invalid {
                var: ENV_AUTH_SCHEME,
                value: raw.clone(),
                reason,
            })?;
        }
        if let Some(title) = get(ENV_APP_TITLE) {
            self.app_title = title;
        }
        if let Some(path) = get(ENV_ROUTES) {
            self.routes_path = Some(PathBuf::from(path));
        }

        Ok(self)
    }

    /// Absolute URL prefix for every endpoint: origin plus base path.
    pub fn endpoint_root(&self) -> String {
        let origin = self.api_url.trim_end_matches('/');
        let base = self.api_base.trim_matches('/');
        if base.is_empty() {
            origin.to_string()
        } else {
            format!("{origin}/{base}")
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn credential_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.credential_ttl_days.clamp(1, MAX_CREDENTIAL_TTL_DAYS))
    }

    /// The route catalog for this deployment.
    pub fn route_catalog(&self) -> Result<RouteCatalog, ConfigError> {
        match &self.routes_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                Ok(RouteCatalog::from_json(&raw)?)
            }
            None => Ok(RouteCatalog::reporting(&self.role_groups)),
        }
    }
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value: T = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
