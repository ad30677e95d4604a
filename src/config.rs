// Runtime configuration for the storefront gateway
// Everything is read from the environment once at startup and passed down explicitly

use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::models::Role;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set in environment")]
    Missing { name: &'static str },

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// How credentials are encoded when posted to the external API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialEncoding {
    Json,
    Form,
}

/// Which backend holds server-side sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis { url: String },
}

/// Login/register/logout paths of one role's endpoint family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthEndpoints {
    #[schema(example = "/api/login")]
    pub login: String,
    #[schema(example = "/api/register")]
    pub register: String,
    #[schema(example = "/api/logout")]
    pub logout: String,
}

impl AuthEndpoints {
    /// Default endpoint family for a role under the given prefix
    pub fn defaults(prefix: &str, role: Role) -> Self {
        let base = match role {
            Role::User => prefix.to_string(),
            Role::Entrepreneur => format!("{}/entrepreneur", prefix),
        };
        Self {
            login: format!("{}/login", base),
            register: format!("{}/register", base),
            logout: format!("{}/logout", base),
        }
    }
}

/// Connection details for the external API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub prefix: String,
    pub timeout: Duration,
    pub credential_encoding: CredentialEncoding,
    pub user: AuthEndpoints,
    pub entrepreneur: AuthEndpoints,
}

impl ApiConfig {
    /// Build a config with default endpoints for both roles
    pub fn new(base_url: impl Into<String>, prefix: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let prefix = normalize_prefix(&prefix.into());
        Self {
            user: AuthEndpoints::defaults(&prefix, Role::User),
            entrepreneur: AuthEndpoints::defaults(&prefix, Role::Entrepreneur),
            base_url,
            prefix,
            timeout: Duration::from_secs(30),
            credential_encoding: CredentialEncoding::Json,
        }
    }

    /// Endpoint family for a role
    pub fn endpoints(&self, role: Role) -> &AuthEndpoints {
        match role {
            Role::User => &self.user,
            Role::Entrepreneur => &self.entrepreneur,
        }
    }

    /// Path under the versioned prefix, e.g. `resource_path("products")` -> `/api/products`
    pub fn resource_path(&self, resource: &str) -> String {
        format!("{}/{}", self.prefix, resource.trim_start_matches('/'))
    }

    /// Absolute URL of an upstream path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Server-side session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub ttl: Duration,
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            ttl: Duration::from_secs(7200),
            cookie_name: "storefront_session".to_string(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub api: ApiConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var(&lookup, "PORT", 8080u16)?;

        let base_url = lookup("API_BASE_URL").unwrap_or_else(|| "http://localhost:8000".to_string());
        let prefix = lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string());
        let mut api = ApiConfig::new(base_url, prefix);
        api.timeout = Duration::from_secs(parse_var(&lookup, "API_TIMEOUT_SECONDS", 30u64)?);

        api.credential_encoding = match lookup("API_CREDENTIAL_ENCODING").as_deref() {
            None | Some("json") => CredentialEncoding::Json,
            Some("form") => CredentialEncoding::Form,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "API_CREDENTIAL_ENCODING",
                    value: other.to_string(),
                })
            }
        };

        override_endpoints(&lookup, "API_USER", &mut api.user);
        override_endpoints(&lookup, "API_ENTREPRENEUR", &mut api.entrepreneur);

        let backend = match lookup("SESSION_BACKEND").as_deref() {
            None | Some("memory") => SessionBackend::Memory,
            Some("redis") => SessionBackend::Redis {
                url: lookup("REDIS_URL").ok_or(ConfigError::Missing { name: "REDIS_URL" })?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "SESSION_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let session = SessionConfig {
            backend,
            ttl: Duration::from_secs(parse_var(&lookup, "SESSION_TTL_SECONDS", 7200u64)?),
            ..SessionConfig::default()
        };

        Ok(Self {
            host,
            port,
            api,
            session,
        })
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

fn override_endpoints<F>(lookup: &F, scope: &str, endpoints: &mut AuthEndpoints)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(&format!("{}_LOGIN_PATH", scope)) {
        endpoints.login = path;
    }
    if let Some(path) = lookup(&format!("{}_REGISTER_PATH", scope)) {
        endpoints.register = path;
    }
    if let Some(path) = lookup(&format!("{}_LOGOUT_PATH", scope)) {
        endpoints.logout = path;
    }
}
