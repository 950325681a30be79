//! Gateway configuration - environment loading and connect options
//!
//! Configuration is read once at startup from environment variables:
//! - `PORT`, `BIND_ADDR`: listen address (default: 127.0.0.1:3000)
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`: MySQL target
//! - `DB_CONNECTION_LIMIT`: pool size (default: 10)
//! - `DB_CONNECT_TIMEOUT_SECS`: how long to keep trying to connect (default: 10)
//! - `QUERY_TIMEOUT_SECS`: optional per-statement deadline
//! - `PROCEDURE_ALLOWLIST`: optional comma-separated procedure names
//! - `CORS_PERMISSIVE`: allow any origin (default: true)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use sqlx::mysql::MySqlConnectOptions;

/// Default maximum connections for the pool.
pub const DEFAULT_CONNECTION_LIMIT: u32 = 10;

/// Default time allowed for opening a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// MySQL connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Upper bound on live connections; callers past it wait for a free slot
    pub connection_limit: u32,
    /// How long the pool keeps retrying a refused connect before failing
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "users".to_string(),
            connection_limit: DEFAULT_CONNECTION_LIMIT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl DatabaseConfig {
    /// Build sqlx connect options for this target.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);

        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

/// Full gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    pub database: DatabaseConfig,

    /// Deadline applied to each statement. `None` waits indefinitely.
    pub query_timeout: Option<Duration>,

    /// Procedures callable through the gateway. `None` allows any name.
    pub procedure_allowlist: Option<Vec<String>>,

    /// Allow any origin (default: true)
    pub cors_permissive: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            database: DatabaseConfig::default(),
            query_timeout: None,
            procedure_allowlist: None,
            cors_permissive: true,
        }
    }
}

impl GatewayConfig {
    /// Create config from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ip: IpAddr = parse_or(&get, "BIND_ADDR", defaults.bind_addr.ip())?;
        let port: u16 = parse_or(&get, "PORT", DEFAULT_PORT)?;

        let db_defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            host: get("DB_HOST").unwrap_or(db_defaults.host),
            port: parse_or(&get, "DB_PORT", db_defaults.port)?,
            user: get("DB_USER").unwrap_or(db_defaults.user),
            // An empty password is meaningful, so read it without the filter
            password: lookup("DB_PASSWORD").unwrap_or(db_defaults.password),
            database: get("DB_NAME").unwrap_or(db_defaults.database),
            connection_limit: parse_or(&get, "DB_CONNECTION_LIMIT", db_defaults.connection_limit)?,
            connect_timeout: Duration::from_secs(parse_or(
                &get,
                "DB_CONNECT_TIMEOUT_SECS",
                db_defaults.connect_timeout.as_secs(),
            )?),
        };

        if database.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "DB_CONNECT_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        if database.connection_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_CONNECTION_LIMIT",
                value: "0".to_string(),
            });
        }

        let query_timeout = match get("QUERY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse_value("QUERY_TIMEOUT_SECS", &raw)?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let procedure_allowlist = get("PROCEDURE_ALLOWLIST").map(|raw| parse_list(&raw));

        let cors_permissive = match get("CORS_PERMISSIVE") {
            Some(raw) => parse_bool("CORS_PERMISSIVE", &raw)?,
            None => defaults.cors_permissive,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            database,
            query_timeout,
            procedure_allowlist,
            cors_permissive,
        })
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}
