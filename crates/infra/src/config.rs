//! Configuration loading from environment variables.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory. Parsing goes through a lookup function so
//! tests can feed a plain map instead of mutating the environment.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `USE_SSL=true` but some of the certificate paths are missing.
    #[error("USE_SSL is enabled but {} not set", .missing.join(", "))]
    MissingDatabaseTls { missing: Vec<&'static str> },

    /// Only one of `SSL_CERTFILE` / `SSL_KEYFILE` was provided.
    #[error("HTTPS requires both SSL_CERTFILE and SSL_KEYFILE (only {present} is set)")]
    IncompleteServerTls { present: &'static str },

    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Full process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// `false` selects the in-memory store (dev/test); no database is touched.
    pub use_persistent_stores: bool,
}

/// Database connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub tls: Option<DatabaseTls>,
}

/// Client TLS material for the database connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTls {
    pub ca: PathBuf,
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<ServerTls>,
}

/// PEM files used to terminate HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTls {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("failed to read .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = DatabaseConfig {
            host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_number("DB_PORT", get("DB_PORT"), 5432)?,
            user: get("DB_USER").unwrap_or_else(|| "postgres".to_string()),
            password: get("DB_PASSWORD").unwrap_or_default(),
            name: get("DB_NAME").unwrap_or_else(|| "biblioteka".to_string()),
            max_connections: parse_number("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5)?,
            tls: database_tls(&get)?,
        };

        let server = ServerConfig {
            host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number("SSL_PORT", get("SSL_PORT"), 8000)?,
            tls: server_tls(&get)?,
        };

        let use_persistent_stores = get("USE_PERSISTENT_STORES")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Self {
            database,
            server,
            use_persistent_stores,
        })
    }
}

impl DatabaseConfig {
    /// Connection URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("tls", &self.tls)
            .finish()
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => match v.trim().parse() {
            Ok(n) => Ok(n),
            Err(_) => Err(ConfigError::InvalidNumber { var, value: v }),
        },
    }
}

fn database_tls<F>(get: &F) -> Result<Option<DatabaseTls>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let enabled = get("USE_SSL").map(|v| parse_flag(&v)).unwrap_or(false);
    if !enabled {
        return Ok(None);
    }

    let ca = get("SSL_CA");
    let cert = get("SSL_CERT");
    let key = get("SSL_KEY");

    match (ca, cert, key) {
        (Some(ca), Some(cert), Some(key)) => Ok(Some(DatabaseTls {
            ca: ca.into(),
            cert: cert.into(),
            key: key.into(),
        })),
        (ca, cert, key) => {
            let missing = [("SSL_CA", ca), ("SSL_CERT", cert), ("SSL_KEY", key)]
                .into_iter()
                .filter(|(_, v)| v.is_none())
                .map(|(name, _)| name)
                .collect();
            Err(ConfigError::MissingDatabaseTls { missing })
        }
    }
}

fn server_tls<F>(get: &F) -> Result<Option<ServerTls>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match (get("SSL_CERTFILE"), get("SSL_KEYFILE")) {
        (Some(cert), Some(key)) => Ok(Some(ServerTls {
            cert_file: cert.into(),
            key_file: key.into(),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::IncompleteServerTls { present: "SSL_CERTFILE" }),
        (None, Some(_)) => Err(ConfigError::IncompleteServerTls { present: "SSL_KEYFILE" }),
    }
}
