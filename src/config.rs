use std::env;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "Wells.db";
const DEFAULT_LOG_FILE: &str = "app.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid port number, got '{0}'")]
    InvalidPort(String),

    #[error("Invalid database URL '{url}': {reason}")]
    InvalidDatabaseUrl { url: String, reason: String },
}

/// Where the wells dataset lives.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Sqlite(PathBuf),
    Postgres(Url),
}

impl DataSource {
    /// `postgres://` and `postgresql://` URLs select Postgres; `sqlite://<path>`
    /// or anything else is treated as a SQLite file path.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.starts_with("postgres://") || raw.starts_with("postgresql://") {
            let url = Url::parse(raw).map_err(|e| ConfigError::InvalidDatabaseUrl {
                url: raw.to_string(),
                reason: e.to_string(),
            })?;
            if url.host_str().map_or(true, str::is_empty) {
                return Err(ConfigError::InvalidDatabaseUrl {
                    url: raw.to_string(),
                    reason: "missing host".to_string(),
                });
            }
            return Ok(DataSource::Postgres(url));
        }

        let path = raw.strip_prefix("sqlite://").unwrap_or(raw);
        if path.is_empty() {
            return Err(ConfigError::InvalidDatabaseUrl {
                url: raw.to_string(),
                reason: "empty path".to_string(),
            });
        }
        Ok(DataSource::Sqlite(PathBuf::from(path)))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Sqlite(path) => write!(f, "sqlite {}", path.display()),
            DataSource::Postgres(url) => {
                let mut redacted = url.clone();
                // Only fails for URLs that cannot carry credentials at all.
                let _ = redacted.set_password(None);
                write!(f, "{redacted}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_source: DataSource,
    pub log_file: PathBuf,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let database = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let data_source = DataSource::parse(&database)?;

        let log_file = lookup("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        let debug = lookup("WELLS_DEBUG")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            data_source,
            log_file,
            debug,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
