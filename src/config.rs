//! `config.toml` loading.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use iso_currency::Currency;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `database.json` and `users.json`.
    pub data_dir: PathBuf,
    pub bind: String,
    /// ISO 4217 code used when printing amounts.
    pub currency: String,
    pub require_auth: bool,
    pub session_ttl_hours: u32,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind: "127.0.0.1:5000".into(),
            currency: "USD".into(),
            require_auth: true,
            session_ttl_hours: 24,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(PathBuf),
    Io(std::io::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(p) => write!(f, "config file {} not found", p.display()),
            ConfigError::Io(e) => write!(f, "could not read config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(input).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::Missing(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
        Self::parse(&data)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Missing(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Currency::from_code(&self.currency).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown currency code {:?}",
                self.currency
            )));
        }
        if self.session_ttl_hours == 0 {
            return Err(ConfigError::Invalid(
                "session_ttl_hours must be at least 1".into(),
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address {:?}", self.bind)))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("database.json")
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.session_ttl_hours))
    }

    /// Symbol for the configured currency, e.g. `$`.
    pub fn currency_symbol(&self) -> String {
        Currency::from_code(&self.currency)
            .map(|c| c.symbol().to_string())
            .unwrap_or_else(|| self.currency.clone())
    }
}
