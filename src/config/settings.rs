//! Application settings loading from config.toml
//!
//! Every setting has a default, so the file is optional. Values from the file can be
//! overridden by environment variables (usually provided through `.env`):
//! `DATABASE_URL`, `HOST`, `PORT`, `CHATBOT_CORPUS_PATH` and `GOOGLE_CLIENT_ID`.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Database connection
    pub database: DatabaseConfig,
    /// FAQ corpus and match threshold
    pub chatbot: ChatbotConfig,
    /// Google sign-in
    pub auth: AuthConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SeaORM connection string
    pub url: String,
}

/// `[chatbot]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatbotConfig {
    /// Q&A corpus loaded at startup
    pub corpus_path: PathBuf,
    /// Best-match score below which the fallback answer is given
    pub min_score: f64,
}

/// `[auth]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth client id Google ID tokens must be issued for; unchecked when empty
    pub google_client_id: String,
    /// Google endpoint that validates an ID token and returns its claims
    pub token_info_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/deduction_buddy.sqlite?mode=rwc".to_string(),
        }
    }
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("data/tax_faq.txt"),
            min_score: 0.5,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            google_client_id: String::new(),
            token_info_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string to bind the listener to.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Replaces file values with any environment overrides that are set.
    ///
    /// # Errors
    /// Returns an error if `PORT` is set but is not a valid port number.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.parse().map_err(|e| Error::Config {
                message: format!("Invalid PORT value {port:?}: {e}"),
            })?;
        }
        if let Ok(path) = std::env::var("CHATBOT_CORPUS_PATH") {
            self.chatbot.corpus_path = PathBuf::from(path);
        }
        if let Ok(client_id) = std::env::var("GOOGLE_CLIENT_ID") {
            self.auth.google_client_id = client_id;
        }
        Ok(())
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads the file at `path` if it exists (defaults otherwise), then applies
/// environment overrides.
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed, or an override is invalid.
pub fn load_app_configuration_from<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    let mut config = if path_ref.exists() {
        info!("Loading configuration from {:?}", path_ref);
        load_config(path_ref)?
    } else {
        warn!("{:?} not found, using default configuration", path_ref);
        AppConfig::default()
    };
    config.apply_env_overrides()?;
    Ok(config)
}

/// Loads configuration from the default location (./config.toml)
///
/// # Errors
/// See [`load_app_configuration_from`].
pub fn load_app_configuration() -> Result<AppConfig> {
    load_app_configuration_from(DEFAULT_CONFIG_PATH)
}
