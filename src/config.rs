use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_OLLAMA_PORT: u16 = 11434;
const DEFAULT_SUMMARY_MODEL: &str = "llama3.2:1b";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the student records server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; when absent the in-memory repository is used.
    pub database_url: Option<String>,
    /// Maximum size of the Postgres connection pool.
    pub database_max_connections: u32,
    /// Port the HTTP listener binds to.
    pub server_port: u16,
    /// Base URL of the Ollama runtime used for summaries.
    pub ollama_url: String,
    /// Model identifier passed to the generation endpoint.
    pub summary_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            server_port: DEFAULT_PORT,
            ollama_url: format!("http://127.0.0.1:{DEFAULT_OLLAMA_PORT}"),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ollama_port: u16 = parse_optional("OLLAMA_PORT")?.unwrap_or(DEFAULT_OLLAMA_PORT);
        Ok(Self {
            database_url: load_env_optional("DATABASE_URL"),
            database_max_connections: parse_optional("DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            server_port: parse_optional("PORT")?.unwrap_or(DEFAULT_PORT),
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| format!("http://127.0.0.1:{ollama_port}")),
            summary_model: load_env_optional("SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
        })
    }

    /// Connection string to use for the Postgres repository, or `None` for the in-memory one.
    ///
    /// `force_in_memory` wins over a configured `DATABASE_URL`.
    pub fn postgres_url(&self, force_in_memory: bool) -> Option<&str> {
        if force_in_memory {
            return None;
        }
        self.database_url.as_deref()
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, falling back to defaults if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Merge variables from the nearest `.env` file into the process environment.
///
/// Must run before tracing is initialized so `RUST_LOG` and the log file path can come from
/// `.env`. Variables already set in the environment are left untouched. A missing file is not
/// an error; the loaded path is returned when one was found.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Like [`load_env_file`], reading an explicit path.
pub fn load_env_file_from(path: &Path) -> bool {
    dotenvy::from_path(path).is_ok()
}

/// Read configuration from the environment and install it in the global cache.
///
/// Call [`load_env_file`] first when `.env` support is wanted.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    let config = Config::from_env()?;
    tracing::debug!(
        database_configured = config.database_url.is_some(),
        server_port = config.server_port,
        ollama_url = %config.ollama_url,
        summary_model = %config.summary_model,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
