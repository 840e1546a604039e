use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Google Generative Language API root used when `GEMINI_BASE_URL` is not set.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Embedding model used when `EMBEDDING_MODEL` is not set.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/text-embedding-004";
/// Generative model used when `GENERATION_MODEL` is not set.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";
/// Upper bound on request bodies, uploads included.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Two settings contradict each other.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Runtime configuration for the question-answering server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Directory receiving uploaded PDFs while they are processed.
    pub upload_dir: PathBuf,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Generative model identifier passed to the provider.
    pub generation_model: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Maximum overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub retrieval_top_k: usize,
    /// Fixed wait between rate-limited attempts, in seconds.
    pub rate_limit_wait_secs: u64,
    /// Total attempts (first try included) for a rate-limited question.
    pub rate_limit_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: None,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            retrieval_top_k: 4,
            rate_limit_wait_secs: 35,
            rate_limit_max_attempts: 3,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            server_port: parse_optional(&read, "SERVER_PORT")?,
            upload_dir: read("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_optional(&read, "MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
            gemini_base_url: read("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            embedding_model: read("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            generation_model: read("GENERATION_MODEL").unwrap_or(defaults.generation_model),
            chunk_size: parse_optional(&read, "TEXT_SPLITTER_CHUNK_SIZE")?
                .unwrap_or(defaults.chunk_size),
            chunk_overlap: parse_optional(&read, "TEXT_SPLITTER_CHUNK_OVERLAP")?
                .unwrap_or(defaults.chunk_overlap),
            retrieval_top_k: parse_optional(&read, "RETRIEVAL_TOP_K")?
                .unwrap_or(defaults.retrieval_top_k),
            rate_limit_wait_secs: parse_optional(&read, "RATE_LIMIT_WAIT_SECS")?
                .unwrap_or(defaults.rate_limit_wait_secs),
            rate_limit_max_attempts: parse_optional(&read, "RATE_LIMIT_MAX_ATTEMPTS")?
                .unwrap_or(defaults.rate_limit_max_attempts),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("TEXT_SPLITTER_CHUNK_SIZE".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Inconsistent(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::InvalidValue("RETRIEVAL_TOP_K".into()));
        }
        if self.rate_limit_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("RATE_LIMIT_MAX_ATTEMPTS".into()));
        }
        Ok(())
    }

    /// Fixed wait applied between rate-limited attempts.
    pub fn rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.rate_limit_wait_secs)
    }
}

fn parse_optional<T, F>(read: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    read(key)
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

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        server_port = ?config.server_port,
        upload_dir = %config.upload_dir.display(),
        embedding_model = %config.embedding_model,
        generation_model = %config.generation_model,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
