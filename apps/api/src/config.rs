use anyhow::{bail, Context, Result};

use crate::import::ImportConfig;

/// Which implementation answers structured-extraction requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionBackend {
    /// Hosted extraction function reached over HTTP.
    Function { url: String, key: Option<String> },
    /// Direct LLM prompting through `LlmClient`.
    Llm { api_key: String },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: ExtractionBackend,
    pub extraction_timeout_secs: u64,
    pub max_upload_bytes: u64,
    pub development_mode: bool,
    /// Sessions untouched for this long are dropped by the sweeper.
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let backend = match var("EXTRACTION_BACKEND").as_deref().unwrap_or("function") {
            "function" => ExtractionBackend::Function {
                url: require("EXTRACTION_SERVICE_URL")?,
                key: var("EXTRACTION_SERVICE_KEY").filter(|v| !v.is_empty()),
            },
            "llm" => ExtractionBackend::Llm {
                api_key: require("ANTHROPIC_API_KEY")?,
            },
            other => bail!("EXTRACTION_BACKEND must be 'function' or 'llm', got '{other}'"),
        };

        let max_upload_mb = var("MAX_UPLOAD_MB")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .context("MAX_UPLOAD_MB must be a whole number of megabytes")?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("MAX_UPLOAD_MB is too large: {max_upload_mb}"))?;

        Ok(Config {
            backend,
            extraction_timeout_secs: var("EXTRACTION_TIMEOUT_SECS")
                .unwrap_or_else(|| "120".to_string())
                .parse::<u64>()
                .context("EXTRACTION_TIMEOUT_SECS must be a number of seconds")?,
            max_upload_bytes,
            development_mode: var("IS_DEVELOPMENT")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            session_ttl_secs: var("SESSION_TTL_SECS")
                .unwrap_or_else(|| "3600".to_string())
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a number of seconds")?,
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

impl From<&Config> for ImportConfig {
    fn from(config: &Config) -> Self {
        ImportConfig {
            max_file_bytes: config.max_upload_bytes,
            development_mode: config.development_mode,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
