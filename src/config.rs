use std::time::Duration;

use anyhow::{Context, Result};

pub const PDF_MAX_PAGES: usize = 200;
pub const PDF_MAX_FILE_SIZE_MB: usize = 20;
pub const PDF_MAX_FILE_SIZE_BYTES: usize = PDF_MAX_FILE_SIZE_MB * 1024 * 1024;
pub const YOUTUBE_MAX_DURATION_SECONDS: u64 = 18_000;
pub const YOUTUBE_MAX_SEGMENT_CHARS: usize = 50_000;
pub const GENERATE_MIN_CHARS: usize = 50;
pub const GENERATE_MAX_CHARS: usize = 50_000;

/// Settings for the text-generation API.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Settings for the caption fetcher.
#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    /// Caption languages in order of preference.
    pub languages: Vec<String>,
    pub timeout: Duration,
}

/// Service configuration, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    pub llm: LlmConfig,
    pub youtube: YoutubeConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                                  |
    /// |------------------------|------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                |
    /// | `PORT`                 | `3000`                                   |
    /// | `CORS_ORIGINS`         | `*`                                      |
    /// | `LLM_API_KEY`          | required                                 |
    /// | `LLM_API_URL`          | `https://api.anthropic.com/v1/messages`  |
    /// | `LLM_MODEL`            | `claude-sonnet-4-20250514`               |
    /// | `LLM_MAX_TOKENS`       | `8192`                                   |
    /// | `LLM_TIMEOUT_SECS`     | `120`                                    |
    /// | `YOUTUBE_TIMEOUT_SECS` | `30`                                     |
    /// | `YOUTUBE_LANGUAGES`    | `en`                                     |
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY").context("LLM_API_KEY must be set")?;

        Ok(Config {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 3000)?,
            cors_origins: split_list(&var_or("CORS_ORIGINS", "*"))
                .into_iter()
                .filter(|origin| origin != "*")
                .collect(),
            llm: LlmConfig {
                api_url: var_or("LLM_API_URL", "https://api.anthropic.com/v1/messages"),
                api_key,
                model: var_or("LLM_MODEL", "claude-sonnet-4-20250514"),
                max_tokens: parse_var("LLM_MAX_TOKENS", 8192)?,
                timeout: Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", 120)?),
            },
            youtube: YoutubeConfig {
                languages: split_list(&var_or("YOUTUBE_LANGUAGES", "en")),
                timeout: Duration::from_secs(parse_var("YOUTUBE_TIMEOUT_SECS", 30)?),
            },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
