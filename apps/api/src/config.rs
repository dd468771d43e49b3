use anyhow::{bail, Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_JWT_AUDIENCE: &str = "authenticated";
const DEFAULT_SCORING_STALENESS_DAYS: i64 = 30;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RUST_LOG: &str = "info";
const MAX_SCORING_STALENESS_DAYS: i64 = 3650;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub openai_api_key: String,
    pub openai_base_url: String,
    /// Chat model used for scoring and segment generation.
    pub llm_model: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
    /// Downstream segment-processing endpoint. Unset disables the trigger.
    pub segments_process_url: Option<String>,
    /// Bearer token sent to the processing endpoint, if it requires one.
    pub segments_process_token: Option<String>,
    pub scoring_staleness_days: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: match optional_env("DATABASE_MAX_CONNECTIONS") {
                Some(v) => v
                    .parse::<u32>()
                    .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
                None => DEFAULT_MAX_CONNECTIONS,
            },
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            llm_model: optional_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            jwt_secret: require_env("SUPABASE_JWT_SECRET")?,
            jwt_audience: optional_env("JWT_AUDIENCE")
                .unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
            segments_process_url: optional_env("SEGMENTS_PROCESS_URL"),
            segments_process_token: optional_env("SEGMENTS_PROCESS_TOKEN"),
            scoring_staleness_days: parse_staleness_days(optional_env("SCORING_STALENESS_DAYS"))?,
            port: match optional_env("PORT") {
                Some(v) => v.parse::<u16>().context("PORT must be a valid port number")?,
                None => DEFAULT_PORT,
            },
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| DEFAULT_RUST_LOG.to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Treats blank values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Staleness window in days, 1..=3650. Unset falls back to the default.
fn parse_staleness_days(raw: Option<String>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SCORING_STALENESS_DAYS);
    };
    let days = raw
        .parse::<i64>()
        .context("SCORING_STALENESS_DAYS must be an integer number of days")?;
    if !(1..=MAX_SCORING_STALENESS_DAYS).contains(&days) {
        bail!("SCORING_STALENESS_DAYS must be between 1 and {MAX_SCORING_STALENESS_DAYS}, got {days}");
    }
    Ok(days)
}
