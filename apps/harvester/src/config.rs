use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::store::DedupPolicy;

/// Application configuration loaded from environment variables.
/// Everything has a default except the Anthropic key, which is optional:
/// without it the run simply skips compatibility scoring.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub results_dir: PathBuf,
    pub site_profile: String,
    pub search_query: String,
    pub search_location: String,
    pub max_pages: u32,
    pub dedup_policy: DedupPolicy,
    pub throttle_min_ms: u64,
    pub throttle_max_ms: u64,
    pub anthropic_api_key: Option<String>,
    pub resume_path: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let throttle_min_ms = parse_env("THROTTLE_MIN_MS", 2_000)?;
        let throttle_max_ms = parse_env("THROTTLE_MAX_MS", 5_000)?;
        anyhow::ensure!(
            throttle_min_ms <= throttle_max_ms,
            "THROTTLE_MIN_MS must not exceed THROTTLE_MAX_MS"
        );

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://harvester_jobs.db?mode=rwc".to_string()),
            results_dir: std::env::var("RESULTS_DIR")
                .unwrap_or_else(|_| "results_folder".to_string())
                .into(),
            site_profile: std::env::var("SITE_PROFILE").unwrap_or_else(|_| "indeed".to_string()),
            search_query: std::env::var("SEARCH_QUERY")
                .unwrap_or_else(|_| "software engineering".to_string()),
            search_location: std::env::var("SEARCH_LOCATION")
                .unwrap_or_else(|_| "Richmond, VA".to_string()),
            max_pages: parse_env("MAX_PAGES", 3)?,
            dedup_policy: dedup_policy_from_env()?,
            throttle_min_ms,
            throttle_max_ms,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            resume_path: std::env::var("RESUME_PATH").ok().map(PathBuf::from),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn dedup_policy_from_env() -> Result<DedupPolicy> {
    match std::env::var("DEDUP_POLICY") {
        Ok(raw) => match raw.to_lowercase().as_str() {
            "ignore" => Ok(DedupPolicy::Ignore),
            "overwrite" => Ok(DedupPolicy::Overwrite),
            other => anyhow::bail!("DEDUP_POLICY must be 'ignore' or 'overwrite', got '{other}'"),
        },
        Err(_) => Ok(DedupPolicy::Ignore),
    }
}
