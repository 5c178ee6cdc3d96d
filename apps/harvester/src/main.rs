mod config;
mod errors;
mod export;
mod extract;
mod filter;
mod llm_client;
mod nav;
mod pipeline;
mod scorer;
mod sites;
mod store;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::PipelineError;
use crate::llm_client::LlmClient;
use crate::nav::HttpNavigator;
use crate::pipeline::{RunContext, Throttle};
use crate::scorer::{CompatibilityScorer, LlmCompatibilityScorer};
use crate::sites::SiteProfile;
use crate::store::JobStore;

const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting harvester v{}", env!("CARGO_PKG_VERSION"));

    // Startup failures abort; once scraping begins, failures are contained.
    let store = JobStore::connect(&config.database_url)
        .await
        .map_err(PipelineError::Storage)
        .context("failed to open job store")?;

    let navigator = HttpNavigator::new(PAGE_TIMEOUT)
        .map_err(PipelineError::Navigation)
        .context("failed to build HTTP client")?;

    let profile = SiteProfile::by_name(
        &config.site_profile,
        &config.search_query,
        &config.search_location,
    )
    .map_err(|msg| anyhow::anyhow!(msg))?;

    let (scorer, resume_text) = build_scorer(&config);

    let ctx = RunContext {
        navigator: Box::new(navigator),
        store,
        scorer,
        resume_text,
        throttle: Throttle::new(config.throttle_min_ms, config.throttle_max_ms),
        dedup_policy: config.dedup_policy,
    };

    info!(
        site = %config.site_profile,
        query = %config.search_query,
        location = %config.search_location,
        max_pages = config.max_pages,
        "Starting scrape"
    );

    let summary = pipeline::run(&ctx, &profile, config.max_pages, &config.results_dir).await?;
    summary.report();

    match ctx.store.count().await {
        Ok(total) => info!(total_rows = total, "Job store total"),
        Err(err) => warn!(%err, "could not read job store row count"),
    }

    Ok(())
}

/// Builds the compatibility scorer when both the API key and a readable
/// resume file are configured. Anything short of that disables scoring
/// with a log line rather than failing the run.
fn build_scorer(config: &Config) -> (Option<Box<dyn CompatibilityScorer>>, Option<String>) {
    let Some(api_key) = config.anthropic_api_key.clone() else {
        info!("ANTHROPIC_API_KEY not set, compatibility scoring disabled");
        return (None, None);
    };
    let Some(resume_path) = &config.resume_path else {
        info!("RESUME_PATH not set, compatibility scoring disabled");
        return (None, None);
    };

    match std::fs::read_to_string(resume_path) {
        Ok(resume_text) => {
            info!(model = llm_client::MODEL, "Compatibility scoring enabled");
            let scorer = LlmCompatibilityScorer::new(LlmClient::new(api_key));
            (Some(Box::new(scorer)), Some(resume_text))
        }
        Err(err) => {
            warn!(
                path = %resume_path.display(),
                %err,
                "could not read resume file, compatibility scoring disabled"
            );
            (None, None)
        }
    }
}
