mod config;
mod format;
mod handlers;
mod platform;
mod router;
mod scheduler;
mod translate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handlers::BotContext;
use crate::router::Router;
use crate::scheduler::Scheduler;
use crate::translate::cache::LanguageCache;
use crate::translate::google::GoogleTranslateClient;
use crate::translate::Gateway;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,translatebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Provider: {}", config.translate.base_url);
    info!("  Default target: {}", config.translate.default_target);
    info!("  Timeout: {}s", config.translate.timeout_secs);
    info!("  Language cache: {}", config.cache.enabled);

    let provider = GoogleTranslateClient::new(config.translate.clone())
        .context("Failed to build translation client")?;
    let mut gateway = Gateway::new(
        Arc::new(provider),
        Duration::from_secs(config.translate.timeout_secs),
    );

    let mut scheduler = None;
    if config.cache.enabled {
        let cache = Arc::new(LanguageCache::new());
        gateway = gateway.with_cache(cache.clone());

        let mut jobs = Scheduler::new().await?;
        scheduler::tasks::register_cache_refresh(&mut jobs, &config.cache.refresh_cron, cache)
            .await?;
        jobs.start().await?;
        scheduler = Some(jobs);
    }

    let ctx = Arc::new(BotContext::new(Router::new()?, gateway));
    let bot = teloxide::Bot::new(&config.telegram.bot_token);

    info!("Google Translate Bot is starting...");
    platform::telegram::run(ctx, bot).await?;

    if let Some(mut jobs) = scheduler {
        jobs.shutdown().await?;
    }

    Ok(())
}
