use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub translate: TranslateConfig,
    #[serde(default = "default_cache_config")]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// File holding the bot token, read when `bot_token` is empty
    #[serde(default)]
    pub bot_token_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslateConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Target language used when a command does not name one
    #[serde(default = "default_target")]
    pub default_target: String,
    /// Language the provider uses for language display names
    #[serde(default = "default_display_language")]
    pub display_language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,
}

fn default_base_url() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_target() -> String {
    "en".to_string()
}

fn default_display_language() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_enabled() -> bool {
    true
}

fn default_refresh_cron() -> String {
    "0 0 */6 * * *".to_string()
}

fn default_cache_config() -> CacheConfig {
    CacheConfig {
        enabled: default_cache_enabled(),
        refresh_cron: default_refresh_cron(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&content)?;
        config.apply_env(
            std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            std::env::var("GOOGLE_TRANSLATE_API_KEY").ok(),
        );
        config.resolve_token_file()?;
        config.validate()?;

        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Environment variables win over values from the file.
    fn apply_env(&mut self, bot_token: Option<String>, api_key: Option<String>) {
        if let Some(token) = bot_token.filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.translate.api_key = key.trim().to_string();
        }
    }

    fn resolve_token_file(&mut self) -> Result<()> {
        if !self.telegram.bot_token.is_empty() {
            return Ok(());
        }
        if let Some(path) = &self.telegram.bot_token_file {
            let token = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read bot token file: {}", path.display()))?;
            self.telegram.bot_token = token.trim().to_string();
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            anyhow::bail!(
                "No Telegram bot token: set telegram.bot_token, telegram.bot_token_file or TELEGRAM_BOT_TOKEN"
            );
        }
        if self.translate.api_key.is_empty() {
            anyhow::bail!(
                "No translation API key: set translate.api_key or GOOGLE_TRANSLATE_API_KEY"
            );
        }
        if self.translate.timeout_secs == 0 {
            anyhow::bail!("translate.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
