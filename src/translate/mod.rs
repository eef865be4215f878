pub mod cache;
pub mod google;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use self::cache::LanguageCache;

/// A language the provider supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

impl TranslationRequest {
    /// Auto-detected source, default target.
    pub fn auto(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: None,
            target_lang: None,
        }
    }

    pub fn between(text: impl Into<String>, source: &str, target: &str) -> Self {
        Self {
            text: text.into(),
            source_lang: Some(source.to_string()),
            target_lang: Some(target.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub translated_text: String,
}

/// Failure reported by a provider. The provider exposes no typed error codes,
/// so the display string is all the gateway has to classify.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Translation provider interface
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate text; `None` languages fall back to provider auto-detection
    /// and the provider's default target.
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;

    /// Detect the language code of text
    async fn detect_language(&self, text: &str) -> Result<String, ProviderError>;

    /// All supported languages, in provider order
    async fn list_languages(&self) -> Result<Vec<LanguageEntry>, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadLanguagePair,
    InvalidLanguageCode,
    Unknown,
}

impl ErrorKind {
    /// Best-effort classification of a raw provider error string.
    ///
    /// Brittle by nature: it relies on substrings of the provider's English
    /// error messages. Handlers only ever see the resulting kind.
    pub fn classify(raw: &str) -> Self {
        if raw.contains("Bad language pair") {
            ErrorKind::BadLanguagePair
        } else if raw.contains("Invalid Value") {
            ErrorKind::InvalidLanguageCode
        } else {
            ErrorKind::Unknown
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::BadLanguagePair => "Error: bad language pair.",
            ErrorKind::InvalidLanguageCode => {
                "Error: invalid language code. Write *code for [language]* to get the language code of a given language."
            }
            ErrorKind::Unknown => "Error: an unknown error occurred.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {raw_message}")]
pub struct TranslationError {
    pub kind: ErrorKind,
    pub raw_message: String,
}

impl TranslationError {
    pub fn from_raw(raw_message: impl Into<String>) -> Self {
        let raw_message = raw_message.into();
        Self {
            kind: ErrorKind::classify(&raw_message),
            raw_message,
        }
    }

    fn unknown(raw_message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            raw_message: raw_message.into(),
        }
    }
}

/// Call-through to the translation provider.
///
/// Applies the per-call timeout, unescapes translated text, serves the
/// language list from the cache when one is configured, and normalizes
/// every failure into a [`TranslationError`].
pub struct Gateway {
    provider: Arc<dyn TranslationProvider>,
    timeout: Duration,
    cache: Option<Arc<LanguageCache>>,
}

impl Gateway {
    pub fn new(provider: Arc<dyn TranslationProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<LanguageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn call<T, F>(&self, op: &str, fut: F) -> Result<T, TranslationError>
    where
        F: std::future::Future<Output = Result<T, ProviderError>>,
    {
        let outcome = match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => TranslationError::from_raw(e.to_string()),
            Err(_) => TranslationError::unknown(format!(
                "{} timed out after {}s",
                op,
                self.timeout.as_secs_f32()
            )),
        };
        warn!("Provider {} failed ({:?}): {}", op, outcome.kind, outcome.raw_message);
        Err(outcome)
    }

    pub async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslationError> {
        debug!(
            "Translating {} chars ({:?} -> {:?})",
            request.text.chars().count(),
            request.source_lang,
            request.target_lang
        );
        let raw = self
            .call("translate", self.provider.translate(request))
            .await?;
        Ok(TranslationResult {
            translated_text: html_escape::decode_html_entities(&raw).into_owned(),
        })
    }

    pub async fn detect_language(&self, text: &str) -> Result<String, TranslationError> {
        self.call("detect_language", self.provider.detect_language(text))
            .await
    }

    pub async fn list_languages(&self) -> Result<Vec<LanguageEntry>, TranslationError> {
        if let Some(cache) = &self.cache {
            if let Some(languages) = cache.get().await {
                return Ok(languages);
            }
        }

        let languages = self
            .call("list_languages", self.provider.list_languages())
            .await?;

        if let Some(cache) = &self.cache {
            cache.store(languages.clone()).await;
        }
        Ok(languages)
    }

    /// Display name for a language code. An unknown code is an internal
    /// failure and surfaces as [`ErrorKind::Unknown`].
    pub async fn language_name(&self, code: &str) -> Result<String, TranslationError> {
        let languages = self.list_languages().await?;
        languages
            .into_iter()
            .find(|lang| lang.code == code)
            .map(|lang| lang.display_name)
            .ok_or_else(|| {
                let err = TranslationError::unknown(format!(
                    "No display name for language code '{}'",
                    code
                ));
                warn!("{}", err.raw_message);
                err
            })
    }
}
