use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LanguageEntry, ProviderError, TranslationProvider, TranslationRequest};
use crate::config::TranslateConfig;

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DetectBody<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TranslationsData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct DetectionsData {
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
}

#[derive(Debug, Deserialize)]
struct LanguagesData {
    languages: Vec<Language>,
}

#[derive(Debug, Deserialize)]
struct Language {
    language: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Google Cloud Translation (v2 REST) client
pub struct GoogleTranslateClient {
    client: reqwest::Client,
    config: TranslateConfig,
}

impl GoogleTranslateClient {
    pub fn new(config: TranslateConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// The provider's error message, or the raw body if it is not the usual JSON shape.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl TranslationProvider for GoogleTranslateClient {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let body = TranslateBody {
            q: &request.text,
            target: request
                .target_lang
                .as_deref()
                .unwrap_or(&self.config.default_target),
            source: request.source_lang.as_deref(),
        };

        let url = self.endpoint("");
        debug!("Sending translate request to {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.config.api_key)])
            .json(&body)
            .send()
            .await?;

        let data: TranslationsData = Self::decode(response).await?;
        data.translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::Decode("no translations in response".to_string()))
    }

    async fn detect_language(&self, text: &str) -> Result<String, ProviderError> {
        let url = self.endpoint("detect");
        debug!("Sending detect request to {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.config.api_key)])
            .json(&DetectBody { q: text })
            .send()
            .await?;

        let data: DetectionsData = Self::decode(response).await?;
        first_detection(data)
    }

    async fn list_languages(&self) -> Result<Vec<LanguageEntry>, ProviderError> {
        let url = self.endpoint("languages");
        debug!("Fetching supported languages from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("target", self.config.display_language.as_str()),
            ])
            .send()
            .await?;

        let data: LanguagesData = Self::decode(response).await?;
        Ok(into_entries(data))
    }
}

fn first_detection(data: DetectionsData) -> Result<String, ProviderError> {
    data.detections
        .into_iter()
        .next()
        .and_then(|candidates| candidates.into_iter().next())
        .map(|d| d.language)
        .ok_or_else(|| ProviderError::Decode("no detections in response".to_string()))
}

fn into_entries(data: LanguagesData) -> Vec<LanguageEntry> {
    data.languages
        .into_iter()
        .map(|lang| LanguageEntry {
            display_name: lang.name.unwrap_or_else(|| lang.language.clone()),
            code: lang.language,
        })
        .collect()
}
