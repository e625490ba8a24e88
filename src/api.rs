//! Completion client for the Gemini `generateContent` API.
//!
//! The pipeline only needs one operation: send a prompt, get text back. That
//! operation is the [`Completion`] trait, so runs can be driven by a scripted
//! client in tests. [`GeminiClient`] is the production implementation.
//!
//! One request per run. No retries and no streaming; a failed call fails the
//! run, and rerunning is safe because state is untouched.

use crate::config::Config;
use crate::error::{GeneratorError, Result};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

/// Text-in, text-out access to a generative model.
pub trait Completion {
    /// Send `prompt` and return the model's raw text response.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for `POST {api_base}/models/{model}:generateContent`.
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// The key is taken from `--api-key` when given, otherwise from the
    /// environment variable named by `api_key_env`.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Configuration`] if no API key is configured or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let from_env = || std::env::var(&config.api_key_env).ok();
        let api_key = config
            .api_key
            .clone()
            .or_else(from_env)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                GeneratorError::configuration(format!(
                    "no API key: pass --api-key or set the {} environment variable",
                    config.api_key_env
                ))
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GeneratorError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl Completion for GeminiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let t0 = Instant::now();
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Completion request failed");
                GeneratorError::service(format!("request failed: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            error!(%status, "Completion service returned an error status");
            return Err(GeneratorError::service(format!(
                "HTTP {status}: {}",
                crate::utils::truncate_for_log(&detail, 500)
            )));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| GeneratorError::service(format!("unreadable response body: {e}")))?;
        let finish_reason = parsed
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone())
            .unwrap_or_default();

        let text = parsed.into_text().ok_or_else(|| {
            GeneratorError::service(format!(
                "response has no candidate text (finish reason: {finish_reason:?})"
            ))
        })?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_len = text.len(),
            %finish_reason,
            "Completion received"
        );
        Ok(text)
    }
}
