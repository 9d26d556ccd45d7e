//! Summarizer adapter for the external language-model service.
//!
//! Flattens a `ContentBundle` into one prompt and asks for a summary
//! within a character budget. The budget is advisory: the adapter never
//! enforces it on the response. Failures degrade to a descriptive error
//! string so the pipeline keeps going.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sitereel_models::ContentBundle;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};

/// Models tried in order until one answers.
const GEMINI_MODELS: [&str; 2] = ["gemini-1.5-flash", "gemini-1.5-pro"];

/// The summarization service contract.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, bundle: &ContentBundle, max_chars: usize) -> EngineResult<String>;
}

/// Summarize a bundle, degrading to an error-string summary on failure.
///
/// Summarization must never abort the pipeline; a failed call just yields
/// a generic placeholder the synthesizer can still work with.
pub async fn summarize_or_fallback(
    summarizer: &dyn Summarizer,
    bundle: &ContentBundle,
    max_chars: usize,
) -> String {
    match summarizer.summarize(bundle, max_chars).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Summarization failed, using placeholder summary: {e}");
            format!("Failed to get summary from the language model: {e}")
        }
    }
}

/// Build the summarization prompt from a content bundle.
pub fn build_summary_prompt(bundle: &ContentBundle, max_chars: usize) -> String {
    let headings = bundle
        .headings
        .iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let content = format!(
        "Title: {}\nDescription: {}\nHeadings: {}\nContent: {}\nList Items: {}",
        bundle.title,
        bundle.meta_description,
        headings,
        bundle.paragraphs.join(" "),
        bundle.list_items.join(" ")
    );

    format!(
        r#"Create a concise summary of this website in EXACTLY {max_chars} characters or less.
This summary will be used to generate an advertising video, so focus on:
1. The core value proposition
2. What product/service is being offered
3. Why someone would want it
4. Any unique selling points

Website content:
{content}

IMPORTANT: Your response MUST be {max_chars} characters or less. Count carefully."#
    )
}

/// Gemini API client.
pub struct GeminiSummarizer {
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiSummarizer {
    /// Create a client from the `GEMINI_API_KEY` environment variable.
    ///
    /// A missing key is not an error here: the credential is checked per
    /// call so the pipeline can degrade instead of refusing to start.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            client: Client::new(),
        }
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            client: Client::new(),
        }
    }

    async fn call_api(&self, model: &str, prompt: &str) -> EngineResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EngineError::config_error("GEMINI_API_KEY not set"))?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            model, api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::summarize_failed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::summarize_failed(format!(
                "service returned {status}: {error_text}"
            )));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| EngineError::summarize_failed(format!("failed to parse response: {e}")))?;

        body.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| EngineError::summarize_failed("no content in response"))
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, bundle: &ContentBundle, max_chars: usize) -> EngineResult<String> {
        let prompt = build_summary_prompt(bundle, max_chars);

        let mut last_error = None;
        for model in GEMINI_MODELS {
            match self.call_api(model, &prompt).await {
                Ok(summary) => {
                    info!(model, "Got summary");
                    return Ok(summary);
                }
                Err(e @ EngineError::ConfigError(_)) => return Err(e),
                Err(e) => {
                    warn!(model, "Summarization attempt failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| EngineError::summarize_failed("all models failed")))
    }
}
