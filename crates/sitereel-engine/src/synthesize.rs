//! Video synthesis against the external generation service.
//!
//! Every synthesis call costs money, so attempts are bounded by the retry
//! budget and exhaustion always degrades to a local fallback artifact.
//! `synthesize_to_file` guarantees a file exists at the output path when
//! it returns `Ok`, whether from the service or the fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitereel_models::AcquiredImage;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::retry::{retry_fixed, RetryConfig, RetryOutcome};

const REPLICATE_MODEL: &str = "wan-video/wan-2.1-1.3b";
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 150;

/// Generation parameters forwarded to the synthesis service.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisParams {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub negative_prompt: String,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            width: 832,
            height: 480,
            frame_rate: 16,
            negative_prompt: "poor quality, blurry, low resolution".to_string(),
        }
    }
}

/// What a synthesis call hands back: either a URL to download from or the
/// encoded video bytes directly.
#[derive(Debug, Clone)]
pub enum SynthesisOutput {
    Url(String),
    Bytes(Vec<u8>),
}

/// A single attempt against the synthesis service.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(
        &self,
        prompt: &str,
        params: &SynthesisParams,
    ) -> EngineResult<SynthesisOutput>;
}

/// Build the video prompt from the summary and any acquired images.
pub fn build_video_prompt(summary: &str, images: &[AcquiredImage]) -> String {
    let mut prompt = format!(
        "Create a 5-second advertisement video for a website about: {summary}"
    );

    let hints: Vec<&str> = images
        .iter()
        .filter_map(|img| {
            let alt = img.alt_text.trim();
            if !alt.is_empty() {
                Some(alt)
            } else {
                let title = img.title.trim();
                (!title.is_empty()).then_some(title)
            }
        })
        .collect();

    if !hints.is_empty() {
        prompt.push_str(&format!(" Featuring imagery of: {}.", hints.join(", ")));
    }

    prompt
}

/// Replicate API client.
pub struct ReplicateSynthesizer {
    api_token: Option<String>,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct PredictionRequest {
    input: PredictionInput,
}

#[derive(Debug, Serialize)]
struct PredictionInput {
    prompt: String,
    negative_prompt: String,
    width: u32,
    height: u32,
    frame_rate: u32,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

impl ReplicateSynthesizer {
    /// Create a client from the `REPLICATE_API_TOKEN` environment variable.
    ///
    /// A missing token is checked per call, not at startup.
    pub fn from_env() -> Self {
        Self {
            api_token: std::env::var("REPLICATE_API_TOKEN").ok(),
            base_url: "https://api.replicate.com".to_string(),
            client: Client::new(),
        }
    }

    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: Some(api_token.into()),
            base_url: "https://api.replicate.com".to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn token(&self) -> EngineResult<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| EngineError::config_error("REPLICATE_API_TOKEN not set"))
    }

    async fn create_prediction(
        &self,
        prompt: &str,
        params: &SynthesisParams,
    ) -> EngineResult<Prediction> {
        let url = format!("{}/v1/models/{REPLICATE_MODEL}/predictions", self.base_url);
        let request = PredictionRequest {
            input: PredictionInput {
                prompt: prompt.to_string(),
                negative_prompt: params.negative_prompt.clone(),
                width: params.width,
                height: params.height,
                frame_rate: params.frame_rate,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::synthesis_failed(format!("create failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::synthesis_failed(format!(
                "create returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::synthesis_failed(format!("invalid create response: {e}")))
    }

    async fn poll_prediction(&self, poll_url: &str) -> EngineResult<Prediction> {
        for _ in 0..MAX_POLLS {
            let prediction: Prediction = self
                .client
                .get(poll_url)
                .bearer_auth(self.token()?)
                .send()
                .await
                .map_err(|e| EngineError::synthesis_failed(format!("poll failed: {e}")))?
                .json()
                .await
                .map_err(|e| EngineError::synthesis_failed(format!("invalid poll response: {e}")))?;

            match prediction.status.as_str() {
                "succeeded" => return Ok(prediction),
                "failed" | "canceled" => {
                    let detail = prediction
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| prediction.status.clone());
                    return Err(EngineError::synthesis_failed(format!(
                        "prediction ended: {detail}"
                    )));
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }

        Err(EngineError::synthesis_failed("prediction timed out"))
    }

    fn extract_output_url(output: Option<Value>) -> EngineResult<String> {
        let value =
            output.ok_or_else(|| EngineError::synthesis_failed("prediction has no output"))?;
        match value {
            Value::String(url) => Ok(url),
            Value::Array(items) => items
                .into_iter()
                .find_map(|v| match v {
                    Value::String(url) => Some(url),
                    _ => None,
                })
                .ok_or_else(|| EngineError::synthesis_failed("output array has no URL")),
            other => Err(EngineError::synthesis_failed(format!(
                "unexpected output shape: {other}"
            ))),
        }
    }
}

#[async_trait]
impl SynthesisService for ReplicateSynthesizer {
    async fn synthesize(
        &self,
        prompt: &str,
        params: &SynthesisParams,
    ) -> EngineResult<SynthesisOutput> {
        let created = self.create_prediction(prompt, params).await?;

        let finished = if created.status == "succeeded" {
            created
        } else {
            let poll_url = created
                .urls
                .as_ref()
                .map(|u| u.get.clone())
                .ok_or_else(|| EngineError::synthesis_failed("prediction has no poll URL"))?;
            self.poll_prediction(&poll_url).await?
        };

        Self::extract_output_url(finished.output).map(SynthesisOutput::Url)
    }
}

/// Outcome of `VideoSynthesizer::synthesize_to_file`.
#[derive(Debug)]
pub struct SynthesisOutcome {
    /// Path the artifact was written to.
    pub output_path: PathBuf,
    /// True when the fallback artifact was used instead of service output.
    pub used_fallback: bool,
    /// Attempts made against the service.
    pub attempts: u32,
}

/// Drives a `SynthesisService` with bounded retries and writes the result
/// (or the fallback artifact) to disk.
pub struct VideoSynthesizer {
    service: Arc<dyn SynthesisService>,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
    placeholder: Option<PathBuf>,
}

impl VideoSynthesizer {
    pub fn new(service: Arc<dyn SynthesisService>) -> Self {
        Self {
            service,
            client: Client::new(),
            max_retries: 1,
            retry_delay: Duration::from_secs(5),
            placeholder: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Option<PathBuf>) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Synthesize a video and write it to `output_path`.
    ///
    /// Retries the service up to the configured budget. When the budget is
    /// exhausted, writes the fallback artifact instead. Returns `Err` only
    /// when even the fallback cannot be written.
    pub async fn synthesize_to_file(
        &self,
        prompt: &str,
        params: &SynthesisParams,
        output_path: &Path,
    ) -> EngineResult<SynthesisOutcome> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let retry = RetryConfig::new("video synthesis")
            .with_max_retries(self.max_retries)
            .with_delay(self.retry_delay);

        let outcome = retry_fixed(&retry, || self.service.synthesize(prompt, params)).await;

        match outcome {
            RetryOutcome::Success {
                value: output,
                attempts,
            } => {
                self.write_output(output, output_path).await?;
                info!(path = %output_path.display(), attempts, "Synthesis succeeded");
                Ok(SynthesisOutcome {
                    output_path: output_path.to_path_buf(),
                    used_fallback: false,
                    attempts,
                })
            }
            RetryOutcome::Exhausted { error, attempts } => {
                warn!(
                    attempts,
                    "Synthesis exhausted, writing fallback artifact: {error}"
                );
                self.write_fallback(output_path).await?;
                Ok(SynthesisOutcome {
                    output_path: output_path.to_path_buf(),
                    used_fallback: true,
                    attempts,
                })
            }
        }
    }

    async fn write_output(&self, output: SynthesisOutput, path: &Path) -> EngineResult<()> {
        match output {
            SynthesisOutput::Bytes(bytes) => {
                tokio::fs::write(path, bytes).await?;
            }
            SynthesisOutput::Url(url) => {
                let response = self.client.get(&url).send().await.map_err(|e| {
                    EngineError::synthesis_failed(format!("download failed: {e}"))
                })?;
                if !response.status().is_success() {
                    return Err(EngineError::synthesis_failed(format!(
                        "download returned {}",
                        response.status()
                    )));
                }
                // Stream to disk; generated videos can run to many MB.
                let mut file = tokio::fs::File::create(path).await?;
                let mut stream = response.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| {
                        EngineError::synthesis_failed(format!("download read failed: {e}"))
                    })?;
                    file.write_all(&chunk).await?;
                }
                file.flush().await?;
            }
        }
        Ok(())
    }

    async fn write_fallback(&self, path: &Path) -> EngineResult<()> {
        match &self.placeholder {
            Some(placeholder) if tokio::fs::try_exists(placeholder).await.unwrap_or(false) => {
                tokio::fs::copy(placeholder, path).await?;
            }
            _ => {
                tokio::fs::write(path, &[]).await?;
            }
        }
        Ok(())
    }
}
