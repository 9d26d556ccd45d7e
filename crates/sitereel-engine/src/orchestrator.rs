//! Job orchestration: the in-memory registry and the scrape → summarize
//! → synthesize pipeline.
//!
//! Jobs move Processing → Completed | Failed and never leave a terminal
//! state. Lookups hand out cloned snapshots so callers never observe a
//! job mid-update. Even failed jobs leave an artifact at their output
//! path so the download surface stays total.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sitereel_models::{FilterCriteria, Job, JobId};
use sitereel_scrape::{
    extract_content, extract_image_candidates, HttpRenderer, ImageAcquirer, PageRenderer,
};
use tokio::sync::{RwLock, Semaphore};
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::summarize::{summarize_or_fallback, Summarizer};
use crate::synthesize::{build_video_prompt, SynthesisParams, SynthesisService, VideoSynthesizer};

/// Creates a fresh page renderer per job.
///
/// Renderers hold per-page state, so each pipeline run gets its own.
#[async_trait]
pub trait RendererProvider: Send + Sync {
    async fn create(&self) -> EngineResult<Box<dyn PageRenderer>>;
}

/// Default provider backed by the plain-HTTP renderer.
pub struct HttpRendererProvider {
    fetch_timeout: std::time::Duration,
}

impl HttpRendererProvider {
    pub fn new(fetch_timeout: std::time::Duration) -> Self {
        Self { fetch_timeout }
    }
}

#[async_trait]
impl RendererProvider for HttpRendererProvider {
    async fn create(&self) -> EngineResult<Box<dyn PageRenderer>> {
        Ok(Box::new(HttpRenderer::new(self.fetch_timeout)?))
    }
}

/// Per-submission options.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Character budget for the summary.
    pub max_chars: usize,
    /// Whether to acquire reference images from the page.
    pub include_images: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            max_chars: 300,
            include_images: false,
        }
    }
}

/// The pipeline orchestrator and job registry.
pub struct Orchestrator {
    config: EngineConfig,
    registry: RwLock<HashMap<JobId, Job>>,
    workers: Arc<Semaphore>,
    renderers: Arc<dyn RendererProvider>,
    summarizer: Arc<dyn Summarizer>,
    synthesis: Arc<dyn SynthesisService>,
}

impl Orchestrator {
    pub fn new(
        config: EngineConfig,
        renderers: Arc<dyn RendererProvider>,
        summarizer: Arc<dyn Summarizer>,
        synthesis: Arc<dyn SynthesisService>,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(config.max_workers));
        Self {
            config,
            registry: RwLock::new(HashMap::new()),
            workers,
            renderers,
            summarizer,
            synthesis,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reserve a unique output path under the configured output directory.
    ///
    /// The job id suffix keeps paths distinct even for submissions landing
    /// in the same millisecond.
    fn reserve_output_path(&self, job_id: &JobId) -> PathBuf {
        let short: String = job_id.as_str().chars().take(8).collect();
        self.config
            .output_dir
            .join(format!("video_{}_{}.mp4", Utc::now().timestamp_millis(), short))
    }

    fn new_job(&self, url: &str) -> Job {
        let mut job = Job::new(url, PathBuf::new());
        job.output_path = self.reserve_output_path(&job.id);
        job
    }

    /// Register a job and spawn its pipeline in the background.
    ///
    /// Returns the initial Processing snapshot immediately.
    pub async fn submit(self: &Arc<Self>, url: String, options: SubmitOptions) -> Job {
        let job = self.new_job(&url);
        let job_id = job.id.clone();

        self.registry
            .write()
            .await
            .insert(job_id.clone(), job.clone());

        let orchestrator = Arc::clone(self);
        let span = info_span!("job", id = %job_id, url = %url);
        tokio::spawn(
            async move {
                orchestrator.run_job(job_id, url, options).await;
            }
            .instrument(span),
        );

        job
    }

    /// Look up a job by id, returning a cloned snapshot.
    pub async fn status(&self, job_id: &JobId) -> Option<Job> {
        self.registry.read().await.get(job_id).cloned()
    }

    /// Run the pipeline to completion on the caller's task.
    ///
    /// Synchronous jobs never touch the registry: the terminal result goes
    /// straight back to the caller and nothing is left to look up.
    pub async fn run_sync(&self, url: String, options: SubmitOptions) -> EngineResult<Job> {
        let mut job = self.new_job(&url);

        let _permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EngineError::job_failed("worker pool shut down"))?;

        match self.run_pipeline(&url, &options, &job.output_path).await {
            Ok(()) => {
                info!(path = %job.output_path.display(), "Job completed");
                job.complete();
                Ok(job)
            }
            Err(e) => {
                error!("Job failed: {e}");
                if let Err(write_err) = ensure_artifact(&job.output_path).await {
                    error!("Could not write failure artifact: {write_err}");
                }
                Err(EngineError::job_failed(e.to_string()))
            }
        }
    }

    async fn run_job(self: &Arc<Self>, job_id: JobId, url: String, options: SubmitOptions) {
        // Semaphore is never closed while the orchestrator lives.
        let permit = match self.workers.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                self.finish_job(&job_id, Some("worker pool shut down".to_string()))
                    .await;
                return;
            }
        };

        let output_path = match self.status(&job_id).await {
            Some(job) => job.output_path,
            None => return,
        };

        let result = self.run_pipeline(&url, &options, &output_path).await;
        drop(permit);

        let error = match result {
            Ok(()) => {
                info!(path = %output_path.display(), "Job completed");
                None
            }
            Err(e) => {
                error!("Job failed: {e}");
                // Failed jobs still expose an artifact at their path.
                if let Err(write_err) = ensure_artifact(&output_path).await {
                    error!("Could not write failure artifact: {write_err}");
                }
                Some(e.to_string())
            }
        };

        self.finish_job(&job_id, error).await;
    }

    async fn finish_job(&self, job_id: &JobId, error: Option<String>) {
        let mut registry = self.registry.write().await;
        if let Some(job) = registry.get_mut(job_id) {
            match error {
                Some(msg) => job.fail(msg),
                None => job.complete(),
            }
        }
    }

    async fn run_pipeline(
        &self,
        url: &str,
        options: &SubmitOptions,
        output_path: &std::path::Path,
    ) -> EngineResult<()> {
        let mut renderer = self.renderers.create().await?;
        let result = self
            .run_stages(renderer.as_mut(), url, options, output_path)
            .await;
        renderer.close().await;
        result
    }

    async fn run_stages(
        &self,
        renderer: &mut dyn PageRenderer,
        url: &str,
        options: &SubmitOptions,
        output_path: &std::path::Path,
    ) -> EngineResult<()> {
        renderer.navigate(url).await?;
        renderer
            .scroll_to_bottom_until_stable(self.config.scroll_max_attempts, self.config.scroll_wait)
            .await?;

        let images = if options.include_images {
            let candidates = extract_image_candidates(renderer, url).await;
            info!(candidates = candidates.len(), "Extracted image candidates");
            let acquirer =
                ImageAcquirer::new(&self.config.image_dir, FilterCriteria::default())?;
            acquirer
                .acquire(&candidates, Some(self.config.max_images))
                .await
        } else {
            Vec::new()
        };

        let bundle = extract_content(renderer).await;
        if bundle.is_empty() {
            warn!("No textual content extracted; summary will be generic");
        }

        let summary =
            summarize_or_fallback(self.summarizer.as_ref(), &bundle, options.max_chars).await;
        info!(chars = summary.len(), "Summary ready");

        let prompt = build_video_prompt(&summary, &images);
        let synthesizer = VideoSynthesizer::new(Arc::clone(&self.synthesis))
            .with_max_retries(self.config.synthesis_max_retries)
            .with_retry_delay(self.config.synthesis_retry_delay)
            .with_placeholder(self.config.placeholder_path.clone());

        let outcome = synthesizer
            .synthesize_to_file(&prompt, &SynthesisParams::default(), output_path)
            .await?;

        if outcome.used_fallback {
            warn!(attempts = outcome.attempts, "Job finished with fallback video");
        }

        Ok(())
    }
}

/// Guarantee a file exists at `path`, writing an empty one if needed.
async fn ensure_artifact(path: &std::path::Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &[]).await
}
