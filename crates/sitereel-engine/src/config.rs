//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration, threaded explicitly through the orchestrator
/// rather than read from ambient globals.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory for generated video artifacts
    pub output_dir: PathBuf,
    /// Directory for acquired reference images
    pub image_dir: PathBuf,
    /// Maximum reference images acquired per job
    pub max_images: usize,
    /// Maximum concurrently running pipeline workers
    pub max_workers: usize,
    /// Synthesis retries after the initial attempt
    pub synthesis_max_retries: u32,
    /// Fixed delay between synthesis attempts
    pub synthesis_retry_delay: Duration,
    /// Pre-staged placeholder video copied when synthesis is exhausted
    pub placeholder_path: Option<PathBuf>,
    /// Scroll attempts while waiting for lazy content
    pub scroll_max_attempts: u32,
    /// Wait per scroll attempt
    pub scroll_wait: Duration,
    /// Default character budget for summaries
    pub summary_max_chars: usize,
    /// Per-request page fetch timeout
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./video"),
            image_dir: PathBuf::from("./downloaded_images"),
            max_images: 5,
            max_workers: 4,
            synthesis_max_retries: 1,
            synthesis_retry_delay: Duration::from_secs(5),
            placeholder_path: None,
            scroll_max_attempts: 5,
            scroll_wait: Duration::from_secs(2),
            summary_max_chars: 300,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("VIDEO_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            image_dir: std::env::var("IMAGE_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.image_dir),
            max_images: env_parse("MAX_REFERENCE_IMAGES", defaults.max_images),
            max_workers: env_parse("ENGINE_MAX_WORKERS", defaults.max_workers),
            synthesis_max_retries: env_parse("SYNTHESIS_MAX_RETRIES", defaults.synthesis_max_retries),
            synthesis_retry_delay: Duration::from_secs(env_parse("SYNTHESIS_RETRY_DELAY_SECS", 5)),
            placeholder_path: std::env::var("FALLBACK_VIDEO_PATH").ok().map(PathBuf::from),
            scroll_max_attempts: env_parse("SCROLL_MAX_ATTEMPTS", defaults.scroll_max_attempts),
            scroll_wait: Duration::from_secs(env_parse("SCROLL_WAIT_SECS", 2)),
            summary_max_chars: env_parse("SUMMARY_MAX_CHARS", defaults.summary_max_chars),
            fetch_timeout: Duration::from_secs(env_parse("FETCH_TIMEOUT_SECS", 10)),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
