//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Summarization failed: {0}")]
    SummarizeFailed(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scrape error: {0}")]
    Scrape(#[from] sitereel_scrape::ScrapeError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn summarize_failed(msg: impl Into<String>) -> Self {
        Self::SummarizeFailed(msg.into())
    }

    pub fn synthesis_failed(msg: impl Into<String>) -> Self {
        Self::SynthesisFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
