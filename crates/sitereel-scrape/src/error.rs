//! Scrape error types.

use thiserror::Error;

pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    pub fn renderer(msg: impl Into<String>) -> Self {
        Self::Renderer(msg.into())
    }

    pub fn invalid_data_uri(msg: impl Into<String>) -> Self {
        Self::InvalidDataUri(msg.into())
    }
}
