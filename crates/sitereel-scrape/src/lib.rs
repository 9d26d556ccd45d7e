//! Page scraping for the SiteReel pipeline.
//!
//! This crate provides:
//! - The `PageRenderer` contract the pipeline depends on
//! - A default renderer backed by plain HTTP + HTML parsing
//! - Image candidate extraction and the quality filter/acquirer
//! - Text content extraction into a `ContentBundle`
//! - Test fixtures (`testing` module)

pub mod acquire;
pub mod dom;
pub mod error;
pub mod http_renderer;
pub mod images;
pub mod renderer;
pub mod testing;
pub mod text;

pub use acquire::ImageAcquirer;
pub use error::{ScrapeError, ScrapeResult};
pub use http_renderer::HttpRenderer;
pub use images::extract_image_candidates;
pub use renderer::{DomElement, PageRenderer};
pub use text::extract_content;
