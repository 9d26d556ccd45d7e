//! The page renderer contract.
//!
//! The pipeline only depends on this trait; the concrete renderer (a
//! headless browser, or the bundled HTTP renderer) is a collaborator
//! behind it. Elements are materialized into plain `DomElement` values so
//! implementations never have to keep live handles across async calls.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScrapeResult;

/// A DOM element materialized into its attributes and visible text.
#[derive(Debug, Clone, Default)]
pub struct DomElement {
    attributes: HashMap<String, String>,
    text: String,
}

impl DomElement {
    pub fn new(attributes: HashMap<String, String>, text: impl Into<String>) -> Self {
        Self {
            attributes,
            text: text.into(),
        }
    }

    /// Read an attribute value. Absent attributes return `None`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The element's whitespace-normalized text content.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Rendered-page access used by the extraction stages.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load the page at `url`.
    async fn navigate(&mut self, url: &str) -> ScrapeResult<()>;

    /// Pause for page content to settle.
    async fn wait(&self, duration: Duration);

    /// Scroll to the bottom repeatedly until the scroll height stops
    /// changing or `max_attempts` is reached.
    async fn scroll_to_bottom_until_stable(
        &mut self,
        max_attempts: u32,
        wait_per_attempt: Duration,
    ) -> ScrapeResult<()>;

    /// Find all elements matching a tag name or CSS selector.
    async fn find_all(&self, selector: &str) -> ScrapeResult<Vec<DomElement>>;

    /// The page title.
    async fn title(&self) -> ScrapeResult<String>;

    /// Release the underlying session. Safe to call more than once.
    async fn close(&mut self);
}
