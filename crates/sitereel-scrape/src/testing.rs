//! Test fixtures for code that consumes the renderer contract.

use std::time::Duration;

use async_trait::async_trait;

use crate::dom::{document_title, select_elements};
use crate::error::{ScrapeError, ScrapeResult};
use crate::renderer::{DomElement, PageRenderer};

/// A renderer over a fixed HTML document. `navigate` accepts any URL and
/// serves the fixture; scrolling is a no-op.
pub struct StaticRenderer {
    html: String,
    closed: bool,
}

impl StaticRenderer {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl PageRenderer for StaticRenderer {
    async fn navigate(&mut self, _url: &str) -> ScrapeResult<()> {
        Ok(())
    }

    async fn wait(&self, _duration: Duration) {}

    async fn scroll_to_bottom_until_stable(
        &mut self,
        _max_attempts: u32,
        _wait_per_attempt: Duration,
    ) -> ScrapeResult<()> {
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> ScrapeResult<Vec<DomElement>> {
        select_elements(&self.html, selector)
    }

    async fn title(&self) -> ScrapeResult<String> {
        Ok(document_title(&self.html))
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// A renderer whose every operation fails, for degradation tests.
#[derive(Default)]
pub struct FailingRenderer;

#[async_trait]
impl PageRenderer for FailingRenderer {
    async fn navigate(&mut self, _url: &str) -> ScrapeResult<()> {
        Err(ScrapeError::renderer("session lost"))
    }

    async fn wait(&self, _duration: Duration) {}

    async fn scroll_to_bottom_until_stable(
        &mut self,
        _max_attempts: u32,
        _wait_per_attempt: Duration,
    ) -> ScrapeResult<()> {
        Err(ScrapeError::renderer("session lost"))
    }

    async fn find_all(&self, _selector: &str) -> ScrapeResult<Vec<DomElement>> {
        Err(ScrapeError::renderer("session lost"))
    }

    async fn title(&self) -> ScrapeResult<String> {
        Err(ScrapeError::renderer("session lost"))
    }

    async fn close(&mut self) {}
}
