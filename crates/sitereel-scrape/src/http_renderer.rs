//! Default `PageRenderer` backed by plain HTTP and HTML parsing.
//!
//! Serves the renderer contract without a browser: the whole document is
//! available after `navigate`, so scrolling is an immediate no-op. A
//! headless-browser implementation can replace this behind the same trait
//! when pages need JavaScript to materialize content.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::dom::{document_title, select_elements};
use crate::error::{ScrapeError, ScrapeResult};
use crate::renderer::{DomElement, PageRenderer};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct HttpRenderer {
    client: reqwest::Client,
    html: Option<String>,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> ScrapeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, html: None })
    }

    fn html(&self) -> ScrapeResult<&str> {
        self.html
            .as_deref()
            .ok_or_else(|| ScrapeError::renderer("no page loaded; call navigate first"))
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn navigate(&mut self, url: &str) -> ScrapeResult<()> {
        debug!(url, "Fetching page");
        let response = self.client.get(url).send().await?.error_for_status()?;
        self.html = Some(response.text().await?);
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn scroll_to_bottom_until_stable(
        &mut self,
        _max_attempts: u32,
        _wait_per_attempt: Duration,
    ) -> ScrapeResult<()> {
        // Static HTML never grows; the document is already exhausted.
        self.html()?;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> ScrapeResult<Vec<DomElement>> {
        select_elements(self.html()?, selector)
    }

    async fn title(&self) -> ScrapeResult<String> {
        Ok(document_title(self.html()?))
    }

    async fn close(&mut self) {
        self.html = None;
    }
}
