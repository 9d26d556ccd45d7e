//! Text content extraction into a `ContentBundle`.

use sitereel_models::{ContentBundle, Heading};
use tracing::warn;

use crate::error::ScrapeResult;
use crate::renderer::PageRenderer;

/// CSS selectors for call-to-action styled elements, beyond plain buttons.
const CTA_SELECTOR: &str = "a.btn, .button, [role='button']";

/// Extract the page's textual content.
///
/// Any renderer failure degrades to an all-empty bundle: downstream
/// summarization still proceeds and just produces a generic result.
pub async fn extract_content(renderer: &dyn PageRenderer) -> ContentBundle {
    match try_extract(renderer).await {
        Ok(bundle) => bundle,
        Err(e) => {
            warn!("Text extraction failed, returning empty bundle: {e}");
            ContentBundle::default()
        }
    }
}

async fn try_extract(renderer: &dyn PageRenderer) -> ScrapeResult<ContentBundle> {
    let title = renderer.title().await?;

    let meta_description = renderer
        .find_all("meta[name='description']")
        .await?
        .first()
        .and_then(|el| el.attribute("content"))
        .unwrap_or_default()
        .to_string();

    let mut headings = Vec::new();
    for level in 1..=6u8 {
        for element in renderer.find_all(&format!("h{level}")).await? {
            let text = element.text().trim().to_string();
            if !text.is_empty() {
                headings.push(Heading { level, text });
            }
        }
    }

    let paragraphs = nonempty_texts(renderer, "p").await?;
    let list_items = nonempty_texts(renderer, "li").await?;

    let mut call_to_actions = nonempty_texts(renderer, "button").await?;
    call_to_actions.extend(nonempty_texts(renderer, CTA_SELECTOR).await?);

    Ok(ContentBundle {
        title,
        meta_description,
        headings,
        paragraphs,
        list_items,
        call_to_actions,
    })
}

async fn nonempty_texts(renderer: &dyn PageRenderer, selector: &str) -> ScrapeResult<Vec<String>> {
    Ok(renderer
        .find_all(selector)
        .await?
        .iter()
        .map(|el| el.text().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect())
}
