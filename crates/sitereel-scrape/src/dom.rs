//! HTML query helpers shared by the HTTP renderer and test fixtures.
//!
//! `scraper`'s parsed document is not `Send`, so queries parse the source
//! on demand and materialize matches into `DomElement`s before returning.
//! Pages are only queried a handful of times per job.

use std::collections::HashMap;

use scraper::{Html, Selector};

use crate::error::{ScrapeError, ScrapeResult};
use crate::renderer::DomElement;

/// Select all elements matching `selector` from an HTML document.
pub fn select_elements(html: &str, selector: &str) -> ScrapeResult<Vec<DomElement>> {
    let selector = Selector::parse(selector)
        .map_err(|e| ScrapeError::renderer(format!("invalid selector '{selector}': {e}")))?;
    let document = Html::parse_document(html);

    let elements = document
        .select(&selector)
        .map(|el| {
            let attributes: HashMap<String, String> = el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            DomElement::new(attributes, normalize_text(el.text()))
        })
        .collect();

    Ok(elements)
}

/// The document `<title>` text, or empty when absent.
pub fn document_title(html: &str) -> String {
    select_elements(html, "title")
        .ok()
        .and_then(|mut els| els.drain(..).next())
        .map(|el| el.text().to_string())
        .unwrap_or_default()
}

fn normalize_text<'a>(chunks: impl Iterator<Item = &'a str>) -> String {
    let joined = chunks.collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_elements_materializes_attributes_and_text() {
        let html = r#"<html><body><img src="/a.jpg" alt="Logo"><p>  Hello
            world  </p></body></html>"#;

        let imgs = select_elements(html, "img").unwrap();
        assert_eq!(imgs.len(), 1);
        assert_eq!(imgs[0].attribute("src"), Some("/a.jpg"));
        assert_eq!(imgs[0].attribute("alt"), Some("Logo"));

        let paragraphs = select_elements(html, "p").unwrap();
        assert_eq!(paragraphs[0].text(), "Hello world");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        assert!(select_elements("<html></html>", ":::").is_err());
    }

    #[test]
    fn test_document_title() {
        let html = "<html><head><title>Acme Widgets</title></head></html>";
        assert_eq!(document_title(html), "Acme Widgets");
        assert_eq!(document_title("<html></html>"), "");
    }
}
