//! Structured text content extracted from a rendered page.

use serde::{Deserialize, Serialize};

/// A heading element with its level (1-6) in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// The textual extraction of a page, prior to summarization.
///
/// Sequences preserve document order. An all-empty bundle is a valid
/// result: extraction degrades gracefully instead of failing the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBundle {
    pub title: String,
    pub meta_description: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub list_items: Vec<String>,
    pub call_to_actions: Vec<String>,
}

impl ContentBundle {
    /// Check whether extraction produced nothing at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.meta_description.is_empty()
            && self.headings.is_empty()
            && self.paragraphs.is_empty()
            && self.list_items.is_empty()
            && self.call_to_actions.is_empty()
    }

    /// Flatten the bundle into a single space-joined text block.
    pub fn all_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.paragraphs.iter().map(String::as_str));
        parts.extend(self.headings.iter().map(|h| h.text.as_str()));
        parts.extend(self.list_items.iter().map(String::as_str));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bundle() {
        let bundle = ContentBundle::default();
        assert!(bundle.is_empty());
        assert_eq!(bundle.all_text(), "");
    }

    #[test]
    fn test_all_text_joins_in_order() {
        let bundle = ContentBundle {
            title: "Acme".into(),
            paragraphs: vec!["First paragraph.".into()],
            headings: vec![Heading {
                level: 1,
                text: "Welcome".into(),
            }],
            list_items: vec!["Fast".into(), "Cheap".into()],
            ..Default::default()
        };

        assert!(!bundle.is_empty());
        assert_eq!(bundle.all_text(), "First paragraph. Welcome Fast Cheap");
    }
}
