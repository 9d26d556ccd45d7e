//! Image candidate extraction from a rendered page.
//!
//! Pure DOM reads: no network I/O happens here. Candidates are resolved to
//! absolute URLs and deduplicated; downloading and quality filtering is the
//! acquirer's job.

use std::collections::HashSet;

use sitereel_models::ImageCandidate;
use tracing::{debug, warn};
use url::Url;

use crate::renderer::{DomElement, PageRenderer};

/// Lazy-load attributes tried, in order, when `src` is unusable.
const LAZY_SRC_ATTRS: [&str; 4] = ["data-src", "data-lazy-src", "data-original", "data-srcset"];

/// Inline data URIs shorter than this are almost certainly 1x1 placeholders.
const MIN_DATA_URI_LEN: usize = 1000;

/// Enumerate all image candidates on the current page.
///
/// Relative sources are resolved against `page_url`. Candidates are
/// deduplicated by resolved URL, first occurrence winning. A renderer
/// failure degrades to an empty list.
pub async fn extract_image_candidates(
    renderer: &dyn PageRenderer,
    page_url: &str,
) -> Vec<ImageCandidate> {
    let elements = match renderer.find_all("img").await {
        Ok(elements) => elements,
        Err(e) => {
            warn!("Failed to enumerate image elements: {e}");
            return Vec::new();
        }
    };
    debug!(count = elements.len(), "Found image elements");

    let base_url = Url::parse(page_url).ok();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for element in &elements {
        let Some(src) = resolve_source(element, base_url.as_ref()) else {
            continue;
        };
        if seen.insert(src.clone()) {
            candidates.push(ImageCandidate {
                url: src,
                alt_text: element.attribute("alt").unwrap_or_default().to_string(),
                title: element.attribute("title").unwrap_or_default().to_string(),
            });
        }
    }

    debug!(count = candidates.len(), "Unique image candidates");
    candidates
}

/// Resolve a usable source URL for one image element, or `None` to skip it.
fn resolve_source(element: &DomElement, base_url: Option<&Url>) -> Option<String> {
    let mut src = element
        .attribute("src")
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    // Lazy-loaded images park a placeholder GIF in src and the real source
    // in a data attribute.
    let placeholder = match &src {
        None => true,
        Some(s) => s.ends_with(".gif") || s.contains("data:image/gif"),
    };
    if placeholder {
        for attr in LAZY_SRC_ATTRS {
            if let Some(alt_src) = element.attribute(attr).filter(|s| !s.is_empty()) {
                src = Some(alt_src.to_string());
                break;
            }
        }
    }

    let mut src = src?;

    // WebP is excluded by policy: the downstream variance check cannot
    // decode it in this pipeline.
    let lower = src.to_lowercase();
    if lower.ends_with(".webp") || lower.contains(".webp?") {
        debug!(url = %src, "Skipping WebP image");
        return None;
    }

    if !src.starts_with("http://") && !src.starts_with("https://") && !src.starts_with("data:") {
        src = base_url?.join(&src).ok()?.to_string();
    }

    if src.starts_with("data:") && src.len() < MIN_DATA_URI_LEN {
        return None;
    }

    Some(src)
}
