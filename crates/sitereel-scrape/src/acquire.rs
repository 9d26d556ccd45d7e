//! Image quality filtering and acquisition.
//!
//! Downloads candidate bytes (or decodes inline data URIs), applies the
//! size/dimension/variance filters, and persists only the survivors under
//! collision-safe filenames. Failures are per-candidate: one bad image
//! never aborts the batch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use sitereel_models::{AcquiredImage, FilterCriteria, ImageCandidate};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ScrapeError, ScrapeResult};

/// Characters stripped from metadata-derived filenames.
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum filename stem length.
const MAX_FILENAME_LEN: usize = 100;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_THROTTLE: Duration = Duration::from_millis(500);

pub struct ImageAcquirer {
    client: reqwest::Client,
    dest_dir: PathBuf,
    criteria: FilterCriteria,
    throttle: Duration,
}

impl ImageAcquirer {
    /// Create an acquirer saving into `dest_dir` (created if missing).
    pub fn new(dest_dir: impl Into<PathBuf>, criteria: FilterCriteria) -> ScrapeResult<Self> {
        let dest_dir = dest_dir.into();
        std::fs::create_dir_all(&dest_dir)?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            dest_dir,
            criteria,
            throttle: DEFAULT_THROTTLE,
        })
    }

    /// Set the delay inserted between downloads.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Download, filter and persist candidates in order, up to `max_images`.
    ///
    /// Returns the acquired images in candidate order. Skips are logged,
    /// never fatal.
    pub async fn acquire(
        &self,
        candidates: &[ImageCandidate],
        max_images: Option<usize>,
    ) -> Vec<AcquiredImage> {
        let limit = max_images
            .unwrap_or(candidates.len())
            .min(candidates.len());

        let mut acquired = Vec::new();
        for (index, candidate) in candidates.iter().take(limit).enumerate() {
            match self.acquire_one(candidate, index).await {
                Ok(Some(image)) => {
                    info!(url = %candidate.url, path = %image.saved_path.display(), "Saved filtered image");
                    acquired.push(image);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(url = %candidate.url, "Skipping image candidate: {e}");
                }
            }
            tokio::time::sleep(self.throttle).await;
        }

        info!(processed = limit, saved = acquired.len(), "Image acquisition finished");
        acquired
    }

    async fn acquire_one(
        &self,
        candidate: &ImageCandidate,
        index: usize,
    ) -> ScrapeResult<Option<AcquiredImage>> {
        let url = &candidate.url;

        let bytes = if url.starts_with("data:image/") {
            decode_data_uri(url)?
        } else {
            let response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                warn!(url = %url, status = %response.status(), "Image download failed");
                return Ok(None);
            }
            // Skip without reading the body when the size hint already
            // rules the image out.
            if let Some(len) = response.content_length() {
                if len > 0 && !self.size_in_range(len) {
                    debug!(url = %url, bytes = len, "Skipping: file size outside range");
                    return Ok(None);
                }
            }
            response.bytes().await?.to_vec()
        };

        if !self.size_in_range(bytes.len() as u64) {
            debug!(url = %url, bytes = bytes.len(), "Skipping: file size outside range");
            return Ok(None);
        }

        let format = image::guess_format(&bytes).ok();
        let img = image::load_from_memory(&bytes)?;

        let (width, height) = (img.width(), img.height());
        if width < self.criteria.min_width || height < self.criteria.min_height {
            debug!(url = %url, width, height, "Skipping: dimensions too small");
            return Ok(None);
        }

        let std_dev = pixel_std_dev(&img);
        if std_dev < self.criteria.variance_threshold {
            debug!(url = %url, std_dev, "Skipping: low pixel variation");
            return Ok(None);
        }

        let base = base_name(candidate, index);
        let ext = extension_for(format, url);
        let save_path = unique_path(&self.dest_dir, &base, &ext);
        tokio::fs::write(&save_path, &bytes).await?;

        Ok(Some(AcquiredImage {
            source_url: url.clone(),
            saved_path: save_path,
            alt_text: candidate.alt_text.clone(),
            title: candidate.title.clone(),
        }))
    }

    fn size_in_range(&self, size: u64) -> bool {
        size >= self.criteria.min_filesize && size <= self.criteria.max_filesize
    }
}

/// Decode the payload of an inline `data:` URI.
pub fn decode_data_uri(uri: &str) -> ScrapeResult<Vec<u8>> {
    let (_, payload) = uri
        .split_once(',')
        .ok_or_else(|| ScrapeError::invalid_data_uri("missing payload separator"))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ScrapeError::invalid_data_uri(e.to_string()))
}

/// Standard deviation of all RGB channel values, 0.0 for empty images.
pub fn pixel_std_dev(img: &DynamicImage) -> f64 {
    let rgb = img.to_rgb8();
    let pixels = rgb.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let n = pixels.len() as f64;
    let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
    let variance = pixels
        .iter()
        .map(|&p| {
            let d = p as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

/// Sanitize a metadata string into a filename stem.
///
/// Replaces `<>:"/\|?*` with underscores, trims whitespace, caps the
/// length, and substitutes `image` when nothing survives. Idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let limited: String = cleaned.trim().chars().take(MAX_FILENAME_LEN).collect();
    let limited = limited.trim();

    if limited.is_empty() {
        "image".to_string()
    } else {
        limited.to_string()
    }
}

fn base_name(candidate: &ImageCandidate, index: usize) -> String {
    if !candidate.title.trim().is_empty() {
        return sanitize_filename(&candidate.title);
    }
    if !candidate.alt_text.trim().is_empty() {
        return sanitize_filename(&candidate.alt_text);
    }
    url_file_stem(&candidate.url).unwrap_or_else(|| format!("image_{index}"))
}

fn url_file_stem(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let stem = Path::new(name).file_stem()?.to_str()?;
    if stem.is_empty() {
        None
    } else {
        Some(sanitize_filename(stem))
    }
}

fn extension_for(format: Option<ImageFormat>, url: &str) -> String {
    if let Some(ext) = format.and_then(|f| f.extensions_str().first().copied()) {
        return ext.to_string();
    }
    Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
        })
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "jpg".to_string())
}

/// Resolve filename collisions by suffixing `_1`, `_2`, ... before the
/// extension until the path is free.
fn unique_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let mut path = dir.join(format!("{base}.{ext}"));
    let mut counter = 1;
    while path.exists() {
        path = dir.join(format!("{base}_{counter}.{ext}"));
        counter += 1;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes(width: u32, height: u32, noisy: bool) -> Vec<u8> {
        let mut img = image::RgbImage::new(width, height);
        let mut seed = 0x1234_5678u32;
        for pixel in img.pixels_mut() {
            if noisy {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                *pixel = image::Rgb([(seed >> 8) as u8, (seed >> 16) as u8, (seed >> 24) as u8]);
            } else {
                *pixel = image::Rgb([200, 200, 200]);
            }
        }
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut out),
                image::ImageOutputFormat::Png,
            )
            .unwrap();
        out
    }

    fn data_uri(bytes: &[u8]) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    fn permissive_criteria() -> FilterCriteria {
        FilterCriteria {
            min_width: 1,
            min_height: 1,
            min_filesize: 0,
            max_filesize: 10_000_000,
            variance_threshold: 0.0,
        }
    }

    fn fast_acquirer(dir: &Path, criteria: FilterCriteria) -> ImageAcquirer {
        ImageAcquirer::new(dir, criteria)
            .unwrap()
            .with_throttle(Duration::from_millis(0))
    }

    #[test]
    fn test_sanitize_strips_invalid_characters() {
        assert_eq!(sanitize_filename("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_trims_and_caps_length() {
        assert_eq!(sanitize_filename("  hello  "), "hello");
        let long = "x".repeat(300);
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_sanitize_empty_defaults() {
        assert_eq!(sanitize_filename(""), "image");
        assert_eq!(sanitize_filename("   "), "image");
        assert_eq!(sanitize_filename("///"), "___");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in ["Product photo: hero/main", "  spaced  ", "", "a".repeat(150).as_str()] {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn test_pixel_std_dev_solid_vs_varied() {
        let solid = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            10,
            10,
            image::Rgb([128, 128, 128]),
        ));
        assert!(pixel_std_dev(&solid) < f64::EPSILON);

        let varied = image::load_from_memory(&png_bytes(50, 50, true)).unwrap();
        assert!(pixel_std_dev(&varied) > 20.0);
    }

    #[test]
    fn test_unique_path_suffixes_counter() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_path(dir.path(), "logo", "png");
        assert_eq!(first.file_name().unwrap(), "logo.png");
        std::fs::write(&first, b"x").unwrap();

        let second = unique_path(dir.path(), "logo", "png");
        assert_eq!(second.file_name().unwrap(), "logo_1.png");
        std::fs::write(&second, b"x").unwrap();

        let third = unique_path(dir.path(), "logo", "png");
        assert_eq!(third.file_name().unwrap(), "logo_2.png");
    }

    #[tokio::test]
    async fn test_acquire_from_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let acquirer = fast_acquirer(dir.path(), permissive_criteria());

        let candidate = ImageCandidate {
            url: data_uri(&png_bytes(16, 16, true)),
            alt_text: String::new(),
            title: "Inline logo".into(),
        };

        let acquired = acquirer.acquire(&[candidate], None).await;
        assert_eq!(acquired.len(), 1);
        assert_eq!(acquired[0].saved_path.file_name().unwrap(), "Inline logo.png");
        assert!(acquired[0].saved_path.exists());
    }

    #[tokio::test]
    async fn test_colliding_titles_get_suffixed_files() {
        let dir = tempfile::tempdir().unwrap();
        let acquirer = fast_acquirer(dir.path(), permissive_criteria());

        let make = || ImageCandidate {
            url: data_uri(&png_bytes(16, 16, true)),
            alt_text: String::new(),
            title: "Logo".into(),
        };

        let acquired = acquirer.acquire(&[make(), make()], None).await;
        assert_eq!(acquired.len(), 2);
        assert_eq!(acquired[0].saved_path.file_name().unwrap(), "Logo.png");
        assert_eq!(acquired[1].saved_path.file_name().unwrap(), "Logo_1.png");
    }

    #[tokio::test]
    async fn test_max_images_caps_batch() {
        let dir = tempfile::tempdir().unwrap();
        let acquirer = fast_acquirer(dir.path(), permissive_criteria());

        let candidates: Vec<ImageCandidate> = (0..4)
            .map(|_| ImageCandidate::new(data_uri(&png_bytes(16, 16, true))))
            .collect();

        let acquired = acquirer.acquire(&candidates, Some(2)).await;
        assert_eq!(acquired.len(), 2);
    }

    #[tokio::test]
    async fn test_filesize_bounds_reject() {
        let dir = tempfile::tempdir().unwrap();
        let criteria = FilterCriteria {
            max_filesize: 10,
            ..permissive_criteria()
        };
        let acquirer = fast_acquirer(dir.path(), criteria);

        let candidate = ImageCandidate::new(data_uri(&png_bytes(64, 64, true)));
        assert!(acquirer.acquire(&[candidate], None).await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let acquirer = fast_acquirer(dir.path(), permissive_criteria());

        let bad = ImageCandidate::new(data_uri(b"definitely not an image"));
        let good = ImageCandidate::new(data_uri(&png_bytes(16, 16, true)));

        let acquired = acquirer.acquire(&[bad, good], None).await;
        assert_eq!(acquired.len(), 1);
    }

    /// The end-to-end filter scenario: a rejected-format candidate, an
    /// undersized image, and one image that passes every stage.
    #[tokio::test]
    async fn test_filter_scenario_only_quality_image_survives() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(50, 50, true)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(400, 400, true)))
            .mount(&server)
            .await;
        // a.webp is not mounted: the server answers 404 and the candidate
        // is skipped like any other failed download.

        let dir = tempfile::tempdir().unwrap();
        let criteria = FilterCriteria {
            min_width: 200,
            min_height: 200,
            min_filesize: 0,
            max_filesize: 10_000_000,
            variance_threshold: 20.0,
        };
        let acquirer = fast_acquirer(dir.path(), criteria);

        let candidates = vec![
            ImageCandidate::new(format!("{}/a.webp", server.uri())),
            ImageCandidate::new(format!("{}/b.jpg", server.uri())),
            ImageCandidate::new(format!("{}/c.jpg", server.uri())),
        ];

        let acquired = acquirer.acquire(&candidates, None).await;
        assert_eq!(acquired.len(), 1);
        assert!(acquired[0].source_url.ends_with("/c.jpg"));
        assert!(acquired[0].saved_path.exists());
    }

    #[tokio::test]
    async fn test_low_variance_image_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let criteria = FilterCriteria {
            variance_threshold: 20.0,
            ..permissive_criteria()
        };
        let acquirer = fast_acquirer(dir.path(), criteria);

        let blank = ImageCandidate::new(data_uri(&png_bytes(300, 300, false)));
        assert!(acquirer.acquire(&[blank], None).await.is_empty());
    }
}
