//! Content normalization.
//!
//! Converts each input kind into bounded plain text, or into an image payload
//! for the provider's multimodal path when no text can be recognized.

pub mod html;
pub mod image;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::analysis::model::{AnalysisRequest, InputKind, NormalizedContent};
use crate::config::Settings;
use crate::error::{AnalysisError, AnalysisResult};
use crate::fetch::Fetcher;

pub use self::html::extract_readable_text;
pub use self::image::{decode_image, preprocess_for_ocr, OcrEngine, OcrError, TesseractOcr};

/// Cut `text` to at most `max_chars` characters.
///
/// The cut is a hard character boundary with no word awareness.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Turns an [`AnalysisRequest`] into [`NormalizedContent`].
#[derive(Clone)]
pub struct Normalizer {
    fetcher: Fetcher,
    ocr: Option<Arc<dyn OcrEngine>>,
    max_chars: usize,
}

impl Normalizer {
    pub fn new(fetcher: Fetcher, ocr: Option<Arc<dyn OcrEngine>>, max_chars: usize) -> Self {
        Self {
            fetcher,
            ocr,
            max_chars,
        }
    }

    /// Build with the default fetcher and, when enabled, the Tesseract engine.
    pub fn from_settings(settings: &Settings) -> AnalysisResult<Self> {
        let fetcher = Fetcher::new(&settings.fetch)?;
        let ocr: Option<Arc<dyn OcrEngine>> = if settings.ocr.enabled {
            Some(Arc::new(TesseractOcr::new(&settings.ocr)))
        } else {
            None
        };
        Ok(Self::new(fetcher, ocr, settings.normalize.max_chars))
    }

    pub async fn normalize(&self, request: &AnalysisRequest) -> AnalysisResult<NormalizedContent> {
        let content = match request.input_kind {
            InputKind::Image => self.normalize_image(&request.raw_content).await?,
            InputKind::Url => self.normalize_url(&request.raw_content).await?,
            InputKind::Text => self.normalize_text(&request.raw_content)?,
        };

        if content.is_empty() {
            return Err(AnalysisError::validation("No analysable content after processing input"));
        }
        Ok(content)
    }

    async fn normalize_image(&self, raw: &str) -> AnalysisResult<NormalizedContent> {
        let payload = decode_image(raw)?;

        if let Some(ocr) = &self.ocr {
            match ocr.recognize(&payload).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(engine = ocr.name(), chars = text.chars().count(), "OCR recognized text");
                    return Ok(NormalizedContent::from_text(truncate_chars(text.trim(), self.max_chars)));
                }
                Ok(_) => {
                    debug!(engine = ocr.name(), "OCR found no text, submitting image");
                }
                Err(e) => {
                    warn!(engine = ocr.name(), error = %e, "OCR failed, submitting image");
                }
            }
        }

        Ok(NormalizedContent {
            text: String::new(),
            image: Some(payload),
        })
    }

    async fn normalize_url(&self, raw: &str) -> AnalysisResult<NormalizedContent> {
        let page = self.fetcher.fetch(raw).await?;
        let text = extract_readable_text(&page.html);
        if text.is_empty() {
            return Err(AnalysisError::validation(format!(
                "No readable text found at {}",
                page.final_url
            )));
        }
        Ok(NormalizedContent::from_text(truncate_chars(&text, self.max_chars)))
    }

    fn normalize_text(&self, raw: &str) -> AnalysisResult<NormalizedContent> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(AnalysisError::validation("text content is empty"));
        }
        Ok(NormalizedContent::from_text(truncate_chars(text, self.max_chars)))
    }
}
