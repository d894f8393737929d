//! Base64 image decoding and optical character recognition.

use std::io::Cursor;
use std::process::Stdio;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use image::{DynamicImage, ImageFormat};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::analysis::model::ImagePayload;
use crate::config::OcrSettings;
use crate::error::{AnalysisError, AnalysisResult};

/// Decode a base64 image, with or without a `data:` URI prefix.
pub fn decode_image(raw: &str) -> AnalysisResult<ImagePayload> {
    let body = match raw.split_once(',') {
        Some((head, body)) if head.trim_start().starts_with("data:") => body,
        _ => raw,
    };
    let cleaned: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(AnalysisError::decoding("image payload is empty"));
    }

    let engine = base64::engine::general_purpose::STANDARD;
    let bytes = engine
        .decode(&cleaned)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(&cleaned))
        .map_err(|e| AnalysisError::decoding(format!("invalid base64 image data: {}", e)))?;

    let mime_type = sniff_image_mime(&bytes)
        .ok_or_else(|| AnalysisError::decoding("unsupported image format (expected jpg, png, bmp, gif or webp)"))?;

    debug!(size = bytes.len(), mime_type, "Decoded image payload");
    Ok(ImagePayload { bytes, mime_type })
}

/// Detect an image MIME type from magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
        Some("image/bmp")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Median filter radius used to suppress speckle before binarization.
const DENOISE_RADIUS: u32 = 1;

/// Clean an image up for recognition: drop alpha, convert to grayscale,
/// median-denoise, then binarize at the Otsu threshold. Returns PNG bytes.
pub fn preprocess_for_ocr(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let gray = image::load_from_memory(bytes)?.to_luma8();
    let mut gray = imageproc::filter::median_filter(&gray, DENOISE_RADIUS, DENOISE_RADIUS);

    let level = imageproc::contrast::otsu_level(&gray);
    for pixel in gray.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { 255 } else { 0 };
    }

    let mut out = Vec::new();
    DynamicImage::ImageLuma8(gray).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("failed to start OCR engine '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("OCR engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Converts image pixels to text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, image: &ImagePayload) -> Result<String, OcrError>;
}

/// Runs the `tesseract` executable, streaming the image over stdin.
pub struct TesseractOcr {
    command: String,
    preprocess: bool,
    oem: u8,
    psm: u8,
}

impl TesseractOcr {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            command: settings.command.clone(),
            preprocess: settings.preprocess,
            oem: settings.oem,
            psm: settings.psm,
        }
    }

    /// Preprocessed bytes, or the original bytes when preprocessing fails.
    async fn prepare(&self, image: &ImagePayload) -> Vec<u8> {
        if !self.preprocess {
            return image.bytes.clone();
        }
        let raw = image.bytes.clone();
        match tokio::task::spawn_blocking(move || preprocess_for_ocr(&raw)).await {
            Ok(Ok(processed)) => processed,
            Ok(Err(e)) => {
                debug!(error = %e, "Image preprocessing failed, using original");
                image.bytes.clone()
            }
            Err(e) => {
                warn!(error = %e, "Image preprocessing task failed, using original");
                image.bytes.clone()
            }
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "--oem".to_string(),
            self.oem.to_string(),
            "--psm".to_string(),
            self.psm.to_string(),
        ]
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &ImagePayload) -> Result<String, OcrError> {
        let input = self.prepare(image).await;
        let mut child = Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&input).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_plain_base64() {
        let payload = decode_image(PNG_1X1).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert!(payload.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_decode_strips_data_uri() {
        let uri = format!("data:image/png;base64,{}", PNG_1X1);
        let payload = decode_image(&uri).unwrap();
        assert_eq!(payload.mime_type, "image/png");
    }

    #[test]
    fn test_decode_tolerates_line_breaks() {
        let wrapped = format!("{}\n{}", &PNG_1X1[..20], &PNG_1X1[20..]);
        assert!(decode_image(&wrapped).is_ok());
    }

    #[test]
    fn test_malformed_base64() {
        let err = decode_image("!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, AnalysisError::InputDecoding(_)));
        assert!(err.to_string().to_lowercase().contains("image"));
    }

    #[test]
    fn test_valid_base64_but_not_an_image() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"fake_image_data");
        let err = decode_image(&encoded).unwrap_err();
        assert!(err.to_string().contains("unsupported image format"));
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_mime(b"BM\0\0\0\0\0\0\0\0\0\0\0\0\0\0"), Some("image/bmp"));
        assert_eq!(sniff_image_mime(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_tesseract_args() {
        let ocr = TesseractOcr::new(&OcrSettings::default());
        assert_eq!(ocr.args(), vec!["stdin", "stdout", "--oem", "3", "--psm", "6"]);
    }

    #[tokio::test]
    async fn test_missing_engine_is_an_error() {
        let ocr = TesseractOcr::new(&OcrSettings {
            command: "definitely-not-a-real-ocr-binary".to_string(),
            ..OcrSettings::default()
        });
        let payload = decode_image(PNG_1X1).unwrap();
        let err = ocr.recognize(&payload).await.unwrap_err();
        assert!(matches!(err, OcrError::Spawn { .. }));
    }

    fn two_tone_png() -> Vec<u8> {
        let img = image::RgbaImage::from_fn(16, 8, |x, _| {
            if x < 8 {
                image::Rgba([20, 20, 20, 255])
            } else {
                image::Rgba([230, 230, 230, 128])
            }
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_preprocess_binarizes() {
        let processed = preprocess_for_ocr(&two_tone_png()).unwrap();
        assert_eq!(sniff_image_mime(&processed), Some("image/png"));

        let gray = image::load_from_memory(&processed).unwrap().to_luma8();
        assert_eq!(gray.dimensions(), (16, 8));
        assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(gray.get_pixel(2, 4).0[0], 0);
        assert_eq!(gray.get_pixel(13, 4).0[0], 255);
    }

    #[test]
    fn test_preprocess_rejects_truncated_image() {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.resize(64, 0);
        assert!(preprocess_for_ocr(&bytes).is_err());
    }

    #[tokio::test]
    async fn test_prepare_falls_back_to_original_bytes() {
        let ocr = TesseractOcr::new(&OcrSettings::default());
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.resize(64, 0);
        let payload = ImagePayload { bytes: bytes.clone(), mime_type: "image/png" };
        assert_eq!(ocr.prepare(&payload).await, bytes);

        let clean = ImagePayload { bytes: two_tone_png(), mime_type: "image/png" };
        assert_ne!(ocr.prepare(&clean).await, clean.bytes);

        let raw = TesseractOcr::new(&OcrSettings { preprocess: false, ..OcrSettings::default() });
        assert_eq!(raw.prepare(&clean).await, clean.bytes);
    }
}
