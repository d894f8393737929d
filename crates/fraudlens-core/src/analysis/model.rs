//! Analysis domain models.

use base64::Engine;
use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};

/// Kind of content submitted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Url,
    Text,
}

impl InputKind {
    /// Parse from the wire name. `webcam` frames are images.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" | "webcam" => Some(Self::Image),
            "url" => Some(Self::Url),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Url => "url",
            Self::Text => "text",
        }
    }
}

/// Analysis persona: selects system instructions and fraud keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    #[default]
    Prescription,
    Reviews,
}

impl Domain {
    /// Parse from the wire name. `review` is accepted for `reviews`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "prescription" => Some(Self::Prescription),
            "reviews" | "review" => Some(Self::Reviews),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prescription => "prescription",
            Self::Reviews => "reviews",
        }
    }
}

/// A validated analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub input_kind: InputKind,
    pub raw_content: String,
    pub domain: Domain,
}

impl AnalysisRequest {
    /// Validate the loosely-typed request fields.
    ///
    /// A missing `model_type` falls back to [`Domain::Prescription`]; a present
    /// but unknown one is rejected.
    pub fn from_fields(
        input_type: Option<&str>,
        content: Option<&str>,
        model_type: Option<&str>,
    ) -> AnalysisResult<Self> {
        let (input_type, content) = match (input_type, content) {
            (Some(i), Some(c)) => (i, c),
            _ => return Err(AnalysisError::validation("Missing Fields: input_type and content are required")),
        };

        let input_kind = InputKind::parse(input_type)
            .ok_or_else(|| AnalysisError::validation(format!("Invalid input type '{}'", input_type)))?;

        let domain = match model_type {
            None => Domain::default(),
            Some(m) => Domain::parse(m)
                .ok_or_else(|| AnalysisError::validation(format!("Invalid model type '{}'", m)))?,
        };

        if content.trim().is_empty() {
            return Err(AnalysisError::validation(format!(
                "content must not be empty for input type '{}'",
                input_kind.as_str()
            )));
        }

        Ok(Self {
            input_kind,
            raw_content: content.to_string(),
            domain,
        })
    }
}

/// A decoded image ready for multimodal submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl ImagePayload {
    /// Render as a `data:` URI.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Normalized input: bounded text, an image, or both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedContent {
    pub text: String,
    pub image: Option<ImagePayload>,
}

impl NormalizedContent {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image.is_none()
    }
}

/// The terminal fraud determination returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub fraud_detected: bool,
    pub confidence: f64,
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_aliases() {
        assert_eq!(InputKind::parse("webcam"), Some(InputKind::Image));
        assert_eq!(InputKind::parse("URL"), Some(InputKind::Url));
        assert_eq!(InputKind::parse("pdf"), None);
    }

    #[test]
    fn test_domain_aliases() {
        assert_eq!(Domain::parse("review"), Some(Domain::Reviews));
        assert_eq!(Domain::parse("reviews"), Some(Domain::Reviews));
        assert_eq!(Domain::parse("Prescription"), Some(Domain::Prescription));
        assert_eq!(Domain::parse("legal"), None);
    }

    #[test]
    fn test_from_fields_missing() {
        let err = AnalysisRequest::from_fields(Some("url"), None, None).unwrap_err();
        assert!(matches!(err, AnalysisError::InputValidation(_)));
    }

    #[test]
    fn test_from_fields_rejects_unknown_domain() {
        let err = AnalysisRequest::from_fields(Some("text"), Some("hello"), Some("legal")).unwrap_err();
        assert!(err.to_string().contains("Invalid model type"));
    }

    #[test]
    fn test_from_fields_rejects_blank_content() {
        for kind in ["image", "url", "text", "webcam"] {
            let err = AnalysisRequest::from_fields(Some(kind), Some("   "), Some("reviews")).unwrap_err();
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn test_from_fields_defaults_domain() {
        let req = AnalysisRequest::from_fields(Some("text"), Some("hi"), None).unwrap();
        assert_eq!(req.domain, Domain::Prescription);
        assert_eq!(req.input_kind, InputKind::Text);
    }

    #[test]
    fn test_data_uri() {
        let payload = ImagePayload { bytes: b"abc".to_vec(), mime_type: "image/png" };
        assert_eq!(payload.data_uri(), "data:image/png;base64,YWJj");
    }
}
