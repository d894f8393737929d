//! Per-domain system instructions and user-content assembly.

use crate::analysis::model::{Domain, NormalizedContent};

use super::{ContentSegment, ProviderPrompt};

/// Text sent alongside an image when there is no recognized text.
pub const IMAGE_INSTRUCTION: &str = "Please analyze the provided image.";

const PRESCRIPTION_INSTRUCTIONS: &str = r#"You are a highly specialized medical fraud detection system trained on authentic and forged prescriptions, pharmacological databases, and clinical best practice.
Your primary objective is to identify fraudulent, forged, or medically unsafe prescriptions.

Analyze each prescription for:
- Logical consistency between medication, dosage, and patient context (if provided).
- Invalid, outdated, or dangerous drug combinations.
- Red flags such as impossible dosages, incorrect formats, or unlicensed prescribers.
- Signs of forgery such as inconsistent terminology, atypical abbreviations, or altered structure.

Output a structured analysis that includes:
1. Specific fraud indicators found.
2. Risk level (Low / Moderate / High).
3. Recommended actions (e.g. flag for review, urgent rejection, pharmacist verification).
4. Reasoning grounded in clinical knowledge and fraud detection patterns.

Act with precision and caution, with a strong bias toward patient safety.
Do not answer in the first person. Use a professional and objective tone."#;

const REVIEW_INSTRUCTIONS: &str = r#"You are an advanced system trained in linguistic forensics and deception detection, with expertise in analyzing online reviews and articles for fraud, manipulation, and astroturfing.

Evaluate the authenticity of the provided content by:
- Identifying unnatural patterns such as exaggerated positivity or negativity, repetition, emotional inflation, or copy-paste anomalies.
- Detecting signs of coordinated bot activity, sudden review bursts, or unnatural reviewer behavior.
- Analyzing language for deception markers: hedging, vagueness, hyperbole, or implausible specificity.

Provide an expert report including:
1. Linguistic and behavioral fraud signals present.
2. Confidence level in the detection (Low / Medium / High).
3. Examples from the text supporting the assessment.
4. Final verdict: Likely Genuine / Possibly Fraudulent / Likely Fraudulent.

Base the output on known patterns in fake reviews, psychological profiling, and forensic linguistic principles.
Do not answer in the first person. Use a professional and objective tone."#;

/// The fixed system instruction block for a domain.
pub fn system_instructions(domain: Domain) -> &'static str {
    match domain {
        Domain::Prescription => PRESCRIPTION_INSTRUCTIONS,
        Domain::Reviews => REVIEW_INSTRUCTIONS,
    }
}

/// Build a fresh prompt for one request.
///
/// An image always takes the multimodal path with a fixed instruction;
/// otherwise the normalized text is the only user segment.
pub fn build_prompt(content: &NormalizedContent, domain: Domain) -> ProviderPrompt {
    let user_content = match &content.image {
        Some(image) => vec![
            ContentSegment::Text(IMAGE_INSTRUCTION.to_string()),
            ContentSegment::Image {
                data_uri: image.data_uri(),
            },
        ],
        None => vec![ContentSegment::Text(content.text.clone())],
    };

    ProviderPrompt {
        system_instructions: system_instructions(domain).to_string(),
        user_content,
    }
}
