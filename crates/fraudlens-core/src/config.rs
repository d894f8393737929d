//! Typed process-wide settings.
//!
//! Loaded once at startup from an optional TOML file, then overridden by
//! environment variables. Components receive the section they need.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default reasoning provider endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Default reasoning model.
pub const DEFAULT_MODEL: &str = "sonar-pro";

/// Browser-like user agent sent by the fetcher.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("PERPLEXITY_API_KEY is not set.\nSet it with: export PERPLEXITY_API_KEY=your-key")]
    MissingApiKey,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub fetch: FetchSettings,
    pub normalize: NormalizeSettings,
    pub ocr: OcrSettings,
}

/// Default request body limit: a multi-megabyte photo, base64-encoded.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 250,
            temperature: 0.25,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub retry_statuses: Vec<u16>,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_attempts: 3,
            backoff_base_ms: 200,
            retry_statuses: vec![500, 502, 503, 504],
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    /// Characters kept before text is handed to the provider.
    pub max_chars: usize,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self { max_chars: 3000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub enabled: bool,
    /// Denoise, grayscale and binarize before recognition.
    pub preprocess: bool,
    pub command: String,
    pub oem: u8,
    pub psm: u8,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            preprocess: true,
            command: "tesseract".to_string(),
            oem: 3,
            psm: 6,
        }
    }
}

impl Settings {
    /// Load from an optional TOML file, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("PERPLEXITY_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup("SONAR_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.provider.base_url = url;
        }
        if let Some(model) = lookup("SONAR_MODEL").filter(|m| !m.trim().is_empty()) {
            self.provider.model = model;
        }
        if let Some(value) = lookup("FRAUDLENS_MAX_CHARS") {
            self.normalize.max_chars = value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
                key: "FRAUDLENS_MAX_CHARS".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("FRAUDLENS_MAX_BODY_BYTES") {
            self.server.max_body_bytes = value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
                key: "FRAUDLENS_MAX_BODY_BYTES".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("FRAUDLENS_OCR") {
            self.ocr.enabled = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" => false,
                _ => {
                    return Err(SettingsError::InvalidEnv {
                        key: "FRAUDLENS_OCR".to_string(),
                        value,
                    })
                }
            };
        }
        Ok(())
    }

    /// The provider credential, or an error telling the operator how to set it.
    pub fn require_api_key(&self) -> Result<&str, SettingsError> {
        self.provider
            .api_key
            .as_deref()
            .ok_or(SettingsError::MissingApiKey)
    }

    /// A copy safe to print or log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.provider.api_key.is_some() {
            copy.provider.api_key = Some("***".to_string());
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.provider.model, "sonar-pro");
        assert_eq!(s.provider.max_tokens, 250);
        assert_eq!(s.fetch.timeout_secs, 10);
        assert_eq!(s.fetch.retry_statuses, vec![500, 502, 503, 504]);
        assert_eq!(s.normalize.max_chars, 3000);
        assert_eq!(s.ocr.psm, 6);
        assert!(s.ocr.preprocess);
        assert_eq!(s.server.max_body_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_body_limit_from_toml_and_env() {
        let mut s: Settings = toml::from_str("[server]\nmax_body_bytes = 1024\n").unwrap();
        assert_eq!(s.server.max_body_bytes, 1024);
        s.apply_env(env(&[("FRAUDLENS_MAX_BODY_BYTES", "4096")])).unwrap();
        assert_eq!(s.server.max_body_bytes, 4096);
        assert!(s.apply_env(env(&[("FRAUDLENS_MAX_BODY_BYTES", "big")])).is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let s: Settings = toml::from_str("[provider]\nmodel = \"sonar\"\n[normalize]\nmax_chars = 10\n").unwrap();
        assert_eq!(s.provider.model, "sonar");
        assert_eq!(s.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.normalize.max_chars, 10);
        assert_eq!(s.fetch.max_attempts, 3);
    }

    #[test]
    fn test_env_overrides() {
        let mut s = Settings::default();
        s.apply_env(env(&[
            ("PERPLEXITY_API_KEY", "pplx-123"),
            ("SONAR_BASE_URL", "http://localhost:9999"),
            ("FRAUDLENS_MAX_CHARS", "42"),
            ("FRAUDLENS_OCR", "off"),
        ]))
        .unwrap();
        assert_eq!(s.require_api_key().unwrap(), "pplx-123");
        assert_eq!(s.provider.base_url, "http://localhost:9999");
        assert_eq!(s.normalize.max_chars, 42);
        assert!(!s.ocr.enabled);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut s = Settings::default();
        let err = s.apply_env(env(&[("FRAUDLENS_MAX_CHARS", "lots")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidEnv { .. }));
    }

    #[test]
    fn test_missing_key_and_redaction() {
        let mut s = Settings::default();
        assert!(matches!(s.require_api_key(), Err(SettingsError::MissingApiKey)));
        s.provider.api_key = Some("secret".into());
        assert_eq!(s.redacted().provider.api_key.as_deref(), Some("***"));
    }
}
