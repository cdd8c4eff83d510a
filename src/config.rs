//! Configuration types and validation for the pipeline
//! Author: cloakdocs maintainers
//! Created: 2026-10-19

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Category;

/// Global anonymization config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizerConfig {
    pub categories: Vec<Category>,
    pub sections: SectionConfig,
    pub detection: DetectionConfig,
    pub model: ModelConfig,
    pub redaction: RedactionConfig,
    pub audit: AuditConfig,
}

/// Section classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    /// Lines with more words than this are never treated as section headers
    pub max_header_words: usize,
    /// Lines captured around an author-context phrase on page one
    pub author_context_radius: usize,
    /// Lines captured after a title marker on page one
    pub title_marker_lines: usize,
}

/// Entity detector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Texts longer than this (in chars) are chunked
    pub chunk_threshold: usize,
    pub chunk_size: usize,
    /// Generic minimum acceptance score
    pub min_score: f64,
    /// Extra score `author_name` candidates from main content must reach
    pub author_bonus: f64,
    /// Context window around a candidate used for trigger-word boosting
    pub context_window: usize,
    /// Window around an author-context phrase
    pub author_context_window: usize,
    /// Window used to re-check keyword blocks
    pub keyword_window: usize,
}

/// NER model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    /// Optional JSON/YAML lexicon extending the built-in gazetteer
    pub lexicon_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelBackend {
    Gazetteer,
    Disabled,
}

/// Redaction engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// When false the engine only copies the input (degraded mode)
    pub burn_in: bool,
    pub detect_biographies: bool,
    /// RGB fill painted under every label
    pub fill_color: [f64; 3],
    pub fallback_font_size: f64,
    pub min_font_size: f64,
    pub label_scale: f64,
    pub biography_font_size: f64,
    /// Characters of page text around an occurrence checked for excluded headers
    pub context_chars: usize,
}

/// Audit encryptor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub key_bits: u32,
    /// Largest plaintext block for RSA-OAEP(SHA-256)
    pub chunk_size: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            max_header_words: 8,
            author_context_radius: 3,
            title_marker_lines: 10,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            chunk_threshold: 500_000,
            chunk_size: 250_000,
            min_score: 1.0,
            author_bonus: 1.0,
            context_window: 100,
            author_context_window: 200,
            keyword_window: 200,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Gazetteer,
            lexicon_path: None,
        }
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            burn_in: true,
            detect_biographies: true,
            fill_color: [1.0, 1.0, 1.0],
            fallback_font_size: 9.0,
            min_font_size: 6.0,
            label_scale: 0.85,
            biography_font_size: 9.0,
            context_chars: 100,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            key_bits: 2048,
            chunk_size: 190,
        }
    }
}

impl AnonymizerConfig {
    /// Loads a config file, trying JSON first and YAML second
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: AnonymizerConfig = serde_json::from_str(&content)
            .or_else(|_| serde_yaml::from_str(&content))
            .map_err(|e| Error::Config(format!("Config parsing error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Categories to process; an empty list means all of them
    pub fn requested_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.categories.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.detection.chunk_size == 0 {
            return Err(Error::Config("Chunk size must be at least 1".into()));
        }
        if self.detection.chunk_size > self.detection.chunk_threshold {
            return Err(Error::Config("Chunk size exceeds chunk threshold".into()));
        }
        if self.sections.max_header_words == 0 {
            return Err(Error::Config("max_header_words must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.redaction.label_scale) || self.redaction.label_scale == 0.0 {
            return Err(Error::Config("label_scale must be in (0, 1]".into()));
        }
        if self.redaction.fill_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(Error::Config("fill_color components must be in [0, 1]".into()));
        }
        if self.audit.key_bits < 1024 {
            return Err(Error::Config("RSA keys shorter than 1024 bits are rejected".into()));
        }
        // OAEP with SHA-256 spends 66 bytes of every block on padding
        let max_chunk = (self.audit.key_bits / 8) as usize - 66;
        if self.audit.chunk_size == 0 || self.audit.chunk_size > max_chunk {
            return Err(Error::Config(format!(
                "Audit chunk size must be in 1..={} for {}-bit keys",
                max_chunk, self.audit.key_bits
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnonymizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.requested_categories(), Category::ALL.to_vec());
    }

    #[test]
    fn oversized_audit_chunk_is_rejected() {
        let mut config = AnonymizerConfig::default();
        config.audit.chunk_size = 250;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn yaml_config_parses_partial_documents() {
        let yaml = "categories: [author_name]\nredaction:\n  burn_in: false\n";
        let config: AnonymizerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.categories, vec![Category::AuthorName]);
        assert!(!config.redaction.burn_in);
        assert_eq!(config.detection.chunk_size, 250_000);
    }
}
