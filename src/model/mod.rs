//! Named-entity model loading
//! Author: cloakdocs maintainers
//! Created: 2026-10-19
//!
//! The model is loaded once by the caller and passed by reference into the
//! detector. It is never mutated after loading, so a single instance can be
//! shared across concurrent runs.

pub mod gazetteer;

pub use gazetteer::{GazetteerModel, Lexicon};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ModelBackend, ModelConfig};
use crate::error::DetectionError;

/// Entity labels a model may emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NerLabel {
    Person,
    Org,
    Fac,
    Gpe,
    Loc,
}

impl NerLabel {
    /// Labels mapped to `institution_info`
    pub fn is_institutional(&self) -> bool {
        matches!(self, NerLabel::Org | NerLabel::Fac | NerLabel::Gpe | NerLabel::Loc)
    }
}

/// One recognized span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerSpan {
    pub text: String,
    pub label: NerLabel,
    /// Byte offset of the span in the input text
    pub start: usize,
}

/// Pluggable named-entity recognizer
pub trait NerModel: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(&self, text: &str) -> Result<Vec<NerSpan>, DetectionError>;
}

/// Result of loading the model once at startup
#[derive(Clone)]
pub enum ModelStatus {
    Loaded(Arc<dyn NerModel>),
    Unavailable(String),
}

impl fmt::Debug for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Loaded(model) => write!(f, "Loaded({})", model.name()),
            ModelStatus::Unavailable(reason) => write!(f, "Unavailable({})", reason),
        }
    }
}

impl ModelStatus {
    /// Loads the configured backend; failures become `Unavailable`
    pub fn load(config: &ModelConfig) -> Self {
        match config.backend {
            ModelBackend::Disabled => ModelStatus::Unavailable("model disabled by configuration".into()),
            ModelBackend::Gazetteer => {
                let lexicon = match &config.lexicon_path {
                    Some(path) => match Lexicon::from_file(path) {
                        Ok(lexicon) => lexicon,
                        Err(e) => {
                            warn!("⚠️ Lexicon {} could not be loaded: {}", path.display(), e);
                            return ModelStatus::Unavailable(e.to_string());
                        }
                    },
                    None => Lexicon::default(),
                };
                let model = GazetteerModel::new(lexicon);
                info!("🧠 NER model loaded: {}", model.name());
                ModelStatus::Loaded(Arc::new(model))
            }
        }
    }

    pub fn from_model(model: Arc<dyn NerModel>) -> Self {
        ModelStatus::Loaded(model)
    }

    pub fn model(&self) -> Option<&dyn NerModel> {
        match self {
            ModelStatus::Loaded(model) => Some(model.as_ref()),
            ModelStatus::Unavailable(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelStatus::Loaded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_backend_is_unavailable() {
        let config = ModelConfig {
            backend: ModelBackend::Disabled,
            lexicon_path: None,
        };
        assert!(!ModelStatus::load(&config).is_loaded());
    }

    #[test]
    fn missing_lexicon_is_reported_not_fatal() {
        let config = ModelConfig {
            backend: ModelBackend::Gazetteer,
            lexicon_path: Some("/nonexistent/lexicon.yaml".into()),
        };
        assert!(matches!(ModelStatus::load(&config), ModelStatus::Unavailable(_)));
    }
}
