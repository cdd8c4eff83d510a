//! Main Library File for scholarly PDF anonymization
//! Provides a stage-based pipeline that sections a submission, detects
//! identifying entities, burns masks into the PDF and seals an encrypted
//! audit record of what was removed.

// Configuration and Core Pipeline
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Stage 1: PDF Loading & Text Layout
pub mod pdf;
pub mod pdf_document;

// Stage 2: Document Sectioning
pub mod sections;

// Stage 3: Entity Detection
pub mod detector;
pub mod model;

// Stage 4: Redaction
pub mod redaction;

// Stage 5: Audit Sealing
pub mod audit;

// Run Reporting
pub mod report;

// Re-exports for crate consumers
pub use audit::{decrypt, AuditEncryptor, AuditEntry, AuditRecord, KeyStore, SealedAudit};
pub use config::AnonymizerConfig;
pub use detector::{DetectionOutcome, DetectionRequest, EntityDetector};
pub use error::{Error, Result};
pub use model::{ModelStatus, NerModel};
pub use pipeline::{Pipeline, PipelineOutcome, RunRequest};
pub use redaction::{RedactionCapability, RedactionEngine, RedactionOutcome};
pub use report::{ReportFormat, ReportFormatter, RunReport};
pub use sections::SectionClassifier;
pub use types::{Category, DocumentText, ReplacementMap, ResolvedEntities};
