//! Anonymization pipeline, stage by stage
//! Author: cloakdocs maintainers
//! Created: 2026-10-19
//!
//! Stages run sequentially for one document. Only extraction failures
//! abort a run; every later degradation lands in the run report.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::audit::{AuditEncryptor, KeyStore, SealedAudit, StoredAudit};
use crate::config::AnonymizerConfig;
use crate::detector::{DetectionOutcome, DetectionRequest, EntityDetector};
use crate::error::{Error, ExtractionError, Result};
use crate::model::ModelStatus;
use crate::pdf::{detect_title, PageLayout};
use crate::pdf_document::PdfDocument;
use crate::redaction::{RedactionEngine, RedactionOutcome};
use crate::report::RunReport;
use crate::sections::SectionClassifier;
use crate::types::{Category, DocumentText};

/// One document to anonymize
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Where the audit record and keys go; nothing is persisted when unset
    pub audit_dir: Option<PathBuf>,
    /// Stop after detection; no PDF or audit record is written
    pub dry_run: bool,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub document: DocumentText,
    pub title: Option<String>,
    pub detection: DetectionOutcome,
    pub redaction: Option<RedactionOutcome>,
    pub audit: Option<SealedAudit>,
    pub stored_audit: Option<StoredAudit>,
    pub report: RunReport,
}

struct Extracted {
    bytes: Vec<u8>,
    layouts: Vec<PageLayout>,
}

/// Anonymization pipeline; built once and shared across documents
pub struct Pipeline {
    config: AnonymizerConfig,
    classifier: SectionClassifier,
    detector: EntityDetector,
    engine: RedactionEngine,
    encryptor: AuditEncryptor,
}

impl Pipeline {
    /// Validates the config and loads the configured model
    pub fn new(config: AnonymizerConfig) -> Result<Self> {
        let model = ModelStatus::load(&config.model);
        Self::with_model(config, &model)
    }

    pub fn with_model(config: AnonymizerConfig, model: &ModelStatus) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: SectionClassifier::new(config.sections.clone()),
            detector: EntityDetector::new(config.detection.clone(), model),
            engine: RedactionEngine::new(config.redaction.clone(), &config.sections),
            encryptor: AuditEncryptor::new(config.audit.clone()),
            config,
        })
    }

    /// Replaces the redaction engine, e.g. to force degraded mode
    pub fn with_engine(mut self, engine: RedactionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    /// Runs the pipeline on a blocking worker
    pub async fn execute(self: Arc<Self>, request: RunRequest) -> Result<PipelineOutcome> {
        tokio::task::spawn_blocking(move || self.run_blocking(&request))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Runs every stage on the current thread
    #[instrument(skip(self), fields(input = %request.input.display()))]
    pub fn run_blocking(&self, request: &RunRequest) -> Result<PipelineOutcome> {
        info!("🚦 Starting anonymization of {}", request.input.display());
        let categories = self.config.requested_categories();
        let mut report = RunReport::new(request.input.display().to_string());

        // Stage 1: Extraction
        let extracted = self.stage_extract(request)?;
        report.page_count = extracted.layouts.len();

        // Stage 2: Sectioning
        let document = self.stage_classify(&extracted.layouts)?;
        let title = extracted.layouts.first().and_then(detect_title);
        report.title = title.clone();

        // Stage 3: Detection
        let detection = self.stage_detect(&document, title.as_deref(), &categories, &mut report);

        if request.dry_run {
            report.add_info("pipeline", "dry run: no output written");
            info!("✅ Dry run finished");
            return Ok(PipelineOutcome {
                document,
                title,
                detection,
                redaction: None,
                audit: None,
                stored_audit: None,
                report,
            });
        }

        // Stage 4: Redaction
        let redaction = self.stage_redact(request, &detection, title.as_deref(), &mut report);

        // Stage 5: Audit
        let (audit, stored_audit) = if redaction.success {
            self.stage_seal(request, &detection, &redaction, &categories, &extracted.bytes, &mut report)
        } else {
            (None, None)
        };

        info!("✅ Anonymization finished: {} regions masked", report.total_masked());
        Ok(PipelineOutcome {
            document,
            title,
            detection,
            redaction: Some(redaction),
            audit,
            stored_audit,
            report,
        })
    }

    fn stage_extract(&self, request: &RunRequest) -> Result<Extracted> {
        info!("📄 Stage 1: Extraction");
        let bytes = fs::read(&request.input)
            .map_err(|e| ExtractionError::Unreadable(format!("{}: {}", request.input.display(), e)))?;
        let pdf = PdfDocument::from_bytes(&bytes)?;
        let layouts = pdf.layouts();
        if layouts.iter().all(|l| l.glyphs.is_empty()) {
            warn!("⚠️ No extractable text; the document may be scanned");
        }
        Ok(Extracted { bytes, layouts })
    }

    fn stage_classify(&self, layouts: &[PageLayout]) -> Result<DocumentText> {
        info!("🗂️ Stage 2: Sectioning");
        self.classifier.classify(layouts)
    }

    fn stage_detect(
        &self,
        document: &DocumentText,
        title: Option<&str>,
        categories: &[Category],
        report: &mut RunReport,
    ) -> DetectionOutcome {
        info!("🔍 Stage 3: Detection");
        let request = DetectionRequest::from_document(document, title);
        let detection = self.detector.detect(&request, categories);

        report.record_detected(&detection.raw);
        report.record_resolved(&detection.resolved.replacements.counts());
        for note in &detection.degraded {
            report.add_warning("detection", note.clone());
        }
        report.add_info(
            "detection",
            format!("{} entities selected for masking", detection.resolved.replacements.len()),
        );
        detection
    }

    fn stage_redact(
        &self,
        request: &RunRequest,
        detection: &DetectionOutcome,
        title: Option<&str>,
        report: &mut RunReport,
    ) -> RedactionOutcome {
        info!("🖊️ Stage 4: Redaction");
        let outcome = self
            .engine
            .redact(&request.input, &request.output, &detection.resolved.replacements, title);

        report.redaction_success = outcome.success;
        report.redaction_report = outcome.report.clone();
        report.record_masked(&outcome.counts, outcome.biographies);
        if outcome.success {
            report.output = Some(request.output.display().to_string());
        } else {
            report.add_warning("redaction", outcome.report.clone());
        }
        if let Some(reason) = &outcome.degraded {
            report.add_warning("redaction", format!("degraded mode, output is an unmodified copy: {}", reason));
        }
        if !outcome.failed_pages.is_empty() {
            let pages: Vec<String> = outcome.failed_pages.iter().map(|p| (p + 1).to_string()).collect();
            report.add_warning("redaction", format!("pages {} left unmodified", pages.join(", ")));
        }
        outcome
    }

    fn stage_seal(
        &self,
        request: &RunRequest,
        detection: &DetectionOutcome,
        redaction: &RedactionOutcome,
        categories: &[Category],
        bytes: &[u8],
        report: &mut RunReport,
    ) -> (Option<SealedAudit>, Option<StoredAudit>) {
        info!("🔐 Stage 5: Audit");
        let sealed = match self
            .encryptor
            .seal(&detection.resolved.replacements, categories, &redaction.counts, bytes)
        {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!("⚠️ Audit record could not be sealed: {}", e);
                report.add_warning("audit", e.to_string());
                return (None, None);
            }
        };
        report.audit_id = Some(sealed.record.id.clone());

        let stored = match &request.audit_dir {
            Some(dir) => match KeyStore::new(dir).write(&sealed) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    warn!("⚠️ Audit record could not be written: {}", e);
                    report.add_warning("audit", e.to_string());
                    None
                }
            },
            None => None,
        };
        (Some(sealed), stored)
    }
}
