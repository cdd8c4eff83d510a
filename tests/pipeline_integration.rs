mod fixtures;

use std::fs;
use std::sync::Arc;

use cloakdocs::config::ModelBackend;
use cloakdocs::{decrypt, AnonymizerConfig, Category, Error, KeyStore, Pipeline, RunRequest};
use fixtures::{page_texts, sample_paper, PdfBuilder, TITLE};

fn fast_config() -> AnonymizerConfig {
    let mut config = AnonymizerConfig::default();
    config.audit.key_bits = 1024;
    config.audit.chunk_size = 62;
    config
}

fn request(dir: &tempfile::TempDir) -> RunRequest {
    RunRequest {
        input: dir.path().join("paper.pdf"),
        output: dir.path().join("anonymized.pdf"),
        audit_dir: Some(dir.path().join("audit")),
        dry_run: false,
    }
}

#[tokio::test]
async fn full_run_masks_seals_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    sample_paper().write(&dir.path().join("paper.pdf"));
    let pipeline = Arc::new(Pipeline::new(fast_config()).unwrap());

    let outcome = pipeline.execute(request(&dir)).await.unwrap();

    assert_eq!(outcome.title.as_deref(), Some(TITLE));
    let redaction = outcome.redaction.as_ref().unwrap();
    assert!(redaction.success, "{}", redaction.report);

    let pages = page_texts(&dir.path().join("anonymized.pdf"));
    assert!(!pages[0].contains("jane.smith@kocaeli.edu.tr"));
    assert!(!pages[1].contains("jane.smith@kocaeli.edu.tr"));
    assert!(pages[2].contains("J. Doe"));

    let report = &outcome.report;
    assert_eq!(report.page_count, 3);
    assert!(report.categories[&Category::ContactInfo].resolved >= 1);
    assert!(report.categories[&Category::ContactInfo].masked >= 2);
    assert_eq!(report.audit_id.as_deref(), outcome.audit.as_ref().map(|a| a.record.id.as_str()));
}

#[tokio::test]
async fn stored_audit_record_decrypts_to_the_masked_values() {
    let dir = tempfile::tempdir().unwrap();
    sample_paper().write(&dir.path().join("paper.pdf"));
    let pipeline = Arc::new(Pipeline::new(fast_config()).unwrap());

    let outcome = pipeline.execute(request(&dir)).await.unwrap();
    let stored = outcome.stored_audit.unwrap();
    assert!(stored.private_key_path.exists());
    assert!(stored.public_key_path.exists());

    let record_json = fs::read_to_string(&stored.record_path).unwrap();
    assert!(!record_json.contains("jane.smith@kocaeli.edu.tr"));
    assert!(!record_json.contains("PRIVATE KEY"));

    let store = KeyStore::new(dir.path().join("audit"));
    let record = store.load_record(&stored.id).unwrap();
    let key = store.load_private_key(&stored.id).unwrap();
    let plaintexts: Vec<String> = record
        .entries
        .iter()
        .map(|e| decrypt(&key, &e.ciphertext).unwrap())
        .collect();
    let expected: Vec<String> = outcome
        .detection
        .resolved
        .replacements
        .iter()
        .map(|r| r.text.clone())
        .collect();
    assert_eq!(plaintexts, expected);
    assert!(plaintexts.iter().any(|p| p == "jane.smith@kocaeli.edu.tr"));
    assert_eq!(record.summary.document_sha256.len(), 64);
    assert_eq!(record.summary.options_requested, Category::ALL.to_vec());
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    sample_paper().write(&dir.path().join("paper.pdf"));
    let pipeline = Arc::new(Pipeline::new(fast_config()).unwrap());

    let mut req = request(&dir);
    req.dry_run = true;
    let outcome = pipeline.execute(req).await.unwrap();

    assert!(outcome.redaction.is_none());
    assert!(outcome.audit.is_none());
    assert!(!dir.path().join("anonymized.pdf").exists());
    assert!(!dir.path().join("audit").exists());
    assert!(!outcome.detection.resolved.replacements.is_empty());
}

#[test]
fn corrupt_input_is_a_fatal_extraction_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("paper.pdf"), b"not a pdf at all").unwrap();
    let pipeline = Pipeline::new(fast_config()).unwrap();

    let result = pipeline.run_blocking(&request(&dir));
    assert!(matches!(result, Err(Error::Extraction(_))));
    assert!(!dir.path().join("anonymized.pdf").exists());
}

#[test]
fn degradations_surface_as_report_warnings() {
    let dir = tempfile::tempdir().unwrap();
    sample_paper().write(&dir.path().join("paper.pdf"));
    let mut config = fast_config();
    config.model.backend = ModelBackend::Disabled;
    config.redaction.burn_in = false;
    let pipeline = Pipeline::new(config).unwrap();

    let outcome = pipeline.run_blocking(&request(&dir)).unwrap();
    assert!(outcome.report.is_degraded());
    let stages: Vec<&str> = outcome.report.entries.iter().map(|e| e.stage.as_str()).collect();
    assert!(stages.contains(&"detection"));
    assert!(stages.contains(&"redaction"));
    assert_eq!(outcome.report.total_masked(), 0);
    assert_eq!(
        fs::read(dir.path().join("paper.pdf")).unwrap(),
        fs::read(dir.path().join("anonymized.pdf")).unwrap()
    );
}

#[test]
fn requested_categories_limit_detection() {
    let dir = tempfile::tempdir().unwrap();
    sample_paper().write(&dir.path().join("paper.pdf"));
    let mut config = fast_config();
    config.categories = vec![Category::ContactInfo];
    let pipeline = Pipeline::new(config).unwrap();

    let outcome = pipeline.run_blocking(&request(&dir)).unwrap();
    assert!(outcome.detection.resolved.for_category(Category::AuthorName).is_empty());
    assert_eq!(outcome.report.categories[&Category::AuthorName].masked, 0);
    assert!(!outcome.detection.resolved.for_category(Category::ContactInfo).is_empty());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = fast_config();
    config.audit.chunk_size = 500;
    assert!(matches!(Pipeline::new(config), Err(Error::Config(_))));
}

#[test]
fn text_free_pages_still_produce_output() {
    let dir = tempfile::tempdir().unwrap();
    PdfBuilder::new().page(&[]).write(&dir.path().join("paper.pdf"));
    let pipeline = Pipeline::new(fast_config()).unwrap();

    let outcome = pipeline.run_blocking(&request(&dir)).unwrap();
    assert!(outcome.detection.resolved.replacements.is_empty());
    assert!(dir.path().join("anonymized.pdf").exists());
}

#[test]
fn uniform_font_front_matter_is_still_masked() {
    let dir = tempfile::tempdir().unwrap();
    PdfBuilder::new()
        .page(&[
            "Seismic Signal Analysis with Networks",
            "Jane Smith",
            "Department of Computer Engineering, Kocaeli University",
            "jane.smith@kocaeli.edu.tr",
            "Abstract",
            "We study seismic signals with convolutional networks.",
        ])
        .write(&dir.path().join("paper.pdf"));
    let pipeline = Pipeline::new(fast_config()).unwrap();

    let outcome = pipeline.run_blocking(&request(&dir)).unwrap();
    assert_eq!(outcome.title.as_deref(), Some("Seismic Signal Analysis with Networks"));
    assert!(outcome
        .detection
        .resolved
        .for_category(Category::ContactInfo)
        .iter()
        .any(|e| e == "jane.smith@kocaeli.edu.tr"));

    let pages = page_texts(&dir.path().join("anonymized.pdf"));
    assert!(!pages[0].contains("jane.smith@kocaeli.edu.tr"));
}
