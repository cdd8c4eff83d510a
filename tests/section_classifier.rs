mod fixtures;

use cloakdocs::config::SectionConfig;
use cloakdocs::pdf_document::PdfDocument;
use cloakdocs::SectionClassifier;
use fixtures::{sample_paper, PdfBuilder};

fn classifier() -> SectionClassifier {
    SectionClassifier::new(SectionConfig::default())
}

#[test]
fn pdf_pages_are_split_into_zones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("paper.pdf");
    sample_paper().write(&path);

    let pdf = PdfDocument::load(&path).unwrap();
    let text = classifier().classify(&pdf.layouts()).unwrap();

    assert_eq!(text.page_count, 3);
    assert_eq!(text.references_page, Some(2));
    assert!(text.first_page().contains("Jane Smith"));
    assert!(text.header_sections().contains("Kocaeli University"));
    assert!(text.main_content().contains("band pass filter"));
    assert!(!text.main_content().contains("J. Doe"));
    assert!(text.excluded_text().contains("J. Doe"));
}

#[test]
fn nothing_after_the_reference_heading_reaches_main_content() {
    let text = classifier().classify_pages(&[
        "Methods\nWe used sensors.",
        "REFERENCES\n[1] A. Roe, Networks.",
        "Results\nAlan Turing helped with Kocaeli University data.",
        "Conclusion\nMore text by Grace Hopper.",
    ]);
    for name in ["A. Roe", "Alan Turing", "Grace Hopper"] {
        assert!(!text.main_content().contains(name), "{} leaked into main content", name);
        assert!(text.excluded_text().contains(name));
    }
    assert!(text.main_content().contains("We used sensors."));
}

#[test]
fn introduction_is_excluded_until_the_next_header() {
    let text = classifier().classify_pages(&[
        "1. Introduction\nPrior work by Ada Lovelace.\nTABLE\nStill introductory.\n2. Method\nOur method.",
    ]);
    assert!(text.excluded_text().contains("Prior work by Ada Lovelace."));
    assert!(text.excluded_text().contains("Still introductory."));
    assert!(text.main_content().contains("Our method."));
    assert!(!text.main_content().contains("Ada Lovelace"));
}

#[test]
fn empty_document_is_an_extraction_error() {
    assert!(classifier().classify(&[]).is_err());
}

#[test]
fn title_marker_pulls_following_lines_into_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abstract.pdf");
    PdfBuilder::new()
        .page(&["ABSTRACT", "Short summary.", "Contact Alan Turing for data."])
        .write(&path);
    let pdf = PdfDocument::load(&path).unwrap();
    let text = classifier().classify(&pdf.layouts()).unwrap();
    assert!(text.header_sections().contains("Alan Turing"));
}
