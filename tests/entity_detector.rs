use cloakdocs::config::{DetectionConfig, ModelConfig, SectionConfig};
use cloakdocs::detector::resolve::resolve;
use cloakdocs::detector::ResolutionContext;
use cloakdocs::types::CategoryLists;
use cloakdocs::{Category, DetectionRequest, EntityDetector, ModelStatus, SectionClassifier};

const PAPER_PAGES: [&str; 3] = [
    "Deep Learning for Seismic Signal Analysis\n\
     Jane Smith\n\
     jane.smith@kocaeli.edu.tr\n\
     Department of Computer Engineering, Kocaeli University\n\
     Corresponding author: Jane Smith, Tel: +90 262 303 1000\n\
     ABSTRACT\n\
     We study seismic signals with convolutional networks.\n\
     INDEX TERMS Deep learning, seismic analysis, Signal Processing.",
    "Methods\n\
     Recordings were provided by Kocaeli University and filtered with a CNN.\n\
     Questions may be sent to jane.smith@kocaeli.edu.tr for access.",
    "REFERENCES\n\
     [1] J. Doe, Signal processing for geophysics, Stanford University, 2019.",
];

fn detect_paper(model: &ModelStatus) -> cloakdocs::DetectionOutcome {
    let document = SectionClassifier::new(SectionConfig::default()).classify_pages(&PAPER_PAGES);
    let detector = EntityDetector::new(DetectionConfig::default(), model);
    let request = DetectionRequest::from_document(&document, Some("Deep Learning for Seismic Signal Analysis"));
    detector.detect(&request, &Category::ALL)
}

fn all_entities(outcome: &cloakdocs::DetectionOutcome) -> Vec<(Category, String)> {
    outcome
        .resolved
        .entities
        .iter()
        .flat_map(|(c, values)| values.iter().map(move |v| (*c, v.clone())))
        .collect()
}

#[test]
fn paper_front_matter_is_detected() {
    let outcome = detect_paper(&ModelStatus::load(&ModelConfig::default()));
    assert!(outcome
        .resolved
        .for_category(Category::ContactInfo)
        .iter()
        .any(|e| e == "jane.smith@kocaeli.edu.tr"));
    assert!(outcome
        .resolved
        .for_category(Category::AuthorName)
        .iter()
        .any(|e| e.contains("Jane Smith")));
}

#[test]
fn resolved_entities_are_exclusive_and_not_nested() {
    for model in [
        ModelStatus::load(&ModelConfig::default()),
        ModelStatus::Unavailable("disabled".into()),
    ] {
        let outcome = detect_paper(&model);
        for category in Category::ALL {
            let values = outcome.resolved.for_category(category);
            for a in values {
                for b in values {
                    assert!(a == b || !b.contains(a.as_str()), "{:?} nests {:?}", b, a);
                }
            }
        }
        let entities = all_entities(&outcome);
        for (ca, a) in &entities {
            for (cb, b) in &entities {
                assert!(ca == cb || a != b, "{:?} is in two categories", a);
            }
        }
    }
}

#[test]
fn reference_and_title_text_is_never_selected() {
    let outcome = detect_paper(&ModelStatus::load(&ModelConfig::default()));
    for (_, entity) in all_entities(&outcome) {
        assert!(!entity.contains("Doe"), "reference author {:?} selected", entity);
        assert!(!entity.contains("Stanford"), "reference venue {:?} selected", entity);
        assert!(!"Deep Learning for Seismic Signal Analysis".contains(entity.as_str()));
        assert_ne!(entity.to_uppercase(), "CNN");
    }
}

#[test]
fn mask_tokens_count_up_per_category() {
    let outcome = detect_paper(&ModelStatus::load(&ModelConfig::default()));
    for category in Category::ALL {
        let tokens: Vec<&str> = outcome
            .resolved
            .replacements
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.token.as_str())
            .collect();
        let expected: Vec<String> = (1..=tokens.len()).map(|i| category.mask_token(i)).collect();
        assert_eq!(tokens, expected);
    }
}

#[test]
fn shared_model_serves_concurrent_detectors() {
    let model = ModelStatus::load(&ModelConfig::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = model.clone();
            std::thread::spawn(move || detect_paper(&model).resolved)
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert!(model.is_loaded());
}

#[test]
fn university_is_absorbed_by_the_longer_institution() {
    let mut raw = CategoryLists::new();
    raw.insert(
        Category::InstitutionInfo,
        vec!["University".to_string(), "University of Delhi".to_string()],
    );
    let resolved = resolve(&raw, &ResolutionContext::default());
    assert_eq!(resolved.for_category(Category::InstitutionInfo), ["University of Delhi"]);
}
