//! Document-level metadata scrub
//!
//! The Info dictionary and the XMP packet sit outside page content, so
//! they would leak author identity even after every page is redacted.

use lopdf::{Document, Object};
use tracing::{debug, info};

use crate::pdf_document::decode_text_string;
use crate::types::ReplacementMap;

/// Info keys that identify the submitting person or their tooling
const IDENTIFYING_KEYS: &[&[u8]] = &[b"Author", b"Creator", b"Producer"];

fn info_dictionary_id(doc: &Document) -> Option<lopdf::ObjectId> {
    doc.trailer.get(b"Info").and_then(Object::as_reference).ok()
}

fn mentions_entity(value: &str, replacements: &ReplacementMap) -> bool {
    let lower = value.to_lowercase();
    replacements.iter().any(|r| lower.contains(&r.text.to_lowercase()))
}

/// Removes identifying Info entries and the XMP packet; returns how many entries went
pub fn scrub_metadata(doc: &mut Document, replacements: &ReplacementMap) -> usize {
    let mut removed = 0;

    let info = match info_dictionary_id(doc) {
        Some(id) => doc.get_object_mut(id).and_then(Object::as_dict_mut).ok(),
        None => doc.trailer.get_mut(b"Info").and_then(Object::as_dict_mut).ok(),
    };
    if let Some(info) = info {
        let doomed: Vec<Vec<u8>> = info
            .iter()
            .filter(|(key, value)| {
                IDENTIFYING_KEYS.contains(&key.as_slice())
                    || matches!(value, Object::String(bytes, _) if mentions_entity(&decode_text_string(bytes), replacements))
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            debug!("Removing Info entry {}", String::from_utf8_lossy(&key));
            info.remove(&key);
            removed += 1;
        }
    }

    let root = doc.trailer.get(b"Root").and_then(Object::as_reference).ok();
    let catalog = root.and_then(|id| doc.get_object_mut(id).and_then(Object::as_dict_mut).ok());
    if let Some(catalog) = catalog {
        if catalog.remove(b"Metadata").is_some() {
            debug!("Removed XMP metadata packet");
            removed += 1;
        }
    }

    if removed > 0 {
        info!("🧽 Scrubbed {} metadata entries", removed);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Replacement};
    use lopdf::{Dictionary, StringFormat};

    #[test]
    fn identifying_entries_are_removed() {
        let mut doc = Document::with_version("1.5");
        let mut info = Dictionary::new();
        info.set("Author", Object::String(b"Jane Smith".to_vec(), StringFormat::Literal));
        info.set("Title", Object::String(b"Deep Learning".to_vec(), StringFormat::Literal));
        info.set("Subject", Object::String(b"Work by Jane Smith".to_vec(), StringFormat::Literal));
        let info_id = doc.add_object(Object::Dictionary(info));
        doc.trailer.set("Info", Object::Reference(info_id));

        let replacements = ReplacementMap::from_entries(vec![Replacement {
            text: "Jane Smith".into(),
            token: "[YAZAR-1]".into(),
            category: Category::AuthorName,
        }]);
        assert_eq!(scrub_metadata(&mut doc, &replacements), 2);
        let info = doc.get_dictionary(info_id).unwrap();
        assert!(info.get(b"Title").is_ok());
        assert!(info.get(b"Author").is_err());
    }
}
