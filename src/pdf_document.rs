//! PDF Document abstraction
//! Author: cloakdocs maintainers
//! Created: 2026-10-19

use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::{ExtractionError, Result};
use crate::pdf::fonts::{number, resolve};
use crate::pdf::text::{extract_glyphs, page_fonts, page_operations};
use crate::pdf::{PageLayout, Rect};

/// US Letter, used when a page has no readable MediaBox
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// PDF Document wrapper for loading and layout extraction
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub document: Document,
    /// Page object ids in page order
    pages: Vec<ObjectId>,
}

impl PdfDocument {
    /// Load a PDF document from file path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = Document::load(path)
            .map_err(|e| ExtractionError::Unreadable(format!("{}: {}", path.display(), e)))?;
        Self::from_document(document)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let document =
            Document::load_mem(bytes).map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
        Self::from_document(document)
    }

    fn from_document(document: Document) -> Result<Self> {
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(ExtractionError::NoPages.into());
        }
        debug!("Loaded PDF with {} pages", pages.len());
        Ok(Self { document, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.pages.get(index).copied()
    }

    pub fn is_encrypted(&self) -> bool {
        self.document.trailer.get(b"Encrypt").is_ok()
    }

    /// MediaBox of a page, following the page tree for inherited values
    pub fn media_box(&self, index: usize) -> Rect {
        let mut current = self.page_id(index);
        let mut depth = 0;
        while let Some(id) = current {
            let Ok(dict) = self.document.get_dictionary(id) else { break };
            if let Ok(obj) = dict.get(b"MediaBox") {
                if let Ok(arr) = resolve(&self.document, obj).as_array() {
                    let v: Vec<f64> = arr
                        .iter()
                        .filter_map(|o| number(resolve(&self.document, o)))
                        .collect();
                    if let &[x0, y0, x1, y1] = v.as_slice() {
                        return Rect::new(x0, y0, x1, y1);
                    }
                }
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
            if depth > 32 {
                break;
            }
        }
        let [x0, y0, x1, y1] = DEFAULT_MEDIA_BOX;
        Rect::new(x0, y0, x1, y1)
    }

    /// Reconstructs the text layout of one page
    pub fn layout(&self, index: usize) -> Result<PageLayout> {
        let page_id = self
            .page_id(index)
            .ok_or_else(|| ExtractionError::PageDecode(index as u32 + 1, "no such page".into()))?;
        let content = page_operations(&self.document, page_id)
            .map_err(|e| ExtractionError::PageDecode(index as u32 + 1, e.to_string()))?;
        let fonts = page_fonts(&self.document, page_id);
        let glyphs = extract_glyphs(&content.operations, &fonts);
        Ok(PageLayout::new(index, self.media_box(index), glyphs))
    }

    /// Layout of every page; undecodable pages become empty layouts
    pub fn layouts(&self) -> Vec<PageLayout> {
        (0..self.page_count())
            .map(|index| {
                self.layout(index).unwrap_or_else(|e| {
                    warn!("⚠️ {}; treating page as empty", e);
                    PageLayout::new(index, self.media_box(index), Vec::new())
                })
            })
            .collect()
    }
}

/// Decodes a PDF text string (UTF-16BE with BOM, otherwise Latin-1)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|b| *b as char).collect()
    }
}
