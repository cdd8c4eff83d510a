//! Author-biography paragraphs on the last page

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::pdf::{PageLayout, Rect};

lazy_static! {
    static ref BIO_PHRASES: Regex = Regex::new(
        r"(?i)received (?:the|his|her) [^\n]{0,60}?degree|is currently (?:a|an|the|pursuing|working)|(?:his|her|their) research interests|research interests include|was born in|joined the|is (?:a|an) (?:assistant |associate |full )?professor|(?:ph\.?\s?d\.?|m\.?\s?s\.?|b\.?\s?s\.?|b\.?\s?tech|m\.?\s?tech) degree|is a (?:senior )?member of|has published|graduated from"
    )
    .unwrap();
    static ref CAPS_NAME: Regex =
        Regex::new(r"(?m)^[ \t]*[A-Z]{2,}(?:[ \t]+[A-Z]\.)*(?:[ \t]+[A-Z][A-Z'\-]+)+\b").unwrap();
    static ref TITLE_CASE_NAME: Regex =
        Regex::new(r"(?m)^[ \t]*[A-Z][a-z]+(?:[ \t]+[A-Z]\.)?(?:[ \t]+[A-Z][a-z]+)+\b").unwrap();
    static ref IEEE_FOOTER: Regex = Regex::new(r"VOLUME \d+,\s*\d{4}").unwrap();
}

/// Paragraph length above which two phrases and a name are enough on their own
const LONG_PARAGRAPH_CHARS: usize = 100;

/// One biography region
#[derive(Debug, Clone)]
pub struct Biography {
    pub text: String,
    pub rect: Rect,
    pub glyphs: Vec<usize>,
}

fn name_count(text: &str) -> usize {
    CAPS_NAME.find_iter(text).count() + TITLE_CASE_NAME.find_iter(text).count()
}

fn has_name(text: &str) -> bool {
    CAPS_NAME.is_match(text) || TITLE_CASE_NAME.is_match(text)
}

/// Whether the page looks like it carries author biographies
pub fn page_has_biographies(layout: &PageLayout) -> bool {
    let text = layout.text();
    let phrases = BIO_PHRASES.find_iter(text).count();
    if phrases == 0 {
        return false;
    }
    if name_count(text) >= 2 || IEEE_FOOTER.is_match(text) {
        return true;
    }
    layout.blocks().iter().any(|block| {
        block.text.chars().count() >= LONG_PARAGRAPH_CHARS
            && BIO_PHRASES.find_iter(&block.text).count() >= 2
            && has_name(&block.text)
    })
}

/// Biography paragraphs of the page, or an empty list when the gate fails.
///
/// Paragraphs come from the page's text blocks; when no block qualifies the
/// lines holding a biography phrase are used instead.
pub fn find_biographies(layout: &PageLayout) -> Vec<Biography> {
    if !page_has_biographies(layout) {
        return Vec::new();
    }

    let mut found: Vec<Biography> = layout
        .blocks()
        .into_iter()
        .filter(|block| BIO_PHRASES.is_match(&block.text) && has_name(&block.text))
        .map(|block| Biography {
            glyphs: layout.glyphs_within(&block.bbox),
            text: block.text,
            rect: block.bbox,
        })
        .collect();

    if found.is_empty() {
        debug!("No biography block matched on page {}, using phrase lines", layout.index + 1);
        let text = layout.text();
        let mut seen_lines = Vec::new();
        for m in BIO_PHRASES.find_iter(text) {
            let char_index = text[..m.start()].chars().count();
            let Some(li) = layout.line_of(char_index) else { continue };
            if seen_lines.contains(&li) {
                continue;
            }
            seen_lines.push(li);
            let line = &layout.lines[li];
            found.push(Biography {
                text: line.text.clone(),
                rect: line.bbox,
                glyphs: layout.glyphs_within(&line.bbox),
            });
        }
    }
    found
}
