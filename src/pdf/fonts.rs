//! Font metrics and text decoding for page fonts
//!
//! Only what glyph positioning needs: advance widths and a byte-to-text
//! mapping. Glyph outlines are never read.

use std::collections::HashMap;

use lazy_static::lazy_static;
use lopdf::{Dictionary, Document, Object};
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref HEX_TOKEN: Regex = Regex::new(r"<([0-9A-Fa-f]*)>").unwrap();
    static ref BFCHAR_SECTION: Regex =
        Regex::new(r"(?s)beginbfchar(.*?)endbfchar").unwrap();
    static ref BFRANGE_SECTION: Regex =
        Regex::new(r"(?s)beginbfrange(.*?)endbfrange").unwrap();
    static ref BFRANGE_ENTRY: Regex = Regex::new(
        r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*(?:<([0-9A-Fa-f]*)>|\[([^\]]*)\])"
    )
    .unwrap();
}

/// Glyph-space width used when a font carries no width information
const DEFAULT_WIDTH: f64 = 500.0;
const DEFAULT_SPACE_WIDTH: f64 = 250.0;

/// Resolves an indirect reference, returning the object itself otherwise
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Numeric value of an integer or real operand
pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Metrics and decoding table of one font resource
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    widths: HashMap<u32, f64>,
    default_width: f64,
    two_byte: bool,
    to_unicode: HashMap<u32, String>,
}

impl FontMetrics {
    /// Metrics used when a `Tf` names a font that is not in the resources
    pub fn fallback() -> Self {
        Self {
            default_width: DEFAULT_WIDTH,
            ..Default::default()
        }
    }

    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let subtype = font
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|n| n.to_vec())
            .unwrap_or_default();
        let mut metrics = if subtype == b"Type0" {
            Self::composite(doc, font)
        } else {
            Self::simple(doc, font)
        };
        if let Ok(obj) = font.get(b"ToUnicode") {
            if let Object::Stream(stream) = resolve(doc, obj) {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                metrics.to_unicode = parse_to_unicode(&String::from_utf8_lossy(&data));
            }
        }
        metrics
    }

    fn simple(doc: &Document, font: &Dictionary) -> Self {
        let mut widths = HashMap::new();
        let first_char = font.get(b"FirstChar").ok().and_then(number).unwrap_or(0.0) as u32;
        if let Ok(obj) = font.get(b"Widths") {
            if let Object::Array(arr) = resolve(doc, obj) {
                for (i, w) in arr.iter().enumerate() {
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(first_char + i as u32, w);
                    }
                }
            }
        }
        let missing = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| resolve(doc, d).as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(number)
            .filter(|w| *w > 0.0);
        if widths.is_empty() {
            widths.insert(32, DEFAULT_SPACE_WIDTH);
        }
        Self {
            widths,
            default_width: missing.unwrap_or(DEFAULT_WIDTH),
            two_byte: false,
            to_unicode: HashMap::new(),
        }
    }

    fn composite(doc: &Document, font: &Dictionary) -> Self {
        let mut widths = HashMap::new();
        let mut default_width = 1000.0;
        let descendant = font
            .get(b"DescendantFonts")
            .ok()
            .and_then(|d| resolve(doc, d).as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|d| resolve(doc, d).as_dict().ok());
        if let Some(cid_font) = descendant {
            if let Some(dw) = cid_font.get(b"DW").ok().and_then(number) {
                default_width = dw;
            }
            if let Ok(obj) = cid_font.get(b"W") {
                if let Object::Array(arr) = resolve(doc, obj) {
                    parse_cid_widths(doc, arr, &mut widths);
                }
            }
        }
        Self {
            widths,
            default_width,
            two_byte: true,
            to_unicode: HashMap::new(),
        }
    }

    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Glyph-space width (thousandths of an em) of a character code
    pub fn width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    /// Splits a string operand into `(code, byte_len)` pairs
    pub fn codes(&self, bytes: &[u8]) -> Vec<(u32, usize)> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                    (code, pair.len())
                })
                .collect()
        } else {
            bytes.iter().map(|b| (*b as u32, 1)).collect()
        }
    }

    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if self.two_byte {
            return char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_default();
        }
        match code {
            // Single-byte fallback: treat the code as Latin-1
            0..=31 => String::new(),
            _ => char::from_u32(code).map(String::from).unwrap_or_default(),
        }
    }
}

fn parse_cid_widths(doc: &Document, arr: &[Object], widths: &mut HashMap<u32, f64>) {
    let mut i = 0;
    while i < arr.len() {
        let first = match number(resolve(doc, &arr[i])) {
            Some(v) => v as u32,
            None => break,
        };
        match arr.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = number(last).unwrap_or(first as f64) as u32;
                let w = arr.get(i + 2).and_then(|o| number(resolve(doc, o)));
                if let Some(w) = w {
                    for code in first..=last.min(first + 0xFFFF) {
                        widths.insert(code, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
}

fn hex_value(hex: &str) -> Option<u32> {
    if hex.is_empty() || hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Destination strings in ToUnicode maps are UTF-16BE
fn utf16_hex(hex: &str) -> String {
    let units: Vec<u16> = hex
        .as_bytes()
        .chunks(4)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .filter_map(|c| u16::from_str_radix(c, 16).ok())
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parses the `bfchar` and `bfrange` sections of a ToUnicode CMap
pub fn parse_to_unicode(cmap: &str) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    for section in BFCHAR_SECTION.captures_iter(cmap) {
        let tokens: Vec<&str> = HEX_TOKEN
            .captures_iter(&section[1])
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        for pair in tokens.chunks(2) {
            if let [src, dst] = pair {
                if let Some(code) = hex_value(src) {
                    map.insert(code, utf16_hex(dst));
                }
            }
        }
    }
    for section in BFRANGE_SECTION.captures_iter(cmap) {
        for entry in BFRANGE_ENTRY.captures_iter(&section[1]) {
            let (Some(lo), Some(hi)) = (hex_value(&entry[1]), hex_value(&entry[2])) else {
                continue;
            };
            if hi < lo || hi - lo > 0xFFFF {
                continue;
            }
            if let Some(dst) = entry.get(3) {
                let base = utf16_hex(dst.as_str());
                let mut chars: Vec<char> = base.chars().collect();
                for code in lo..=hi {
                    map.insert(code, chars.iter().collect());
                    if let Some(last) = chars.last_mut() {
                        *last = char::from_u32(*last as u32 + 1).unwrap_or(*last);
                    }
                }
            } else if let Some(list) = entry.get(4) {
                let dsts: Vec<String> = HEX_TOKEN
                    .captures_iter(list.as_str())
                    .map(|c| utf16_hex(&c[1]))
                    .collect();
                for (offset, dst) in dsts.into_iter().enumerate() {
                    map.insert(lo + offset as u32, dst);
                }
            }
        }
    }
    debug!("Parsed ToUnicode map with {} entries", map.len());
    map
}
