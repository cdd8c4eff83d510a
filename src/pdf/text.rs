//! Content-stream interpreter producing positioned glyphs
//!
//! Tracks just enough graphics and text state to place every shown glyph
//! on the page and to point back at the operator that drew it, so the
//! redaction rewrite can remove exactly those bytes later.

use std::collections::{BTreeMap, HashMap};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, trace};

use super::fonts::{number, FontMetrics};
use super::geometry::{Matrix, Rect};

/// Text-space extent of a glyph below the baseline, in ems
const DESCENT: f64 = -0.2;
/// Text-space extent of a glyph above the baseline, in ems
const ASCENT: f64 = 0.8;

/// Where a glyph came from in the decoded content stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphOrigin {
    /// Index of the show operator in the content operations
    pub op_index: usize,
    /// Index of the string operand (only non-zero inside `TJ` arrays)
    pub item_index: usize,
    pub byte_start: usize,
    pub byte_len: usize,
}

/// One shown glyph in page space
#[derive(Debug, Clone)]
pub struct Glyph {
    pub text: String,
    pub bbox: Rect,
    /// Baseline origin in page space
    pub origin_x: f64,
    pub baseline: f64,
    /// Rendered font size (font size scaled by the text and CTM matrices)
    pub size: f64,
    pub color: [f64; 3],
    pub source: GlyphOrigin,
    /// `TJ` adjustment that reproduces this glyph's advance once removed
    pub kerning: f64,
}

#[derive(Debug, Clone)]
struct TextState {
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
    font: Vec<u8>,
    font_size: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            font: Vec::new(),
            font_size: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: [f64; 3],
    text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill: [0.0, 0.0, 0.0],
            text: TextState::default(),
        }
    }
}

/// Decodes a page's content into operations, tolerating empty pages
pub fn page_operations(doc: &Document, page_id: lopdf::ObjectId) -> lopdf::Result<Content> {
    let data = doc.get_page_content(page_id)?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Content { operations: Vec::new() });
    }
    Content::decode(&data)
}

/// Loads metrics for every font resource of a page
pub fn page_fonts(doc: &Document, page_id: lopdf::ObjectId) -> HashMap<Vec<u8>, FontMetrics> {
    let fonts: BTreeMap<Vec<u8>, &Dictionary> = doc.get_page_fonts(page_id);
    fonts
        .into_iter()
        .map(|(name, dict)| (name, FontMetrics::from_dict(doc, dict)))
        .collect()
}

/// Walks the operations and returns every glyph drawn by a text operator.
///
/// Form XObjects are not entered; their text is neither extracted nor
/// redacted.
pub fn extract_glyphs(operations: &[Operation], fonts: &HashMap<Vec<u8>, FontMetrics>) -> Vec<Glyph> {
    let mut interpreter = Interpreter::new(fonts);
    for (index, op) in operations.iter().enumerate() {
        interpreter.step(index, op);
    }
    debug!("Interpreted {} operations into {} glyphs", operations.len(), interpreter.glyphs.len());
    interpreter.glyphs
}

struct Interpreter<'a> {
    fonts: &'a HashMap<Vec<u8>, FontMetrics>,
    stack: Vec<GraphicsState>,
    gs: GraphicsState,
    tm: Matrix,
    tlm: Matrix,
    glyphs: Vec<Glyph>,
}

fn operand(op: &Operation, i: usize) -> f64 {
    op.operands.get(i).and_then(number).unwrap_or(0.0)
}

fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> [f64; 3] {
    [(1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)]
}

fn color_from_operands(operands: &[Object]) -> Option<[f64; 3]> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    match values.as_slice() {
        [g] => Some([*g, *g, *g]),
        [r, g, b] => Some([*r, *g, *b]),
        [c, m, y, k] => Some(cmyk_to_rgb(*c, *m, *y, *k)),
        _ => None,
    }
}

impl<'a> Interpreter<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, FontMetrics>) -> Self {
        Self {
            fonts,
            stack: Vec::new(),
            gs: GraphicsState::default(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            glyphs: Vec::new(),
        }
    }

    fn step(&mut self, index: usize, op: &Operation) {
        match op.operator.as_str() {
            "q" => self.stack.push(self.gs.clone()),
            "Q" => {
                if let Some(gs) = self.stack.pop() {
                    self.gs = gs;
                }
            }
            "cm" => {
                let m = Matrix([
                    operand(op, 0),
                    operand(op, 1),
                    operand(op, 2),
                    operand(op, 3),
                    operand(op, 4),
                    operand(op, 5),
                ]);
                self.gs.ctm = m.multiply(&self.gs.ctm);
            }
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(color) = color_from_operands(&op.operands) {
                    self.gs.fill = color;
                }
            }
            "cs" => self.gs.fill = [0.0, 0.0, 0.0],
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.gs.text.font = name.clone();
                }
                self.gs.text.font_size = operand(op, 1);
            }
            "Tc" => self.gs.text.char_spacing = operand(op, 0),
            "Tw" => self.gs.text.word_spacing = operand(op, 0),
            "Tz" => self.gs.text.horizontal_scale = operand(op, 0) / 100.0,
            "TL" => self.gs.text.leading = operand(op, 0),
            "Ts" => self.gs.text.rise = operand(op, 0),
            "Td" => self.move_line(operand(op, 0), operand(op, 1)),
            "TD" => {
                self.gs.text.leading = -operand(op, 1);
                self.move_line(operand(op, 0), operand(op, 1));
            }
            "Tm" => {
                let m = Matrix([
                    operand(op, 0),
                    operand(op, 1),
                    operand(op, 2),
                    operand(op, 3),
                    operand(op, 4),
                    operand(op, 5),
                ]);
                self.tm = m;
                self.tlm = m;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes, index, 0);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes, index, 0);
                }
            }
            "\"" => {
                self.gs.text.word_spacing = operand(op, 0);
                self.gs.text.char_spacing = operand(op, 1);
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show(bytes, index, 2);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for (item_index, item) in items.iter().enumerate() {
                        match item {
                            Object::String(bytes, _) => self.show(bytes, index, item_index),
                            other => {
                                if let Some(adjust) = number(other) {
                                    self.kern(adjust);
                                }
                            }
                        }
                    }
                }
            }
            other => trace!("Skipping operator {}", other),
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translate(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.gs.text.leading;
        self.move_line(0.0, -leading);
    }

    fn kern(&mut self, adjust: f64) {
        let ts = &self.gs.text;
        let tx = -adjust / 1000.0 * ts.font_size * ts.horizontal_scale;
        self.tm = Matrix::translate(tx, 0.0).multiply(&self.tm);
    }

    fn show(&mut self, bytes: &[u8], op_index: usize, item_index: usize) {
        let fonts: &'a HashMap<Vec<u8>, FontMetrics> = self.fonts;
        let fallback;
        let font = match fonts.get(&self.gs.text.font) {
            Some(font) => font,
            None => {
                fallback = FontMetrics::fallback();
                &fallback
            }
        };
        let ts = self.gs.text.clone();
        let mut byte_start = 0;
        for (code, byte_len) in font.codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let word_spacing = if byte_len == 1 && code == 32 { ts.word_spacing } else { 0.0 };
            let render = Matrix([
                ts.font_size * ts.horizontal_scale,
                0.0,
                0.0,
                ts.font_size,
                0.0,
                ts.rise,
            ])
            .multiply(&self.tm)
            .multiply(&self.gs.ctm);

            let corners = [
                render.apply(0.0, DESCENT),
                render.apply(w0, DESCENT),
                render.apply(0.0, ASCENT),
                render.apply(w0, ASCENT),
            ];
            let (mut x0, mut y0) = corners[0];
            let (mut x1, mut y1) = corners[0];
            for (x, y) in &corners[1..] {
                x0 = x0.min(*x);
                y0 = y0.min(*y);
                x1 = x1.max(*x);
                y1 = y1.max(*y);
            }
            let (origin_x, baseline) = render.apply(0.0, 0.0);
            let size = ts.font_size * self.tm.multiply(&self.gs.ctm).vertical_scale();

            let advance = w0 * ts.font_size + ts.char_spacing + word_spacing;
            let kerning = if ts.font_size.abs() > f64::EPSILON {
                -advance * 1000.0 / ts.font_size
            } else {
                0.0
            };

            self.glyphs.push(Glyph {
                text: font.decode(code),
                bbox: Rect { x0, y0, x1, y1 },
                origin_x,
                baseline,
                size: size.abs(),
                color: self.gs.fill,
                source: GlyphOrigin {
                    op_index,
                    item_index,
                    byte_start,
                    byte_len,
                },
                kerning,
            });

            let tx = advance * ts.horizontal_scale;
            self.tm = Matrix::translate(tx, 0.0).multiply(&self.tm);
            byte_start += byte_len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    #[test]
    fn glyphs_follow_text_position_and_size() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("Td", vec![Object::Integer(100), Object::Integer(700)]),
            op("Tj", vec![Object::String(b"AB".to_vec(), StringFormat::Literal)]),
            op("ET", vec![]),
        ];
        let glyphs = extract_glyphs(&ops, &HashMap::new());
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text, "A");
        assert!((glyphs[0].origin_x - 100.0).abs() < 1e-9);
        assert!((glyphs[1].origin_x - 105.0).abs() < 1e-9);
        assert!((glyphs[0].baseline - 700.0).abs() < 1e-9);
        assert!((glyphs[0].size - 10.0).abs() < 1e-9);
        assert_eq!(glyphs[1].source.byte_start, 1);
        assert!((glyphs[0].kerning + 500.0).abs() < 1e-9);
    }

    #[test]
    fn tj_arrays_apply_kerning_and_colour() {
        let ops = vec![
            op("rg", vec![Object::Integer(1), Object::Integer(0), Object::Integer(0)]),
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(20)]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::String(b"A".to_vec(), StringFormat::Literal),
                    Object::Integer(-500),
                    Object::String(b"B".to_vec(), StringFormat::Literal),
                ])],
            ),
            op("ET", vec![]),
        ];
        let glyphs = extract_glyphs(&ops, &HashMap::new());
        assert_eq!(glyphs[1].source.item_index, 2);
        assert!((glyphs[1].origin_x - 20.0).abs() < 1e-9);
        assert_eq!(glyphs[0].color, [1.0, 0.0, 0.0]);
    }
}
