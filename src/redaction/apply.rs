//! Burns a page plan into the page's content stream
//!
//! Removed glyphs are cut out of their show operators and replaced by `TJ`
//! adjustments of the same advance, so the remaining text keeps its
//! position. Fills and labels are appended after the original content and
//! the page gets one new content stream.

use std::collections::{BTreeSet, HashMap};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use super::plan::PagePlan;
use crate::error::RedactionError;
use crate::pdf::fonts::resolve;
use crate::pdf::{Glyph, Rect};

/// Resource name of the label font added to redacted pages
const LABEL_FONT: &[u8] = b"CloakHelv";

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];
const FALLBACK_WIDTH: u16 = 556;
/// Labels never shrink below this size, even when the region is narrower
const MIN_LABEL_SIZE: f64 = 1.0;

fn real(value: f64) -> Object {
    Object::Real(value as _)
}

/// Byte ranges and replacement advances of removed glyphs, keyed by string operand
type Removals = HashMap<(usize, usize), Vec<(usize, usize, f64)>>;

fn collect_removals(glyphs: &[Glyph], removed: &BTreeSet<usize>) -> Removals {
    let mut removals: Removals = HashMap::new();
    for &gi in removed {
        let Some(glyph) = glyphs.get(gi) else { continue };
        let source = glyph.source;
        removals
            .entry((source.op_index, source.item_index))
            .or_default()
            .push((source.byte_start, source.byte_len, glyph.kerning));
    }
    for cuts in removals.values_mut() {
        cuts.sort_by_key(|c| c.0);
    }
    removals
}

/// Splits a shown string into kept runs and kerning numbers
fn cut_string(bytes: &[u8], format: &StringFormat, cuts: &[(usize, usize, f64)]) -> Vec<Object> {
    let mut parts: Vec<Object> = Vec::new();
    let mut kept: Vec<u8> = Vec::new();
    let mut pos = 0;
    let mut pending_kern = 0.0;

    for &(start, len, kerning) in cuts {
        if start < pos || start >= bytes.len() {
            continue;
        }
        kept.extend_from_slice(&bytes[pos..start]);
        if !kept.is_empty() {
            if pending_kern != 0.0 {
                parts.push(real(pending_kern));
                pending_kern = 0.0;
            }
            parts.push(Object::String(std::mem::take(&mut kept), format.clone()));
        }
        pending_kern += kerning;
        pos = (start + len).min(bytes.len());
    }
    if pending_kern != 0.0 {
        parts.push(real(pending_kern));
    }
    if pos < bytes.len() {
        parts.push(Object::String(bytes[pos..].to_vec(), format.clone()));
    }
    parts
}

fn cut_operand(operand: Option<&Object>, cuts: &[(usize, usize, f64)]) -> Option<Object> {
    match operand {
        Some(Object::String(bytes, format)) => Some(Object::Array(cut_string(bytes, format, cuts))),
        _ => None,
    }
}

/// Rewrites show operators so that the `removed` layout glyphs are no longer drawn
pub fn remove_glyphs(operations: &[Operation], glyphs: &[Glyph], removed: &BTreeSet<usize>) -> Vec<Operation> {
    let removals = collect_removals(glyphs, removed);
    let mut out = Vec::with_capacity(operations.len() + 8);

    for (index, op) in operations.iter().enumerate() {
        let touched = removals.keys().any(|(op_index, _)| *op_index == index);
        if !touched {
            out.push(op.clone());
            continue;
        }
        let cuts = |item: usize| removals.get(&(index, item)).map(Vec::as_slice).unwrap_or(&[]);

        match op.operator.as_str() {
            "Tj" => match cut_operand(op.operands.first(), cuts(0)) {
                Some(array) => out.push(Operation::new("TJ", vec![array])),
                None => out.push(op.clone()),
            },
            "'" => match cut_operand(op.operands.first(), cuts(0)) {
                Some(array) => {
                    out.push(Operation::new("T*", vec![]));
                    out.push(Operation::new("TJ", vec![array]));
                }
                None => out.push(op.clone()),
            },
            "\"" => match cut_operand(op.operands.get(2), cuts(2)) {
                Some(array) => {
                    out.push(Operation::new("Tw", vec![op.operands[0].clone()]));
                    out.push(Operation::new("Tc", vec![op.operands[1].clone()]));
                    out.push(Operation::new("T*", vec![]));
                    out.push(Operation::new("TJ", vec![array]));
                }
                None => out.push(op.clone()),
            },
            "TJ" => match op.operands.first() {
                Some(Object::Array(items)) => {
                    let mut rebuilt = Vec::with_capacity(items.len());
                    for (item_index, item) in items.iter().enumerate() {
                        match item {
                            Object::String(bytes, format) if !cuts(item_index).is_empty() => {
                                rebuilt.extend(cut_string(bytes, format, cuts(item_index)));
                            }
                            other => rebuilt.push(other.clone()),
                        }
                    }
                    out.push(Operation::new("TJ", vec![Object::Array(rebuilt)]));
                }
                _ => out.push(op.clone()),
            },
            _ => out.push(op.clone()),
        }
    }
    out
}

/// Width of `label` set in Helvetica at `size`
fn label_width(label: &str, size: f64) -> f64 {
    let units: u32 = label
        .chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => u32::from(HELVETICA_WIDTHS[(code - 32) as usize]),
            _ => u32::from(FALLBACK_WIDTH),
        })
        .sum();
    f64::from(units) / 1000.0 * size
}

/// Largest size up to `size` at which `label` fits inside `width`
fn fitted_label_size(label: &str, size: f64, width: f64) -> f64 {
    let natural = label_width(label, size);
    if natural <= width || natural <= 0.0 {
        return size;
    }
    (size * width / natural).max(MIN_LABEL_SIZE)
}

/// Baseline that centres a label of `size` vertically in `rect`
fn label_baseline(rect: &Rect, size: f64) -> f64 {
    rect.y0 + ((rect.height() - size) / 2.0).max(0.0) + 0.2 * size
}

/// Background fills followed by the mask labels
pub fn overlay_operations(plan: &PagePlan, fill: [f64; 3]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for record in plan.records() {
        let r = record.rect;
        let size = fitted_label_size(&record.label, record.font_size, r.width());
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("rg", fill.iter().map(|c| real(*c)).collect()));
        ops.push(Operation::new(
            "re",
            vec![real(r.x0), real(r.y0), real(r.width()), real(r.height())],
        ));
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));

        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(LABEL_FONT.to_vec()), real(size)],
        ));
        ops.push(Operation::new("rg", record.color.iter().map(|c| real(*c)).collect()));
        ops.push(Operation::new(
            "Td",
            vec![real(r.x0), real(label_baseline(&r, size))],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(record.label.as_bytes().to_vec(), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

/// Resources of a page, following `/Parent` for inherited entries
fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else { break };
        if let Ok(obj) = dict.get(b"Resources") {
            if let Ok(resources) = resolve(doc, obj).as_dict() {
                return resources.clone();
            }
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
        if depth > 32 {
            break;
        }
    }
    Dictionary::new()
}

/// Gives the page its own resource dictionary holding the label font
fn install_label_font(doc: &mut Document, page_id: ObjectId, page_number: u32) -> Result<(), RedactionError> {
    let mut resources = page_resources(doc, page_id);
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|f| resolve(doc, f).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font));

    fonts.set(LABEL_FONT.to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RedactionError::Rewrite(page_number, e.to_string()))?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Applies every record of `plan` to one page in a single content rewrite
pub fn apply_page_plan(
    doc: &mut Document,
    page_id: ObjectId,
    operations: &[Operation],
    glyphs: &[Glyph],
    plan: &PagePlan,
    fill: [f64; 3],
) -> Result<(), RedactionError> {
    let page_number = plan.page as u32 + 1;
    let mut rewritten = remove_glyphs(operations, glyphs, &plan.glyphs());
    // Isolate the original graphics state from the overlay
    rewritten.insert(0, Operation::new("q", vec![]));
    rewritten.push(Operation::new("Q", vec![]));
    rewritten.extend(overlay_operations(plan, fill));

    let encoded = Content {
        operations: rewritten,
    }
    .encode()
    .map_err(|e| RedactionError::Rewrite(page_number, e.to_string()))?;

    install_label_font(doc, page_id, page_number)?;
    let stream_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));
    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RedactionError::Rewrite(page_number, e.to_string()))?;
    page.set("Contents", Object::Reference(stream_id));

    debug!("Page {}: {} regions burned in", page_number, plan.records().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::text::GlyphOrigin;
    use crate::redaction::plan::{RecordKind, RedactionRecord};
    use crate::types::Category;

    fn glyph(op_index: usize, item_index: usize, byte_start: usize) -> Glyph {
        Glyph {
            text: "x".into(),
            bbox: Rect::new(0.0, 0.0, 5.0, 10.0),
            origin_x: 0.0,
            baseline: 2.0,
            size: 10.0,
            color: [0.0; 3],
            source: GlyphOrigin {
                op_index,
                item_index,
                byte_start,
                byte_len: 1,
            },
            kerning: -500.0,
        }
    }

    fn literal(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn text(obj: &Object) -> Option<&[u8]> {
        match obj {
            Object::String(bytes, _) => Some(bytes),
            _ => None,
        }
    }

    fn numbers(items: &[Object]) -> Vec<f64> {
        items
            .iter()
            .filter_map(|o| match o {
                Object::Real(r) => Some(*r as f64),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tj_becomes_a_kerned_array() {
        let ops = vec![Operation::new("Tj", vec![literal("abcd")])];
        let glyphs = vec![glyph(0, 0, 0), glyph(0, 0, 1), glyph(0, 0, 2), glyph(0, 0, 3)];
        let removed: BTreeSet<usize> = [1, 2].into_iter().collect();
        let out = remove_glyphs(&ops, &glyphs, &removed);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].operator, "TJ");
        let Object::Array(items) = &out[0].operands[0] else { panic!("expected array") };
        assert_eq!(items.len(), 3);
        assert_eq!(text(&items[0]), Some(&b"a"[..]));
        assert_eq!(numbers(items), vec![-1000.0]);
        assert_eq!(text(&items[2]), Some(&b"d"[..]));
    }

    #[test]
    fn untouched_operations_are_kept() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("TJ", vec![Object::Array(vec![literal("ab"), Object::Integer(-20), literal("cd")])]),
            Operation::new("ET", vec![]),
        ];
        let glyphs = vec![glyph(1, 2, 0)];
        let removed: BTreeSet<usize> = [0].into_iter().collect();
        let out = remove_glyphs(&ops, &glyphs, &removed);
        assert_eq!(out[0].operator, "BT");
        let Object::Array(items) = &out[1].operands[0] else { panic!("expected array") };
        assert_eq!(text(&items[0]), Some(&b"ab"[..]));
        assert!(matches!(items[1], Object::Integer(-20)));
        assert_eq!(numbers(items), vec![-500.0]);
        assert_eq!(text(&items[3]), Some(&b"d"[..]));
    }

    fn label_sizes(plan: &PagePlan) -> Vec<f64> {
        overlay_operations(plan, [1.0; 3])
            .iter()
            .filter(|op| op.operator == "Tf")
            .flat_map(|op| numbers(&op.operands))
            .collect()
    }

    fn labelled(rect: Rect, label: &str) -> PagePlan {
        let mut plan = PagePlan::new(0);
        plan.propose(RedactionRecord {
            page: 0,
            rect,
            label: label.into(),
            font_size: 9.0,
            color: [0.0; 3],
            kind: RecordKind::Entity(Category::AuthorName),
            glyphs: Vec::new(),
        });
        plan
    }

    #[test]
    fn wide_labels_shrink_to_the_region() {
        let rect = Rect::new(72.0, 700.0, 112.0, 710.0);
        let label = "[AUTHOR-BIOGRAPHY-1 SANSURLENDI]";
        let sizes = label_sizes(&labelled(rect, label));
        assert_eq!(sizes.len(), 1);
        assert!(sizes[0] < 9.0);
        assert!(label_width(label, sizes[0]) <= rect.width() + 0.01);
    }

    #[test]
    fn labels_that_fit_keep_their_size() {
        let sizes = label_sizes(&labelled(Rect::new(72.0, 700.0, 300.0, 710.0), "[YAZAR-1]"));
        assert_eq!(sizes, vec![9.0]);
    }

    #[test]
    fn quote_operator_keeps_its_spacing() {
        let ops = vec![Operation::new(
            "\"",
            vec![Object::Integer(2), Object::Integer(1), literal("ab")],
        )];
        let glyphs = vec![glyph(0, 2, 0)];
        let removed: BTreeSet<usize> = [0].into_iter().collect();
        let out = remove_glyphs(&ops, &glyphs, &removed);
        let operators: Vec<&str> = out.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(operators, vec!["Tw", "Tc", "T*", "TJ"]);
    }
}
