//! Page layout reconstruction from positioned glyphs
//!
//! Lines, spans and blocks are derived once per page and share a single
//! char-indexed text so that search results, context windows and the
//! section state machine all agree on positions.

use std::collections::BTreeMap;
use std::ops::Range;

use super::geometry::Rect;
use super::text::Glyph;

/// Baseline shift (relative to font size) that starts a new line
const LINE_BREAK_RATIO: f64 = 0.4;
/// Horizontal gap (relative to font size) rendered as a space
const WORD_GAP_RATIO: f64 = 0.15;
/// Vertical gap (relative to line height) that ends a block
const BLOCK_GAP_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
struct CharSlot {
    glyph: Option<usize>,
    line: usize,
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub bbox: Rect,
    /// Char range of this line inside the page text
    pub chars: Range<usize>,
}

/// Run of glyphs on one line sharing size and colour
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub bbox: Rect,
    pub size: f64,
    pub color: [f64; 3],
}

/// Consecutive lines without a paragraph-sized gap between them
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub text: String,
    pub bbox: Rect,
    pub lines: Range<usize>,
}

/// One match of a search needle
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub chars: Range<usize>,
    /// One rectangle per line fragment, in reading order
    pub rects: Vec<Rect>,
    pub glyphs: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct PageLayout {
    pub index: usize,
    pub media_box: Rect,
    pub glyphs: Vec<Glyph>,
    pub lines: Vec<TextLine>,
    text: String,
    slots: Vec<CharSlot>,
}

impl PageLayout {
    pub fn new(index: usize, media_box: Rect, glyphs: Vec<Glyph>) -> Self {
        let mut layout = Self {
            index,
            media_box,
            glyphs,
            lines: Vec::new(),
            text: String::new(),
            slots: Vec::new(),
        };
        layout.build_lines();
        layout
    }

    fn build_lines(&mut self) {
        let mut current: Option<(f64, f64, f64)> = None; // baseline, right edge, size
        let mut line_text = String::new();
        let mut line_bbox: Option<Rect> = None;
        let mut line_start = 0usize;

        for (gi, glyph) in self.glyphs.iter().enumerate() {
            if glyph.text.is_empty() {
                continue;
            }
            let size = glyph.size.max(1.0);
            let breaks = match current {
                None => false,
                Some((baseline, right, _)) => {
                    (glyph.baseline - baseline).abs() > LINE_BREAK_RATIO * size
                        || glyph.origin_x < right - 2.0 * size
                }
            };
            if breaks {
                if let Some(bbox) = line_bbox.take() {
                    let end = self.slots.len();
                    self.lines.push(TextLine {
                        text: std::mem::take(&mut line_text),
                        bbox,
                        chars: line_start..end,
                    });
                    self.text.push('\n');
                    self.slots.push(CharSlot {
                        glyph: None,
                        line: self.lines.len() - 1,
                    });
                    line_start = self.slots.len();
                }
            } else if let Some((_, right, prev_size)) = current {
                let gap = glyph.bbox.x0 - right;
                let ends_blank = line_text.ends_with(char::is_whitespace);
                let starts_blank = glyph.text.starts_with(char::is_whitespace);
                if gap > WORD_GAP_RATIO * prev_size.max(1.0) && !ends_blank && !starts_blank && !line_text.is_empty() {
                    line_text.push(' ');
                    self.text.push(' ');
                    self.slots.push(CharSlot {
                        glyph: None,
                        line: self.lines.len(),
                    });
                }
            }

            for c in glyph.text.chars() {
                line_text.push(c);
                self.text.push(c);
                self.slots.push(CharSlot {
                    glyph: Some(gi),
                    line: self.lines.len(),
                });
            }
            line_bbox = Some(match line_bbox {
                Some(b) => b.union(&glyph.bbox),
                None => glyph.bbox,
            });
            current = Some((glyph.baseline, glyph.bbox.x1, glyph.size));
        }

        if let Some(bbox) = line_bbox {
            let end = self.slots.len();
            self.lines.push(TextLine {
                text: line_text,
                bbox,
                chars: line_start..end,
            });
        }
    }

    /// Page text, lines joined with `'\n'`
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lines overlapping the char range widened by `radius` on each side
    pub fn lines_near(&self, chars: &Range<usize>, radius: usize) -> impl Iterator<Item = &TextLine> {
        let lo = chars.start.saturating_sub(radius);
        let hi = chars.end.saturating_add(radius);
        self.lines
            .iter()
            .filter(move |line| line.chars.start < hi && line.chars.end > lo)
    }

    /// Index of the line holding the given char
    pub fn line_of(&self, char_index: usize) -> Option<usize> {
        self.slots.get(char_index).map(|s| s.line)
    }

    /// Case-insensitive, whitespace-normalized search for `needle`.
    ///
    /// Line breaks in the page text match any whitespace in the needle, so
    /// an entity wrapped over two lines yields one occurrence with two
    /// rectangles.
    pub fn search(&self, needle: &str) -> Vec<Occurrence> {
        let target: Vec<char> = needle
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .map(fold_case)
            .collect();
        if target.is_empty() {
            return Vec::new();
        }

        let mut haystack = Vec::with_capacity(self.slots.len());
        let mut positions = Vec::with_capacity(self.slots.len());
        let mut prev_blank = true;
        for (i, c) in self.text.chars().enumerate() {
            if c.is_whitespace() {
                if !prev_blank {
                    haystack.push(' ');
                    positions.push(i);
                }
                prev_blank = true;
            } else {
                haystack.push(fold_case(c));
                positions.push(i);
                prev_blank = false;
            }
        }

        let mut found = Vec::new();
        let mut i = 0;
        while i + target.len() <= haystack.len() {
            if haystack[i..i + target.len()] == target[..] {
                let start = positions[i];
                let end = positions[i + target.len() - 1] + 1;
                found.push(self.occurrence(start..end));
                i += target.len();
            } else {
                i += 1;
            }
        }
        found
    }

    fn occurrence(&self, chars: Range<usize>) -> Occurrence {
        let mut glyphs: Vec<usize> = Vec::new();
        let mut rects: Vec<(usize, Rect)> = Vec::new();
        for slot in &self.slots[chars.clone()] {
            let Some(gi) = slot.glyph else { continue };
            if glyphs.last() == Some(&gi) || glyphs.contains(&gi) {
                continue;
            }
            glyphs.push(gi);
            let bbox = self.glyphs[gi].bbox;
            match rects.last_mut() {
                Some((line, rect)) if *line == slot.line => *rect = rect.union(&bbox),
                _ => rects.push((slot.line, bbox)),
            }
        }
        Occurrence {
            chars,
            rects: rects.into_iter().map(|(_, r)| r).collect(),
            glyphs,
        }
    }

    /// Size and colour of the first glyph overlapping `rect`
    pub fn style_at(&self, rect: &Rect) -> Option<(f64, [f64; 3])> {
        self.glyphs
            .iter()
            .find(|g| !g.text.trim().is_empty() && g.bbox.intersects(rect))
            .map(|g| (g.size, g.color))
    }

    /// Glyphs whose centre lies inside `rect`
    pub fn glyphs_within(&self, rect: &Rect) -> Vec<usize> {
        self.glyphs
            .iter()
            .enumerate()
            .filter(|(_, g)| {
                let (x, y) = g.bbox.center();
                rect.contains_point(x, y)
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn spans(&self) -> Vec<TextSpan> {
        let mut spans = Vec::new();
        for line in &self.lines {
            let mut current: Option<TextSpan> = None;
            for (offset, c) in line.text.chars().enumerate() {
                let slot = self.slots[line.chars.start + offset];
                let Some(gi) = slot.glyph else {
                    if let Some(span) = current.as_mut() {
                        span.text.push(c);
                    }
                    continue;
                };
                let glyph = &self.glyphs[gi];
                let same_style = current
                    .as_ref()
                    .map(|s| (s.size - glyph.size).abs() < 0.01 && s.color == glyph.color)
                    .unwrap_or(false);
                if same_style {
                    if let Some(span) = current.as_mut() {
                        span.text.push(c);
                        span.bbox = span.bbox.union(&glyph.bbox);
                    }
                } else {
                    if let Some(span) = current.take() {
                        spans.push(span);
                    }
                    current = Some(TextSpan {
                        text: c.to_string(),
                        bbox: glyph.bbox,
                        size: glyph.size,
                        color: glyph.color,
                    });
                }
            }
            if let Some(span) = current {
                spans.push(span);
            }
        }
        spans
    }

    pub fn blocks(&self) -> Vec<TextBlock> {
        let mut blocks: Vec<TextBlock> = Vec::new();
        for (li, line) in self.lines.iter().enumerate() {
            let joins = blocks.last().map_or(false, |block| {
                let prev = &self.lines[block.lines.end - 1].bbox;
                let gap = prev.y0 - line.bbox.y1;
                let height = prev.height().max(line.bbox.height());
                gap <= BLOCK_GAP_RATIO * height && gap >= -height
            });
            match blocks.last_mut() {
                Some(block) if joins => {
                    block.text.push('\n');
                    block.text.push_str(&line.text);
                    block.bbox = block.bbox.union(&line.bbox);
                    block.lines.end = li + 1;
                }
                _ => blocks.push(TextBlock {
                    text: line.text.clone(),
                    bbox: line.bbox,
                    lines: li..li + 1,
                }),
            }
        }
        blocks
    }
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Most common glyph size on the page, weighted by character count
fn body_size(spans: &[TextSpan]) -> Option<f64> {
    let mut tally: BTreeMap<i64, usize> = BTreeMap::new();
    for span in spans {
        *tally.entry((span.size * 10.0).round() as i64).or_default() += span.text.trim().chars().count();
    }
    tally
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(size, _)| size as f64 / 10.0)
}

/// Largest-font run of text on the page.
///
/// A title set larger than the body text continues through the spans of
/// the same size directly below it (multi-line titles). When nothing on the
/// page is larger than the body text, only the first run is the title.
pub fn detect_title(page: &PageLayout) -> Option<String> {
    let spans = page.spans();
    let mut first: Option<usize> = None;
    for (i, span) in spans.iter().enumerate() {
        if span.text.trim().chars().count() > 5 && first.map_or(true, |f| span.size > spans[f].size) {
            first = Some(i);
        }
    }
    let first = first?;
    let title_size = spans[first].size;
    let mut title = spans[first].text.trim().to_string();

    if body_size(&spans).map_or(false, |body| title_size > body + 0.05) {
        let mut prev = &spans[first];
        for span in &spans[first + 1..] {
            let text = span.text.trim();
            if text.is_empty() {
                continue;
            }
            let gap = prev.bbox.y0 - span.bbox.y1;
            let height = prev.bbox.height().max(span.bbox.height());
            let same_size = (span.size - title_size).abs() <= title_size * 0.05;
            if !same_size || gap > height || gap < -1.5 * height {
                break;
            }
            title.push(' ');
            title.push_str(text);
            prev = span;
        }
    }
    let title = title.trim().to_string();
    (!title.is_empty()).then_some(title)
}
