//! PDF geometry layer: glyph placement, page layout and text search
//! Author: cloakdocs maintainers
//! Created: 2026-10-19

pub mod fonts;
pub mod geometry;
pub mod layout;
pub mod text;

pub use geometry::{Matrix, Rect, RectKey};
pub use layout::{detect_title, Occurrence, PageLayout, TextBlock, TextLine, TextSpan};
pub use text::{Glyph, GlyphOrigin};
