// Type definitions for the anonymization pipeline

pub mod document;
pub mod entity;

pub use document::*;
pub use entity::*;
