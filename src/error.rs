//! Error types and handling for the anonymization pipeline
//! Author: cloakdocs maintainers
//!
//! Only [`ExtractionError`] is fatal for a run. Detection and redaction
//! degradations are absorbed by their stages and surface in the report text.

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Custom result type for anonymization operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for anonymization operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Redaction error: {0}")]
    Redaction(#[from] RedactionError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Task error: {0}")]
    Task(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// -------------------- Sub-Error Categories --------------------

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExtractionError {
    #[error("Unreadable PDF: {0}")]
    Unreadable(String),

    #[error("PDF has no pages")]
    NoPages,

    #[error("Page {0} could not be decoded: {1}")]
    PageDecode(u32, String),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DetectionError {
    #[error("NER model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("NER model failed: {0}")]
    ModelFailure(String),

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RedactionError {
    #[error("Input could not be read: {0}")]
    UnreadableInput(String),

    #[error("Output could not be written: {0}")]
    UnwritableOutput(String),

    #[error("Content rewrite failed on page {0}: {1}")]
    Rewrite(u32, String),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AuditError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

impl From<openssl::error::ErrorStack> for AuditError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        AuditError::Encryption(err.to_string())
    }
}
