//! Programmatic PDF fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

pub const BODY_SIZE: f64 = 10.0;
pub const TITLE_SIZE: f64 = 16.0;
pub const TITLE: &str = "Deep Learning for Seismic Signal Analysis";

/// One line of text at an absolute position
#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// Builds small single-font PDFs, one `BT`/`ET` block per line
#[derive(Debug, Clone, Default)]
pub struct PdfBuilder {
    pages: Vec<Vec<TextLine>>,
    info: Vec<(String, String)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page of body-size lines, top to bottom, 14pt apart
    pub fn page(self, lines: &[&str]) -> Self {
        let lines = lines
            .iter()
            .enumerate()
            .map(|(i, text)| TextLine {
                text: text.to_string(),
                x: 72.0,
                y: 760.0 - 14.0 * i as f64,
                size: BODY_SIZE,
            })
            .collect();
        self.page_with(lines)
    }

    /// Adds a page whose first line is set in the title size
    pub fn titled_page(self, title: &str, lines: &[&str]) -> Self {
        let mut page = vec![TextLine {
            text: title.to_string(),
            x: 72.0,
            y: 780.0,
            size: TITLE_SIZE,
        }];
        page.extend(lines.iter().enumerate().map(|(i, text)| TextLine {
            text: text.to_string(),
            x: 72.0,
            y: 750.0 - 14.0 * i as f64,
            size: BODY_SIZE,
        }));
        self.page_with(page)
    }

    pub fn page_with(mut self, lines: Vec<TextLine>) -> Self {
        self.pages.push(lines);
        self
    }

    pub fn info(mut self, key: &str, value: &str) -> Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    pub fn document(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids = Vec::new();
        for lines in &self.pages {
            let mut operations = Vec::new();
            for line in lines {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), Object::Real(line.size as _)]));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Real(line.x as _), Object::Real(line.y as _)],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(line.text.as_str())]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if !self.info.is_empty() {
            let mut info = lopdf::Dictionary::new();
            for (key, value) in &self.info {
                info.set(key.as_str(), Object::String(value.as_bytes().to_vec(), StringFormat::Literal));
            }
            let info_id = doc.add_object(Object::Dictionary(info));
            doc.trailer.set("Info", info_id);
        }
        doc
    }

    pub fn write(&self, path: &Path) {
        self.document().save(path).unwrap();
    }
}

/// A three-page submission: front matter, body, references with a
/// trailing author biography.
pub fn sample_paper() -> PdfBuilder {
    PdfBuilder::new()
        .titled_page(
            TITLE,
            &[
                "Jane Smith",
                "jane.smith@kocaeli.edu.tr",
                "Department of Computer Engineering, Kocaeli University",
                "ABSTRACT",
                "We study seismic signals with convolutional networks.",
                "INDEX TERMS Deep learning, seismic analysis.",
            ],
        )
        .page(&[
            "METHOD",
            "Recordings were processed with a band pass filter.",
            "Questions may be sent to jane.smith@kocaeli.edu.tr for access.",
        ])
        .page(&[
            "REFERENCES",
            "[1] J. Doe, Signal processing for geophysics, 2019.",
            "[2] A. Roe, Deep networks, 2020.",
        ])
        .info("Author", "Jane Smith")
        .info("Title", TITLE)
}

/// Texts of every page of a PDF on disk
pub fn page_texts(path: &Path) -> Vec<String> {
    let pdf = cloakdocs::pdf_document::PdfDocument::load(path).unwrap();
    pdf.layouts().iter().map(|l| l.text().to_string()).collect()
}
