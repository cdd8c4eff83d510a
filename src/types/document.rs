use serde::{Deserialize, Serialize};

/// Named text zones with distinct anonymization policy.
///
/// Zones may overlap: a line on page one can land in `first_page`,
/// `header_sections` and `main_content` at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    FirstPage,
    HeaderSections,
    MainContent,
    ExcludedSections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zones {
    pub first_page: String,
    pub header_sections: String,
    pub main_content: String,
    pub excluded_sections: String,
}

impl Zones {
    pub fn get(&self, zone: Zone) -> &str {
        match zone {
            Zone::FirstPage => &self.first_page,
            Zone::HeaderSections => &self.header_sections,
            Zone::MainContent => &self.main_content,
            Zone::ExcludedSections => &self.excluded_sections,
        }
    }

    pub(crate) fn push_line(&mut self, zone: Zone, line: &str) {
        let buf = match zone {
            Zone::FirstPage => &mut self.first_page,
            Zone::HeaderSections => &mut self.header_sections,
            Zone::MainContent => &mut self.main_content,
            Zone::ExcludedSections => &mut self.excluded_sections,
        };
        buf.push_str(line);
        buf.push('\n');
    }
}

/// Extracted text of one PDF, produced once by the section classifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentText {
    pub full_text: String,
    pub zones: Zones,
    pub page_count: usize,
    /// Zero-based page on which the reference section started, if any
    pub references_page: Option<usize>,
}

impl DocumentText {
    pub fn main_content(&self) -> &str {
        &self.zones.main_content
    }

    pub fn excluded_text(&self) -> &str {
        &self.zones.excluded_sections
    }

    pub fn first_page(&self) -> &str {
        &self.zones.first_page
    }

    pub fn header_sections(&self) -> &str {
        &self.zones.header_sections
    }
}
