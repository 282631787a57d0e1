//! WordprocessingML (`.docx`)

use super::opc::{rel_types, OpcPackage};
use super::{needs_space_preserve, Paragraph, PartGraph};
use quick_xml::escape::escape;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// The body of a word-processing document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDocument {
    pub paragraphs: Vec<Paragraph>,
}

impl WordDocument {
    /// A document with no paragraphs at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// One single-run paragraph per line
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paragraphs: lines.into_iter().map(Paragraph::from_text).collect(),
        }
    }

    pub fn text_lines(&self) -> Vec<String> {
        self.paragraphs.iter().map(Paragraph::text).collect()
    }

    /// Markup of `word/document.xml`
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!("<w:document xmlns:w=\"{WORDPROCESSING_NS}\">\n"));
        xml.push_str("    <w:body>\n");
        for paragraph in &self.paragraphs {
            xml.push_str("        <w:p>\n");
            for run in &paragraph.runs {
                let space = if needs_space_preserve(&run.text) {
                    " xml:space=\"preserve\""
                } else {
                    ""
                };
                xml.push_str(&format!(
                    "            <w:r><w:t{}>{}</w:t></w:r>\n",
                    space,
                    escape(run.text.as_str())
                ));
            }
            xml.push_str("        </w:p>\n");
        }
        xml.push_str("    </w:body>\n");
        xml.push_str("</w:document>");
        xml
    }

    /// Content types, the package relationship and the body part
    pub fn into_part_graph(&self) -> PartGraph {
        let mut package = OpcPackage::new();
        package.relate(None, rel_types::OFFICE_DOCUMENT, DOCUMENT_PART);
        package.add_part(DOCUMENT_PART, DOCUMENT_CONTENT_TYPE, self.to_xml());
        package.into_part_graph()
    }
}
