//! OpenDocument text (`.odt`) and spreadsheet (`.ods`)
//!
//! ODF packages have no relationship parts. The body lives inline in
//! `content.xml`, the manifest lists it, and the uncompressed `mimetype` entry
//! at offset zero lets readers sniff the format without inflating anything.

use super::spreadsheet::{cell_reference, number_value, CellValue, Sheet};
use super::{ContainerPart, LinkKind, Paragraph, PartGraph, MIMETYPE_PATH};
use crate::error::Result;
use quick_xml::escape::escape;

pub const MANIFEST_PART: &str = "META-INF/manifest.xml";
pub const CONTENT_PART: &str = "content.xml";

pub const TEXT_MEDIA_TYPE: &str = "application/vnd.oasis.opendocument.text";
pub const SPREADSHEET_MEDIA_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

const MANIFEST_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";
const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
const TABLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";

#[derive(Debug, Clone, PartialEq)]
pub enum OdfDocument {
    Text(Vec<Paragraph>),
    Spreadsheet(Vec<Sheet>),
}

impl OdfDocument {
    pub fn text_from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OdfDocument::Text(lines.into_iter().map(Paragraph::from_text).collect())
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            OdfDocument::Text(_) => TEXT_MEDIA_TYPE,
            OdfDocument::Spreadsheet(_) => SPREADSHEET_MEDIA_TYPE,
        }
    }

    pub fn text_lines(&self) -> Vec<String> {
        match self {
            OdfDocument::Text(paragraphs) => paragraphs.iter().map(Paragraph::text).collect(),
            OdfDocument::Spreadsheet(sheets) => sheets.iter().flat_map(Sheet::text_values).collect(),
        }
    }

    /// Markup of `content.xml`
    pub fn content_xml(&self) -> Result<String> {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        match self {
            OdfDocument::Text(paragraphs) => {
                xml.push_str(&format!(
                    "<office:document-content xmlns:office=\"{OFFICE_NS}\" xmlns:text=\"{TEXT_NS}\">\n"
                ));
                xml.push_str("    <office:body>\n");
                xml.push_str("        <office:text>\n");
                for paragraph in paragraphs {
                    xml.push_str(&format!(
                        "            <text:p>{}</text:p>\n",
                        escape(paragraph.text().as_str())
                    ));
                }
                xml.push_str("        </office:text>\n");
            }
            OdfDocument::Spreadsheet(sheets) => {
                xml.push_str(&format!(
                    "<office:document-content xmlns:office=\"{OFFICE_NS}\" xmlns:text=\"{TEXT_NS}\" xmlns:table=\"{TABLE_NS}\">\n"
                ));
                xml.push_str("    <office:body>\n");
                xml.push_str("        <office:spreadsheet>\n");
                for sheet in sheets {
                    write_table(&mut xml, sheet)?;
                }
                xml.push_str("        </office:spreadsheet>\n");
            }
        }
        xml.push_str("    </office:body>\n");
        xml.push_str("</office:document-content>");
        Ok(xml)
    }

    /// Markup of `META-INF/manifest.xml`
    pub fn manifest_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!("<manifest:manifest xmlns:manifest=\"{MANIFEST_NS}\">\n"));
        xml.push_str(&format!(
            "    <manifest:file-entry manifest:media-type=\"{}\" manifest:full-path=\"/\"/>\n",
            self.media_type()
        ));
        xml.push_str(&format!(
            "    <manifest:file-entry manifest:media-type=\"text/xml\" manifest:full-path=\"{CONTENT_PART}\"/>\n"
        ));
        xml.push_str("</manifest:manifest>");
        xml
    }

    /// `mimetype` (stored, first), manifest, content
    pub fn into_part_graph(&self) -> Result<PartGraph> {
        let content = self.content_xml()?;
        let mut graph = PartGraph::new();
        graph
            .push(ContainerPart::stored(MIMETYPE_PATH, self.media_type()))
            .push(ContainerPart::deflated(MANIFEST_PART, self.manifest_xml()))
            .push(ContainerPart::deflated(CONTENT_PART, content));
        graph.link(MANIFEST_PART, CONTENT_PART, LinkKind::ManifestEntry);
        Ok(graph)
    }
}

fn write_table(xml: &mut String, sheet: &Sheet) -> Result<()> {
    xml.push_str(&format!(
        "            <table:table table:name=\"{}\">\n",
        escape(sheet.name.as_str())
    ));
    for (r, row) in sheet.rows.iter().enumerate() {
        xml.push_str("                <table:table-row>\n");
        for (c, cell) in row.iter().enumerate() {
            match cell {
                CellValue::Text(text) => xml.push_str(&format!(
                    "                    <table:table-cell office:value-type=\"string\"><text:p>{}</text:p></table:table-cell>\n",
                    escape(text.as_str())
                )),
                CellValue::Number(n) => {
                    let at = format!("{}.{}", sheet.name, cell_reference(r, c));
                    let value = number_value(*n, &at)?;
                    xml.push_str(&format!(
                        "                    <table:table-cell office:value-type=\"float\" office:value=\"{value}\"><text:p>{value}</text:p></table:table-cell>\n"
                    ));
                }
            }
        }
        xml.push_str("                </table:table-row>\n");
    }
    xml.push_str("            </table:table>\n");
    Ok(())
}
