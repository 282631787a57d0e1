//! Open Packaging Conventions plumbing shared by DOCX, XLSX and PPTX
//!
//! An OPC package is a ZIP archive with a `[Content_Types].xml` declaration
//! part and `.rels` relationship parts. Content parts never name each other
//! directly: they hold relationship ids that resolve through the `.rels` part
//! belonging to them.

use super::{ContainerPart, LinkKind, PartGraph};
use quick_xml::escape::escape;
use tracing::debug;

pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PATH: &str = "_rels/.rels";

pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const XML_CONTENT_TYPE: &str = "application/xml";

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URIs
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
}

/// Namespace bound to the `r:` prefix inside content parts
pub const OFFICE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One entry of a `.rels` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: &'static str,
    /// Absolute archive path of the target, without leading slash
    pub target: String,
}

#[derive(Debug, Default)]
struct RelationshipSet {
    /// `None` for the package itself
    source: Option<String>,
    entries: Vec<Relationship>,
}

/// Collects the parts, overrides and relationships of one OPC package
#[derive(Debug, Default)]
pub struct OpcPackage {
    overrides: Vec<(String, &'static str)>,
    relationships: Vec<RelationshipSet>,
    parts: Vec<ContainerPart>,
}

impl OpcPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship from `source` (or the package when `None`) to
    /// `target` and return its id.
    ///
    /// Ids are `rId1`, `rId2`, ... numbered per source part.
    pub fn relate(&mut self, source: Option<&str>, rel_type: &'static str, target: &str) -> String {
        let source = source.map(str::to_string);
        let index = match self.relationships.iter().position(|s| s.source == source) {
            Some(index) => index,
            None => {
                self.relationships.push(RelationshipSet {
                    source,
                    entries: Vec::new(),
                });
                self.relationships.len() - 1
            }
        };

        let set = &mut self.relationships[index];
        let id = format!("rId{}", set.entries.len() + 1);
        set.entries.push(Relationship {
            id: id.clone(),
            rel_type,
            target: target.trim_start_matches('/').to_string(),
        });
        id
    }

    /// Add a content part with an override in `[Content_Types].xml`
    pub fn add_part(&mut self, path: &str, content_type: &'static str, content: impl Into<Vec<u8>>) {
        self.overrides.push((path.to_string(), content_type));
        self.parts.push(ContainerPart::deflated(path, content));
    }

    /// Serialize declaration and relationship parts and lay out the graph:
    /// `[Content_Types].xml`, the package `.rels`, part-scoped `.rels` in the
    /// order their sources were first related, then content parts.
    pub fn into_part_graph(self) -> PartGraph {
        let mut graph = PartGraph::new();

        graph.push(ContainerPart::deflated(
            CONTENT_TYPES_PATH,
            content_types_xml(&self.overrides),
        ));
        for (path, _) in &self.overrides {
            graph.link(CONTENT_TYPES_PATH, path, LinkKind::ContentTypeOverride);
        }

        let mut sets: Vec<&RelationshipSet> = self.relationships.iter().collect();
        sets.sort_by_key(|s| s.source.is_some());

        for set in sets {
            let rels_path = rels_path_for(set.source.as_deref());
            debug!(
                rels = %rels_path,
                count = set.entries.len(),
                "writing relationship part"
            );
            graph.push(ContainerPart::deflated(
                rels_path.as_str(),
                relationships_xml(set.source.as_deref(), &set.entries),
            ));
            for rel in &set.entries {
                graph.link(
                    &rels_path,
                    &rel.target,
                    LinkKind::Relationship { id: rel.id.clone() },
                );
            }
        }

        for part in self.parts {
            graph.push(part);
        }

        graph
    }
}

/// Path of the `.rels` part belonging to `source`
///
/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`, package -> `_rels/.rels`.
pub fn rels_path_for(source: Option<&str>) -> String {
    match source {
        None => PACKAGE_RELS_PATH.to_string(),
        Some(source) => match source.rsplit_once('/') {
            Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
            None => format!("_rels/{source}.rels"),
        },
    }
}

/// Target as written inside the `.rels` part of `source`
///
/// Targets below the source's directory are written relative to it; anything
/// else is written as an absolute part name.
pub fn relative_target(source: Option<&str>, target: &str) -> String {
    let target = target.trim_start_matches('/');
    let dir = match source.and_then(|s| s.rsplit_once('/')) {
        Some((dir, _)) => format!("{dir}/"),
        None if source.is_some() => String::new(),
        None => return target.to_string(),
    };
    match target.strip_prefix(dir.as_str()) {
        Some(relative) => relative.to_string(),
        None => format!("/{target}"),
    }
}

fn content_types_xml(overrides: &[(String, &'static str)]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<Types xmlns=\"{CONTENT_TYPES_NS}\">\n"));
    xml.push_str(&format!(
        "    <Default Extension=\"rels\" ContentType=\"{RELS_CONTENT_TYPE}\"/>\n"
    ));
    xml.push_str(&format!(
        "    <Default Extension=\"xml\" ContentType=\"{XML_CONTENT_TYPE}\"/>\n"
    ));
    for (path, content_type) in overrides {
        xml.push_str(&format!(
            "    <Override PartName=\"/{}\" ContentType=\"{}\"/>\n",
            escape(path.as_str()),
            content_type
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn relationships_xml(source: Option<&str>, entries: &[Relationship]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<Relationships xmlns=\"{RELATIONSHIPS_NS}\">\n"));
    for rel in entries {
        let target = relative_target(source, &rel.target);
        xml.push_str(&format!(
            "    <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>\n",
            rel.id,
            rel.rel_type,
            escape(target.as_str())
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for(None), "_rels/.rels");
        assert_eq!(rels_path_for(Some("xl/workbook.xml")), "xl/_rels/workbook.xml.rels");
        assert_eq!(
            rels_path_for(Some("ppt/slides/slide1.xml")),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(rels_path_for(Some("root.xml")), "_rels/root.xml.rels");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(relative_target(None, "word/document.xml"), "word/document.xml");
        assert_eq!(
            relative_target(Some("xl/workbook.xml"), "xl/worksheets/sheet1.xml"),
            "worksheets/sheet1.xml"
        );
        assert_eq!(
            relative_target(Some("xl/workbook.xml"), "docProps/app.xml"),
            "/docProps/app.xml"
        );
        assert_eq!(relative_target(Some("root.xml"), "/other.xml"), "other.xml");
    }

    #[test]
    fn test_relationship_ids_are_numbered_per_source() {
        let mut package = OpcPackage::new();
        assert_eq!(
            package.relate(None, rel_types::OFFICE_DOCUMENT, "xl/workbook.xml"),
            "rId1"
        );
        assert_eq!(
            package.relate(Some("xl/workbook.xml"), rel_types::WORKSHEET, "xl/worksheets/sheet1.xml"),
            "rId1"
        );
        assert_eq!(
            package.relate(Some("xl/workbook.xml"), rel_types::SHARED_STRINGS, "xl/sharedStrings.xml"),
            "rId2"
        );
    }

    #[test]
    fn test_part_graph_layout() {
        let mut package = OpcPackage::new();
        let sheet_id =
            package.relate(Some("xl/workbook.xml"), rel_types::WORKSHEET, "xl/worksheets/sheet1.xml");
        package.relate(None, rel_types::OFFICE_DOCUMENT, "xl/workbook.xml");
        package.add_part("xl/workbook.xml", "application/test.workbook", format!("<wb id=\"{sheet_id}\"/>"));
        package.add_part("xl/worksheets/sheet1.xml", "application/test.sheet", "<ws/>");

        let graph = package.into_part_graph();
        let paths: Vec<&str> = graph.parts().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
            ]
        );
        assert!(graph.validate().is_ok());

        let rels = String::from_utf8(graph.part("xl/_rels/workbook.xml.rels").unwrap().content.clone())
            .unwrap();
        assert!(rels.contains("Id=\"rId1\""));
        assert!(rels.contains("Target=\"worksheets/sheet1.xml\""));

        let types = String::from_utf8(graph.part(CONTENT_TYPES_PATH).unwrap().content.clone()).unwrap();
        assert!(types.contains("<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/test.workbook\"/>"));
        assert!(types.contains("<Default Extension=\"rels\""));
    }

    #[test]
    fn test_unresolved_relationship_fails_validation() {
        let mut package = OpcPackage::new();
        package.relate(None, rel_types::OFFICE_DOCUMENT, "word/document.xml");

        let graph = package.into_part_graph();
        let error = graph.validate().unwrap_err().to_string();
        assert!(error.contains("rId1"));
        assert!(error.contains("word/document.xml"));
    }
}
