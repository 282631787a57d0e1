//! Archive-of-parts containers
//!
//! Every OOXML and OpenDocument fixture is a ZIP archive holding a small graph
//! of named parts. The format modules describe *which* parts exist and how they
//! reference one another; [`ContainerBuilder`] only turns an ordered
//! [`PartGraph`] into archive bytes.
//!
//! ```rust
//! use docfixture::container::{wordprocessing::WordDocument, ContainerBuilder};
//!
//! # fn main() -> docfixture::Result<()> {
//! let document = WordDocument::from_lines(["Hello", "World"]);
//! let graph = document.into_part_graph();
//! graph.validate()?;
//! let bytes = ContainerBuilder::build(&graph)?;
//! assert!(bytes.starts_with(b"PK\x03\x04"));
//! # Ok(())
//! # }
//! ```

pub mod opc;
pub mod opendocument;
pub mod presentation;
pub mod spreadsheet;
pub mod wordprocessing;

use crate::error::{FixtureError, Result};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Path of the OpenDocument mimetype marker entry.
pub const MIMETYPE_PATH: &str = "mimetype";

/// How a part is stored inside the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Stored,
    Deflated,
}

impl StorageMode {
    fn compression_method(self) -> CompressionMethod {
        match self {
            StorageMode::Stored => CompressionMethod::Stored,
            StorageMode::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// A single named entry of a container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerPart {
    pub path: String,
    pub content: Vec<u8>,
    pub storage: StorageMode,
}

impl ContainerPart {
    pub fn deflated(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            storage: StorageMode::Deflated,
        }
    }

    pub fn stored(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            storage: StorageMode::Stored,
        }
    }
}

/// Why one part points at another
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// `<Override PartName=...>` in `[Content_Types].xml`
    ContentTypeOverride,
    /// `<Relationship Id=...>` in a `.rels` part
    Relationship { id: String },
    /// `<manifest:file-entry>` in the ODF manifest
    ManifestEntry,
}

/// A reference from one part of the graph to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartLink {
    /// Part holding the reference
    pub from: String,
    /// Referenced part, as an archive path without leading slash
    pub target: String,
    pub kind: LinkKind,
}

/// The ordered parts of one container plus the references between them
#[derive(Debug, Clone, Default)]
pub struct PartGraph {
    parts: Vec<ContainerPart>,
    links: Vec<PartLink>,
}

impl PartGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a part; parts are written in insertion order
    pub fn push(&mut self, part: ContainerPart) -> &mut Self {
        debug!(
            path = %part.path,
            bytes = part.content.len(),
            storage = ?part.storage,
            "adding container part"
        );
        self.parts.push(part);
        self
    }

    pub fn link(&mut self, from: &str, target: &str, kind: LinkKind) -> &mut Self {
        self.links.push(PartLink {
            from: from.to_string(),
            target: target.trim_start_matches('/').to_string(),
            kind,
        });
        self
    }

    pub fn parts(&self) -> &[ContainerPart] {
        &self.parts
    }

    pub fn links(&self) -> &[PartLink] {
        &self.links
    }

    pub fn part(&self, path: &str) -> Option<&ContainerPart> {
        self.parts.iter().find(|p| p.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.part(path).is_some()
    }

    /// Check the invariants every reader relies on.
    ///
    /// - part paths are unique
    /// - every link source and target is a part of this graph
    /// - a `mimetype` marker, when present, is the first part and stored
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for part in &self.parts {
            if !seen.insert(part.path.as_str()) {
                return Err(FixtureError::Construction(format!(
                    "duplicate part {}",
                    part.path
                )));
            }
        }

        for link in &self.links {
            if !seen.contains(link.from.as_str()) {
                return Err(FixtureError::Construction(format!(
                    "link source {} is not a part",
                    link.from
                )));
            }
            if !seen.contains(link.target.as_str()) {
                let what = match &link.kind {
                    LinkKind::ContentTypeOverride => "content type override".to_string(),
                    LinkKind::Relationship { id } => format!("relationship {id}"),
                    LinkKind::ManifestEntry => "manifest entry".to_string(),
                };
                return Err(FixtureError::Construction(format!(
                    "{what} in {} points at missing part {}",
                    link.from, link.target
                )));
            }
        }

        if let Some(position) = self.parts.iter().position(|p| p.path == MIMETYPE_PATH) {
            if position != 0 {
                return Err(FixtureError::Construction(format!(
                    "mimetype marker must be the first part, found at position {position}"
                )));
            }
            if self.parts[0].storage != StorageMode::Stored {
                return Err(FixtureError::Construction(
                    "mimetype marker must be stored without compression".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Writes a [`PartGraph`] into ZIP bytes.
pub struct ContainerBuilder;

impl ContainerBuilder {
    /// Build the archive with every part in graph order.
    ///
    /// Entry timestamps and permissions are fixed, so equal graphs produce
    /// equal bytes.
    pub fn build(graph: &PartGraph) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for part in graph.parts() {
            let options = SimpleFileOptions::default()
                .compression_method(part.storage.compression_method())
                .last_modified_time(DateTime::default())
                .unix_permissions(0o644);
            zip.start_file(part.path.as_str(), options)?;
            zip.write_all(&part.content)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// ZIP local file header signature
pub const LOCAL_FILE_HEADER_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Bytes that sniff as a ZIP archive but are not one: the local file header
/// signature followed by `junk`, with no central directory.
pub fn corrupted_container(junk: &[u8]) -> Vec<u8> {
    let mut bytes = LOCAL_FILE_HEADER_SIGNATURE.to_vec();
    bytes.extend_from_slice(junk);
    bytes
}

/// A run of literal text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// An ordered sequence of runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// A paragraph holding exactly one run
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::new(text)],
        }
    }

    pub fn with_run(mut self, text: impl Into<String>) -> Self {
        self.runs.push(Run::new(text));
        self
    }

    /// The paragraph's text as a reader would recover it
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// `xml:space="preserve"` is needed when surrounding whitespace must survive
pub(crate) fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample_graph() -> PartGraph {
        let mut graph = PartGraph::new();
        graph
            .push(ContainerPart::stored(MIMETYPE_PATH, "application/x-test"))
            .push(ContainerPart::deflated("index.xml", "<index/>"))
            .push(ContainerPart::deflated("body.xml", "<body>text</body>"));
        graph.link("index.xml", "body.xml", LinkKind::ManifestEntry);
        graph
    }

    #[test]
    fn test_valid_graph_passes() {
        assert!(sample_graph().validate().is_ok());
    }

    #[test]
    fn test_dangling_link_rejected() {
        let mut graph = sample_graph();
        graph.link(
            "index.xml",
            "/missing.xml",
            LinkKind::Relationship {
                id: "rId7".to_string(),
            },
        );

        let error = graph.validate().unwrap_err();
        let message = error.to_string();
        assert!(message.contains("relationship rId7"));
        assert!(message.contains("missing.xml"));
    }

    #[test]
    fn test_duplicate_part_rejected() {
        let mut graph = sample_graph();
        graph.push(ContainerPart::deflated("body.xml", "<again/>"));
        assert!(matches!(
            graph.validate(),
            Err(FixtureError::Construction(_))
        ));
    }

    #[test]
    fn test_mimetype_must_be_first() {
        let mut graph = PartGraph::new();
        graph
            .push(ContainerPart::deflated("content.xml", "<c/>"))
            .push(ContainerPart::stored(MIMETYPE_PATH, "application/x-test"));
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_mimetype_must_be_stored() {
        let mut graph = PartGraph::new();
        graph.push(ContainerPart::deflated(MIMETYPE_PATH, "application/x-test"));
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_build_preserves_order_and_storage() {
        let bytes = ContainerBuilder::build(&sample_graph()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        assert_eq!(archive.len(), 3);
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["mimetype", "index.xml", "body.xml"]);

        assert_eq!(
            archive.by_index(0).unwrap().compression(),
            CompressionMethod::Stored
        );
        assert_eq!(
            archive.by_index(2).unwrap().compression(),
            CompressionMethod::Deflated
        );

        let mut body = String::new();
        archive
            .by_name("body.xml")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "<body>text</body>");
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = ContainerBuilder::build(&sample_graph()).unwrap();
        let second = ContainerBuilder::build(&sample_graph()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_graph_builds_empty_archive() {
        let bytes = ContainerBuilder::build(&PartGraph::new()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_corrupted_container_is_rejected_by_readers() {
        let bytes = corrupted_container(b"corrupted zip data that is not valid");
        assert!(bytes.starts_with(LOCAL_FILE_HEADER_SIGNATURE));
        assert!(ZipArchive::new(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_paragraph_text_joins_runs() {
        let paragraph = Paragraph::from_text("Hello ").with_run("world");
        assert_eq!(paragraph.runs.len(), 2);
        assert_eq!(paragraph.text(), "Hello world");
    }

    #[test]
    fn test_space_preserve_detection() {
        assert!(needs_space_preserve(" leading"));
        assert!(needs_space_preserve("trailing "));
        assert!(!needs_space_preserve("inner space"));
        assert!(!needs_space_preserve(""));
    }
}
