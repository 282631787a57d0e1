//! Fixture catalog
//!
//! The catalog is plain data: a static list of [`FixtureDefinition`]s, each
//! naming an output file, its format, its validity class and the content to
//! embed. Rendering dispatches a definition to the container or PDF builder;
//! generation writes every rendered fixture into one directory.

mod standard;

pub use standard::STANDARD_FIXTURES;

use crate::container::opendocument::OdfDocument;
use crate::container::presentation::{Presentation, Shape, Slide};
use crate::container::spreadsheet::{format_number, CellValue, Sheet, Workbook};
use crate::container::wordprocessing::WordDocument;
use crate::container::{corrupted_container, ContainerBuilder, PartGraph};
use crate::error::{FixtureError, Result};
use crate::pdf::content::win_ansi_code;
use crate::pdf::{corrupted_pdf, PdfBuilder, PdfVersion};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the JSON manifest written next to the fixtures
pub const MANIFEST_FILE: &str = "fixtures.json";

/// Directory the fixtures live in, next to the catalog that defines them
pub fn default_output_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("text_extraction")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Docx,
    Xlsx,
    Pptx,
    Odt,
    Ods,
    Pdf,
}

impl FormatTag {
    pub fn extension(self) -> &'static str {
        match self {
            FormatTag::Docx => "docx",
            FormatTag::Xlsx => "xlsx",
            FormatTag::Pptx => "pptx",
            FormatTag::Odt => "odt",
            FormatTag::Ods => "ods",
            FormatTag::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FormatTag::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FormatTag::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FormatTag::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            FormatTag::Odt => crate::container::opendocument::TEXT_MEDIA_TYPE,
            FormatTag::Ods => crate::container::opendocument::SPREADSHEET_MEDIA_TYPE,
            FormatTag::Pdf => "application/pdf",
        }
    }

    /// Whether the format is a ZIP container
    pub fn is_container(self) -> bool {
        !matches!(self, FormatTag::Pdf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Validity {
    /// Opens and yields the embedded text
    ValidWithText,
    /// Opens and yields no text
    ValidEmpty,
    /// Must fail to open or fail to decode
    Corrupted,
}

/// A spreadsheet cell as written in the static table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
}

impl Cell {
    fn to_value(self) -> CellValue {
        match self {
            Cell::Text(text) => CellValue::Text(text.to_string()),
            Cell::Number(n) => CellValue::Number(n),
        }
    }
}

/// What a fixture embeds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixtureContent {
    /// One single-run paragraph per line (docx, odt)
    Paragraphs(&'static [&'static str]),
    /// Rows of cells of a single sheet (xlsx, ods)
    Table(&'static [&'static [Cell]]),
    /// One text box per slide, one paragraph per line (pptx)
    Slides(&'static [&'static [&'static str]]),
    /// One shown text line each (pdf)
    Lines(&'static [&'static str]),
    /// A valid document with no text
    Empty,
    /// The format's magic bytes followed by these bytes
    Corrupted(&'static [u8]),
}

impl FixtureContent {
    fn validity(self) -> Validity {
        match self {
            FixtureContent::Empty => Validity::ValidEmpty,
            FixtureContent::Corrupted(_) => Validity::Corrupted,
            _ => Validity::ValidWithText,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureDefinition {
    pub format: FormatTag,
    pub output_name: &'static str,
    pub validity: Validity,
    pub content: FixtureContent,
}

impl FixtureDefinition {
    /// Text a conforming reader recovers, in reading order.
    ///
    /// Spreadsheet cells are listed row by row; numbers in their written form.
    pub fn expected_text(&self) -> Vec<String> {
        match self.content {
            FixtureContent::Paragraphs(lines) | FixtureContent::Lines(lines) => {
                lines.iter().map(|l| l.to_string()).collect()
            }
            FixtureContent::Table(rows) => rows
                .iter()
                .flat_map(|row| row.iter())
                .map(|cell| match *cell {
                    Cell::Text(text) => text.to_string(),
                    Cell::Number(n) => format_number(n),
                })
                .collect(),
            FixtureContent::Slides(slides) => slides
                .iter()
                .flat_map(|lines| lines.iter().map(|l| l.to_string()))
                .collect(),
            FixtureContent::Empty | FixtureContent::Corrupted(_) => Vec::new(),
        }
    }

    /// Reject definitions whose parts do not fit together
    pub fn check(&self) -> Result<()> {
        if self.content.validity() != self.validity {
            return Err(FixtureError::Construction(format!(
                "{}: content is {:?} but fixture is declared {:?}",
                self.output_name,
                self.content.validity(),
                self.validity
            )));
        }

        let expected_extension = format!(".{}", self.format.extension());
        if !self.output_name.ends_with(&expected_extension) {
            return Err(FixtureError::Construction(format!(
                "{}: {:?} fixtures must end in {}",
                self.output_name, self.format, expected_extension
            )));
        }

        let fits = match self.content {
            FixtureContent::Paragraphs(_) => {
                matches!(self.format, FormatTag::Docx | FormatTag::Odt)
            }
            FixtureContent::Table(_) => matches!(self.format, FormatTag::Xlsx | FormatTag::Ods),
            FixtureContent::Slides(_) => self.format == FormatTag::Pptx,
            FixtureContent::Lines(_) => self.format == FormatTag::Pdf,
            FixtureContent::Empty | FixtureContent::Corrupted(_) => true,
        };
        if !fits {
            return Err(FixtureError::Construction(format!(
                "{}: {:?} content cannot be written as {:?}",
                self.output_name, self.content, self.format
            )));
        }

        match self.content {
            FixtureContent::Lines(lines) => {
                let unencodable = lines
                    .iter()
                    .flat_map(|line| line.chars())
                    .find(|&c| win_ansi_code(c).is_none());
                if let Some(c) = unencodable {
                    return Err(FixtureError::Construction(format!(
                        "{}: {c:?} cannot be shown with the WinAnsi page font",
                        self.output_name
                    )));
                }
            }
            FixtureContent::Table(rows) => {
                let non_finite = rows.iter().flat_map(|row| row.iter()).find_map(|cell| match *cell {
                    Cell::Number(n) if !n.is_finite() => Some(n),
                    _ => None,
                });
                if let Some(n) = non_finite {
                    return Err(FixtureError::Construction(format!(
                        "{}: cell value {n} is not a finite number",
                        self.output_name
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// The part graph of a valid container fixture
    pub fn part_graph(&self) -> Result<PartGraph> {
        self.check()?;
        let graph = match (self.format, self.content) {
            (FormatTag::Docx, FixtureContent::Paragraphs(lines)) => {
                WordDocument::from_lines(lines.iter().copied()).into_part_graph()
            }
            (FormatTag::Docx, FixtureContent::Empty) => WordDocument::empty().into_part_graph(),
            (FormatTag::Xlsx, FixtureContent::Table(rows)) => {
                Workbook::new(vec![table_sheet(rows)]).into_part_graph()?
            }
            (FormatTag::Xlsx, FixtureContent::Empty) => Workbook::default().into_part_graph()?,
            (FormatTag::Pptx, FixtureContent::Slides(slides)) => Presentation::new(
                slides
                    .iter()
                    .map(|lines| Slide::new(vec![Shape::text_box("Title", lines.iter().copied())]))
                    .collect(),
            )
            .into_part_graph(),
            (FormatTag::Pptx, FixtureContent::Empty) => Presentation::default().into_part_graph(),
            (FormatTag::Odt, FixtureContent::Paragraphs(lines)) => {
                OdfDocument::text_from_lines(lines.iter().copied()).into_part_graph()?
            }
            (FormatTag::Odt, FixtureContent::Empty) => {
                OdfDocument::Text(Vec::new()).into_part_graph()?
            }
            (FormatTag::Ods, FixtureContent::Table(rows)) => {
                OdfDocument::Spreadsheet(vec![table_sheet(rows)]).into_part_graph()?
            }
            (FormatTag::Ods, FixtureContent::Empty) => {
                OdfDocument::Spreadsheet(vec![Sheet::new("Sheet1")]).into_part_graph()?
            }
            (format, content) => {
                return Err(FixtureError::Construction(format!(
                    "{}: no part graph for {:?} {:?}",
                    self.output_name, format, content
                )))
            }
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Complete file bytes of this fixture
    pub fn render(&self) -> Result<Vec<u8>> {
        self.check()?;
        match (self.format, self.content) {
            (FormatTag::Pdf, FixtureContent::Lines(lines)) => PdfBuilder::text_document(lines)?.build(),
            (FormatTag::Pdf, FixtureContent::Empty) => PdfBuilder::empty_document().build(),
            (FormatTag::Pdf, FixtureContent::Corrupted(junk)) => {
                Ok(corrupted_pdf(PdfVersion::V1_4, junk))
            }
            (_, FixtureContent::Corrupted(junk)) => Ok(corrupted_container(junk)),
            _ => ContainerBuilder::build(&self.part_graph()?),
        }
    }
}

fn table_sheet(rows: &[&[Cell]]) -> Sheet {
    Sheet {
        name: "Sheet1".to_string(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_value()).collect())
            .collect(),
    }
}

/// Result of writing one fixture
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFixture {
    pub name: &'static str,
    pub path: PathBuf,
    pub size: usize,
    pub validity: Validity,
}

/// A fixture on disk that no longer matches its definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureDrift {
    Missing {
        name: &'static str,
    },
    Changed {
        name: &'static str,
        expected_size: usize,
        actual_size: usize,
    },
}

impl FixtureDrift {
    pub fn name(&self) -> &'static str {
        match self {
            FixtureDrift::Missing { name } | FixtureDrift::Changed { name, .. } => name,
        }
    }
}

impl std::fmt::Display for FixtureDrift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureDrift::Missing { name } => write!(f, "{name}: missing"),
            FixtureDrift::Changed {
                name,
                expected_size,
                actual_size,
            } => write!(
                f,
                "{name}: differs from definition ({actual_size} bytes on disk, {expected_size} expected)"
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub name: &'static str,
    pub format: FormatTag,
    pub mime_type: &'static str,
    pub validity: Validity,
    pub expected_text: Vec<String>,
    pub size: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub generator: String,
    pub fixtures: Vec<ManifestEntry>,
}

/// An ordered set of fixture definitions
#[derive(Debug, Clone, Copy)]
pub struct FixtureCatalog {
    definitions: &'static [FixtureDefinition],
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl FixtureCatalog {
    /// The ten text-extraction fixtures
    pub fn standard() -> Self {
        Self::new(STANDARD_FIXTURES)
    }

    pub fn new(definitions: &'static [FixtureDefinition]) -> Self {
        Self { definitions }
    }

    pub fn definitions(&self) -> &'static [FixtureDefinition] {
        self.definitions
    }

    pub fn find(&self, output_name: &str) -> Option<&'static FixtureDefinition> {
        self.definitions
            .iter()
            .find(|d| d.output_name == output_name)
    }

    /// Render every fixture and write it into `output_dir`, overwriting
    /// existing files.
    ///
    /// Stops at the first failure; fixtures already written stay on disk and
    /// are rewritten by the next run.
    pub fn generate<P: AsRef<Path>>(&self, output_dir: P) -> Result<Vec<GeneratedFixture>> {
        let output_dir = output_dir.as_ref();
        info!(dir = %output_dir.display(), "Generating text extraction fixtures");
        fs::create_dir_all(output_dir).map_err(|e| FixtureError::persist(output_dir, e))?;

        let mut generated = Vec::with_capacity(self.definitions.len());
        for definition in self.definitions {
            let bytes = definition.render()?;
            let path = output_dir.join(definition.output_name);
            fs::write(&path, &bytes).map_err(|e| FixtureError::persist(&path, e))?;
            info!(
                path = %path.display(),
                bytes = bytes.len(),
                validity = ?definition.validity,
                "Created fixture"
            );
            generated.push(GeneratedFixture {
                name: definition.output_name,
                path,
                size: bytes.len(),
                validity: definition.validity,
            });
        }

        Ok(generated)
    }

    /// Compare the files in `output_dir` with freshly rendered fixtures
    pub fn verify<P: AsRef<Path>>(&self, output_dir: P) -> Result<Vec<FixtureDrift>> {
        let output_dir = output_dir.as_ref();
        let mut drift = Vec::new();

        for definition in self.definitions {
            let expected = definition.render()?;
            let path = output_dir.join(definition.output_name);
            match fs::read(&path) {
                Ok(actual) if actual == expected => {
                    debug!(path = %path.display(), "fixture up to date");
                }
                Ok(actual) => {
                    warn!(path = %path.display(), "fixture differs from its definition");
                    drift.push(FixtureDrift::Changed {
                        name: definition.output_name,
                        expected_size: expected.len(),
                        actual_size: actual.len(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(path = %path.display(), "fixture missing");
                    drift.push(FixtureDrift::Missing {
                        name: definition.output_name,
                    });
                }
                Err(e) => return Err(FixtureError::persist(&path, e)),
            }
        }

        Ok(drift)
    }

    pub fn manifest(&self) -> Result<Manifest> {
        let mut fixtures = Vec::with_capacity(self.definitions.len());
        for definition in self.definitions {
            let bytes = definition.render()?;
            fixtures.push(ManifestEntry {
                name: definition.output_name,
                format: definition.format,
                mime_type: definition.format.mime_type(),
                validity: definition.validity,
                expected_text: definition.expected_text(),
                size: bytes.len(),
                sha256: hex::encode(Sha256::digest(&bytes)),
            });
        }

        Ok(Manifest {
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            fixtures,
        })
    }

    /// Write [`MANIFEST_FILE`] into `output_dir` and return its path
    pub fn write_manifest<P: AsRef<Path>>(&self, output_dir: P) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        let json = serde_json::to_string_pretty(&self.manifest()?)?;
        let path = output_dir.join(MANIFEST_FILE);
        fs::create_dir_all(output_dir).map_err(|e| FixtureError::persist(output_dir, e))?;
        fs::write(&path, json).map_err(|e| FixtureError::persist(&path, e))?;
        info!(path = %path.display(), "Wrote fixture manifest");
        Ok(path)
    }
}
