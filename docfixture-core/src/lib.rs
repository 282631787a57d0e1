//! # docfixture
//!
//! Deterministic document fixtures for exercising text-extraction pipelines.
//!
//! ## Features
//!
//! - **Office containers**: minimal DOCX, XLSX and PPTX packages with correct
//!   content types and relationships
//! - **OpenDocument**: ODT and ODS archives with a stored `mimetype` marker
//! - **PDF**: single-page text documents with an exact cross-reference table
//! - **Negative fixtures**: valid-but-empty documents and files that sniff as
//!   the right format but fail to open
//! - **Reproducible**: equal definitions always produce equal bytes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docfixture::{FixtureCatalog, Result};
//!
//! # fn main() -> Result<()> {
//! let catalog = FixtureCatalog::standard();
//! for fixture in catalog.generate("fixtures/text_extraction")? {
//!     println!("{} ({} bytes)", fixture.path.display(), fixture.size);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Rendering a single fixture
//!
//! ```rust
//! use docfixture::{FixtureCatalog, Result};
//!
//! # fn main() -> Result<()> {
//! let pdf = FixtureCatalog::standard().find("document.pdf").unwrap();
//! let bytes = pdf.render()?;
//! assert!(bytes.starts_with(b"%PDF-1.4"));
//! assert_eq!(pdf.expected_text()[0], "Hello from PDF document");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod container;
pub mod error;
pub mod pdf;

pub use catalog::{
    default_output_dir, Cell, FixtureCatalog, FixtureContent, FixtureDefinition, FixtureDrift,
    FormatTag, GeneratedFixture, Manifest, ManifestEntry, Validity, MANIFEST_FILE,
    STANDARD_FIXTURES,
};
pub use container::{ContainerBuilder, ContainerPart, PartGraph, StorageMode};
pub use error::{FixtureError, Result};
pub use pdf::{PdfBuilder, PdfVersion};

/// Current version of docfixture
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_every_standard_fixture_renders() {
        for definition in FixtureCatalog::standard().definitions() {
            let bytes = definition.render().unwrap();
            assert!(!bytes.is_empty(), "{} rendered empty", definition.output_name);
        }
    }
}
