//! The text-extraction fixture set

use super::{Cell, FixtureContent, FixtureDefinition, FormatTag, Validity};

pub const DOCX_LINES: &[&str] = &[
    "Hello from DOCX document",
    "This is test content for FamilyVault text extraction",
    "Тестовая строка на русском языке",
];

pub const XLSX_ROWS: &[&[Cell]] = &[
    &[Cell::Text("Name"), Cell::Text("Value")],
    &[Cell::Text("Excel test data"), Cell::Number(100.0)],
    &[Cell::Text("FamilyVault spreadsheet"), Cell::Number(200.0)],
];

pub const PPTX_SLIDES: &[&[&str]] = &[&[
    "PowerPoint Test Slide",
    "FamilyVault presentation extraction test",
]];

pub const ODT_LINES: &[&str] = &[
    "Hello from ODT document",
    "This is OpenDocument text for FamilyVault",
    "Текст на русском языке в ODT",
];

pub const ODS_ROWS: &[&[Cell]] = &[
    &[Cell::Text("Name"), Cell::Text("Value")],
    &[Cell::Text("ODS test item"), Cell::Number(100.0)],
    &[Cell::Text("FamilyVault spreadsheet"), Cell::Number(200.0)],
];

pub const PDF_LINES: &[&str] = &["Hello from PDF document", "FamilyVault PDF test"];

pub const STANDARD_FIXTURES: &[FixtureDefinition] = &[
    FixtureDefinition {
        format: FormatTag::Docx,
        output_name: "document.docx",
        validity: Validity::ValidWithText,
        content: FixtureContent::Paragraphs(DOCX_LINES),
    },
    FixtureDefinition {
        format: FormatTag::Xlsx,
        output_name: "data.xlsx",
        validity: Validity::ValidWithText,
        content: FixtureContent::Table(XLSX_ROWS),
    },
    FixtureDefinition {
        format: FormatTag::Pptx,
        output_name: "presentation.pptx",
        validity: Validity::ValidWithText,
        content: FixtureContent::Slides(PPTX_SLIDES),
    },
    FixtureDefinition {
        format: FormatTag::Odt,
        output_name: "document.odt",
        validity: Validity::ValidWithText,
        content: FixtureContent::Paragraphs(ODT_LINES),
    },
    FixtureDefinition {
        format: FormatTag::Ods,
        output_name: "data.ods",
        validity: Validity::ValidWithText,
        content: FixtureContent::Table(ODS_ROWS),
    },
    FixtureDefinition {
        format: FormatTag::Pdf,
        output_name: "document.pdf",
        validity: Validity::ValidWithText,
        content: FixtureContent::Lines(PDF_LINES),
    },
    FixtureDefinition {
        format: FormatTag::Pdf,
        output_name: "empty.pdf",
        validity: Validity::ValidEmpty,
        content: FixtureContent::Empty,
    },
    FixtureDefinition {
        format: FormatTag::Docx,
        output_name: "empty.docx",
        validity: Validity::ValidEmpty,
        content: FixtureContent::Empty,
    },
    FixtureDefinition {
        format: FormatTag::Docx,
        output_name: "corrupted.docx",
        validity: Validity::Corrupted,
        content: FixtureContent::Corrupted(b"corrupted zip data that is not valid"),
    },
    FixtureDefinition {
        format: FormatTag::Pdf,
        output_name: "corrupted.pdf",
        validity: Validity::Corrupted,
        content: FixtureContent::Corrupted(b"This is not a valid PDF content"),
    },
];
