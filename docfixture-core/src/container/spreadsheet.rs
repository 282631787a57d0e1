//! SpreadsheetML (`.xlsx`) and the sheet model shared with OpenDocument
//!
//! Text cells never carry their text inline. They hold a zero-based index
//! into the workbook's shared string table, resolved through the
//! `sharedStrings` relationship of the workbook.

use super::opc::{rel_types, OpcPackage, OFFICE_RELATIONSHIPS_NS};
use super::PartGraph;
use crate::error::{FixtureError, Result};
use quick_xml::escape::escape;
use std::collections::HashMap;

pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

pub const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub const SHARED_STRINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// The value as a reader displays it
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }
}

/// Shortest decimal form: `100`, `2.5`, `-0.125`
pub fn format_number(n: f64) -> String {
    format!("{n}")
}

/// [`format_number`] for the cell at `at`; NaN and infinities have no
/// spreadsheet representation.
pub fn number_value(n: f64, at: &str) -> Result<String> {
    if !n.is_finite() {
        return Err(FixtureError::Construction(format!(
            "{at}: cell value {n} is not a finite number"
        )));
    }
    Ok(format_number(n))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<CellValue>) -> Self {
        self.rows.push(row);
        self
    }

    /// Cell values in row-major order
    pub fn text_values(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(CellValue::display))
            .collect()
    }
}

/// Zero-based column index to letters: 0 -> `A`, 25 -> `Z`, 26 -> `AA`
pub fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// `A1`-style reference for zero-based row and column
pub fn cell_reference(row: usize, column: usize) -> String {
    format!("{}{}", column_name(column), row + 1)
}

/// Ordered, de-duplicated text values of a workbook
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    entries: Vec<String>,
    index: HashMap<String, usize>,
    references: usize,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every text cell of `sheets` interned, sheet by sheet in row-major order
    pub fn from_sheets(sheets: &[Sheet]) -> Self {
        let mut table = Self::new();
        for cell in sheets.iter().flat_map(|sheet| sheet.rows.iter().flatten()) {
            if let CellValue::Text(text) = cell {
                table.intern(text);
            }
        }
        table
    }

    /// Index of `text`, appending it on first use
    pub fn intern(&mut self, text: &str) -> usize {
        self.references += 1;
        if let Some(&index) = self.index.get(text) {
            return index;
        }
        let index = self.entries.len();
        self.entries.push(text.to_string());
        self.index.insert(text.to_string(), index);
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of `text` if it was interned; does not count as a reference
    pub fn index_of(&self, text: &str) -> Option<usize> {
        self.index.get(text).copied()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Markup of `xl/sharedStrings.xml`
    ///
    /// `count` is the number of cell references, `uniqueCount` the table size.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<sst xmlns=\"{}\" count=\"{}\" uniqueCount=\"{}\">\n",
            SPREADSHEET_NS,
            self.references,
            self.entries.len()
        ));
        for entry in &self.entries {
            xml.push_str(&format!("    <si><t>{}</t></si>\n", escape(entry.as_str())));
        }
        xml.push_str("</sst>");
        xml
    }
}

/// An OOXML workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn worksheet_part(position: usize) -> String {
        format!("xl/worksheets/sheet{}.xml", position + 1)
    }

    /// Content types, package and workbook relationships, workbook, shared
    /// strings and one part per worksheet.
    ///
    /// A workbook without sheets gets one empty sheet, since readers reject
    /// workbooks with an empty `<sheets>` list.
    pub fn into_part_graph(&self) -> Result<PartGraph> {
        let fallback;
        let sheets: &[Sheet] = if self.sheets.is_empty() {
            fallback = [Sheet::new("Sheet1")];
            &fallback
        } else {
            &self.sheets
        };

        let mut package = OpcPackage::new();
        package.relate(None, rel_types::OFFICE_DOCUMENT, WORKBOOK_PART);

        let mut sheet_ids = Vec::with_capacity(sheets.len());
        for position in 0..sheets.len() {
            sheet_ids.push(package.relate(
                Some(WORKBOOK_PART),
                rel_types::WORKSHEET,
                &Self::worksheet_part(position),
            ));
        }
        package.relate(Some(WORKBOOK_PART), rel_types::SHARED_STRINGS, SHARED_STRINGS_PART);

        let strings = StringTable::from_sheets(sheets);
        let worksheets = sheets
            .iter()
            .map(|sheet| worksheet_xml(sheet, &strings))
            .collect::<Result<Vec<_>>>()?;

        package.add_part(
            WORKBOOK_PART,
            WORKBOOK_CONTENT_TYPE,
            workbook_xml(sheets, &sheet_ids),
        );
        package.add_part(SHARED_STRINGS_PART, SHARED_STRINGS_CONTENT_TYPE, strings.to_xml());
        for (position, xml) in worksheets.into_iter().enumerate() {
            package.add_part(&Self::worksheet_part(position), WORKSHEET_CONTENT_TYPE, xml);
        }

        Ok(package.into_part_graph())
    }
}

fn workbook_xml(sheets: &[Sheet], sheet_ids: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<workbook xmlns=\"{SPREADSHEET_NS}\" xmlns:r=\"{OFFICE_RELATIONSHIPS_NS}\">\n"
    ));
    xml.push_str("    <sheets>\n");
    for (position, (sheet, id)) in sheets.iter().zip(sheet_ids).enumerate() {
        xml.push_str(&format!(
            "        <sheet name=\"{}\" sheetId=\"{}\" r:id=\"{}\"/>\n",
            escape(sheet.name.as_str()),
            position + 1,
            id
        ));
    }
    xml.push_str("    </sheets>\n");
    xml.push_str("</workbook>");
    xml
}

/// Worksheet markup; every text cell must already be in `strings`
fn worksheet_xml(sheet: &Sheet, strings: &StringTable) -> Result<String> {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<worksheet xmlns=\"{SPREADSHEET_NS}\">\n"));
    xml.push_str("    <sheetData>\n");
    for (r, row) in sheet.rows.iter().enumerate() {
        xml.push_str(&format!("        <row r=\"{}\">\n", r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = cell_reference(r, c);
            match cell {
                CellValue::Text(text) => {
                    let index = strings
                        .index_of(text)
                        .filter(|&index| index < strings.len())
                        .ok_or_else(|| {
                            FixtureError::Construction(format!(
                                "{}!{reference}: {text:?} is not in the shared string table",
                                sheet.name
                            ))
                        })?;
                    xml.push_str(&format!(
                        "            <c r=\"{reference}\" t=\"s\"><v>{index}</v></c>\n"
                    ));
                }
                CellValue::Number(n) => {
                    let value = number_value(*n, &format!("{}!{reference}", sheet.name))?;
                    xml.push_str(&format!(
                        "            <c r=\"{reference}\"><v>{value}</v></c>\n"
                    ));
                }
            }
        }
        xml.push_str("        </row>\n");
    }
    xml.push_str("    </sheetData>\n");
    xml.push_str("</worksheet>");
    Ok(xml)
}
