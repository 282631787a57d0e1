//! Hand-assembled PDF documents
//!
//! Objects are written into one growing buffer and the buffer length before
//! each object becomes its cross-reference offset, so the table always agrees
//! with the bytes around it.

pub mod content;

use crate::error::{FixtureError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

/// Header version written by [`PdfBuilder`] and [`corrupted_pdf`].
///
/// Fixtures use 1.4; 1.7 is the last 1.x revision and is what readers
/// built against ISO 32000-1 expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PdfVersion {
    #[default]
    V1_4,
    V1_7,
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_7 => "1.7",
        })
    }
}

/// The header line, e.g. `%PDF-1.4\n`
pub fn header(version: PdfVersion) -> Vec<u8> {
    format!("%PDF-{version}\n").into_bytes()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBody {
    /// A complete dictionary, `<< ... >>`
    Dictionary(String),
    /// Stream data plus extra dictionary entries; `/Length` is always computed
    Stream { entries: String, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfObject {
    pub id: u32,
    pub generation: u16,
    pub body: ObjectBody,
}

impl PdfObject {
    pub fn dictionary(id: u32, dictionary: impl Into<String>) -> Self {
        Self {
            id,
            generation: 0,
            body: ObjectBody::Dictionary(dictionary.into()),
        }
    }

    pub fn stream(id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            generation: 0,
            body: ObjectBody::Stream {
                entries: String::new(),
                data: data.into(),
            },
        }
    }
}

/// One row of the `xref` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossReferenceEntry {
    pub byte_offset: u64,
    pub generation: u16,
    pub in_use: bool,
}

impl CrossReferenceEntry {
    /// Generation written on free entries for ids that were never used
    pub const FREED_GENERATION: u16 = 1;

    /// Head of the free list when no other id is free
    pub const FREE_HEAD: CrossReferenceEntry = CrossReferenceEntry::free_head(0);

    /// Object 0, pointing at the first free id (0 ends the list)
    pub const fn free_head(next_free: u32) -> Self {
        Self {
            byte_offset: next_free as u64,
            generation: 65535,
            in_use: false,
        }
    }

    /// A free entry linking to the next free id
    pub const fn free(next_free: u32) -> Self {
        Self {
            byte_offset: next_free as u64,
            generation: Self::FREED_GENERATION,
            in_use: false,
        }
    }

    /// The fixed 20-byte line form
    pub fn to_line(&self) -> String {
        format!(
            "{:010} {:05} {} \n",
            self.byte_offset,
            self.generation,
            if self.in_use { 'n' } else { 'f' }
        )
    }
}

/// Output of [`PdfBuilder::build_document`]
#[derive(Debug, Clone)]
pub struct BuiltPdf {
    pub bytes: Vec<u8>,
    /// Indexed by object id, entry 0 is the free-list head
    pub xref: Vec<CrossReferenceEntry>,
    pub xref_offset: u64,
}

/// Builder for flat, single-revision PDF files
#[derive(Debug, Clone)]
pub struct PdfBuilder {
    version: PdfVersion,
    objects: Vec<PdfObject>,
    root: u32,
    include_binary_marker: bool,
    compress_streams: bool,
}

impl PdfBuilder {
    /// An empty document whose catalog will be object `root`
    pub fn new(root: u32) -> Self {
        Self {
            version: PdfVersion::default(),
            objects: Vec::new(),
            root,
            include_binary_marker: true,
            compress_streams: false,
        }
    }

    /// Catalog, page tree, one Letter page, its content stream and a
    /// Helvetica font, showing one line of text per entry of `lines`.
    ///
    /// The font uses WinAnsiEncoding; a line with a character outside it is
    /// rejected.
    pub fn text_document<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut builder = Self::new(1);
        builder
            .add_object(PdfObject::dictionary(1, "<< /Type /Catalog /Pages 2 0 R >>"))
            .add_object(PdfObject::dictionary(
                2,
                "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            ))
            .add_object(PdfObject::dictionary(
                3,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /{} 5 0 R >> >> >>",
                    content::FONT_RESOURCE
                ),
            ))
            .add_object(PdfObject::stream(4, content::text_stream(lines)?))
            .add_object(PdfObject::dictionary(
                5,
                "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
            ));
        Ok(builder)
    }

    /// A structurally valid single page whose content stream is empty
    pub fn empty_document() -> Self {
        let mut builder = Self::new(1);
        builder
            .add_object(PdfObject::dictionary(1, "<< /Type /Catalog /Pages 2 0 R >>"))
            .add_object(PdfObject::dictionary(
                2,
                "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            ))
            .add_object(PdfObject::dictionary(
                3,
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>",
            ))
            .add_object(PdfObject::stream(4, Vec::new()));
        builder
    }

    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    /// Emit the `%âãÏÓ` comment after the header
    pub fn with_binary_marker(mut self, include: bool) -> Self {
        self.include_binary_marker = include;
        self
    }

    /// Flate-compress non-empty stream data
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress_streams = compress;
        self
    }

    pub fn add_object(&mut self, object: PdfObject) -> &mut Self {
        self.objects.push(object);
        self
    }

    pub fn objects(&self) -> &[PdfObject] {
        &self.objects
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        self.build_document().map(|built| built.bytes)
    }

    pub fn build_document(&self) -> Result<BuiltPdf> {
        self.check_objects()?;

        let mut pdf = header(self.version);
        if self.include_binary_marker {
            pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        }

        let mut positions: BTreeMap<u32, (u64, u16)> = BTreeMap::new();
        for object in &self.objects {
            let offset = pdf.len() as u64;
            positions.insert(object.id, (offset, object.generation));
            debug!(id = object.id, offset, "writing object");

            pdf.extend_from_slice(format!("{} {} obj\n", object.id, object.generation).as_bytes());
            self.write_body(&mut pdf, &object.body)?;
            pdf.extend_from_slice(b"\nendobj\n");
        }

        let max_id = positions.keys().next_back().copied().unwrap_or(0);
        let free_ids: Vec<u32> = (1..=max_id)
            .filter(|id| !positions.contains_key(id))
            .collect();
        // each free entry points at the next free id; the last one at 0
        let next_free = |after: u32| {
            free_ids
                .iter()
                .copied()
                .find(|&id| id > after)
                .unwrap_or(0)
        };

        let mut xref = Vec::with_capacity(max_id as usize + 1);
        xref.push(CrossReferenceEntry::free_head(next_free(0)));
        for id in 1..=max_id {
            xref.push(match positions.get(&id) {
                Some(&(byte_offset, generation)) => CrossReferenceEntry {
                    byte_offset,
                    generation,
                    in_use: true,
                },
                None => CrossReferenceEntry::free(next_free(id)),
            });
        }

        let xref_offset = pdf.len() as u64;
        pdf.extend_from_slice(b"xref\n");
        pdf.extend_from_slice(format!("0 {}\n", xref.len()).as_bytes());
        for entry in &xref {
            pdf.extend_from_slice(entry.to_line().as_bytes());
        }

        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                xref.len(),
                self.root,
                xref_offset
            )
            .as_bytes(),
        );

        Ok(BuiltPdf {
            bytes: pdf,
            xref,
            xref_offset,
        })
    }

    fn check_objects(&self) -> Result<()> {
        let mut seen = BTreeMap::new();
        for object in &self.objects {
            if object.id == 0 {
                return Err(FixtureError::Construction(
                    "object 0 is reserved for the free list".to_string(),
                ));
            }
            if seen.insert(object.id, ()).is_some() {
                return Err(FixtureError::Construction(format!(
                    "object {} defined twice",
                    object.id
                )));
            }
        }
        if !seen.contains_key(&self.root) {
            return Err(FixtureError::Construction(format!(
                "root object {} is not defined",
                self.root
            )));
        }
        Ok(())
    }

    fn write_body(&self, pdf: &mut Vec<u8>, body: &ObjectBody) -> Result<()> {
        match body {
            ObjectBody::Dictionary(dictionary) => pdf.extend_from_slice(dictionary.as_bytes()),
            ObjectBody::Stream { entries, data } => {
                let (data, filter) = if self.compress_streams && !data.is_empty() {
                    (deflate(data)?, " /Filter /FlateDecode")
                } else {
                    (data.clone(), "")
                };
                pdf.extend_from_slice(
                    format!("<< /Length {}{}{} >>\nstream\n", data.len(), filter, entries)
                        .as_bytes(),
                );
                pdf.extend_from_slice(&data);
                pdf.extend_from_slice(b"\nendstream");
            }
        }
        Ok(())
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// A file that starts like a PDF and then is not one: header followed by
/// `junk`, with no objects, no cross-reference table and no trailer.
pub fn corrupted_pdf(version: PdfVersion, junk: &[u8]) -> Vec<u8> {
    let mut pdf = header(version);
    pdf.extend_from_slice(junk);
    pdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn object_at(bytes: &[u8], offset: u64) -> &[u8] {
        &bytes[offset as usize..]
    }

    #[test]
    fn test_text_document_structure() {
        let pdf = PdfBuilder::text_document(&["Hello from PDF document"])
            .unwrap()
            .build()
            .unwrap();
        let content = String::from_utf8_lossy(&pdf);

        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(content.contains("/Type /Catalog"));
        assert!(content.contains("/BaseFont /Helvetica /Encoding /WinAnsiEncoding"));
        assert!(content.contains("(Hello from PDF document) Tj"));
        assert!(content.contains("trailer\n<< /Size 6 /Root 1 0 R >>"));
    }

    #[test]
    fn test_offsets_match_object_tokens() {
        let built = PdfBuilder::text_document(&["One", "Two"])
            .unwrap()
            .build_document()
            .unwrap();

        assert_eq!(built.xref.len(), 6);
        assert_eq!(built.xref[0], CrossReferenceEntry::FREE_HEAD);
        for (id, entry) in built.xref.iter().enumerate().skip(1) {
            assert!(entry.in_use);
            let token = format!("{id} 0 obj");
            assert!(
                object_at(&built.bytes, entry.byte_offset).starts_with(token.as_bytes()),
                "object {id} not at offset {}",
                entry.byte_offset
            );
        }
        assert!(object_at(&built.bytes, built.xref_offset).starts_with(b"xref\n0 6\n"));

        let tail = String::from_utf8_lossy(&built.bytes).to_string();
        assert!(tail.ends_with(&format!("startxref\n{}\n%%EOF\n", built.xref_offset)));
    }

    #[test]
    fn test_stream_length_is_exact() {
        let stream = content::text_stream(&["Line"]).unwrap();
        let pdf = PdfBuilder::text_document(&["Line"]).unwrap().build().unwrap();
        let content = String::from_utf8_lossy(&pdf);
        assert!(content.contains(&format!("<< /Length {} >>\nstream\n", stream.len())));
    }

    #[test]
    fn test_empty_document_has_zero_length_stream() {
        let pdf = PdfBuilder::empty_document().build().unwrap();
        let content = String::from_utf8_lossy(&pdf);

        assert!(content.contains("4 0 obj\n<< /Length 0 >>\nstream\n\nendstream\nendobj"));
        assert!(!content.contains("Tj"));
        assert!(!content.contains("/Font"));
        assert!(content.contains("/Size 5 /Root 1 0 R"));
    }

    #[test]
    fn test_sparse_ids_get_free_entries() {
        let mut builder = PdfBuilder::new(1);
        builder
            .add_object(PdfObject::dictionary(1, "<< /Type /Catalog /Pages 4 0 R >>"))
            .add_object(PdfObject::dictionary(4, "<< /Type /Pages /Kids [] /Count 0 >>"));
        let built = builder.build_document().unwrap();

        assert_eq!(built.xref.len(), 5);
        assert_eq!(built.xref[0], CrossReferenceEntry::free_head(2));
        assert!(built.xref[1].in_use);
        assert_eq!(built.xref[2], CrossReferenceEntry::free(3));
        assert_eq!(built.xref[3], CrossReferenceEntry::free(0));
        assert!(built.xref[4].in_use);
        assert!(object_at(&built.bytes, built.xref[4].byte_offset).starts_with(b"4 0 obj"));
    }

    #[test]
    fn test_objects_written_in_supplied_order() {
        let mut builder = PdfBuilder::new(2);
        builder
            .add_object(PdfObject::dictionary(3, "<< /Type /Pages /Kids [] /Count 0 >>"))
            .add_object(PdfObject::dictionary(2, "<< /Type /Catalog /Pages 3 0 R >>"));
        let built = builder.build_document().unwrap();
        assert!(built.xref[3].byte_offset < built.xref[2].byte_offset);
    }

    #[test]
    fn test_duplicate_and_reserved_ids_rejected() {
        let mut builder = PdfBuilder::new(1);
        builder
            .add_object(PdfObject::dictionary(1, "<< >>"))
            .add_object(PdfObject::dictionary(1, "<< >>"));
        assert!(matches!(builder.build(), Err(FixtureError::Construction(_))));

        let mut builder = PdfBuilder::new(1);
        builder.add_object(PdfObject::dictionary(0, "<< >>"));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_missing_root_rejected() {
        let mut builder = PdfBuilder::new(9);
        builder.add_object(PdfObject::dictionary(1, "<< >>"));
        let error = builder.build().unwrap_err();
        assert!(error.to_string().contains("root object 9"));
    }

    #[test]
    fn test_compressed_stream_round_trips() {
        let built = PdfBuilder::text_document(&["Compressed line"])
            .unwrap()
            .with_compression(true)
            .build_document()
            .unwrap();
        let offset = built.xref[4].byte_offset as usize;
        let object = &built.bytes[offset..];
        let text = String::from_utf8_lossy(object);
        assert!(text.starts_with("4 0 obj\n<< /Length "));
        assert!(text.contains("/Filter /FlateDecode"));

        let start = object.windows(7).position(|w| w == b"stream\n").unwrap() + 7;
        let end = object.windows(10).position(|w| w == b"\nendstream").unwrap();
        let mut decoded = String::new();
        ZlibDecoder::new(&object[start..end])
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("(Compressed line) Tj"));
    }

    #[test]
    fn test_binary_marker_toggle() {
        let with_marker = PdfBuilder::empty_document().build().unwrap();
        assert!(with_marker.starts_with(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n1 0 obj"));

        let without = PdfBuilder::empty_document()
            .with_binary_marker(false)
            .with_version(PdfVersion::V1_7)
            .build()
            .unwrap();
        assert!(without.starts_with(b"%PDF-1.7\n1 0 obj"));
    }

    #[test]
    fn test_corrupted_pdf_is_header_plus_junk() {
        let pdf = corrupted_pdf(PdfVersion::V1_4, b"This is not a valid PDF content");
        assert_eq!(pdf, b"%PDF-1.4\nThis is not a valid PDF content".to_vec());
    }

    #[test]
    fn test_xref_line_is_twenty_bytes() {
        let entry = CrossReferenceEntry {
            byte_offset: 15,
            generation: 0,
            in_use: true,
        };
        assert_eq!(entry.to_line(), "0000000015 00000 n \n");
        assert_eq!(entry.to_line().len(), 20);
        assert_eq!(CrossReferenceEntry::FREE_HEAD.to_line(), "0000000000 65535 f \n");
        assert_eq!(CrossReferenceEntry::free(7).to_line(), "0000000007 00001 f \n");
    }

    #[test]
    fn test_free_list_walks_every_gap() {
        let mut builder = PdfBuilder::new(1);
        builder
            .add_object(PdfObject::dictionary(1, "<< /Type /Catalog >>"))
            .add_object(PdfObject::dictionary(3, "<< >>"))
            .add_object(PdfObject::dictionary(6, "<< >>"));
        let built = builder.build_document().unwrap();

        let mut walked = Vec::new();
        let mut next = built.xref[0].byte_offset as usize;
        while next != 0 {
            assert!(!built.xref[next].in_use);
            walked.push(next);
            next = built.xref[next].byte_offset as usize;
        }
        assert_eq!(walked, vec![2, 4, 5]);
    }

    #[test]
    fn test_text_document_rejects_unencodable_lines() {
        assert!(PdfBuilder::text_document(&["café"]).is_ok());
        assert!(matches!(
            PdfBuilder::text_document(&["café", "Привет"]),
            Err(FixtureError::Construction(_))
        ));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(PdfVersion::default(), PdfVersion::V1_4);
        assert_eq!(header(PdfVersion::V1_7), b"%PDF-1.7\n".to_vec());
    }
}
