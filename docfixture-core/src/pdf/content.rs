//! Content stream operators for plain text pages

use crate::error::{FixtureError, Result};

/// Resource name of the single font on text pages
pub const FONT_RESOURCE: &str = "F1";
pub const FONT_SIZE: u32 = 24;
/// Start of the first baseline, in points from the bottom-left corner
pub const TEXT_ORIGIN: (u32, u32) = (100, 700);
/// Distance between consecutive baselines
pub const LINE_LEADING: u32 = 30;

/// `BT ... ET` block showing each line below the previous one.
///
/// No lines gives an empty stream rather than an empty text object.
pub fn text_stream<S: AsRef<str>>(lines: &[S]) -> Result<Vec<u8>> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let mut stream = Vec::new();
    stream.extend_from_slice(b"BT\n");
    stream.extend_from_slice(format!("/{FONT_RESOURCE} {FONT_SIZE} Tf\n").as_bytes());
    stream.extend_from_slice(format!("{} {} Td\n", TEXT_ORIGIN.0, TEXT_ORIGIN.1).as_bytes());

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            stream.extend_from_slice(format!("0 -{LINE_LEADING} Td\n").as_bytes());
        }
        stream.extend_from_slice(&literal_string(line.as_ref())?);
        stream.extend_from_slice(b" Tj\n");
    }

    stream.extend_from_slice(b"ET");
    Ok(stream)
}

/// WinAnsiEncoding code for `c`, if the encoding has one.
///
/// Latin-1 maps onto itself; 0x80..=0x9F hold the Windows-1252 punctuation.
pub fn win_ansi_code(c: char) -> Option<u8> {
    let code = match c {
        '\u{0}'..='\u{7F}' | '\u{A0}'..='\u{FF}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Encode `text` as a PDF literal string, parentheses included.
///
/// Bytes follow WinAnsiEncoding, the encoding declared on the page font.
/// Anything above printable ASCII is written as an octal escape. A character
/// with no WinAnsi code is a construction error.
pub fn literal_string(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        match c {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            ' '..='~' => out.push(c as u8),
            _ => {
                let code = win_ansi_code(c).ok_or_else(|| {
                    FixtureError::Construction(format!(
                        "{c:?} (U+{:04X}) has no WinAnsiEncoding code",
                        c as u32
                    ))
                })?;
                out.extend_from_slice(format!("\\{code:03o}").as_bytes());
            }
        }
    }
    out.push(b')');
    Ok(out)
}
