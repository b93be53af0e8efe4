//! PDF rendering for lesson documents.
//!
//! Produces a minimal PDF 1.4 file: A4 pages, the built-in Helvetica font
//! with `WinAnsiEncoding`, and one uncompressed content stream per page.
//! Characters outside that encoding are drawn as `?`.
//!
//! # Example
//!
//! ```rust
//! use babble_export::{LessonExporter, PdfGenerator};
//!
//! let document = LessonExporter::new().export("Read aloud for five minutes.").unwrap();
//! let pdf = PdfGenerator::new(&document).generate();
//! assert!(pdf.ends_with(b"%%EOF\n"));
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::{Document, PlacedLine, Result, DOCUMENT_TITLE, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Fixed object numbers; page objects follow in pairs from `FIRST_PAGE_ID`.
const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;
const INFO_ID: usize = 4;
const FIRST_PAGE_ID: usize = 5;

/// Renders a [`Document`] as PDF.
pub struct PdfGenerator<'a> {
    document: &'a Document,
}

impl<'a> PdfGenerator<'a> {
    /// Creates a generator for the given document.
    #[must_use]
    pub const fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Renders the document to PDF bytes.
    #[must_use]
    pub fn generate(&self) -> Vec<u8> {
        let pages = self.document.pages();
        let mut writer = ObjectWriter::new();

        writer.object(
            CATALOG_ID,
            format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
        );

        let kids = (0..pages.len())
            .map(|i| format!("{} 0 R", page_id(i)))
            .collect::<Vec<_>>()
            .join(" ");
        writer.object(
            PAGES_ID,
            format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} >>",
                pages.len()
            )
            .as_bytes(),
        );

        writer.object(
            FONT_ID,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );

        let mut info = b"<< /Title (".to_vec();
        info.extend(encode_text(DOCUMENT_TITLE));
        info.extend(
            format!(
                ") /Producer (Babble) /CreationDate (D:{}Z) >>",
                self.document.created_at.format("%Y%m%d%H%M%S")
            )
            .as_bytes(),
        );
        writer.object(INFO_ID, &info);

        let media_box = format!(
            "[0 0 {} {}]",
            fmt_num(PAGE_WIDTH_MM * PT_PER_MM),
            fmt_num(PAGE_HEIGHT_MM * PT_PER_MM)
        );
        for (i, lines) in pages.iter().enumerate() {
            let content = content_stream(lines);
            let page = format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox {media_box} \
                 /Resources << /Font << /F1 {FONT_ID} 0 R >> >> /Contents {} 0 R >>",
                content_id(i)
            );
            writer.object(page_id(i), page.as_bytes());
            writer.stream(content_id(i), &content);
        }

        writer.finish(CATALOG_ID, INFO_ID)
    }

    /// Writes the rendered PDF into `dir` under the document's file name.
    ///
    /// The directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExportError::Io`] if the directory or file cannot be
    /// written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.document.file_name());
        let bytes = self.generate();
        std::fs::write(&path, &bytes)?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved lesson document");
        Ok(path)
    }
}

const fn page_id(index: usize) -> usize {
    FIRST_PAGE_ID + index * 2
}

const fn content_id(index: usize) -> usize {
    page_id(index) + 1
}

/// Accumulates numbered objects and tracks their byte offsets for the xref.
struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl ObjectWriter {
    fn new() -> Self {
        Self {
            buf: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend(body);
        self.buf.extend(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, data: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend(data);
        body.extend(b"\nendstream");
        self.object(id, &body);
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        self.offsets.sort_unstable();
        let size = self.offsets.last().map_or(1, |(id, _)| id + 1);
        let xref_offset = self.buf.len();

        let mut table = format!("xref\n0 {size}\n0000000000 65535 f \n");
        let mut next = 1;
        for &(id, offset) in &self.offsets {
            // Unused ids are listed as free entries.
            while next < id {
                table.push_str("0000000000 65535 f \n");
                next += 1;
            }
            let _ = writeln!(table, "{offset:010} 00000 n ");
            next = id + 1;
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {size} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        );

        self.buf.extend(table.as_bytes());
        self.buf
    }
}

/// Builds the drawing operators for one page.
fn content_stream(lines: &[PlacedLine]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        if line.text.is_empty() {
            continue;
        }
        let x = line.x_mm * PT_PER_MM;
        let y = (PAGE_HEIGHT_MM - line.y_mm) * PT_PER_MM;
        out.extend(
            format!(
                "BT\n/F1 {} Tf\n{} {} Td\n(",
                fmt_num(line.font_size),
                fmt_num(x),
                fmt_num(y)
            )
            .as_bytes(),
        );
        out.extend(encode_text(&line.text));
        out.extend(b") Tj\nET\n");
    }
    out
}

/// Formats a coordinate with at most two decimals and no trailing zeros.
fn fmt_num(value: f32) -> String {
    let formatted = format!("{value:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Encodes text as the body of a PDF literal string in `WinAnsiEncoding`.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.extend(u8::try_from(c));
            }
            '\t' => out.push(b' '),
            ' '..='~' | '\u{A0}'..='\u{FF}' => out.push(u8::try_from(c).unwrap_or(b'?')),
            _ => out.push(win_ansi_extra(c).unwrap_or(b'?')),
        }
    }
    out
}

/// Maps the typographic characters `WinAnsiEncoding` places in 0x80..0x9F.
const fn win_ansi_extra(c: char) -> Option<u8> {
    let byte = match c {
        '\u{20AC}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2122}' => 0x99,
        _ => return None,
    };
    Some(byte)
}
