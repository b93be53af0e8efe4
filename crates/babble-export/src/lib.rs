//! Babble Lesson Export
//!
//! Turns lesson text into a downloadable document: a fixed title line
//! followed by the lesson body wrapped to the page width.
//!
//! # Types
//!
//! - [`LessonExporter`] - Validates lesson text and lays it out as a [`Document`]
//! - [`Document`] - Laid-out title and body, ready to render
//! - [`PdfGenerator`] - Renders a [`Document`] to PDF bytes or a file
//!
//! # Example
//!
//! ```rust
//! use babble_export::{LessonExporter, PdfGenerator, ExportError};
//!
//! let exporter = LessonExporter::new();
//! let document = exporter.export("Warm up with lip trills.").unwrap();
//! let bytes = PdfGenerator::new(&document).generate();
//! assert!(bytes.starts_with(b"%PDF-1.4"));
//!
//! assert!(matches!(exporter.export("   "), Err(ExportError::NoContent)));
//! ```

mod pdf;
mod wrap;

pub use pdf::PdfGenerator;

use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during lesson export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is no lesson text to export.
    #[error("No lesson to download.")]
    NoContent,

    /// Failed to write the exported document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

// ============================================================================
// Layout
// ============================================================================

/// Title printed at the top of every exported lesson.
pub const DOCUMENT_TITLE: &str = "Generated Lesson Plan";

/// File name of the exported document.
pub const EXPORT_FILE_NAME: &str = "Speech_Lesson.pdf";

/// Body lines are wrapped to this many characters.
pub const WRAP_COLUMNS: usize = 90;

/// A4 page width in millimetres.
pub const PAGE_WIDTH_MM: f32 = 210.0;

/// A4 page height in millimetres.
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const LEFT_MARGIN_MM: f32 = 10.0;
const TITLE_TOP_MM: f32 = 10.0;
const BODY_TOP_MM: f32 = 20.0;
const BOTTOM_MARGIN_MM: f32 = 10.0;
const TITLE_FONT_SIZE: f32 = 14.0;
const BODY_FONT_SIZE: f32 = 12.0;
const BODY_MAX_WIDTH_MM: f32 = 180.0;

/// Baseline-to-baseline distance as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.15;

const MM_PER_PT: f32 = 25.4 / 72.0;

/// A block of text lines sharing one font size and anchor.
///
/// Coordinates are millimetres from the top-left corner of the page and
/// locate the baseline of the first line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Lines in reading order.
    pub lines: Vec<String>,
    /// Font size in points.
    pub font_size: f32,
    /// Distance from the left page edge.
    pub x_mm: f32,
    /// Distance from the top page edge to the first baseline.
    pub y_mm: f32,
    /// Widest line the block may occupy.
    pub max_width_mm: f32,
}

impl TextBlock {
    /// Vertical advance between consecutive lines, in millimetres.
    #[must_use]
    pub fn line_height_mm(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR * MM_PER_PT
    }
}

/// One line of text positioned on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// The text to draw.
    pub text: String,
    /// Font size in points.
    pub font_size: f32,
    /// Distance from the left page edge in millimetres.
    pub x_mm: f32,
    /// Distance from the top page edge to the baseline in millimetres.
    pub y_mm: f32,
}

/// A laid-out lesson document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The title block.
    pub title: TextBlock,
    /// The wrapped lesson body.
    pub body: TextBlock,
    /// When the document was produced.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// File name the document is saved under.
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        EXPORT_FILE_NAME
    }

    /// Renders the document as PDF.
    #[must_use]
    pub fn to_pdf_bytes(&self) -> Vec<u8> {
        PdfGenerator::new(self).generate()
    }

    /// Saves the rendered PDF as `dir/Speech_Lesson.pdf`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be written.
    pub fn save(&self, dir: &std::path::Path) -> Result<std::path::PathBuf> {
        PdfGenerator::new(self).write_to_dir(dir)
    }

    /// Splits the document into pages.
    ///
    /// The title sits on the first page. Body lines flow downward and move
    /// to a new page, starting at the top margin, when they would cross the
    /// bottom margin.
    #[must_use]
    pub fn pages(&self) -> Vec<Vec<PlacedLine>> {
        let mut pages = Vec::new();
        let mut current = Vec::new();

        let mut y = self.title.y_mm;
        for line in &self.title.lines {
            current.push(PlacedLine {
                text: line.clone(),
                font_size: self.title.font_size,
                x_mm: self.title.x_mm,
                y_mm: y,
            });
            y += self.title.line_height_mm();
        }

        let line_height = self.body.line_height_mm();
        let bottom = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM;
        y = self.body.y_mm;

        for line in &self.body.lines {
            if y > bottom {
                pages.push(std::mem::take(&mut current));
                y = TITLE_TOP_MM;
            }
            current.push(PlacedLine {
                text: line.clone(),
                font_size: self.body.font_size,
                x_mm: self.body.x_mm,
                y_mm: y,
            });
            y += line_height;
        }

        pages.push(current);
        pages
    }
}

// ============================================================================
// Exporter
// ============================================================================

/// Lays out lesson text as a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct LessonExporter {
    wrap_columns: usize,
}

impl Default for LessonExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl LessonExporter {
    /// Creates an exporter with the standard layout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            wrap_columns: WRAP_COLUMNS,
        }
    }

    /// Builds a document for `lesson_text`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoContent`] if the text is empty or whitespace.
    pub fn export(&self, lesson_text: &str) -> Result<Document> {
        self.export_at(lesson_text, Utc::now())
    }

    /// Builds a document for `lesson_text` with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoContent`] if the text is empty or whitespace.
    pub fn export_at(&self, lesson_text: &str, created_at: DateTime<Utc>) -> Result<Document> {
        if lesson_text.trim().is_empty() {
            tracing::debug!("Export requested without a lesson");
            return Err(ExportError::NoContent);
        }

        let lines = wrap::wrap_text(lesson_text, self.wrap_columns);
        tracing::debug!(lines = lines.len(), "Laid out lesson document");

        Ok(Document {
            title: TextBlock {
                lines: vec![DOCUMENT_TITLE.to_string()],
                font_size: TITLE_FONT_SIZE,
                x_mm: LEFT_MARGIN_MM,
                y_mm: TITLE_TOP_MM,
                max_width_mm: BODY_MAX_WIDTH_MM,
            },
            body: TextBlock {
                lines,
                font_size: BODY_FONT_SIZE,
                x_mm: LEFT_MARGIN_MM,
                y_mm: BODY_TOP_MM,
                max_width_mm: BODY_MAX_WIDTH_MM,
            },
            created_at,
        })
    }
}
