//! Create pdf or docx books from markdown chapters.
//!
//! A [`Book`] is a plain value: title, author, optional subtitle and cover
//! image path, and a sequence of chapters holding markdown text. This crate
//! turns one into either of two very differently shaped outputs:
//!
//! 1. a **docx** flow document, fully buffered, where the word processor
//!    does the pagination (`create_docx`), or
//! 2. a **pdf**, drawn page by page with the renderer tracking the cursor
//!    itself and streamed incrementally into any `Write` sink
//!    (`create_pdf`).
//!
//! # Basic example
//!
//! ```no_run
//! use bookpress::{create_docx_default, create_pdf_default, Book};
//!
//! let book = Book::new("A Book", "A.N. Author")
//!     .subtitle("Serving as an Example")
//!     .add_chapter("Greetings", "# Hello\n\nSome **bold** text...");
//!
//! let docx = create_docx_default(&book).expect("error producing docx");
//!
//! let mut pdf = Vec::new();
//! create_pdf_default(&book, &mut pdf).expect("error producing pdf");
//! ```
//!
//! # Degradation and faults
//!
//! Missing or unreadable cover images degrade to "no cover page" with a
//! logged warning; they never fail an export. A chapter whose token stream
//! turns out to be malformed is cut short at the fault and reported in the
//! returned [`ExportReport`] while its siblings render normally. Only
//! serialization failures -- the docx container, the pdf sink -- are
//! terminal.
//!
//! Note the asymmetry the pdf path buys with its streaming: by the time a
//! sink fault surfaces, earlier pages are already written and cannot be
//! retracted, so the caller may hold a truncated document. The error result
//! is the only signal of that.
//!
//! # Technical details
//!
//! Architecturally, this crate is a very thin wrapper over:
//!   1. `bookpress_ast`, which defines the book value, the block token
//!      stream and inline segment resolution, and
//!   2. `bookpress_docx` and `bookpress_pdf`, which define how those are
//!      rendered into a particular output format.
//!
//! So for full details of how something works, you'd best look to the
//! specific crate.
//!
//! # Deserialization
//!
//! The `deserialization` module supports rendering from a json description
//! of a book -- see `DeserializableBook` -- which is also what the bundled
//! binary reads from stdin.

#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

pub use bookpress_ast::{Book, Chapter, ChapterFault, ChapterRecord, ExportReport};
pub use bookpress_common::{suggested_file_name, ExportFormat, StyleConfig};
use bookpress_common::load_cover;
pub use bookpress_docx::RenderingError as DocxRenderingError;
pub use bookpress_pdf::RenderingError as PdfRenderingError;
use log::warn;
use std::error::Error;
use std::fmt;
use std::io::Write;

pub mod deserialization;

/// Errors possible at the export entry points
#[derive(Debug)]
pub enum ExportError {
    /// The book's title was empty or whitespace
    EmptyTitle,
    /// The docx renderer failed
    Docx(DocxRenderingError),
    /// The pdf renderer failed
    Pdf(PdfRenderingError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptyTitle => write!(f, "a book must have a non-empty title"),
            ExportError::Docx(e) => write!(f, "docx rendering failed: {}", e),
            ExportError::Pdf(e) => write!(f, "pdf rendering failed: {}", e),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExportError::EmptyTitle => None,
            ExportError::Docx(e) => Some(e),
            ExportError::Pdf(e) => Some(e),
        }
    }
}

impl From<DocxRenderingError> for ExportError {
    fn from(src: DocxRenderingError) -> Self {
        ExportError::Docx(src)
    }
}

impl From<PdfRenderingError> for ExportError {
    fn from(src: PdfRenderingError) -> Self {
        ExportError::Pdf(src)
    }
}

fn check_title(book: &Book) -> Result<(), ExportError> {
    if book.title.trim().is_empty() {
        return Err(ExportError::EmptyTitle);
    }
    Ok(())
}

fn log_report(report: &ExportReport) {
    if !report.is_clean() {
        let faulted = report.faulted().count();
        warn!(
            "{} of {} chapters rendered incompletely",
            faulted,
            report.chapters.len()
        );
    }
}

/// Create a docx from a `Book` with the given styling, returning the
/// per-chapter report alongside the document bytes
pub fn create_docx_with_report(
    book: &Book,
    config: &StyleConfig,
) -> Result<(Vec<u8>, ExportReport), ExportError> {
    check_title(book)?;
    let cover = load_cover(book.cover_image.as_deref());
    let (bytes, report) = bookpress_docx::render_book(book, cover.as_ref(), config)?;
    log_report(&report);
    Ok((bytes, report))
}

/// Create a docx from a `Book` with the given styling
pub fn create_docx(book: &Book, config: &StyleConfig) -> Result<Vec<u8>, ExportError> {
    create_docx_with_report(book, config).map(|(bytes, _)| bytes)
}

/// Create a docx from a `Book` with default styling
pub fn create_docx_default(book: &Book) -> Result<Vec<u8>, ExportError> {
    create_docx(book, &StyleConfig::default())
}

/// Render a `Book` as a pdf streamed into `sink`.
///
/// The returned report is the completion signal; by the time an `Err`
/// surfaces, the sink may already hold a truncated document.
pub fn create_pdf<W: Write>(
    book: &Book,
    config: &StyleConfig,
    sink: W,
) -> Result<ExportReport, ExportError> {
    check_title(book)?;
    let cover = load_cover(book.cover_image.as_deref());
    let report = bookpress_pdf::render_book(book, cover.as_ref(), config, sink)?;
    log_report(&report);
    Ok(report)
}

/// Render a `Book` as a pdf with default styling
pub fn create_pdf_default<W: Write>(book: &Book, sink: W) -> Result<ExportReport, ExportError> {
    create_pdf(book, &StyleConfig::default(), sink)
}
