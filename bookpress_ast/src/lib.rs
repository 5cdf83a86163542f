//! This crate sets out the abstract source of a book -- its metadata and its
//! chapters of markdown text -- together with the intermediate forms both
//! renderers consume: a flat stream of block-level tokens per chapter, and a
//! resolver which turns a line of markdown-inline text into styled segments.
//!
//! A `Book` here is a plain in-memory snapshot. Where it came from -- a
//! database, a json file, a builder in a test -- is none of this crate's
//! business; renderers treat it as immutable for the duration of one export.
//!
//! ```
//! use bookpress_ast::Book;
//!
//! let book = Book::new("A Book", "A.N. Author")
//!     .subtitle("Serving as an Example")
//!     .add_chapter("Greetings", "# Hello World\n\nText goes here...");
//! assert_eq!(book.chapters.len(), 1);
//! ```

#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

mod book;
mod inline;
mod outcome;
mod tokens;

pub use book::{Book, Chapter};
pub use inline::{resolve_segments, resolve_token_text, InlineSegment, SegmentKind, Segments};
pub use outcome::{ChapterFault, ChapterOutcome, ChapterRecord, ExportReport};
pub use tokens::{code_lines, paired_inline, tokenize, BlockToken};
