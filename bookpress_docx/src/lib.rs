//! This crate renders a book into a flow document: a single linear sequence
//! of styled blocks which a word processor lays out and paginates itself.
//!
//! Rendering happens in two passes. The first walks each chapter's token
//! stream and appends [`FlowBlock`]s to one book-wide sequence; the second
//! serializes that sequence into WordprocessingML and hands the parts to
//! `docx_bundler`. The renderer never decides page geometry beyond explicit
//! page-break markers -- that is the point of the flow-document target.
//!
//! A malformed token stream inside one chapter is reported as that chapter's
//! outcome and costs at most the remainder of that chapter; serialization
//! and bundling faults, by contrast, fail the whole export.

#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

use bookpress_ast::{
    code_lines, paired_inline, resolve_token_text, tokenize, BlockToken, Book, ChapterFault,
    ChapterOutcome, ExportReport, InlineSegment,
};
use bookpress_common::{CoverArt, StyleConfig};
use docx_bundler::{DocxBundlingError, DocxSource};
use log::error;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

mod writer;
use writer::DocumentWriter;

/// The marker prefixed to a list item's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    /// A literal bullet glyph
    Bullet,
    /// A one-based decimal counter
    Number(usize),
}

/// One block of the flow document, in reading order.
///
/// Blocks are constructed while walking a chapter's tokens, appended to a
/// single book-wide sequence, consumed once by serialization and then
/// discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowBlock<'a> {
    /// The book title, centered on the titlepage
    Title(&'a str),
    /// The subtitle beneath it
    Subtitle(&'a str),
    /// The author byline
    Author(&'a str),
    /// The accent rule closing the titlepage
    TitleRule,
    /// A chapter's title
    ChapterTitle(&'a str),
    /// A body heading; levels beyond three have already been clamped
    Heading {
        /// Heading level, 1-3
        level: u32,
        /// The heading's raw inline text
        text: Cow<'a, str>,
    },
    /// A paragraph of resolved inline segments
    BodyParagraph(Vec<InlineSegment<'a>>),
    /// The language label above a code block
    CodeLabel(Cow<'a, str>),
    /// One non-blank line of a code block
    CodeLine(Cow<'a, str>),
    /// A single list item
    ListItem {
        /// The bullet or number prefix
        marker: ListMarker,
        /// The item's resolved inline segments
        segments: Vec<InlineSegment<'a>>,
    },
    /// Vertical breathing room after a list or code block
    Spacer,
    /// A forced page break
    PageBreak,
    /// The cover image, already fitted to its bounding box
    Image {
        /// The resolved cover
        art: &'a CoverArt,
        /// Display width in points
        width: f32,
        /// Display height in points
        height: f32,
    },
}

/// Errors possible while producing a flow document
#[derive(Debug)]
pub enum RenderingError {
    /// The container could not be bundled
    Bundling(DocxBundlingError),
}

impl From<DocxBundlingError> for RenderingError {
    fn from(src: DocxBundlingError) -> Self {
        RenderingError::Bundling(src)
    }
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for RenderingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RenderingError::Bundling(e) => Some(e),
        }
    }
}

/// Render a book to docx bytes, with the per-chapter report alongside.
///
/// The cover, if any, has already been resolved to bytes by the caller; a
/// book without one simply has no cover page.
pub fn render_book(
    book: &Book,
    cover: Option<&CoverArt>,
    config: &StyleConfig,
) -> Result<(Vec<u8>, ExportReport), RenderingError> {
    let (blocks, report) = assemble_blocks(book, cover, config);

    let mut source = DocxSource::new();
    let cover_relationship = match cover {
        Some(art) => Some(source.add_media(
            format!("cover.{}", art.format.extension()),
            art.format.mimetype(),
            art.data.clone(),
        )?),
        None => None,
    };

    let mut docwriter = DocumentWriter::new(config, cover_relationship);
    source.set_document(docwriter.write(&blocks));
    source.set_styles(writer::styles_part(config));
    let bytes = source.bundle()?;
    Ok((bytes, report))
}

/// Build the whole book's flow-block sequence: cover page, titlepage, then
/// each chapter behind a forced page break.
fn assemble_blocks<'a>(
    book: &'a Book,
    cover: Option<&'a CoverArt>,
    config: &StyleConfig,
) -> (Vec<FlowBlock<'a>>, ExportReport) {
    let mut blocks = Vec::new();
    let mut report = ExportReport::default();

    if let Some(art) = cover {
        let (width, height) = art.fitted(&config.cover);
        blocks.push(FlowBlock::Image { art, width, height });
        blocks.push(FlowBlock::PageBreak);
    }

    blocks.push(FlowBlock::Title(&book.title));
    if let Some(subtitle) = book.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        blocks.push(FlowBlock::Subtitle(subtitle));
    }
    blocks.push(FlowBlock::Author(&book.author));
    blocks.push(FlowBlock::TitleRule);

    for (index, chapter) in book.chapters.iter().enumerate() {
        if index > 0 {
            blocks.push(FlowBlock::PageBreak);
        }
        blocks.push(FlowBlock::ChapterTitle(&chapter.title));

        let tokens = tokenize(&chapter.content);
        let outcome = chapter_blocks(&tokens);
        if let Some(fault) = outcome.fault() {
            error!(
                "chapter {} ({:?}) rendered incompletely: {}",
                index + 1,
                chapter.title,
                fault
            );
        }
        report.record(index, &chapter.title, &outcome);
        if let Some(rendered) = outcome.into_payload() {
            blocks.extend(rendered);
        }
    }

    (blocks, report)
}

/// Walk one chapter's token stream into flow blocks.
///
/// Unknown or unsupported tokens are skipped one at a time; the walk only
/// gives up when the stream itself is malformed, and then reports whatever
/// it had already built.
pub fn chapter_blocks<'a>(tokens: &[BlockToken<'a>]) -> ChapterOutcome<Vec<FlowBlock<'a>>> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            BlockToken::HeadingOpen(level) => {
                if let Some(text) = paired_inline(tokens, i) {
                    blocks.push(FlowBlock::Heading {
                        level: (*level).min(3),
                        text: text.clone(),
                    });
                    i += 2;
                    continue;
                }
                // a heading with no inline content is dropped whole
                i += 1;
            }
            BlockToken::CodeBlock { language, content } => {
                if let Some(language) = language {
                    blocks.push(FlowBlock::CodeLabel(language.clone()));
                }
                for line in code_lines(content) {
                    blocks.push(FlowBlock::CodeLine(line));
                }
                blocks.push(FlowBlock::Spacer);
                i += 1;
            }
            BlockToken::ParagraphOpen => {
                if let Some(text) = paired_inline(tokens, i) {
                    if !text.is_empty() {
                        blocks.push(FlowBlock::BodyParagraph(resolve_token_text(text)));
                    }
                    i += 2;
                    continue;
                }
                i += 1;
            }
            BlockToken::BulletListOpen => {
                match walk_list(tokens, i, &mut blocks, None) {
                    Ok(next) => i = next,
                    Err(fault) => return ChapterOutcome::Partial(blocks, fault),
                }
            }
            BlockToken::OrderedListOpen => {
                match walk_list(tokens, i, &mut blocks, Some(1)) {
                    Ok(next) => i = next,
                    Err(fault) => return ChapterOutcome::Partial(blocks, fault),
                }
            }
            // anything else -- close tokens, quotes, rules, raw html --
            // advances one token with no output
            _ => i += 1,
        }
    }

    ChapterOutcome::Success(blocks)
}

/// Walk the items of one list, starting at its open token. Returns the index
/// just past the list's close token, or a fault if the stream ends first.
fn walk_list<'a>(
    tokens: &[BlockToken<'a>],
    open_index: usize,
    blocks: &mut Vec<FlowBlock<'a>>,
    mut counter: Option<usize>,
) -> Result<usize, ChapterFault> {
    let mut i = open_index + 1;

    while i < tokens.len() {
        match &tokens[i] {
            BlockToken::ListClose => {
                blocks.push(FlowBlock::Spacer);
                return Ok(i + 1);
            }
            BlockToken::ListItemOpen => {
                i += 1;
                if matches!(tokens.get(i), Some(BlockToken::ParagraphOpen)) {
                    i += 1;
                    if let Some(BlockToken::Inline(text)) = tokens.get(i) {
                        let marker = match counter {
                            Some(n) => {
                                counter = Some(n + 1);
                                ListMarker::Number(n)
                            }
                            None => ListMarker::Bullet,
                        };
                        blocks.push(FlowBlock::ListItem {
                            marker,
                            segments: resolve_token_text(text),
                        });
                        i += 1;
                    }
                }
            }
            _ => i += 1,
        }
    }

    Err(ChapterFault::at(
        open_index,
        "list was never closed before the end of the chapter",
    ))
}
