//! This crate renders a book into paginated pdf output.
//!
//! Unlike the flow-document target, the renderer here owns layout: it keeps
//! a vertical cursor, measures (approximately) what it is about to draw,
//! and forces a page break whenever the remaining space under the cursor is
//! smaller than a block-type-specific safety margin. Those margins are
//! heuristics -- the design trades exact measurement for a single forward
//! pass, and accepts the occasional slightly-overfull page.
//!
//! Pages are streamed to the sink as each one completes, so a large book
//! never sits fully in memory; the price is that a sink failure after the
//! first page leaves a truncated document behind.

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
    ChapterOutcome, ExportReport, InlineSegment, SegmentKind,
};
use bookpress_common::{CoverArt, CoverFormat, Rgb, StyleConfig, TextRole};
use log::{error, warn};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream, StringFormat};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::io::Write;

mod metrics;
mod writer;

use metrics::{estimate_width, to_win_ansi, FontSlot};
use writer::StreamingPdfWriter;

// A4, in points
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

// how much room a block must have under the cursor before it is drawn
const HEADING_SPACE: f32 = 100.0;
const CODE_SPACE: f32 = 150.0;
const LIST_SPACE: f32 = 50.0;
const PARAGRAPH_SPACE: f32 = 100.0;

/// Errors possible while producing a pdf
#[derive(Debug)]
pub enum RenderingError {
    /// The sink failed while output was being streamed to it
    Io(std::io::Error),
    /// A content stream could not be encoded
    Encoding(lopdf::Error),
}

impl From<std::io::Error> for RenderingError {
    fn from(src: std::io::Error) -> Self {
        RenderingError::Io(src)
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
            RenderingError::Io(e) => Some(e),
            RenderingError::Encoding(_) => None,
        }
    }
}

fn real(value: f32) -> Object {
    Object::Real(f64::from(value))
}

/// Horizontal placement of wrapped text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// The stateful page renderer: a drawing cursor over an incrementally
/// written document.
///
/// `y` measures down from the top of the page; it is translated into pdf's
/// bottom-up coordinates only at the moment an operation is emitted.
#[derive(Debug)]
pub struct PageRenderer<'c, W: Write> {
    writer: StreamingPdfWriter<W>,
    config: &'c StyleConfig,
    operations: Vec<Operation>,
    y: f32,
}

impl<'c, W: Write> PageRenderer<'c, W> {
    /// Start a document on `sink`: the header is written immediately
    pub fn new(sink: W, config: &'c StyleConfig) -> Result<Self, RenderingError> {
        let fonts = &config.fonts.pdf;
        let mut font_dict = Dictionary::new();
        let faces = [
            (FontSlot::Body, fonts.body.as_ref()),
            (FontSlot::Bold, fonts.bold.as_ref()),
            (FontSlot::Italic, fonts.italic.as_ref()),
            (FontSlot::Code, fonts.code.as_ref()),
        ];
        for (slot, base_font) in faces.iter() {
            font_dict.set(
                slot.resource_name().as_bytes(),
                Object::Dictionary(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => *base_font,
                    "Encoding" => "WinAnsiEncoding",
                }),
            );
        }
        Ok(PageRenderer {
            writer: StreamingPdfWriter::new(sink, font_dict)?,
            config,
            operations: Vec::new(),
            y: config.margins.top,
        })
    }

    fn content_left(&self) -> f32 {
        self.config.margins.left
    }

    fn content_right(&self) -> f32 {
        PAGE_WIDTH - self.config.margins.right
    }

    fn content_width(&self) -> f32 {
        self.content_right() - self.content_left()
    }

    fn remaining(&self) -> f32 {
        PAGE_HEIGHT - self.config.margins.bottom - self.y
    }

    fn line_height(&self, size: f32) -> f32 {
        size * self.config.spacing.line_height
    }

    fn body_line(&self) -> f32 {
        self.line_height(self.config.role(TextRole::Body).size)
    }

    /// Force a page break before a block that will not fit
    fn ensure_room(&mut self, needed: f32) -> Result<(), RenderingError> {
        if self.remaining() < needed {
            self.new_page()?;
        }
        Ok(())
    }

    /// Flush the current page to the sink and move the cursor to the top of
    /// a fresh one
    pub fn new_page(&mut self) -> Result<(), RenderingError> {
        let operations = std::mem::take(&mut self.operations);
        self.writer
            .write_page(Content { operations }, PAGE_WIDTH, PAGE_HEIGHT)?;
        self.y = self.config.margins.top;
        Ok(())
    }

    /// Pages already streamed out, not counting the one under the cursor
    pub fn pages_written(&self) -> usize {
        self.writer.pages_written()
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    /// Draw one run of text with its baseline fitted under the cursor
    fn draw_text_at(&mut self, x: f32, slot: FontSlot, size: f32, color: Rgb, text: &str) {
        let (r, g, b) = color.unit_channels();
        let baseline = PAGE_HEIGHT - self.y - size * 0.8;
        self.op("BT", vec![]);
        self.op(
            "Tf",
            vec![
                Object::Name(slot.resource_name().as_bytes().to_vec()),
                real(size),
            ],
        );
        self.op("rg", vec![real(r), real(g), real(b)]);
        self.op("Td", vec![real(x), real(baseline)]);
        self.op(
            "Tj",
            vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
        );
        self.op("ET", vec![]);
    }

    /// Fill a rectangle whose top edge sits at the cursor
    fn draw_rect(&mut self, x: f32, width: f32, height: f32, color: Rgb) {
        let (r, g, b) = color.unit_channels();
        let bottom = PAGE_HEIGHT - self.y - height;
        self.op("rg", vec![real(r), real(g), real(b)]);
        self.op("re", vec![real(x), real(bottom), real(width), real(height)]);
        self.op("f", vec![]);
    }

    /// Stroke a horizontal line at the cursor
    fn stroke_rule(&mut self, x1: f32, x2: f32, color: Rgb) {
        let (r, g, b) = color.unit_channels();
        let line_y = PAGE_HEIGHT - self.y;
        self.op("RG", vec![real(r), real(g), real(b)]);
        self.op("w", vec![real(1.0)]);
        self.op("m", vec![real(x1), real(line_y)]);
        self.op("l", vec![real(x2), real(line_y)]);
        self.op("S", vec![]);
    }

    /// Greedy word wrap against the estimated widths
    fn wrap_lines(text: &str, slot: FontSlot, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0;
        let space = estimate_width(" ", slot, size);
        for word in text.split_whitespace() {
            let width = estimate_width(word, slot, size);
            if !current.is_empty() && current_width + space + width > max_width {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_width += space;
            }
            current.push_str(word);
            current_width += width;
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// Draw a block of uniformly styled text, wrapped to `max_width`,
    /// advancing the cursor one line per drawn line
    fn draw_wrapped(
        &mut self,
        text: &str,
        slot: FontSlot,
        size: f32,
        color: Rgb,
        x: f32,
        max_width: f32,
        align: Align,
    ) -> Result<(), RenderingError> {
        let line_height = self.line_height(size);
        for line in Self::wrap_lines(text, slot, size, max_width) {
            if self.remaining() < line_height {
                self.new_page()?;
            }
            let line_x = match align {
                Align::Left => x,
                Align::Center => x + (max_width - estimate_width(&line, slot, size)) / 2.0,
            };
            self.draw_text_at(line_x, slot, size, color, &line);
            self.y += line_height;
        }
        Ok(())
    }

    fn segment_style(&self, kind: SegmentKind) -> (FontSlot, f32, Rgb) {
        let body = self.config.role(TextRole::Body);
        let code = self.config.role(TextRole::Code);
        match kind {
            SegmentKind::Plain => (FontSlot::Body, body.size, body.color),
            SegmentKind::Bold => (FontSlot::Bold, body.size, body.color),
            SegmentKind::Italic => (FontSlot::Italic, body.size, body.color),
            SegmentKind::Code => (FontSlot::Code, code.size, code.color),
        }
    }

    /// Flow styled segments left to right from `start_x`, swapping fonts
    /// per segment and wrapping at the right limit. Each drawn flow ends
    /// with the cursor advanced past its last line.
    fn draw_segments(
        &mut self,
        segments: &[InlineSegment<'_>],
        start_x: f32,
        right_limit: f32,
    ) -> Result<(), RenderingError> {
        let body_line = self.body_line();
        let mut x = start_x;
        let mut drew_any = false;
        let mut gap_pending = false;

        for segment in segments.iter() {
            let (slot, size, color) = self.segment_style(segment.kind);
            let text = segment.text.as_ref();
            if text.is_empty() {
                continue;
            }
            if text.trim().is_empty() {
                gap_pending = true;
                continue;
            }
            let leading_gap = text.starts_with(char::is_whitespace);
            let space = estimate_width(" ", slot, size);
            let mut first_word = true;
            for word in text.split_whitespace() {
                let needs_gap = if first_word {
                    gap_pending || leading_gap
                } else {
                    true
                };
                first_word = false;
                let width = estimate_width(word, slot, size);
                let gap = if needs_gap && x > start_x { space } else { 0.0 };
                if x + gap + width > right_limit && x > start_x {
                    self.y += body_line;
                    if self.remaining() < body_line {
                        self.new_page()?;
                    }
                    x = start_x;
                } else {
                    x += gap;
                }
                self.draw_text_at(x, slot, size, color, word);
                x += width;
            }
            gap_pending = text.ends_with(char::is_whitespace);
            drew_any = true;
        }

        if drew_any {
            self.y += body_line;
        }
        Ok(())
    }

    /// The dedicated cover page: image fit-centered, then a fresh page.
    /// An image that cannot be embedded is skipped with a warning.
    pub fn draw_cover_page(&mut self, art: &CoverArt) -> Result<(), RenderingError> {
        let stream = match cover_image_stream(art) {
            Some(stream) => stream,
            None => return Ok(()),
        };
        let name = self.writer.add_image_xobject(stream)?;
        let (width, height) = art.fitted(&self.config.cover);
        let x = (PAGE_WIDTH - width) / 2.0;
        let bottom = (PAGE_HEIGHT - height) / 2.0;
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![
                real(width),
                real(0.0),
                real(0.0),
                real(height),
                real(x),
                real(bottom),
            ],
        );
        self.op("Do", vec![Object::Name(name.into_bytes())]);
        self.op("Q", vec![]);
        self.new_page()
    }

    /// The titlepage: title, optional subtitle and byline centered, closed
    /// off with the accent rule
    pub fn draw_title_page(&mut self, book: &Book) -> Result<(), RenderingError> {
        let body_line = self.body_line();
        let left = self.content_left();
        let width = self.content_width();

        self.y += 8.0 * body_line;

        let title = self.config.role(TextRole::Title);
        self.draw_wrapped(
            &book.title,
            FontSlot::Bold,
            title.size,
            title.color,
            left,
            width,
            Align::Center,
        )?;
        self.y += 2.0 * body_line;

        if let Some(subtitle) = book.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
            let style = self.config.role(TextRole::Subtitle);
            self.draw_wrapped(
                subtitle,
                FontSlot::Bold,
                style.size,
                style.color,
                left,
                width,
                Align::Center,
            )?;
            self.y += 2.0 * body_line;
        }

        let author = self.config.role(TextRole::Author);
        let byline = format!("by {}", book.author);
        self.draw_wrapped(
            &byline,
            FontSlot::Bold,
            author.size,
            author.color,
            left,
            width,
            Align::Center,
        )?;
        self.y += 2.0 * body_line;

        let center = PAGE_WIDTH / 2.0;
        self.stroke_rule(center - 100.0, center + 100.0, self.config.accent);
        Ok(())
    }

    /// A chapter's title at the head of its (fresh) page
    pub fn draw_chapter_title(&mut self, title: &str) -> Result<(), RenderingError> {
        let style = self.config.role(TextRole::ChapterTitle);
        let left = self.content_left();
        let width = self.content_width();
        self.draw_wrapped(
            title,
            FontSlot::Bold,
            style.size,
            style.color,
            left,
            width,
            Align::Left,
        )?;
        self.y += 2.0 * self.body_line();
        Ok(())
    }

    fn draw_heading(&mut self, level: u32, text: &str) -> Result<(), RenderingError> {
        self.ensure_room(HEADING_SPACE)?;
        let style = self.config.heading(level);
        let body_line = self.body_line();
        self.y += body_line;
        let left = self.content_left();
        let width = self.content_width();
        self.draw_wrapped(
            text,
            FontSlot::Bold,
            style.size,
            style.color,
            left,
            width,
            Align::Left,
        )?;
        self.y += 0.5 * body_line;
        Ok(())
    }

    fn draw_code_block(
        &mut self,
        language: Option<&str>,
        content: &Cow<'_, str>,
    ) -> Result<(), RenderingError> {
        self.ensure_room(CODE_SPACE)?;
        let body_line = self.body_line();
        self.y += 0.5 * body_line;

        if let Some(language) = language {
            let label_style = self.config.role(TextRole::CodeLabel);
            let label = format!("Language: {}", language);
            let label_x = self.content_left() + 20.0;
            self.draw_text_at(
                label_x,
                FontSlot::Body,
                label_style.size,
                label_style.color,
                &label,
            );
            self.y += label_style.size + 4.0;
        }

        let code = self.config.role(TextRole::Code);
        let line_height = code.size + self.config.spacing.code_line_padding;
        let rect_x = self.content_left() + 10.0;
        let rect_width = self.content_width() - 20.0;
        let text_x = self.content_left() + 20.0;
        for line in code_lines(content) {
            if self.remaining() < line_height {
                self.new_page()?;
            }
            self.draw_rect(rect_x, rect_width, line_height, self.config.code_background);
            self.draw_text_at(
                text_x,
                FontSlot::Code,
                code.size,
                self.config.code_block_text,
                &line,
            );
            self.y += line_height + 3.0;
        }

        self.y += 0.5 * body_line;
        Ok(())
    }

    fn draw_paragraph(&mut self, segments: &[InlineSegment<'_>]) -> Result<(), RenderingError> {
        self.ensure_room(PARAGRAPH_SPACE)?;
        let body_line = self.body_line();
        self.y += 0.5 * body_line;
        let left = self.content_left();
        let right = self.content_right();
        self.draw_segments(segments, left, right)?;
        self.y += 0.5 * body_line;
        Ok(())
    }

    /// One list item: glyph and text anchored on the same line at their two
    /// indent columns. The cursor advances by a fixed per-item increment
    /// rather than the item's wrapped height, so very long items space
    /// approximately.
    fn draw_list_item(
        &mut self,
        glyph: &str,
        segments: &[InlineSegment<'_>],
    ) -> Result<(), RenderingError> {
        self.ensure_room(LIST_SPACE)?;
        let body = self.config.role(TextRole::Body);
        let item_top = self.y;
        let pages_before = self.pages_written();

        let glyph_x = self.content_left() + self.config.list.bullet_indent;
        self.draw_text_at(glyph_x, FontSlot::Body, body.size, body.color, glyph);

        let text_x = self.content_left() + self.config.list.text_indent;
        self.draw_segments(segments, text_x, self.content_right())?;

        if self.pages_written() == pages_before {
            self.y = item_top + 1.4 * self.body_line();
        }
        Ok(())
    }

    /// Walk one chapter's token stream, drawing as it goes.
    ///
    /// Unknown or unsupported tokens advance the walk without drawing; a
    /// malformed stream stops the chapter and reports what was drawn so
    /// far. Only a sink or encoding failure aborts the export.
    pub fn render_chapter_tokens(
        &mut self,
        tokens: &[BlockToken<'_>],
    ) -> Result<ChapterOutcome<()>, RenderingError> {
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                BlockToken::HeadingOpen(level) => {
                    if let Some(text) = paired_inline(tokens, i) {
                        self.draw_heading((*level).min(3), text)?;
                        i += 2;
                        continue;
                    }
                    i += 1;
                }
                BlockToken::CodeBlock { language, content } => {
                    self.draw_code_block(language.as_ref().map(|l| l.as_ref()), content)?;
                    i += 1;
                }
                BlockToken::ParagraphOpen => {
                    if let Some(text) = paired_inline(tokens, i) {
                        if !text.is_empty() {
                            let segments = resolve_token_text(text);
                            self.draw_paragraph(&segments)?;
                        }
                        i += 2;
                        continue;
                    }
                    i += 1;
                }
                BlockToken::BulletListOpen => match self.draw_list(tokens, i, None)? {
                    Ok(next) => i = next,
                    Err(fault) => return Ok(ChapterOutcome::Partial((), fault)),
                },
                BlockToken::OrderedListOpen => match self.draw_list(tokens, i, Some(1))? {
                    Ok(next) => i = next,
                    Err(fault) => return Ok(ChapterOutcome::Partial((), fault)),
                },
                _ => i += 1,
            }
        }
        Ok(ChapterOutcome::Success(()))
    }

    /// Draw the items of one list. The outer result is a stream failure;
    /// the inner one distinguishes "walked past the close token" from a
    /// malformed sequence.
    #[allow(clippy::type_complexity)]
    fn draw_list(
        &mut self,
        tokens: &[BlockToken<'_>],
        open_index: usize,
        mut counter: Option<usize>,
    ) -> Result<Result<usize, ChapterFault>, RenderingError> {
        let body_line = self.body_line();
        self.y += 0.5 * body_line;
        let mut i = open_index + 1;

        while i < tokens.len() {
            match &tokens[i] {
                BlockToken::ListClose => {
                    self.y += 0.5 * body_line;
                    return Ok(Ok(i + 1));
                }
                BlockToken::ListItemOpen => {
                    i += 1;
                    if matches!(tokens.get(i), Some(BlockToken::ParagraphOpen)) {
                        i += 1;
                        if let Some(BlockToken::Inline(text)) = tokens.get(i) {
                            let glyph = match counter {
                                Some(n) => {
                                    counter = Some(n + 1);
                                    format!("{}.", n)
                                }
                                None => "\u{2022}".to_string(),
                            };
                            let segments = resolve_token_text(text);
                            self.draw_list_item(&glyph, &segments)?;
                            i += 1;
                        }
                    }
                }
                _ => i += 1,
            }
        }

        Ok(Err(ChapterFault::at(
            open_index,
            "list was never closed before the end of the chapter",
        )))
    }

    /// Flush the page under the cursor and finalize the document
    pub fn finish(mut self) -> Result<W, RenderingError> {
        self.new_page()?;
        self.writer.finish()
    }
}

/// Build the image object for a cover. A jpeg passes through untouched
/// under `DCTDecode`; a png is decoded and embedded as raw rgb samples.
fn cover_image_stream(art: &CoverArt) -> Option<Stream> {
    let base_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => Object::Integer(i64::from(art.width)),
        "Height" => Object::Integer(i64::from(art.height)),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => Object::Integer(8),
    };
    match art.format {
        CoverFormat::Jpeg => {
            let mut dict = base_dict;
            dict.set("Filter", "DCTDecode");
            Some(Stream::new(dict, art.data.clone()))
        }
        CoverFormat::Png => match image::load_from_memory(&art.data) {
            Ok(decoded) => Some(Stream::new(base_dict, decoded.to_rgb8().into_raw())),
            Err(err) => {
                warn!("cover image could not be decoded for embedding: {}", err);
                None
            }
        },
    }
}

/// Render a book to `sink`, streaming pages as they complete.
///
/// Completion is signalled only by the returned report; a fault partway
/// through may already have written a truncated document to the sink.
pub fn render_book<W: Write>(
    book: &Book,
    cover: Option<&CoverArt>,
    config: &StyleConfig,
    sink: W,
) -> Result<ExportReport, RenderingError> {
    let mut renderer = PageRenderer::new(sink, config)?;

    if let Some(art) = cover {
        renderer.draw_cover_page(art)?;
    }
    renderer.draw_title_page(book)?;

    let mut report = ExportReport::default();
    for (index, chapter) in book.chapters.iter().enumerate() {
        renderer.new_page()?;
        renderer.draw_chapter_title(&chapter.title)?;
        let tokens = tokenize(&chapter.content);
        let outcome = renderer.render_chapter_tokens(&tokens)?;
        if let Some(fault) = outcome.fault() {
            error!(
                "chapter {} ({:?}) rendered incompletely: {}",
                index + 1,
                chapter.title,
                fault
            );
        }
        report.record(index, &chapter.title, &outcome);
    }

    renderer.finish()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn_strings(operations: &[Operation]) -> Vec<String> {
        operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => {
                    Some(String::from_utf8_lossy(bytes).into_owned())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn heading_crowded_at_page_bottom_lands_on_the_next_page() {
        let config = StyleConfig::default();
        let mut renderer = PageRenderer::new(Vec::new(), &config).unwrap();
        renderer.y = PAGE_HEIGHT - config.margins.bottom - 50.0;

        let tokens = tokenize("# Crowded\n");
        let outcome = renderer.render_chapter_tokens(&tokens).unwrap();
        assert!(outcome.is_success());
        // the pre-check flushed the crowded page before drawing
        assert_eq!(renderer.pages_written(), 1);
        assert_eq!(drawn_strings(&renderer.operations), vec!["Crowded"]);
    }

    #[test]
    fn heading_with_room_stays_on_the_current_page() {
        let config = StyleConfig::default();
        let mut renderer = PageRenderer::new(Vec::new(), &config).unwrap();

        let tokens = tokenize("# Roomy\n");
        renderer.render_chapter_tokens(&tokens).unwrap();
        assert_eq!(renderer.pages_written(), 0);
    }

    #[test]
    fn ordered_list_glyphs_count_from_one() {
        let config = StyleConfig::default();
        let mut renderer = PageRenderer::new(Vec::new(), &config).unwrap();

        let tokens = tokenize("5. alpha\n6. beta\n7. gamma\n");
        renderer.render_chapter_tokens(&tokens).unwrap();
        let drawn = drawn_strings(&renderer.operations);
        assert!(drawn.contains(&"1.".to_string()));
        assert!(drawn.contains(&"2.".to_string()));
        assert!(drawn.contains(&"3.".to_string()));
        assert!(!drawn.iter().any(|s| s == "5."));
    }

    #[test]
    fn segment_fonts_swap_midline() {
        let config = StyleConfig::default();
        let mut renderer = PageRenderer::new(Vec::new(), &config).unwrap();

        let tokens = tokenize("plain **bold** and `mono`\n");
        renderer.render_chapter_tokens(&tokens).unwrap();
        let fonts: Vec<Vec<u8>> = renderer
            .operations
            .iter()
            .filter(|op| op.operator == "Tf")
            .filter_map(|op| match op.operands.first() {
                Some(Object::Name(name)) => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert!(fonts.contains(&b"F2".to_vec()));
        assert!(fonts.contains(&b"F4".to_vec()));
    }

    #[test]
    fn empty_book_still_produces_a_valid_single_page_document() {
        let config = StyleConfig::default();
        let book = Book::new("Nothing Yet", "A.N. Author");
        let mut sink = Vec::new();
        let report = render_book(&book, None, &config, &mut sink).unwrap();
        assert!(report.chapters.is_empty());

        let document = lopdf::Document::load_mem(&sink).unwrap();
        assert_eq!(document.get_pages().len(), 1);
    }

    #[test]
    fn chapters_start_on_their_own_pages() {
        let config = StyleConfig::default();
        let book = Book::new("Two Chapters", "A.N. Author")
            .add_chapter("One", "First body.\n")
            .add_chapter("Two", "Second body.\n");
        let mut sink = Vec::new();
        render_book(&book, None, &config, &mut sink).unwrap();

        let document = lopdf::Document::load_mem(&sink).unwrap();
        // titlepage plus one page per chapter
        assert_eq!(document.get_pages().len(), 3);
    }

    #[test]
    fn malformed_chapter_does_not_take_down_its_siblings() {
        let config = StyleConfig::default();
        let mut renderer = PageRenderer::new(Vec::new(), &config).unwrap();

        let good = tokenize("healthy paragraph\n");
        let bad = vec![BlockToken::BulletListOpen, BlockToken::ListItemOpen];

        let first = renderer.render_chapter_tokens(&good).unwrap();
        let second = renderer.render_chapter_tokens(&bad).unwrap();
        let third = renderer.render_chapter_tokens(&good).unwrap();

        assert!(first.is_success());
        assert!(second.fault().is_some());
        assert!(third.is_success());
    }

    #[test]
    fn long_paragraphs_overflow_onto_new_pages() {
        let config = StyleConfig::default();
        let mut renderer = PageRenderer::new(Vec::new(), &config).unwrap();

        let word = "paginate ";
        let long_line = word.repeat(2000);
        let markdown = format!("{}\n", long_line.trim());
        let tokens = tokenize(&markdown);
        renderer.render_chapter_tokens(&tokens).unwrap();
        assert!(renderer.pages_written() >= 1);
    }

    struct FailingSink {
        capacity: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.len() > self.capacity {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "sink closed",
                ));
            }
            self.capacity -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_surfaces_as_the_terminal_error() {
        let config = StyleConfig::default();
        let book = Book::new("Doomed", "A.N. Author").add_chapter("One", "some text\n");
        let sink = FailingSink { capacity: 64 };
        match render_book(&book, None, &config, sink) {
            Err(RenderingError::Io(_)) => {}
            other => panic!("expected io error, got {:?}", other.map(|_| ())),
        }
    }
}
