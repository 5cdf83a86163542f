//! Flattening of parsed markdown into the block token stream the renderers
//! walk.
//!
//! Block-level parsing itself is `pulldown_cmark`'s job; this module only
//! reshapes its nested event stream into a flat open/inline/close sequence,
//! using the offset iterator so that each block's inline text is the raw
//! source slice -- emphasis markers intact -- ready for segment resolution.
//! List items are normalized to an item/paragraph/inline/close shape whether
//! the source list was tight or loose, and multi-line text is flattened onto
//! one line before it reaches the resolver.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use std::borrow::Cow;
use std::ops::Range;

/// One block-level token of a chapter's content.
///
/// Heading, paragraph and list-item content arrives as a separate `Inline`
/// token immediately after the opening token; renderers pair the two with a
/// single-token lookahead and are expected to skip token kinds they do not
/// handle.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockToken<'a> {
    /// Opens a heading of the given source level (1-6)
    HeadingOpen(u32),
    /// The raw inline text belonging to the preceding open token
    Inline(Cow<'a, str>),
    /// Closes a heading
    HeadingClose,
    /// Opens a paragraph
    ParagraphOpen,
    /// Closes a paragraph
    ParagraphClose,
    /// A fenced or indented code block, with its verbatim content
    CodeBlock {
        /// Language tag of a fenced block, if one was given
        language: Option<Cow<'a, str>>,
        /// The code itself, newline-separated
        content: Cow<'a, str>,
    },
    /// Opens an unordered list
    BulletListOpen,
    /// Opens an ordered list; any source start number is discarded
    OrderedListOpen,
    /// Opens a list item
    ListItemOpen,
    /// Closes a list item
    ListItemClose,
    /// Closes either kind of list
    ListClose,
    /// Opens a block quote; renderers pass this through unhandled
    QuoteOpen,
    /// Closes a block quote
    QuoteClose,
    /// A thematic break; unhandled by renderers
    Rule,
    /// A block of raw html; unhandled by renderers
    Html,
}

/// Return the inline text paired with the open token at `index`, if the very
/// next token is inline content.
pub fn paired_inline<'t, 'a>(
    tokens: &'t [BlockToken<'a>],
    index: usize,
) -> Option<&'t Cow<'a, str>> {
    match tokens.get(index + 1) {
        Some(BlockToken::Inline(text)) => Some(text),
        _ => None,
    }
}

/// Split a code block's content into its non-blank lines, preserving
/// borrowed slices where the content itself was borrowed. Blank lines
/// inside a block are dropped.
pub fn code_lines<'a>(content: &Cow<'a, str>) -> Vec<Cow<'a, str>> {
    match content {
        Cow::Borrowed(code) => code
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Cow::Borrowed)
            .collect(),
        Cow::Owned(code) => code
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Cow::Owned(line.to_string()))
            .collect(),
    }
}

/// Tokenize one chapter's markdown into a flat block token stream.
pub fn tokenize(markdown: &str) -> Vec<BlockToken<'_>> {
    let mut iter = Parser::new_ext(markdown, Options::empty()).into_offset_iter();
    let mut tokens = Vec::new();

    while let Some((event, range)) = iter.next() {
        match event {
            Event::Start(Tag::Heading(level)) => {
                let text = heading_text(&markdown[range]);
                tokens.push(BlockToken::HeadingOpen(level));
                tokens.push(BlockToken::Inline(Cow::Borrowed(text)));
                tokens.push(BlockToken::HeadingClose);
                skip_to_end(&mut iter, |tag| matches!(tag, Tag::Heading(_)));
            }
            Event::Start(Tag::Paragraph) => {
                let text = flatten_lines(markdown[range].trim());
                tokens.push(BlockToken::ParagraphOpen);
                tokens.push(BlockToken::Inline(text));
                tokens.push(BlockToken::ParagraphClose);
                skip_to_end(&mut iter, |tag| matches!(tag, Tag::Paragraph));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = fence_language(&kind);
                let content = code_content(&mut iter);
                tokens.push(BlockToken::CodeBlock { language, content });
            }
            Event::Start(Tag::Item) => {
                let text = flatten_lines(strip_list_marker(markdown[range].trim()));
                tokens.push(BlockToken::ListItemOpen);
                tokens.push(BlockToken::ParagraphOpen);
                tokens.push(BlockToken::Inline(text));
                tokens.push(BlockToken::ParagraphClose);
                tokens.push(BlockToken::ListItemClose);
                skip_to_end(&mut iter, |tag| matches!(tag, Tag::Item));
            }
            Event::Start(Tag::List(None)) => tokens.push(BlockToken::BulletListOpen),
            Event::Start(Tag::List(Some(_))) => tokens.push(BlockToken::OrderedListOpen),
            Event::End(Tag::List(_)) => tokens.push(BlockToken::ListClose),
            Event::Start(Tag::BlockQuote) => tokens.push(BlockToken::QuoteOpen),
            Event::End(Tag::BlockQuote) => tokens.push(BlockToken::QuoteClose),
            Event::Rule => tokens.push(BlockToken::Rule),
            Event::Html(_) => tokens.push(BlockToken::Html),
            _ => {}
        }
    }
    tokens
}

/// Consume events up to and including the end tag matching `is_match`,
/// counting nested occurrences of the same tag.
fn skip_to_end<'a, I, F>(iter: &mut I, is_match: F)
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
    F: Fn(&Tag<'a>) -> bool,
{
    let mut depth = 0usize;
    for (event, _) in iter {
        match event {
            Event::Start(ref tag) if is_match(tag) => depth += 1,
            Event::End(ref tag) if is_match(tag) => {
                if depth == 0 {
                    return;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
}

/// Strip the `#` markers (or setext underline) from a heading's source slice
fn heading_text(raw: &str) -> &str {
    let raw = raw.trim_end();
    match raw.strip_prefix('#') {
        Some(stripped) => {
            let text = stripped.trim_start_matches('#').trim_start();
            // an ATX closing sequence is only closing if whitespace-separated
            let unclosed = text.trim_end_matches('#');
            if unclosed.len() < text.len() && unclosed.ends_with(char::is_whitespace) {
                unclosed.trim_end()
            } else {
                text
            }
        }
        // setext heading: the text is the line above the underline
        None => raw.lines().next().unwrap_or("").trim(),
    }
}

/// Drop the bullet or number marker from the front of a list item's slice
fn strip_list_marker(raw: &str) -> &str {
    match raw {
        "-" | "*" | "+" => return "",
        _ => {}
    }
    for marker in &["- ", "* ", "+ "] {
        if let Some(rest) = raw.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    let digits = raw.len() - raw.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &raw[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    raw
}

/// Collapse a block's source text onto a single line
fn flatten_lines(text: &str) -> Cow<'_, str> {
    if text.contains('\n') {
        Cow::Owned(text.split_whitespace().collect::<Vec<_>>().join(" "))
    } else {
        Cow::Borrowed(text)
    }
}

/// The language tag of a fenced code block, taken up to the first space or
/// comma of the info string
fn fence_language<'a>(kind: &CodeBlockKind<'a>) -> Option<Cow<'a, str>> {
    let info = match kind {
        CodeBlockKind::Fenced(info) => info,
        CodeBlockKind::Indented => return None,
    };
    let lang_len = info
        .chars()
        .take_while(|c| *c != ',' && *c != ' ')
        .map(char::len_utf8)
        .sum::<usize>();
    if lang_len == 0 {
        return None;
    }
    match info {
        CowStr::Borrowed(s) => Some(Cow::Borrowed(&s[..lang_len])),
        other => Some(Cow::Owned(other[..lang_len].to_string())),
    }
}

/// Gather the text events inside a code block, up to its end tag
fn code_content<'a, I>(iter: &mut I) -> Cow<'a, str>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    let mut pieces: Vec<CowStr<'a>> = Vec::new();
    for (event, _) in iter {
        match event {
            Event::Text(text) => pieces.push(text),
            Event::End(Tag::CodeBlock(_)) => break,
            _ => {}
        }
    }
    if pieces.len() == 1 {
        match pieces.pop().unwrap() {
            CowStr::Borrowed(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    } else {
        let mut joined = String::new();
        for piece in &pieces {
            joined.push_str(piece);
        }
        Cow::Owned(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_and_paragraph_shape() {
        let tokens = tokenize("## Title **here**\n\nBody with *emphasis*.\n");
        assert_eq!(
            tokens,
            vec![
                BlockToken::HeadingOpen(2),
                BlockToken::Inline(Cow::Borrowed("Title **here**")),
                BlockToken::HeadingClose,
                BlockToken::ParagraphOpen,
                BlockToken::Inline(Cow::Borrowed("Body with *emphasis*.")),
                BlockToken::ParagraphClose,
            ]
        );
    }

    #[test]
    fn paired_inline_looks_one_ahead() {
        let tokens = tokenize("# A heading");
        assert_eq!(
            paired_inline(&tokens, 0).map(|c| c.as_ref()),
            Some("A heading")
        );
        assert!(paired_inline(&tokens, 1).is_none());
    }

    #[test]
    fn tight_and_loose_lists_normalize_to_the_same_shape() {
        let tight = tokenize("- one\n- two\n");
        let loose = tokenize("- one\n\n- two\n");
        assert_eq!(tight, loose);
        assert_eq!(
            tight,
            vec![
                BlockToken::BulletListOpen,
                BlockToken::ListItemOpen,
                BlockToken::ParagraphOpen,
                BlockToken::Inline(Cow::Borrowed("one")),
                BlockToken::ParagraphClose,
                BlockToken::ListItemClose,
                BlockToken::ListItemOpen,
                BlockToken::ParagraphOpen,
                BlockToken::Inline(Cow::Borrowed("two")),
                BlockToken::ParagraphClose,
                BlockToken::ListItemClose,
                BlockToken::ListClose,
            ]
        );
    }

    #[test]
    fn ordered_list_start_number_is_discarded() {
        let tokens = tokenize("4. first\n5. second\n");
        assert_eq!(tokens[0], BlockToken::OrderedListOpen);
        assert_eq!(tokens[3], BlockToken::Inline(Cow::Borrowed("first")));
        assert_eq!(tokens[8], BlockToken::Inline(Cow::Borrowed("second")));
    }

    #[test]
    fn fenced_code_keeps_language_and_content() {
        let tokens = tokenize("```rust\nfn main() {}\n\nlet x = 1;\n```\n");
        assert_eq!(
            tokens,
            vec![BlockToken::CodeBlock {
                language: Some(Cow::Borrowed("rust")),
                content: Cow::Borrowed("fn main() {}\n\nlet x = 1;\n"),
            }]
        );
    }

    #[test]
    fn fence_info_is_cut_at_space_or_comma() {
        let tokens = tokenize("```python, linenos\nx = 1\n```\n");
        match &tokens[0] {
            BlockToken::CodeBlock { language, .. } => {
                assert_eq!(language.as_deref(), Some("python"));
            }
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn multiline_paragraph_flattens_to_one_line() {
        let tokens = tokenize("line one\nline two\n");
        assert_eq!(
            tokens[1],
            BlockToken::Inline(Cow::Owned("line one line two".to_string()))
        );
    }

    #[test]
    fn atx_closing_hashes_are_dropped_but_inline_hash_is_kept() {
        assert_eq!(heading_text("# Foo ##"), "Foo");
        assert_eq!(heading_text("# C#"), "C#");
    }

    #[test]
    fn unsupported_blocks_become_skip_tokens() {
        let tokens = tokenize("> quoted\n\n---\n");
        assert_eq!(tokens[0], BlockToken::QuoteOpen);
        // the paragraph inside the quote still tokenizes
        assert_eq!(tokens[2], BlockToken::Inline(Cow::Borrowed("quoted")));
        assert_eq!(tokens[4], BlockToken::QuoteClose);
        assert_eq!(tokens[5], BlockToken::Rule);
    }

    #[test]
    fn empty_content_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\n").is_empty());
    }
}
