//! Resolution of markdown-inline emphasis spans.
//!
//! Each of the four inline forms is searched for independently over the
//! original line, the matches are merged in start-offset order, and overlaps
//! are settled by a first-match-wins scan. The surviving matches carve the
//! line into an alternating sequence of plain and styled segments which
//! covers every character exactly once, with each kept span's delimiters
//! consumed.

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

/// The styling of a single run of inline text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Unstyled body text
    Plain,
    /// Strong emphasis (`**text**` or `__text__`)
    Bold,
    /// Emphasis (`*text*` or `_text_`)
    Italic,
    /// Inline code (`` `text` ``)
    Code,
}

/// A contiguous run of text tagged with one styling kind
#[derive(Debug, Clone, PartialEq)]
pub struct InlineSegment<'a> {
    /// The segment's text, with any emphasis delimiters stripped
    pub text: Cow<'a, str>,
    /// How the text should be styled
    pub kind: SegmentKind,
}

impl InlineSegment<'_> {
    /// Detach the segment from its source line
    pub fn into_owned(self) -> InlineSegment<'static> {
        InlineSegment {
            text: Cow::Owned(self.text.into_owned()),
            kind: self.kind,
        }
    }
}

// The single-delimiter forms exclude their own delimiter from the span
// interior; an italic scan must not run through the middle of a bold span.
static INLINE_CODE: &str = r"`([^`]+)`";
static BOLD_STARS: &str = r"\*\*(.+?)\*\*";
static BOLD_UNDERSCORES: &str = r"__(.+?)__";
static ITALIC_STAR: &str = r"\*([^*]+?)\*";
static ITALIC_UNDERSCORE: &str = r"_([^_]+?)_";

lazy_static! {
    // searched in priority order: code first, bold before italic
    static ref PATTERNS: [(Regex, SegmentKind); 5] = [
        (Regex::new(INLINE_CODE).unwrap(), SegmentKind::Code),
        (Regex::new(BOLD_STARS).unwrap(), SegmentKind::Bold),
        (Regex::new(BOLD_UNDERSCORES).unwrap(), SegmentKind::Bold),
        (Regex::new(ITALIC_STAR).unwrap(), SegmentKind::Italic),
        (Regex::new(ITALIC_UNDERSCORE).unwrap(), SegmentKind::Italic),
    ];
}

#[derive(Debug, Clone, Copy)]
struct SpanMatch<'a> {
    start: usize,
    end: usize,
    inner: &'a str,
    kind: SegmentKind,
}

/// Search every pattern over the whole line, merge by start offset and keep
/// only matches which begin at or after the end of the previously kept one.
/// The sort is stable, so two matches starting at the same offset keep their
/// pattern-priority order.
fn kept_matches(line: &str) -> Vec<SpanMatch<'_>> {
    let mut matches = Vec::new();
    for (regex, kind) in PATTERNS.iter() {
        for caps in regex.captures_iter(line) {
            let whole = caps.get(0).unwrap();
            let inner = caps.get(1).unwrap();
            matches.push(SpanMatch {
                start: whole.start(),
                end: whole.end(),
                inner: inner.as_str(),
                kind: *kind,
            });
        }
    }
    matches.sort_by_key(|m| m.start);

    let mut kept = Vec::with_capacity(matches.len());
    let mut last_end = 0;
    for m in matches {
        if m.start >= last_end {
            last_end = m.end;
            kept.push(m);
        }
    }
    kept
}

/// Lazy iterator over the resolved segments of one line.
///
/// Yields a plain segment for every gap between kept matches and a styled
/// segment for each kept match, left to right; an empty line yields nothing.
#[derive(Debug)]
pub struct Segments<'a> {
    source: &'a str,
    kept: std::vec::IntoIter<SpanMatch<'a>>,
    pending: Option<InlineSegment<'a>>,
    cursor: usize,
    finished: bool,
}

impl<'a> Iterator for Segments<'a> {
    type Item = InlineSegment<'a>;

    fn next(&mut self) -> Option<InlineSegment<'a>> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }
        if self.finished {
            return None;
        }
        match self.kept.next() {
            Some(m) => {
                let styled = InlineSegment {
                    text: Cow::Borrowed(m.inner),
                    kind: m.kind,
                };
                if m.start > self.cursor {
                    let gap = InlineSegment {
                        text: Cow::Borrowed(&self.source[self.cursor..m.start]),
                        kind: SegmentKind::Plain,
                    };
                    self.cursor = m.end;
                    self.pending = Some(styled);
                    Some(gap)
                } else {
                    self.cursor = m.end;
                    Some(styled)
                }
            }
            None => {
                self.finished = true;
                if self.cursor < self.source.len() {
                    Some(InlineSegment {
                        text: Cow::Borrowed(&self.source[self.cursor..]),
                        kind: SegmentKind::Plain,
                    })
                } else {
                    None
                }
            }
        }
    }
}

/// Resolve a token's inline text, preserving borrowed slices where the
/// tokenizer was able to hand out a plain slice of the chapter source.
pub fn resolve_token_text<'a>(text: &Cow<'a, str>) -> Vec<InlineSegment<'a>> {
    match text {
        Cow::Borrowed(line) => resolve_segments(line).collect(),
        Cow::Owned(line) => resolve_segments(line)
            .map(InlineSegment::into_owned)
            .collect(),
    }
}

/// Resolve a line of markdown-inline text into styled segments.
pub fn resolve_segments(line: &str) -> Segments<'_> {
    Segments {
        source: line,
        kept: kept_matches(line).into_iter(),
        pending: None,
        cursor: 0,
        finished: false,
    }
}
