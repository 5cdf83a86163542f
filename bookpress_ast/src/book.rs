use std::path::PathBuf;

/// A single chapter: a title and a body of markdown text.
///
/// The body may be empty; an empty chapter still renders as a titled
/// section with no content.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// The chapter's title, drawn at the head of its first page
    pub title: String,
    /// Markdown source for the chapter body
    pub content: String,
}

/// An immutable snapshot of a book, in final reading order.
///
/// Chapters appear in insertion order. A missing `cover_image` means
/// "no cover page"; a path which turns out not to resolve to a readable
/// image degrades to the same thing rather than failing the export.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    /// The book's title; exports of an empty-titled book are rejected
    pub title: String,
    /// An optional subtitle for the titlepage
    pub subtitle: Option<String>,
    /// The author, shown on the titlepage as a byline
    pub author: String,
    /// Path to a cover image, if any
    pub cover_image: Option<PathBuf>,
    /// The book's chapters, in reading order
    pub chapters: Vec<Chapter>,
}

impl Book {
    /// Create a book with the two required metadata fields
    pub fn new<T: Into<String>, A: Into<String>>(title: T, author: A) -> Self {
        Book {
            title: title.into(),
            subtitle: None,
            author: author.into(),
            cover_image: None,
            chapters: Vec::new(),
        }
    }

    /// Set a subtitle
    pub fn subtitle<S: Into<String>>(mut self, subtitle: S) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the path of a cover image
    pub fn cover_image<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cover_image = Some(path.into());
        self
    }

    /// Append a chapter to the end of the reading order
    pub fn add_chapter<T: Into<String>, C: Into<String>>(mut self, title: T, content: C) -> Self {
        self.chapters.push(Chapter {
            title: title.into(),
            content: content.into(),
        });
        self
    }

    /// Whether a subtitle is present and not just whitespace
    pub fn has_subtitle(&self) -> bool {
        self.subtitle
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_chapters_in_order() {
        let book = Book::new("T", "A")
            .add_chapter("One", "first")
            .add_chapter("Two", "second");
        let titles: Vec<_> = book.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[test]
    fn blank_subtitle_does_not_count() {
        let book = Book::new("T", "A").subtitle("   ");
        assert!(!book.has_subtitle());
        let book = Book::new("T", "A").subtitle("A Subtitle");
        assert!(book.has_subtitle());
    }
}
