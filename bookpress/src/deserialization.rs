//! Support for building and rendering books from a json description.
//!
//! The json format is deliberately small: title, author, optional subtitle
//! and cover image path, and a list of chapters. A chapter's `content` may
//! be either markdown text in its own right or a path to a markdown file;
//! whichever it is gets decided by looking at the filesystem, so json
//! produced by hand and json produced by a script both just work.

use crate::{create_docx_default, create_pdf_default, Book};
use serde::Deserialize;
use std::borrow::Cow;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Either a path to a markdown file, or a markdown string in its own right.
///
/// If the string names an existing file it is read as a path; otherwise it
/// is taken to be markdown text.
#[derive(Debug, Deserialize)]
#[serde(from = "Cow<str>")]
pub enum PathOrString<'a> {
    /// A path to a markdown file
    Path(Cow<'a, Path>),
    /// Markdown text
    Str(Cow<'a, str>),
}

impl<'a> From<Cow<'a, str>> for PathOrString<'a> {
    fn from(src: Cow<'a, str>) -> Self {
        let s: &str = &src;
        let as_path = Path::new(s);
        if as_path.is_file() {
            let p = match src {
                Cow::Borrowed(b) => Cow::Borrowed(Path::new(b)),
                Cow::Owned(p) => Cow::Owned(PathBuf::from(p)),
            };
            PathOrString::Path(p)
        } else {
            PathOrString::Str(src)
        }
    }
}

impl PathOrString<'_> {
    fn into_markdown(self) -> Result<String, std::io::Error> {
        match self {
            PathOrString::Path(p) => std::fs::read_to_string(p),
            PathOrString::Str(s) => Ok(s.into_owned()),
        }
    }
}

/// One chapter of a deserializable book
#[derive(Debug, Deserialize)]
pub struct DeserializableChapter<'a> {
    /// The chapter's title
    #[serde(borrow)]
    pub title: Cow<'a, str>,
    /// The chapter's markdown, inline or as a file path; an absent value
    /// means an empty chapter
    #[serde(default)]
    pub content: Option<PathOrString<'a>>,
}

/// A simplified representation of a book for easy deserializing.
///
/// The only required values are `title` and `author`.
#[derive(Debug, Deserialize)]
pub struct DeserializableBook<'a> {
    /// The title of the book
    #[serde(borrow)]
    pub title: Cow<'a, str>,
    /// An optional subtitle
    #[serde(default)]
    pub subtitle: Option<Cow<'a, str>>,
    /// The author of the book
    pub author: Cow<'a, str>,
    /// A path to a cover image; a path that turns out not to resolve simply
    /// means no cover page
    #[serde(default)]
    pub cover_image: Option<PathBuf>,
    /// The book's chapters, in reading order
    #[serde(default)]
    pub chapters: Vec<DeserializableChapter<'a>>,
}

impl<'a> DeserializableBook<'a> {
    fn new(src: &'a str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(src)
    }

    /// Resolve any chapter file paths and produce a `Book`
    pub fn into_book(self) -> Result<Book, std::io::Error> {
        let mut book = Book::new(self.title.into_owned(), self.author.into_owned());
        if let Some(subtitle) = self.subtitle {
            book = book.subtitle(subtitle.into_owned());
        }
        if let Some(cover) = self.cover_image {
            book = book.cover_image(cover);
        }
        for chapter in self.chapters.into_iter() {
            let content = match chapter.content {
                Some(content) => content.into_markdown()?,
                None => String::new(),
            };
            book = book.add_chapter(chapter.title.into_owned(), content);
        }
        Ok(book)
    }
}

/// Create a `Book` from a json representation of a `DeserializableBook`
pub fn create_book_from_json(src: &str) -> Result<Book, Box<dyn Error>> {
    let book = DeserializableBook::new(src)?;
    Ok(book.into_book()?)
}

/// Create a pdf from a json representation of a `DeserializableBook`
pub fn create_pdf_from_json(src: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let book = create_book_from_json(src)?;
    let mut sink = Vec::new();
    create_pdf_default(&book, &mut sink)?;
    Ok(sink)
}

/// Create a docx from a json representation of a `DeserializableBook`
pub fn create_docx_from_json(src: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let book = create_book_from_json(src)?;
    Ok(create_docx_default(&book)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_content_deserializes_as_markdown() {
        let json = r##"{
            "title": "A Book",
            "author": "A.N. Author",
            "chapters": [
                {"title": "One", "content": "# Hello\n\nWorld."}
            ]
        }"##;
        let book = create_book_from_json(json).unwrap();
        assert_eq!(book.chapters.len(), 1);
        assert!(book.chapters[0].content.starts_with("# Hello"));
    }

    #[test]
    fn missing_chapter_content_is_an_empty_body() {
        let json = r#"{
            "title": "A Book",
            "author": "A.N. Author",
            "chapters": [{"title": "Silent"}]
        }"#;
        let book = create_book_from_json(json).unwrap();
        assert_eq!(book.chapters[0].content, "");
    }

    #[test]
    fn absent_chapters_default_to_none_at_all() {
        let json = r#"{"title": "A Book", "author": "A.N. Author"}"#;
        let book = create_book_from_json(json).unwrap();
        assert!(book.chapters.is_empty());
    }
}
