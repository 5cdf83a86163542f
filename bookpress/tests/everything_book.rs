//! End-to-end exports of a book exercising every supported block, checked
//! by reopening the produced documents: the docx container through `zip`,
//! the pdf through `lopdf`.

use bookpress::deserialization::{
    create_book_from_json, create_docx_from_json, create_pdf_from_json,
};
use bookpress::{create_docx_default, create_docx_with_report, create_pdf_default, Book, StyleConfig};
use std::io::{Cursor, Read};

static JSON_BOOK: &str = include_str!("everything_book.json");

fn document_xml(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx.to_vec())).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn everything_docx_holds_the_expected_parts_and_content() {
    let docx = create_docx_from_json(JSON_BOOK).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(docx.clone())).unwrap();
    for part in &[
        "[Content_Types].xml",
        "_rels/.rels",
        "word/document.xml",
        "word/styles.xml",
        "word/_rels/document.xml.rels",
    ] {
        assert!(archive.by_name(part).is_ok(), "missing {}", part);
    }

    let xml = document_xml(&docx);
    assert!(xml.contains(">The Everything Book</w:t>"));
    assert!(xml.contains(">One of Each Block</w:t>"));
    assert!(xml.contains(">by A.N. Author</w:t>"));
    // every chapter title, including the empty chapter's
    for title in &["Prose", "Code", "Lists", "Silence"] {
        assert!(xml.contains(&format!(">{}</w:t>", title)), "missing {}", title);
    }
    assert!(xml.contains(">Language: rust</w:t>"));
    assert!(xml.contains("println!(&quot;hello&quot;);"));
}

#[test]
fn everything_pdf_parses_with_a_page_per_chapter() {
    let pdf = create_pdf_from_json(JSON_BOOK).unwrap();
    assert!(pdf.starts_with(b"%PDF-1.7"));
    assert!(pdf.ends_with(b"%%EOF"));

    let document = lopdf::Document::load_mem(&pdf).unwrap();
    // the titlepage, then each of the four chapters on its own page; the
    // contentless chapter still gets one
    assert_eq!(document.get_pages().len(), 5);
}

#[test]
fn ordered_list_numbering_ignores_the_source_start() {
    let docx = create_docx_from_json(JSON_BOOK).unwrap();
    let xml = document_xml(&docx);
    assert!(xml.contains(">1. </w:t>"));
    assert!(xml.contains(">2. </w:t>"));
    assert!(xml.contains(">3. </w:t>"));
    assert!(!xml.contains(">7. </w:t>"));
}

#[test]
fn chapter_structure_counts_add_up() {
    let chapter_body = "## Section\n\nA paragraph of body text.\n\n- a\n- b\n- c\n";
    let mut book = Book::new("Counted", "A.N. Author");
    for n in 1..=3 {
        book = book.add_chapter(format!("Chapter {}", n), chapter_body);
    }

    let (docx, report) = create_docx_with_report(&book, &StyleConfig::default()).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.chapters.len(), 3);

    let xml = document_xml(&docx);
    assert_eq!(count(&xml, "w:pStyle w:val=\"Heading2\""), 3);
    assert_eq!(count(&xml, ">\u{2022} </w:t>"), 9);
    // chapters after the first sit behind forced page breaks
    assert_eq!(count(&xml, "<w:br w:type=\"page\"/>"), 2);
}

#[test]
fn a_missing_cover_image_means_no_cover_at_all() {
    let plain = Book::new("Coverless", "A.N. Author").add_chapter("One", "Some text.\n");
    let mut dressed = plain.clone();
    dressed.cover_image = Some("/definitely/not/a/real/cover.png".into());

    let without = create_docx_default(&plain).unwrap();
    let with = create_docx_default(&dressed).unwrap();
    assert_eq!(without, with);

    let mut without_pdf = Vec::new();
    let mut with_pdf = Vec::new();
    create_pdf_default(&plain, &mut without_pdf).unwrap();
    create_pdf_default(&dressed, &mut with_pdf).unwrap();
    assert_eq!(without_pdf, with_pdf);
}

#[test]
fn an_empty_book_still_exports_cleanly() {
    let json = r#"{"title": "Nothing Yet", "author": "A.N. Author"}"#;
    let book = create_book_from_json(json).unwrap();
    assert!(book.chapters.is_empty());

    let docx = create_docx_from_json(json).unwrap();
    let xml = document_xml(&docx);
    assert!(xml.contains(">Nothing Yet</w:t>"));

    let pdf = create_pdf_from_json(json).unwrap();
    let document = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(document.get_pages().len(), 1);
}

#[test]
fn a_real_cover_lands_in_both_outputs() {
    let pixels = image::ImageBuffer::from_pixel(40, 60, image::Rgb([120u8, 30, 30]));
    let mut encoded = Vec::new();
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut encoded, image::ImageOutputFormat::Png)
        .unwrap();
    let cover_path = std::env::temp_dir().join("bookpress_everything_cover.png");
    std::fs::write(&cover_path, &encoded).unwrap();

    let book = Book::new("Dressed", "A.N. Author")
        .cover_image(&cover_path)
        .add_chapter("One", "Some text.\n");

    let docx = create_docx_default(&book).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(docx.clone())).unwrap();
    assert!(archive.by_name("word/media/cover.png").is_ok());
    let xml = document_xml(&docx);
    assert!(xml.contains("<w:drawing>"));

    let mut pdf = Vec::new();
    create_pdf_default(&book, &mut pdf).unwrap();
    let document = lopdf::Document::load_mem(&pdf).unwrap();
    // cover page, titlepage, one chapter
    assert_eq!(document.get_pages().len(), 3);

    std::fs::remove_file(&cover_path).ok();
}
