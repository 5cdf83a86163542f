//! Bundle WordprocessingML parts into a docx container.
//!
//! A docx file is a zip package: a content-types manifest, a package-level
//! relationship file pointing at the main document part, the document and
//! styles xml, a part-level relationship file binding relationship ids to
//! styles and media, and the media files themselves. This crate owns that
//! container layout; what the document xml *says* is the caller's business.
//!
//! Media must be added before the document part is written, since the
//! document references media by the relationship id assigned here.

#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

use std::error::Error;
use std::fmt;
use std::io::{Cursor, Write};
use zip::ZipWriter;

static DOCUMENT_PATH: &str = "word/document.xml";
static STYLES_PATH: &str = "word/styles.xml";
static STYLES_RELATIONSHIP_ID: &str = "rId1";

/// Errors possible while bundling a docx container
#[derive(Debug)]
pub enum DocxBundlingError {
    /// The zip writer failed
    Zip(zip::result::ZipError),
    /// An io error occurred while writing the container
    Io(std::io::Error),
    /// No document part was set before bundling
    MissingDocument,
    /// Two media resources were added under the same file name
    DuplicateMediaName(String),
}

impl fmt::Display for DocxBundlingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for DocxBundlingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DocxBundlingError::Zip(e) => Some(e),
            DocxBundlingError::Io(e) => Some(e),
            _ => None,
        }
    }
}

macro_rules! error_conv {
    ($from:ty, $to:ident) => {
        impl From<$from> for DocxBundlingError {
            fn from(src: $from) -> Self {
                DocxBundlingError::$to(src)
            }
        }
    };
}

error_conv!(zip::result::ZipError, Zip);
error_conv!(std::io::Error, Io);

/// A binary resource stored under `word/media/`
#[derive(Debug, Clone)]
struct MediaResource {
    file_name: String,
    mimetype: String,
    relationship_id: String,
    data: Vec<u8>,
}

/// The parts of a docx container, accumulated before bundling
#[derive(Debug, Default)]
pub struct DocxSource {
    document: Option<String>,
    styles: Option<String>,
    media: Vec<MediaResource>,
}

impl DocxSource {
    /// Start an empty container
    pub fn new() -> Self {
        DocxSource::default()
    }

    /// Set the main document part
    pub fn set_document<S: Into<String>>(&mut self, xml: S) -> &mut Self {
        self.document = Some(xml.into());
        self
    }

    /// Set the styles part
    pub fn set_styles<S: Into<String>>(&mut self, xml: S) -> &mut Self {
        self.styles = Some(xml.into());
        self
    }

    /// Add a media resource, returning the relationship id the document
    /// part should reference it by
    pub fn add_media<N: Into<String>, M: Into<String>>(
        &mut self,
        file_name: N,
        mimetype: M,
        data: Vec<u8>,
    ) -> Result<String, DocxBundlingError> {
        let file_name = file_name.into();
        if self.media.iter().any(|m| m.file_name == file_name) {
            return Err(DocxBundlingError::DuplicateMediaName(file_name));
        }
        // rId1 is reserved for the styles part
        let relationship_id = format!("rId{}", self.media.len() + 2);
        self.media.push(MediaResource {
            file_name,
            mimetype: mimetype.into(),
            relationship_id: relationship_id.clone(),
            data,
        });
        Ok(relationship_id)
    }

    /// Bundle the parts into docx bytes
    pub fn bundle(self) -> Result<Vec<u8>, DocxBundlingError> {
        let document = self.document.ok_or(DocxBundlingError::MissingDocument)?;
        let styles = self.styles.unwrap_or_else(default_styles);

        let content_types = render_content_types(&self.media);
        let package_rels = render_package_relationships();
        let document_rels = render_document_relationships(&self.media);

        let buf = Vec::new();
        let w = Cursor::new(buf);
        let mut zipper = ZipWriter::new(w);
        let stored =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);

        zipper.start_file("[Content_Types].xml", stored)?;
        zipper.write_all(content_types.as_bytes())?;

        zipper.add_directory("_rels", stored)?;
        zipper.start_file("_rels/.rels", stored)?;
        zipper.write_all(package_rels.as_bytes())?;

        zipper.add_directory("word", stored)?;
        zipper.start_file(DOCUMENT_PATH, stored)?;
        zipper.write_all(document.as_bytes())?;

        zipper.start_file(STYLES_PATH, stored)?;
        zipper.write_all(styles.as_bytes())?;

        zipper.add_directory("word/_rels", stored)?;
        zipper.start_file("word/_rels/document.xml.rels", stored)?;
        zipper.write_all(document_rels.as_bytes())?;

        if !self.media.is_empty() {
            zipper.add_directory("word/media", stored)?;
            for resource in self.media.iter() {
                zipper.start_file(format!("word/media/{}", resource.file_name), stored)?;
                zipper.write_all(&resource.data)?;
            }
        }

        let result = zipper.finish().map(|cursor| cursor.into_inner())?;
        Ok(result)
    }
}

fn render_content_types(media: &[MediaResource]) -> String {
    let mut out = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        "\n",
        r#"	<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        "\n",
        r#"	<Default Extension="xml" ContentType="application/xml"/>"#,
        "\n",
    ));
    let mut declared: Vec<&str> = Vec::new();
    for resource in media.iter() {
        let extension = match resource.file_name.rsplit('.').next() {
            Some(ext) if !ext.is_empty() => ext,
            _ => continue,
        };
        if declared.contains(&extension) {
            continue;
        }
        declared.push(extension);
        out.push_str(&format!(
            "\t<Default Extension=\"{}\" ContentType=\"{}\"/>\n",
            extension, resource.mimetype
        ));
    }
    out.push_str(concat!(
        r#"	<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        "\n",
        r#"	<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
        "\n",
        "</Types>"
    ));
    out
}

fn render_package_relationships() -> String {
    String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        "\n",
        r#"	<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        "\n",
        "</Relationships>"
    ))
}

fn render_document_relationships(media: &[MediaResource]) -> String {
    let mut out = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        "\n",
    ));
    out.push_str(&format!(
        "\t<Relationship Id=\"{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\n",
        STYLES_RELATIONSHIP_ID
    ));
    for resource in media.iter() {
        out.push_str(&format!(
            "\t<Relationship Id=\"{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"media/{}\"/>\n",
            resource.relationship_id, resource.file_name
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// A bare styles part for callers which set none: default paragraph
/// properties only, with everything of visual interest done through direct
/// formatting in the document part
fn default_styles() -> String {
    String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        "\n",
        r#"	<w:docDefaults><w:rPrDefault><w:rPr/></w:rPrDefault><w:pPrDefault><w:pPr/></w:pPrDefault></w:docDefaults>"#,
        "\n",
        "</w:styles>"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn minimal_document() -> String {
        String::from(
            r#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body/></w:document>"#,
        )
    }

    #[test]
    fn bundling_without_a_document_fails() {
        let source = DocxSource::new();
        assert!(matches!(
            source.bundle(),
            Err(DocxBundlingError::MissingDocument)
        ));
    }

    #[test]
    fn container_holds_the_expected_parts() {
        let mut source = DocxSource::new();
        source.set_document(minimal_document());
        let bytes = source.bundle().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for expected in &[
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(archive.by_name(expected).is_ok(), "missing {}", expected);
        }
    }

    #[test]
    fn media_is_stored_and_related() {
        let mut source = DocxSource::new();
        let rel_id = source
            .add_media("cover.png", "image/png", vec![1, 2, 3])
            .unwrap();
        assert_eq!(rel_id, "rId2");
        source.set_document(minimal_document());
        let bytes = source.bundle().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut stored = Vec::new();
        archive
            .by_name("word/media/cover.png")
            .unwrap()
            .read_to_end(&mut stored)
            .unwrap();
        assert_eq!(stored, vec![1, 2, 3]);

        let mut rels = String::new();
        archive
            .by_name("word/_rels/document.xml.rels")
            .unwrap()
            .read_to_string(&mut rels)
            .unwrap();
        assert!(rels.contains(r#"Id="rId2""#));
        assert!(rels.contains("media/cover.png"));

        let mut types = String::new();
        archive
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut types)
            .unwrap();
        assert!(types.contains(r#"Extension="png""#));
    }

    #[test]
    fn duplicate_media_names_are_rejected() {
        let mut source = DocxSource::new();
        source.add_media("a.png", "image/png", vec![]).unwrap();
        assert!(matches!(
            source.add_media("a.png", "image/png", vec![]),
            Err(DocxBundlingError::DuplicateMediaName(_))
        ));
    }
}
