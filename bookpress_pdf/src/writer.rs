//! Incremental pdf writing.
//!
//! Objects are serialized to the sink the moment they are handed over, with
//! their byte offsets recorded as they go; only the small bookkeeping
//! objects -- resources, page tree, catalog -- wait until `finish`, followed
//! by the cross-reference table and trailer. A sink that fails mid-way
//! therefore leaves a truncated document behind; nothing already written can
//! be retracted.
//!
//! Offsets are tracked by counting written bytes, so any `Write` sink will
//! do -- no seeking required.

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::RenderingError;

struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub(crate) struct StreamingPdfWriter<W: Write> {
    writer: CountingWriter<W>,
    offsets: BTreeMap<u32, u64>,
    max_id: u32,
    catalog_id: ObjectId,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    font_dict: Dictionary,
    xobjects: Vec<(String, ObjectId)>,
}

impl<W: Write> std::fmt::Debug for StreamingPdfWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingPdfWriter")
            .field("objects", &self.max_id)
            .field("pages", &self.page_ids.len())
            .finish()
    }
}

impl<W: Write> StreamingPdfWriter<W> {
    /// Write the header and reserve the bookkeeping object ids
    pub(crate) fn new(writer: W, font_dict: Dictionary) -> Result<Self, RenderingError> {
        let mut writer = CountingWriter { inner: writer, written: 0 };
        writer.write_all(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n")?;

        Ok(StreamingPdfWriter {
            writer,
            offsets: BTreeMap::new(),
            max_id: 3,
            resources_id: (1, 0),
            pages_id: (2, 0),
            catalog_id: (3, 0),
            page_ids: Vec::new(),
            font_dict,
            xobjects: Vec::new(),
        })
    }

    fn next_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    /// Serialize one indirect object to the sink immediately
    fn write_object(&mut self, object: Object) -> Result<ObjectId, RenderingError> {
        let id = self.next_id();
        self.write_object_at(id, &object)?;
        Ok(id)
    }

    fn write_object_at(&mut self, id: ObjectId, object: &Object) -> Result<(), RenderingError> {
        self.offsets.insert(id.0, self.writer.written);
        writeln!(self.writer, "{} {} obj", id.0, id.1)?;
        serialize::write_object(&mut self.writer, object)?;
        self.writer.write_all(b"\nendobj\n")?;
        Ok(())
    }

    /// Register an image resource, streamed out immediately; returns the
    /// name the content stream should reference it by
    pub(crate) fn add_image_xobject(&mut self, stream: Stream) -> Result<String, RenderingError> {
        let id = self.write_object(Object::Stream(stream))?;
        let name = format!("Im{}", self.xobjects.len() + 1);
        self.xobjects.push((name.clone(), id));
        Ok(name)
    }

    /// Stream out one finished page: its encoded content stream, then the
    /// page object itself
    pub(crate) fn write_page(
        &mut self,
        content: Content,
        page_width: f32,
        page_height: f32,
    ) -> Result<(), RenderingError> {
        let encoded = content.encode().map_err(RenderingError::Encoding)?;
        let content_id = self.write_object(Object::Stream(Stream::new(dictionary! {}, encoded)))?;

        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(f64::from(page_width)),
                Object::Real(f64::from(page_height)),
            ],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        };
        let page_id = self.write_object(page_dict.into())?;
        self.page_ids.push(page_id);
        Ok(())
    }

    /// How many pages have been streamed so far
    pub(crate) fn pages_written(&self) -> usize {
        self.page_ids.len()
    }

    /// Write the deferred bookkeeping objects, the cross-reference table and
    /// the trailer, then hand the sink back
    pub(crate) fn finish(mut self) -> Result<W, RenderingError> {
        let mut resources = dictionary! { "Font" => self.font_dict.clone() };
        if !self.xobjects.is_empty() {
            let mut xobject_dict = Dictionary::new();
            for (name, id) in self.xobjects.iter() {
                xobject_dict.set(name.as_bytes(), Object::Reference(*id));
            }
            resources.set("XObject", Object::Dictionary(xobject_dict));
        }
        let resources_id = self.resources_id;
        self.write_object_at(resources_id, &resources.into())?;

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        let pages_id = self.pages_id;
        self.write_object_at(pages_id, &pages_dict.into())?;

        let catalog_dict = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        let catalog_id = self.catalog_id;
        self.write_object_at(catalog_id, &catalog_dict.into())?;

        let xref_start = self.writer.written;
        let size = self.max_id + 1;
        writeln!(self.writer, "xref")?;
        writeln!(self.writer, "0 {}", size)?;
        writeln!(self.writer, "0000000000 65535 f ")?;
        for id in 1..=self.max_id {
            match self.offsets.get(&id) {
                Some(offset) => writeln!(self.writer, "{:010} 00000 n ", offset)?,
                None => writeln!(self.writer, "0000000000 65535 f ")?,
            }
        }

        let trailer = dictionary! { "Size" => size as i64, "Root" => self.catalog_id };
        writeln!(self.writer, "trailer")?;
        serialize::write_dictionary(&mut self.writer, &trailer)?;
        writeln!(self.writer, "\nstartxref")?;
        writeln!(self.writer, "{}", xref_start)?;
        write!(self.writer, "%%EOF")?;
        self.writer.flush()?;
        Ok(self.writer.inner)
    }
}

mod serialize {
    use super::*;

    pub(super) fn write_object(writer: &mut dyn Write, object: &Object) -> io::Result<()> {
        match object {
            Object::Null => writer.write_all(b"null"),
            Object::Boolean(b) => writer.write_all(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => write!(writer, "{}", i),
            Object::Real(r) => write!(writer, "{:.3}", r),
            Object::Name(n) => {
                writer.write_all(b"/")?;
                writer.write_all(n)
            }
            Object::String(s, format) => match format {
                StringFormat::Literal => {
                    writer.write_all(b"(")?;
                    for &byte in s {
                        if byte == b'(' || byte == b')' || byte == b'\\' {
                            writer.write_all(b"\\")?;
                        }
                        writer.write_all(&[byte])?;
                    }
                    writer.write_all(b")")
                }
                StringFormat::Hexadecimal => {
                    writer.write_all(b"<")?;
                    for byte in s {
                        write!(writer, "{:02X}", byte)?;
                    }
                    writer.write_all(b">")
                }
            },
            Object::Array(array) => {
                writer.write_all(b"[")?;
                for (i, item) in array.iter().enumerate() {
                    if i > 0 {
                        writer.write_all(b" ")?;
                    }
                    write_object(writer, item)?;
                }
                writer.write_all(b"]")
            }
            Object::Dictionary(dict) => write_dictionary(writer, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                write_dictionary(writer, &dict)?;
                writer.write_all(b"\nstream\n")?;
                writer.write_all(&stream.content)?;
                writer.write_all(b"\nendstream")
            }
            Object::Reference(id) => write!(writer, "{} {} R", id.0, id.1),
        }
    }

    pub(super) fn write_dictionary(writer: &mut dyn Write, dict: &Dictionary) -> io::Result<()> {
        writer.write_all(b"<<")?;
        for (key, value) in dict.iter() {
            writer.write_all(b"/")?;
            writer.write_all(key)?;
            writer.write_all(b" ")?;
            write_object(writer, value)?;
            writer.write_all(b" ")?;
        }
        writer.write_all(b">>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;

    fn one_page_document() -> Vec<u8> {
        let fonts = dictionary! {
            "F1" => dictionary! {
                "Type" => "Font", "Subtype" => "Type1",
                "BaseFont" => "Helvetica", "Encoding" => "WinAnsiEncoding",
            },
        };
        let mut writer = StreamingPdfWriter::new(Vec::new(), fonts).unwrap();
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Real(72.0), Object::Real(720.0)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(b"Hello".to_vec(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        writer.write_page(content, 595.28, 841.89).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn document_brackets_are_in_place() {
        let bytes = one_page_document();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF"));
    }

    #[test]
    fn produced_document_parses() {
        let bytes = one_page_document();
        let document = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 1);
    }

    #[test]
    fn header_is_written_before_any_page() {
        let writer = StreamingPdfWriter::new(Vec::new(), Dictionary::new()).unwrap();
        assert_eq!(writer.pages_written(), 0);
        let sink = writer.finish().unwrap();
        assert!(sink.starts_with(b"%PDF-1.7"));
    }
}
