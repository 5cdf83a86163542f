/// The two export targets a book can be rendered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Paginated output drawn page by page
    Pdf,
    /// Flow-document output laid out by the reading application
    Docx,
}

impl ExportFormat {
    /// The format's file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    /// The mimetype to serve the export under
    pub fn mimetype(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// A download-friendly filename for an export: every character outside
/// ascii alphanumerics becomes an underscore.
pub fn suggested_file_name(title: &str, format: ExportFormat) -> String {
    let mut name = String::with_capacity(title.len() + 5);
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            name.push('_');
        }
    }
    if name.is_empty() {
        name.push_str("book");
    }
    name.push('.');
    name.push_str(format.extension());
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_sanitize_to_safe_names() {
        assert_eq!(
            suggested_file_name("My Book: Part 2!", ExportFormat::Pdf),
            "My_Book__Part_2_.pdf"
        );
        assert_eq!(
            suggested_file_name("plain", ExportFormat::Docx),
            "plain.docx"
        );
    }

    #[test]
    fn empty_title_still_names_the_file() {
        assert_eq!(suggested_file_name("", ExportFormat::Pdf), "book.pdf");
    }
}
