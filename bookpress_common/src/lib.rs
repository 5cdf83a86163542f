//! Common utils for book export: the styling configuration consulted by
//! both renderers, cover-image loading, text escaping and export naming.

#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

mod cover;
mod escape;
mod export;
mod style;

pub use cover::{load_cover, CoverArt, CoverFormat};
pub use escape::escape_to_xml;
pub use export::{suggested_file_name, ExportFormat};
pub use style::{
    CoverBox, DocxFonts, FontConfig, ListLayout, MarginConfig, PdfFonts, Rgb, RoleStyle,
    SpacingConfig, StyleConfig, TextRole,
};
