//! The styling configuration shared by both render targets.
//!
//! Built once per export and passed by reference into whichever renderer is
//! active. Both targets resolve a semantic role through the same value, so a
//! role's color or point size can never drift between the pdf and docx
//! renditions of the same book.

use std::borrow::Cow;

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// red channel
    pub r: u8,
    /// green channel
    pub g: u8,
    /// blue channel
    pub b: u8,
}

impl Rgb {
    /// Build a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// The color as a lowercase rrggbb hex string, without a leading `#`
    pub fn hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The channels scaled to the unit interval, as pdf `rg` operands expect
    pub fn unit_channels(&self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

/// The semantic text roles a renderer can ask the configuration about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextRole {
    /// The book title on the titlepage
    Title,
    /// The subtitle on the titlepage
    Subtitle,
    /// The author byline on the titlepage
    Author,
    /// A chapter's title at the head of its first page
    ChapterTitle,
    /// A level-one heading in chapter body text
    Heading1,
    /// A level-two heading
    Heading2,
    /// A level-three heading
    Heading3,
    /// Body text
    Body,
    /// Inline and block code
    Code,
    /// The language label above a code block
    CodeLabel,
    /// Page numbers
    PageNumber,
}

/// Size and color for one text role
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleStyle {
    /// Point size
    pub size: f32,
    /// Text color
    pub color: Rgb,
}

/// Font family names for the page renderer; these are base-14 PostScript
/// names, so no font files need embedding
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFonts {
    /// Body text
    pub body: Cow<'static, str>,
    /// Bold body text and headings
    pub bold: Cow<'static, str>,
    /// Italic body text
    pub italic: Cow<'static, str>,
    /// Code
    pub code: Cow<'static, str>,
}

/// Font family names for the flow-document renderer
#[derive(Debug, Clone, PartialEq)]
pub struct DocxFonts {
    /// Headings and titlepage text
    pub heading: Cow<'static, str>,
    /// Body text
    pub body: Cow<'static, str>,
    /// Code
    pub code: Cow<'static, str>,
}

/// Per-target font families
#[derive(Debug, Clone, PartialEq)]
pub struct FontConfig {
    /// Families used by the page renderer
    pub pdf: PdfFonts,
    /// Families used by the flow-document renderer
    pub docx: DocxFonts,
}

/// Vertical rhythm, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacingConfig {
    /// Line height as a multiple of the font size
    pub line_height: f32,
    /// Extra height of a code line's background over its font size
    pub code_line_padding: f32,
    /// Flow-document spacing before a paragraph
    pub paragraph_before: f32,
    /// Flow-document spacing after a paragraph
    pub paragraph_after: f32,
    /// Flow-document spacing before a heading
    pub heading_before: f32,
    /// Flow-document spacing after a heading
    pub heading_after: f32,
    /// Flow-document spacing before a chapter title
    pub chapter_before: f32,
    /// Flow-document spacing after a chapter title
    pub chapter_after: f32,
}

/// Page margins, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginConfig {
    /// Top margin
    pub top: f32,
    /// Bottom margin
    pub bottom: f32,
    /// Left margin
    pub left: f32,
    /// Right margin
    pub right: f32,
}

/// The bounding box a cover image is proportionally fitted into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverBox {
    /// Box width in points
    pub width: f32,
    /// Box height in points
    pub height: f32,
}

/// The two fixed indent columns of list rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListLayout {
    /// Distance from the left margin to the bullet or number glyph
    pub bullet_indent: f32,
    /// Distance from the left margin to the item text
    pub text_indent: f32,
}

/// Everything the two renderers consult about how a book should look.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    /// Titlepage title
    pub title: RoleStyle,
    /// Titlepage subtitle
    pub subtitle: RoleStyle,
    /// Titlepage byline
    pub author: RoleStyle,
    /// Chapter titles
    pub chapter_title: RoleStyle,
    /// Level-one headings
    pub heading_1: RoleStyle,
    /// Level-two headings
    pub heading_2: RoleStyle,
    /// Level-three headings
    pub heading_3: RoleStyle,
    /// Body text
    pub body: RoleStyle,
    /// Code text
    pub code: RoleStyle,
    /// Code-block language labels
    pub code_label: RoleStyle,
    /// Page numbers
    pub page_number: RoleStyle,
    /// Code rendered inside a code block, on the dark background
    pub code_block_text: Rgb,
    /// Background fill behind code-block lines
    pub code_background: Rgb,
    /// Shading behind inline code in the flow document
    pub inline_code_background: Rgb,
    /// The titlepage rule and other accents
    pub accent: Rgb,
    /// Font families per target
    pub fonts: FontConfig,
    /// Vertical rhythm
    pub spacing: SpacingConfig,
    /// Page margins
    pub margins: MarginConfig,
    /// Cover image bounding box
    pub cover: CoverBox,
    /// List indent columns
    pub list: ListLayout,
}

impl StyleConfig {
    /// Look up the style of a semantic role
    pub fn role(&self, role: TextRole) -> RoleStyle {
        match role {
            TextRole::Title => self.title,
            TextRole::Subtitle => self.subtitle,
            TextRole::Author => self.author,
            TextRole::ChapterTitle => self.chapter_title,
            TextRole::Heading1 => self.heading_1,
            TextRole::Heading2 => self.heading_2,
            TextRole::Heading3 => self.heading_3,
            TextRole::Body => self.body,
            TextRole::Code => self.code,
            TextRole::CodeLabel => self.code_label,
            TextRole::PageNumber => self.page_number,
        }
    }

    /// The style of a body heading; levels beyond three clamp to three
    pub fn heading(&self, level: u32) -> RoleStyle {
        match level {
            1 => self.heading_1,
            2 => self.heading_2,
            _ => self.heading_3,
        }
    }
}

const INK: Rgb = Rgb::new(0x1a, 0x20, 0x2c);
const SLATE: Rgb = Rgb::new(0x4a, 0x55, 0x68);
const CHARCOAL: Rgb = Rgb::new(0x2d, 0x37, 0x48);
const MUTED: Rgb = Rgb::new(0x64, 0x74, 0x8b);

impl Default for StyleConfig {
    fn default() -> Self {
        StyleConfig {
            title: RoleStyle { size: 32.0, color: INK },
            subtitle: RoleStyle { size: 20.0, color: SLATE },
            author: RoleStyle { size: 16.0, color: CHARCOAL },
            chapter_title: RoleStyle { size: 24.0, color: INK },
            heading_1: RoleStyle { size: 18.0, color: INK },
            heading_2: RoleStyle { size: 16.0, color: INK },
            heading_3: RoleStyle { size: 14.0, color: INK },
            body: RoleStyle {
                size: 11.0,
                color: Rgb::new(0, 0, 0),
            },
            code: RoleStyle {
                size: 9.0,
                color: Rgb::new(0xd6, 0x33, 0x84),
            },
            code_label: RoleStyle {
                size: 8.0,
                color: MUTED,
            },
            page_number: RoleStyle {
                size: 9.0,
                color: MUTED,
            },
            code_block_text: Rgb::new(0xe2, 0xe8, 0xf0),
            code_background: Rgb::new(0x1e, 0x29, 0x3b),
            inline_code_background: Rgb::new(0xf1, 0xf5, 0xf9),
            accent: Rgb::new(0x4f, 0x46, 0xe5),
            fonts: FontConfig {
                pdf: PdfFonts {
                    body: Cow::Borrowed("Helvetica"),
                    bold: Cow::Borrowed("Helvetica-Bold"),
                    italic: Cow::Borrowed("Helvetica-Oblique"),
                    code: Cow::Borrowed("Courier"),
                },
                docx: DocxFonts {
                    heading: Cow::Borrowed("Calibri"),
                    body: Cow::Borrowed("Calibri"),
                    code: Cow::Borrowed("Courier New"),
                },
            },
            spacing: SpacingConfig {
                line_height: 1.5,
                code_line_padding: 6.0,
                paragraph_before: 10.0,
                paragraph_after: 10.0,
                heading_before: 15.0,
                heading_after: 7.5,
                chapter_before: 20.0,
                chapter_after: 15.0,
            },
            margins: MarginConfig {
                top: 72.0,
                bottom: 72.0,
                left: 72.0,
                right: 72.0,
            },
            cover: CoverBox {
                width: 400.0,
                height: 550.0,
            },
            list: ListLayout {
                bullet_indent: 20.0,
                text_indent: 35.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_formatting() {
        assert_eq!(Rgb::new(0x1a, 0x20, 0x2c).hex(), "1a202c");
        assert_eq!(Rgb::new(0, 0, 0).hex(), "000000");
    }

    #[test]
    fn heading_levels_clamp_to_three() {
        let config = StyleConfig::default();
        assert_eq!(config.heading(1), config.heading_1);
        assert_eq!(config.heading(3), config.heading_3);
        assert_eq!(config.heading(4), config.heading_3);
        assert_eq!(config.heading(6), config.heading_3);
    }

    // the cross-renderer consistency contract: a role resolves through one
    // value, so intent-equivalent colors cannot drift between targets
    #[test]
    fn title_and_chapter_title_share_ink() {
        let config = StyleConfig::default();
        assert_eq!(
            config.role(TextRole::Title).color,
            config.role(TextRole::ChapterTitle).color
        );
        assert_eq!(config.role(TextRole::Heading2).color, INK);
    }
}
