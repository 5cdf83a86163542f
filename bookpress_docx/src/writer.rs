//! Serialization of the flow-block sequence into WordprocessingML.
//!
//! Everything visual is direct formatting on runs and paragraphs; the
//! styles part only contributes outline levels so headings show up in a
//! word processor's navigation pane. Measurements follow OOXML's units:
//! half-points for font sizes, twentieths of a point for spacing and
//! indents, EMUs for picture extents.

use crate::{FlowBlock, ListMarker};
use bookpress_ast::{InlineSegment, SegmentKind};
use bookpress_common::{escape_to_xml, Rgb, StyleConfig, TextRole};

// titlepage rhythm, in twips
const TITLE_BEFORE: u32 = 2000;
const TITLE_AFTER: u32 = 400;
const SUBTITLE_AFTER: u32 = 400;
const AUTHOR_AFTER: u32 = 200;
const RULE_BEFORE: u32 = 400;
const COVER_TOP_GAP: u32 = 1000;

// code blocks and lists share the same body indent
const BODY_INDENT: u32 = 360;

const EMU_PER_POINT: f32 = 12700.0;

fn half_points(size: f32) -> u32 {
    (size * 2.0).round() as u32
}

fn twips(points: f32) -> u32 {
    (points * 20.0).round() as u32
}

fn emu(points: f32) -> u64 {
    (points * EMU_PER_POINT).round() as u64
}

/// Formatting for one run of text
struct RunProps<'a> {
    font: &'a str,
    size: f32,
    color: Option<Rgb>,
    bold: bool,
    italic: bool,
    shading: Option<Rgb>,
}

impl<'a> RunProps<'a> {
    fn plain(font: &'a str, size: f32) -> Self {
        RunProps {
            font,
            size,
            color: None,
            bold: false,
            italic: false,
            shading: None,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    fn shading(mut self, fill: Rgb) -> Self {
        self.shading = Some(fill);
        self
    }
}

pub(crate) struct DocumentWriter<'c> {
    target: String,
    config: &'c StyleConfig,
    cover_relationship: Option<String>,
}

impl std::fmt::Debug for DocumentWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWriter")
            .field("written", &self.target.len())
            .finish()
    }
}

impl<'c> DocumentWriter<'c> {
    pub(crate) fn new(config: &'c StyleConfig, cover_relationship: Option<String>) -> Self {
        DocumentWriter {
            target: String::new(),
            config,
            cover_relationship,
        }
    }

    /// Serialize the block sequence into the main document part
    pub(crate) fn write(&mut self, blocks: &[FlowBlock<'_>]) -> String {
        self.target.push_str(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#,
            r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
            r#" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing""#,
            r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
            r#" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            "\n<w:body>\n",
        ));

        for block in blocks.iter() {
            self.push_block(block);
        }

        self.write_section_properties();
        self.target.push_str("</w:body>\n</w:document>");
        std::mem::take(&mut self.target)
    }

    fn push_block(&mut self, block: &FlowBlock<'_>) {
        match block {
            FlowBlock::Title(text) => self.write_title_line(
                text,
                TextRole::Title,
                true,
                TITLE_BEFORE,
                TITLE_AFTER,
            ),
            FlowBlock::Subtitle(text) => {
                self.write_title_line(text, TextRole::Subtitle, false, 0, SUBTITLE_AFTER)
            }
            FlowBlock::Author(author) => {
                let byline = format!("by {}", author);
                self.write_title_line(&byline, TextRole::Author, false, 0, AUTHOR_AFTER)
            }
            FlowBlock::TitleRule => self.write_title_rule(),
            FlowBlock::ChapterTitle(text) => self.write_chapter_title(text),
            FlowBlock::Heading { level, text } => self.write_heading(*level, text),
            FlowBlock::BodyParagraph(segments) => self.write_body_paragraph(segments),
            FlowBlock::CodeLabel(language) => self.write_code_label(language),
            FlowBlock::CodeLine(line) => self.write_code_line(line),
            FlowBlock::ListItem { marker, segments } => self.write_list_item(marker, segments),
            FlowBlock::Spacer => self.write_spacer(),
            FlowBlock::PageBreak => self.write_page_break(),
            FlowBlock::Image { width, height, .. } => self.write_cover_image(*width, *height),
        }
    }

    fn push_run(&mut self, text: &str, props: &RunProps<'_>) {
        self.target.push_str("<w:r><w:rPr>");
        self.target.push_str(&format!(
            "<w:rFonts w:ascii=\"{0}\" w:hAnsi=\"{0}\"/>",
            escape_to_xml(props.font)
        ));
        if props.bold {
            self.target.push_str("<w:b/>");
        }
        if props.italic {
            self.target.push_str("<w:i/>");
        }
        if let Some(color) = props.color {
            self.target
                .push_str(&format!("<w:color w:val=\"{}\"/>", color.hex()));
        }
        let size = half_points(props.size);
        self.target.push_str(&format!(
            "<w:sz w:val=\"{0}\"/><w:szCs w:val=\"{0}\"/>",
            size
        ));
        if let Some(fill) = props.shading {
            self.target.push_str(&format!(
                "<w:shd w:val=\"clear\" w:fill=\"{}\"/>",
                fill.hex()
            ));
        }
        self.target.push_str("</w:rPr>");
        self.target.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t>",
            escape_to_xml(text)
        ));
        self.target.push_str("</w:r>");
    }

    fn push_segment(&mut self, segment: &InlineSegment<'_>) {
        let fonts = &self.config.fonts.docx;
        let body = self.config.role(TextRole::Body);
        let code = self.config.role(TextRole::Code);
        let props = match segment.kind {
            SegmentKind::Plain => RunProps::plain(&fonts.body, body.size),
            SegmentKind::Bold => RunProps::plain(&fonts.body, body.size).bold(),
            SegmentKind::Italic => RunProps::plain(&fonts.body, body.size).italic(),
            SegmentKind::Code => RunProps::plain(&fonts.code, code.size)
                .color(code.color)
                .shading(self.config.inline_code_background),
        };
        self.push_run(&segment.text, &props);
    }

    fn write_title_line(
        &mut self,
        text: &str,
        role: TextRole,
        bold: bool,
        before: u32,
        after: u32,
    ) {
        let style = self.config.role(role);
        self.target.push_str("<w:p><w:pPr><w:jc w:val=\"center\"/>");
        self.target.push_str(&format!(
            "<w:spacing w:before=\"{}\" w:after=\"{}\"/>",
            before, after
        ));
        self.target.push_str("</w:pPr>");
        let mut props =
            RunProps::plain(&self.config.fonts.docx.heading, style.size).color(style.color);
        if bold {
            props = props.bold();
        }
        self.push_run(text, &props);
        self.target.push_str("</w:p>\n");
    }

    fn write_title_rule(&mut self) {
        self.target.push_str(&format!(
            concat!(
                "<w:p><w:pPr><w:jc w:val=\"center\"/>",
                "<w:spacing w:before=\"{}\"/>",
                "<w:pBdr><w:bottom w:val=\"single\" w:sz=\"12\" w:space=\"1\" w:color=\"{}\"/></w:pBdr>",
                "</w:pPr></w:p>\n"
            ),
            RULE_BEFORE,
            self.config.accent.hex()
        ));
    }

    fn write_chapter_title(&mut self, text: &str) {
        let style = self.config.role(TextRole::ChapterTitle);
        let spacing = &self.config.spacing;
        self.target.push_str(&format!(
            "<w:p><w:pPr><w:spacing w:before=\"{}\" w:after=\"{}\"/></w:pPr>",
            twips(spacing.chapter_before),
            twips(spacing.chapter_after)
        ));
        let props = RunProps::plain(&self.config.fonts.docx.heading, style.size)
            .bold()
            .color(style.color);
        self.push_run(text, &props);
        self.target.push_str("</w:p>\n");
    }

    fn write_heading(&mut self, level: u32, text: &str) {
        let style = self.config.heading(level);
        let spacing = &self.config.spacing;
        self.target.push_str(&format!(
            concat!(
                "<w:p><w:pPr><w:pStyle w:val=\"Heading{}\"/>",
                "<w:spacing w:before=\"{}\" w:after=\"{}\"/></w:pPr>"
            ),
            level,
            twips(spacing.heading_before),
            twips(spacing.heading_after)
        ));
        let props = RunProps::plain(&self.config.fonts.docx.heading, style.size)
            .bold()
            .color(style.color);
        self.push_run(text, &props);
        self.target.push_str("</w:p>\n");
    }

    fn write_body_paragraph(&mut self, segments: &[InlineSegment<'_>]) {
        let spacing = &self.config.spacing;
        let line = (spacing.line_height * 240.0).round() as u32;
        self.target.push_str(&format!(
            concat!(
                "<w:p><w:pPr><w:jc w:val=\"left\"/>",
                "<w:spacing w:before=\"{}\" w:after=\"{}\" w:line=\"{}\" w:lineRule=\"auto\"/>",
                "</w:pPr>"
            ),
            twips(spacing.paragraph_before),
            twips(spacing.paragraph_after),
            line
        ));
        for segment in segments.iter() {
            self.push_segment(segment);
        }
        self.target.push_str("</w:p>\n");
    }

    fn write_code_label(&mut self, language: &str) {
        let style = self.config.role(TextRole::CodeLabel);
        self.target
            .push_str("<w:p><w:pPr><w:spacing w:before=\"100\" w:after=\"50\"/></w:pPr>");
        let label = format!("Language: {}", language);
        let props = RunProps::plain(&self.config.fonts.docx.body, style.size)
            .italic()
            .color(style.color);
        self.push_run(&label, &props);
        self.target.push_str("</w:p>\n");
    }

    fn write_code_line(&mut self, line: &str) {
        let style = self.config.role(TextRole::Code);
        self.target.push_str(&format!(
            concat!(
                "<w:p><w:pPr>",
                "<w:spacing w:before=\"50\" w:after=\"50\" w:line=\"276\" w:lineRule=\"auto\"/>",
                "<w:shd w:val=\"clear\" w:fill=\"{}\"/>",
                "<w:ind w:left=\"{}\"/>",
                "</w:pPr>"
            ),
            self.config.code_background.hex(),
            BODY_INDENT
        ));
        let text = if line.is_empty() { " " } else { line };
        let props = RunProps::plain(&self.config.fonts.docx.code, style.size)
            .color(self.config.code_block_text);
        self.push_run(text, &props);
        self.target.push_str("</w:p>\n");
    }

    fn write_list_item(&mut self, marker: &ListMarker, segments: &[InlineSegment<'_>]) {
        let body = self.config.role(TextRole::Body);
        self.target.push_str(&format!(
            concat!(
                "<w:p><w:pPr><w:spacing w:before=\"100\" w:after=\"100\"/>",
                "<w:ind w:left=\"{}\"/></w:pPr>"
            ),
            BODY_INDENT
        ));
        let prefix = match marker {
            ListMarker::Bullet => "\u{2022} ".to_string(),
            ListMarker::Number(n) => format!("{}. ", n),
        };
        let props = RunProps::plain(&self.config.fonts.docx.body, body.size).bold();
        self.push_run(&prefix, &props);
        for segment in segments.iter() {
            self.push_segment(segment);
        }
        self.target.push_str("</w:p>\n");
    }

    fn write_spacer(&mut self) {
        self.target
            .push_str("<w:p><w:pPr><w:spacing w:after=\"200\"/></w:pPr></w:p>\n");
    }

    fn write_page_break(&mut self) {
        self.target
            .push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>\n");
    }

    fn write_cover_image(&mut self, width: f32, height: f32) {
        let relationship = match self.cover_relationship.as_deref() {
            Some(id) => id.to_string(),
            // an image block without a registered resource cannot be drawn
            None => return,
        };
        let cx = emu(width);
        let cy = emu(height);
        self.target.push_str(&format!(
            "<w:p><w:pPr><w:spacing w:before=\"{}\"/></w:pPr></w:p>\n",
            COVER_TOP_GAP
        ));
        self.target.push_str(&format!(
            concat!(
                "<w:p><w:pPr><w:jc w:val=\"center\"/><w:spacing w:before=\"200\" w:after=\"400\"/></w:pPr>",
                "<w:r><w:drawing>",
                "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:docPr id=\"1\" name=\"Cover\"/>",
                "<a:graphic>",
                "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
                "<pic:pic>",
                "<pic:nvPicPr><pic:cNvPr id=\"1\" name=\"Cover\"/><pic:cNvPicPr/></pic:nvPicPr>",
                "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
                "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
                "</pic:pic>",
                "</a:graphicData>",
                "</a:graphic>",
                "</wp:inline>",
                "</w:drawing></w:r></w:p>\n"
            ),
            cx = cx,
            cy = cy,
            rel = relationship
        ));
    }

    fn write_section_properties(&mut self) {
        let margins = &self.config.margins;
        self.target.push_str(&format!(
            concat!(
                "<w:sectPr>",
                "<w:pgSz w:w=\"11906\" w:h=\"16838\"/>",
                "<w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/>",
                "</w:sectPr>\n"
            ),
            twips(margins.top),
            twips(margins.right),
            twips(margins.bottom),
            twips(margins.left)
        ));
    }
}

/// The styles part: default fonts plus the three heading outline levels.
pub(crate) fn styles_part(config: &StyleConfig) -> String {
    let mut out = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        "\n",
    ));
    out.push_str(&format!(
        concat!(
            "\t<w:docDefaults><w:rPrDefault><w:rPr>",
            "<w:rFonts w:ascii=\"{0}\" w:hAnsi=\"{0}\"/>",
            "<w:sz w:val=\"{1}\"/><w:szCs w:val=\"{1}\"/>",
            "</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr/></w:pPrDefault></w:docDefaults>\n"
        ),
        escape_to_xml(config.fonts.docx.body.as_ref()),
        half_points(config.role(TextRole::Body).size)
    ));
    out.push_str(concat!(
        "\t<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\">",
        "<w:name w:val=\"Normal\"/></w:style>\n"
    ));
    for level in 1..=3u32 {
        out.push_str(&format!(
            concat!(
                "\t<w:style w:type=\"paragraph\" w:styleId=\"Heading{0}\">",
                "<w:name w:val=\"heading {0}\"/>",
                "<w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/>",
                "<w:pPr><w:outlineLvl w:val=\"{1}\"/></w:pPr>",
                "</w:style>\n"
            ),
            level,
            level - 1
        ));
    }
    out.push_str("</w:styles>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn write_blocks(blocks: &[FlowBlock<'_>]) -> String {
        let config = StyleConfig::default();
        DocumentWriter::new(&config, None).write(blocks)
    }

    #[test]
    fn title_line_is_centered_and_sized() {
        let xml = write_blocks(&[FlowBlock::Title("A Book")]);
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
        assert!(xml.contains("<w:sz w:val=\"64\"/>"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">A Book</w:t>"));
    }

    #[test]
    fn author_gets_a_byline() {
        let xml = write_blocks(&[FlowBlock::Author("A.N. Author")]);
        assert!(xml.contains(">by A.N. Author</w:t>"));
    }

    #[test]
    fn segments_carry_their_styling() {
        let segments = vec![
            InlineSegment {
                text: Cow::Borrowed("plain "),
                kind: SegmentKind::Plain,
            },
            InlineSegment {
                text: Cow::Borrowed("strong"),
                kind: SegmentKind::Bold,
            },
            InlineSegment {
                text: Cow::Borrowed("mono"),
                kind: SegmentKind::Code,
            },
        ];
        let xml = write_blocks(&[FlowBlock::BodyParagraph(segments)]);
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains("Courier New"));
        assert!(xml.contains("<w:shd w:val=\"clear\" w:fill=\"f1f5f9\"/>"));
    }

    #[test]
    fn code_lines_are_shaded_and_indented() {
        let xml = write_blocks(&[
            FlowBlock::CodeLabel(Cow::Borrowed("rust")),
            FlowBlock::CodeLine(Cow::Borrowed("let x = 1;")),
        ]);
        assert!(xml.contains(">Language: rust</w:t>"));
        assert!(xml.contains("<w:shd w:val=\"clear\" w:fill=\"1e293b\"/>"));
        assert!(xml.contains("<w:ind w:left=\"360\"/>"));
    }

    #[test]
    fn markers_prefix_list_items() {
        let xml = write_blocks(&[
            FlowBlock::ListItem {
                marker: ListMarker::Bullet,
                segments: vec![InlineSegment {
                    text: Cow::Borrowed("first"),
                    kind: SegmentKind::Plain,
                }],
            },
            FlowBlock::ListItem {
                marker: ListMarker::Number(2),
                segments: vec![InlineSegment {
                    text: Cow::Borrowed("second"),
                    kind: SegmentKind::Plain,
                }],
            },
        ]);
        assert!(xml.contains(">\u{2022} </w:t>"));
        assert!(xml.contains(">2. </w:t>"));
    }

    #[test]
    fn page_break_is_a_real_break() {
        let xml = write_blocks(&[FlowBlock::PageBreak]);
        assert!(xml.contains("<w:br w:type=\"page\"/>"));
    }

    #[test]
    fn text_is_escaped() {
        let xml = write_blocks(&[FlowBlock::ChapterTitle("Fish & <Chips>")]);
        assert!(xml.contains(">Fish &amp; &lt;Chips&gt;</w:t>"));
    }

    #[test]
    fn styles_part_declares_heading_outlines() {
        let styles = styles_part(&StyleConfig::default());
        assert!(styles.contains("w:styleId=\"Heading1\""));
        assert!(styles.contains("<w:outlineLvl w:val=\"2\"/>"));
    }
}
