//! Heuristic text measurement for the base-14 fonts.
//!
//! Widths are estimated from a coarse per-class table rather than real font
//! metrics: the page renderer's layout decisions are deliberately
//! approximate, and a small systematic error in line breaking costs nothing
//! worse than a slightly ragged right edge. Courier is genuinely fixed at
//! 0.6 em, so code measures exactly.

/// The four font resources every page's resource dictionary carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontSlot {
    /// Helvetica
    Body,
    /// Helvetica-Bold; also used for headings and titles
    Bold,
    /// Helvetica-Oblique
    Italic,
    /// Courier
    Code,
}

impl FontSlot {
    /// The resource name the font is registered under
    pub(crate) fn resource_name(self) -> &'static str {
        match self {
            FontSlot::Body => "F1",
            FontSlot::Bold => "F2",
            FontSlot::Italic => "F3",
            FontSlot::Code => "F4",
        }
    }
}

/// Estimate the drawn width of `text` in points
pub(crate) fn estimate_width(text: &str, slot: FontSlot, size: f32) -> f32 {
    let em_total: f32 = match slot {
        FontSlot::Code => text.chars().count() as f32 * 0.6,
        _ => text.chars().map(helvetica_em).sum(),
    };
    em_total * size
}

fn helvetica_em(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' | '.' | ',' | ';' | ':' | '!' => 0.25,
        't' | 'f' | 'I' | '(' | ')' | '[' | ']' | '/' | ' ' => 0.30,
        'r' | '"' | '`' => 0.35,
        'm' | 'M' => 0.83,
        'w' => 0.72,
        'W' => 0.94,
        '@' => 1.0,
        c if c.is_ascii_uppercase() => 0.70,
        c if c.is_ascii_digit() => 0.56,
        _ => 0.53,
    }
}

/// Encode text for a WinAnsi-encoded base-14 font. Latin-1 passes through;
/// the common typographic characters land on their cp1252 slots; anything
/// else degrades to a question mark.
pub(crate) fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20ac}' => 0x80, // euro sign
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201c}' => 0x93, // left double quote
            '\u{201d}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en dash
            '\u{2014}' => 0x97, // em dash
            '\u{2122}' => 0x99, // trade mark
            c if (c as u32) <= 255 => c as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn courier_is_fixed_pitch() {
        let narrow = estimate_width("iii", FontSlot::Code, 10.0);
        let wide = estimate_width("mmm", FontSlot::Code, 10.0);
        assert!((narrow - wide).abs() < f32::EPSILON);
        assert!((narrow - 18.0).abs() < 0.001);
    }

    #[test]
    fn helvetica_narrow_chars_measure_less() {
        let narrow = estimate_width("ill", FontSlot::Body, 12.0);
        let wide = estimate_width("mmw", FontSlot::Body, 12.0);
        assert!(narrow < wide);
    }

    #[test]
    fn bullets_and_dashes_survive_win_ansi() {
        assert_eq!(to_win_ansi("\u{2022} a\u{2013}b"), vec![0x95, b' ', b'a', 0x96, b'b']);
        assert_eq!(to_win_ansi("\u{4e16}"), vec![b'?']);
    }
}
