//! Base-14 Helvetica family selection and text measurement.
//!
//! Field text is painted with the standard Type1 Helvetica faces, so no
//! font files are embedded and output stays deterministic. Alignment needs
//! measured widths; these come from the Adobe AFM metrics for the ASCII
//! range (widths are per-mille of the font size). Characters outside that
//! range fall back to a nominal width, which is close enough for centering.

use crate::template::FieldStyle;

/// The four faces a field style can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontVariant {
    Regular,
    Bold,
    Oblique,
    BoldOblique,
}

impl FontVariant {
    /// Map a field's weight/style strings onto a face. Anything other than
    /// the literal "bold"/"italic" means regular.
    pub fn select(style: &FieldStyle) -> Self {
        let bold = style.font_weight.eq_ignore_ascii_case("bold");
        let italic = style.font_style.eq_ignore_ascii_case("italic");
        match (bold, italic) {
            (true, true) => FontVariant::BoldOblique,
            (true, false) => FontVariant::Bold,
            (false, true) => FontVariant::Oblique,
            (false, false) => FontVariant::Regular,
        }
    }

    /// The PDF BaseFont name.
    pub fn base_font(self) -> &'static str {
        match self {
            FontVariant::Regular => "Helvetica",
            FontVariant::Bold => "Helvetica-Bold",
            FontVariant::Oblique => "Helvetica-Oblique",
            FontVariant::BoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Resource dictionary key. Prefixed so overlays on an existing
    /// background PDF cannot collide with the page's own font names.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontVariant::Regular => "CmF1",
            FontVariant::Bold => "CmF2",
            FontVariant::Oblique => "CmF3",
            FontVariant::BoldOblique => "CmF4",
        }
    }

    pub const ALL: [FontVariant; 4] = [
        FontVariant::Regular,
        FontVariant::Bold,
        FontVariant::Oblique,
        FontVariant::BoldOblique,
    ];

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontVariant::Regular | FontVariant::Oblique => &HELVETICA_WIDTHS,
            FontVariant::Bold | FontVariant::BoldOblique => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

const FALLBACK_WIDTH: u16 = 556;

/// AFM widths for Helvetica, characters 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667,
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556,
    556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

/// AFM widths for Helvetica-Bold, characters 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667,
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611,
    611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Encode text as WinAnsi bytes for a `Tj` operand.
///
/// The fonts are declared with /WinAnsiEncoding, so the Latin-1 range maps
/// straight to single bytes and the 0x80..0x9F window carries the Windows
/// punctuation set. Anything outside the encoding substitutes '?'.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c as u32 {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
        _ => match c {
            '\u{20AC}' => 0x80, // euro sign
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85, // ellipsis
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en dash
            '\u{2014}' => 0x97, // em dash
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99, // trademark
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => b'?',
        },
    }
}

/// Width of `text` set in `variant` at `font_size`, in page units.
pub fn text_width(text: &str, variant: FontVariant, font_size: f32) -> f32 {
    let widths = variant.widths();
    let total: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (0x20..=0x7E).contains(&code) {
                widths[(code - 0x20) as usize] as u32
            } else {
                FALLBACK_WIDTH as u32
            }
        })
        .sum();
    total as f32 / 1000.0 * font_size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(weight: &str, font_style: &str) -> FieldStyle {
        FieldStyle {
            font_weight: weight.to_string(),
            font_style: font_style.to_string(),
            ..FieldStyle::default()
        }
    }

    #[test]
    fn test_variant_selection() {
        assert_eq!(FontVariant::select(&style("normal", "normal")), FontVariant::Regular);
        assert_eq!(FontVariant::select(&style("bold", "normal")), FontVariant::Bold);
        assert_eq!(FontVariant::select(&style("normal", "italic")), FontVariant::Oblique);
        assert_eq!(FontVariant::select(&style("BOLD", "Italic")), FontVariant::BoldOblique);
        assert_eq!(FontVariant::select(&style("700", "oblique")), FontVariant::Regular);
    }

    #[test]
    fn test_known_widths() {
        // 'A' is 667/1000 in Helvetica regular.
        assert!((text_width("A", FontVariant::Regular, 1000.0) - 667.0).abs() < 0.01);
        // Space is 278 in both faces.
        assert!((text_width(" ", FontVariant::Bold, 1000.0) - 278.0).abs() < 0.01);
    }

    #[test]
    fn test_width_scales_with_font_size() {
        let w12 = text_width("Certificate", FontVariant::Regular, 12.0);
        let w24 = text_width("Certificate", FontVariant::Regular, 24.0);
        assert!((w24 - 2.0 * w12).abs() < 0.01);
    }

    #[test]
    fn test_bold_at_least_as_wide() {
        let regular = text_width("Diploma in Engineering", FontVariant::Regular, 14.0);
        let bold = text_width("Diploma in Engineering", FontVariant::Bold, 14.0);
        assert!(bold >= regular);
    }

    #[test]
    fn test_non_ascii_uses_fallback() {
        assert!((text_width("é", FontVariant::Regular, 1000.0) - 556.0).abs() < 0.01);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Cafe"), b"Cafe");
        assert_eq!(encode_win_ansi("Caf\u{e9}"), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("\u{20AC}10"), vec![0x80, b'1', b'0']);
        assert_eq!(encode_win_ansi("A\u{2013}B"), vec![b'A', 0x96, b'B']);
        // Outside the encoding entirely.
        assert_eq!(encode_win_ansi("\u{4F60}"), vec![b'?']);
    }
}
