//! Hex color parsing for the PDF fill color space.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColorError {
    #[error("color '{0}' is not a #RGB or #RRGGBB hex string")]
    BadFormat(String),
    #[error("color '{0}' contains a non-hex digit")]
    BadDigit(String),
}

/// RGB triple normalized to the [0, 1] range PDF expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

pub const BLACK: Rgb = Rgb {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};

/// Parse `#RRGGBB` or the 3-digit shorthand `#RGB` (each digit doubled).
///
/// Malformed input is a typed error; the renderer falls back to black
/// instead of letting NaN components reach the content stream.
pub fn parse_hex_color(input: &str) -> Result<Rgb, ColorError> {
    let hex = input.trim().strip_prefix('#').unwrap_or_else(|| input.trim());
    if !hex.is_ascii() {
        return Err(ColorError::BadFormat(input.to_string()));
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(ColorError::BadFormat(input.to_string())),
    };

    let channel = |range: std::ops::Range<usize>| -> Result<f32, ColorError> {
        u8::from_str_radix(&expanded[range], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| ColorError::BadDigit(input.to_string()))
    };

    Ok(Rgb {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_full_hex() {
        let c = parse_hex_color("#FF5733").unwrap();
        assert!(close(c.r, 255.0 / 255.0));
        assert!(close(c.g, 87.0 / 255.0));
        assert!(close(c.b, 51.0 / 255.0));
    }

    #[test]
    fn test_shorthand_expansion() {
        let c = parse_hex_color("#F00").unwrap();
        assert!(close(c.r, 1.0));
        assert!(close(c.g, 0.0));
        assert!(close(c.b, 0.0));
        assert_eq!(parse_hex_color("#abc").unwrap(), parse_hex_color("#aabbcc").unwrap());
    }

    #[test]
    fn test_without_hash() {
        assert!(close(parse_hex_color("000000").unwrap().r, 0.0));
    }

    #[test]
    fn test_malformed_is_error_not_nan() {
        assert!(parse_hex_color("#GGHHII").is_err());
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("blue").is_err());
        assert!(parse_hex_color("").is_err());
    }
}
