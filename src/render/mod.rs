//! Rendering layer: PDF field painting, fonts, colors, and image assets.

pub mod assets;
pub mod color;
pub mod common;
pub mod engine;
pub mod fonts;

pub use assets::AssetError;
pub use color::{parse_hex_color, ColorError, Rgb};
pub use common::{field_visible, resolve_field_value, sanitize_certificate_id};
pub use engine::{text_operations, Background, PageSpec, PdfFieldRenderer, RenderError};
pub use fonts::{encode_win_ansi, text_width, FontVariant};
