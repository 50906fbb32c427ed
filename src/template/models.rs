//! Template and field value objects.
//!
//! These are the serde-facing shapes the surrounding application stores per
//! university and hands to the merge engine / field renderer. A `DataRecord`
//! is the per-document payload (student attributes plus computed values) and
//! is always a JSON object.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Per-document key/value payload merged into a template.
pub type DataRecord = serde_json::Value;

/// How a template describes its layout.
///
/// Unknown strings are a deserialization error on purpose: an invalid
/// template type is a caller bug and must surface, unlike unknown field
/// types which are skipped leniently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    Html,
    PdfMapper,
    Canvas,
    DirectUpload,
}

/// Page orientation hint carried alongside explicit pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Portrait
    }
}

/// Template page dimensions in template pixel space, origin top-left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub orientation: Orientation,
}

impl Default for Dimensions {
    fn default() -> Self {
        // A4 at 72dpi, the layout the template builder starts from.
        Dimensions {
            width: 595.0,
            height: 842.0,
            orientation: Orientation::Portrait,
        }
    }
}

/// Placement of the embedded verification QR code.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    pub enabled: bool,
    pub position: Position,
    pub size: f32,
}

/// A reusable certificate layout with named variable slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub background_image: Option<PathBuf>,
    #[serde(default)]
    pub background_pdf: Option<PathBuf>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub qr_config: QrConfig,
}

/// Field box in template pixel space, origin top-left.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// What a field paints.
///
/// Unknown values deserialize to [`FieldType::Unknown`] and are silently
/// skipped by the renderer, so an older core keeps working against templates
/// saved by a newer builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Image,
    Qrcode,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl Default for TextAlign {
    fn default() -> Self {
        TextAlign::Left
    }
}

/// Text styling for a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldStyle {
    pub font_size: f32,
    pub font_family: String,
    pub font_weight: String,
    pub font_style: String,
    pub color: String,
    pub align: TextAlign,
}

impl Default for FieldStyle {
    fn default() -> Self {
        FieldStyle {
            font_size: 12.0,
            font_family: "Helvetica".to_string(),
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            color: "#000000".to_string(),
            align: TextAlign::Left,
        }
    }
}

/// Declarative validation metadata attached by the template builder.
///
/// The core carries it through but does not enforce it; import-time checks
/// live with the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldValidation {
    pub required: bool,
    pub pattern: Option<String>,
}

/// Conditional visibility bound to a data-record key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditional {
    pub show: Option<String>,
    pub hide: Option<String>,
}

/// One placeholder region within a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub style: FieldStyle,
    #[serde(default)]
    pub validation: FieldValidation,
    #[serde(default)]
    pub conditional: Option<Conditional>,
    #[serde(default)]
    pub default_value: Option<String>,
    /// Expression evaluated against the data record instead of a direct
    /// lookup, e.g. `marks.obtained / marks.total * 100`. See
    /// [`crate::template::expr`] for the grammar.
    #[serde(default)]
    pub computed: Option<String>,
}

impl Field {
    /// A bare text field at a position, with default styling.
    pub fn text(name: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Field {
            name: name.into(),
            field_type: FieldType::Text,
            position: Position {
                x,
                y,
                width,
                height,
            },
            style: FieldStyle::default(),
            validation: FieldValidation::default(),
            conditional: None,
            default_value: None,
            computed: None,
        }
    }
}
