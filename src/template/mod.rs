//! Template layer: value objects, placeholder merging, validation, and the
//! computed-field expression evaluator.

pub mod expr;
pub mod merge;
pub mod models;
pub mod validate;

pub use expr::{evaluate, evaluate_to_string, ExprError, ExprValue};
pub use merge::merge;
pub use models::{
    Conditional, DataRecord, Dimensions, Field, FieldStyle, FieldType, FieldValidation,
    Orientation, Position, QrConfig, Template, TemplateType, TextAlign,
};
pub use validate::{extract_template_variables, validate_template_html, ValidationReport};
