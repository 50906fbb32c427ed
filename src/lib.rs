//! certmint - certificate generation core.
//!
//! Universities build certificate templates (HTML with `{{variable}}`
//! slots, or absolute-positioned field maps over a background), import
//! student records, and issue documents carrying a QR verification code.
//! This crate is the rendering core behind those flows:
//!
//! - [`template`]: template/field value objects, the placeholder merge
//!   engine, HTML security validation, and the computed-field expression
//!   evaluator.
//! - [`render`]: the PDF field renderer that paints a field list onto a
//!   blank, image-backed, or existing-PDF page.
//! - [`qr`]: verification URL composition and QR PNG artifacts.
//! - [`document`]: the orchestration the request handlers call, tying the
//!   three together into a rendered artifact descriptor.
//!
//! The crate has no web, storage, or auth surface of its own; callers load
//! the template and data records, invoke [`document::generate_document`],
//! and persist the returned paths.

pub mod document;
pub mod qr;
pub mod render;
pub mod template;

pub use document::{
    generate_document, issue_data, DocumentArtifact, GenerateError, GenerateRequest,
    RenderedDocument, Verification,
};
pub use qr::{generate_qr, QrError, VerificationConfig};
pub use render::{Background, PageSpec, PdfFieldRenderer, RenderError};
pub use template::{
    extract_template_variables, merge, validate_template_html, DataRecord, Field, FieldType,
    Template, TemplateType, ValidationReport,
};
