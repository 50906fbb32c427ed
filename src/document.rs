//! Document generation orchestration.
//!
//! This is the entry point the surrounding request handlers call: load a
//! template record and a student's data record, then hand both here to get
//! back the rendered artifact descriptor. HTML templates resolve to a
//! merged HTML string (printing it is an external collaborator's job);
//! mapped and canvas templates resolve to a PDF written under the output
//! directory. Either kind may carry a verification QR image.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use thiserror::Error;

use crate::qr::{generate_qr, QrError, VerificationConfig};
use crate::render::{
    sanitize_certificate_id, Background, PageSpec, PdfFieldRenderer, RenderError,
};
use crate::template::{
    merge, Field, FieldStyle, FieldType, FieldValidation, Orientation, Position, Template,
    TemplateType,
};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("template '{0}' is a direct upload; there is nothing to render")]
    DirectUpload(String),
    #[error("HTML template '{0}' has no htmlContent")]
    MissingHtml(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to create output directory: {0}")]
    CreateDir(#[source] io::Error),
    #[error("failed to write PDF file: {0}")]
    WritePdf(#[source] io::Error),
}

/// Output artifact descriptor for a generated PDF document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub pdf_path: PathBuf,
    pub qr_path: Option<PathBuf>,
}

/// What a generation call produced, by template kind.
#[derive(Debug, Clone)]
pub enum DocumentArtifact {
    Pdf(RenderedDocument),
    Html {
        html: String,
        qr_path: Option<PathBuf>,
    },
}

/// Verification identity of the document being generated.
#[derive(Debug, Clone, Copy)]
pub struct Verification<'a> {
    /// Opaque code resolvable via the public verify URL.
    pub code: &'a str,
    /// University subdomain, when the tenant has one.
    pub subdomain: Option<&'a str>,
}

/// One document-generation call. Stateless; batch callers may run many of
/// these in parallel, one per document.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    pub template: &'a Template,
    pub data: &'a Value,
    pub certificate_id: &'a str,
    pub output_dir: &'a Path,
    pub verification: Option<Verification<'a>>,
}

/// Generate the artifact for one document.
///
/// A QR that fails to generate degrades to a document without one (logged);
/// a template that cannot be rendered at all is an error for the caller to
/// translate.
pub fn generate_document(
    request: &GenerateRequest<'_>,
    config: &VerificationConfig,
) -> Result<DocumentArtifact, GenerateError> {
    let template = request.template;

    let qr_path = match (&request.verification, template.qr_config.enabled) {
        (Some(verification), true) => {
            let url = config.build_verification_url(verification.code, verification.subdomain);
            match generate_qr(&url, request.certificate_id, request.output_dir) {
                Ok(path) => Some(path),
                Err(e) => {
                    log_degraded_qr(request.certificate_id, &e);
                    None
                }
            }
        }
        _ => None,
    };

    match template.template_type {
        TemplateType::Html => {
            let html_template = template
                .html_content
                .as_deref()
                .ok_or_else(|| GenerateError::MissingHtml(template.id.clone()))?;
            Ok(DocumentArtifact::Html {
                html: merge(html_template, request.data),
                qr_path,
            })
        }
        TemplateType::PdfMapper | TemplateType::Canvas => {
            let rendered = render_pdf(request, qr_path)?;
            Ok(DocumentArtifact::Pdf(rendered))
        }
        TemplateType::DirectUpload => Err(GenerateError::DirectUpload(template.id.clone())),
    }
}

fn log_degraded_qr(certificate_id: &str, error: &QrError) {
    // A missing QR must not block certificate delivery.
    log::warn!("document '{certificate_id}' will be issued without a QR: {error}");
}

fn render_pdf(
    request: &GenerateRequest<'_>,
    qr_path: Option<PathBuf>,
) -> Result<RenderedDocument, GenerateError> {
    let template = request.template;
    let page = page_spec(template);
    let background = template
        .background_pdf
        .clone()
        .map(Background::Pdf)
        .or_else(|| template.background_image.clone().map(Background::Image));

    // Templates that enable the QR without placing a qrcode field get one
    // synthesized at the configured position.
    let mut fields = template.fields.clone();
    let needs_synthetic_qr = qr_path.is_some()
        && template.qr_config.enabled
        && !fields.iter().any(|f| f.field_type == FieldType::Qrcode);
    if needs_synthetic_qr {
        fields.push(synthetic_qr_field(template));
    }

    let bytes = PdfFieldRenderer::render(
        &fields,
        request.data,
        page,
        background.as_ref(),
        qr_path.as_deref(),
    )?;

    fs::create_dir_all(request.output_dir).map_err(GenerateError::CreateDir)?;
    let filename = format!(
        "{}.pdf",
        sanitize_certificate_id(request.certificate_id, "certificate")
    );
    let pdf_path = request.output_dir.join(filename);
    fs::write(&pdf_path, &bytes).map_err(GenerateError::WritePdf)?;
    log::info!(
        "rendered document '{}' ({} bytes) at {}",
        request.certificate_id,
        bytes.len(),
        pdf_path.display()
    );

    Ok(RenderedDocument { pdf_path, qr_path })
}

fn page_spec(template: &Template) -> PageSpec {
    let dims = template.dimensions;
    // Declared width/height win; the orientation hint only corrects a
    // template saved with the axes the wrong way around.
    let swap = match dims.orientation {
        Orientation::Landscape => dims.width < dims.height,
        Orientation::Portrait => false,
    };
    if swap {
        PageSpec {
            width: dims.height,
            height: dims.width,
        }
    } else {
        PageSpec {
            width: dims.width,
            height: dims.height,
        }
    }
}

fn synthetic_qr_field(template: &Template) -> Field {
    let qr = template.qr_config;
    let size = if qr.size > 0.0 { qr.size } else { 100.0 };
    Field {
        name: "verificationQr".to_string(),
        field_type: FieldType::Qrcode,
        position: Position {
            x: qr.position.x,
            y: qr.position.y,
            width: size,
            height: size,
        },
        style: FieldStyle::default(),
        validation: FieldValidation::default(),
        conditional: None,
        default_value: None,
        computed: None,
    }
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Merge a student record with the computed issue-date fields templates
/// reference (`issueDate`, `issueYear`).
pub fn issue_data(student: &Value, issued_on: NaiveDate) -> Value {
    let mut record = match student {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    let month = MONTHS[(issued_on.month0() as usize).min(MONTHS.len() - 1)];
    record.insert(
        "issueDate".to_string(),
        Value::String(format!(
            "{} {} {}",
            issued_on.day(),
            month,
            issued_on.year()
        )),
    );
    record.insert(
        "issueYear".to_string(),
        Value::String(issued_on.year().to_string()),
    );
    Value::Object(record)
}
