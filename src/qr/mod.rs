//! Verification QR artifacts.
//!
//! Every issued document can carry a QR code pointing at the public
//! verification URL for its code. The PNG lives at a deterministic path
//! keyed by the document identifier, so re-issuing a document overwrites
//! the previous image instead of accumulating files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::Luma;
use qrcode::QrCode;
use thiserror::Error;

use crate::render::sanitize_certificate_id;

/// Output size of the QR PNG in pixels.
pub const QR_SIZE: u32 = 300;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to create QR output directory: {0}")]
    CreateDir(#[source] std::io::Error),
    #[error("failed to encode QR data: {0}")]
    Encode(#[source] qrcode::types::QrError),
    #[error("failed to write QR image: {0}")]
    Write(#[source] image::ImageError),
}

/// Generate a 300x300 black-on-white QR PNG for a verification URL.
///
/// The path is `{output_dir}/qr-{sanitized id}.png`; repeated calls for the
/// same id overwrite the file.
pub fn generate_qr(url: &str, id: &str, output_dir: &Path) -> Result<PathBuf, QrError> {
    fs::create_dir_all(output_dir).map_err(QrError::CreateDir)?;
    let safe_id = sanitize_certificate_id(id, "document");
    let path = output_dir.join(format!("qr-{safe_id}.png"));

    let code = QrCode::new(url.as_bytes()).map_err(QrError::Encode)?;
    let rendered = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(QR_SIZE, QR_SIZE)
        .build();
    // The module grid rarely lands on the target size exactly; snap to it.
    let exact = if rendered.dimensions() == (QR_SIZE, QR_SIZE) {
        rendered
    } else {
        imageops::resize(&rendered, QR_SIZE, QR_SIZE, FilterType::Nearest)
    };
    exact.save(&path).map_err(QrError::Write)?;

    log::info!("wrote verification QR for '{id}' at {}", path.display());
    Ok(path)
}

/// Where verification links point.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Apex domain serving the public verify pages.
    pub base_domain: String,
    /// Production links use https, everything else http.
    pub production: bool,
}

impl VerificationConfig {
    /// Read `VERIFY_BASE_DOMAIN` and `APP_ENV` from the environment,
    /// loading a `.env` file first when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_domain =
            env::var("VERIFY_BASE_DOMAIN").unwrap_or_else(|_| "certmint.local".to_string());
        let production = env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        VerificationConfig {
            base_domain,
            production,
        }
    }

    /// Compose the public verification URL for an opaque code, on the
    /// university's subdomain when it has one.
    pub fn build_verification_url(&self, code: &str, subdomain: Option<&str>) -> String {
        let protocol = if self.production { "https" } else { "http" };
        match subdomain.filter(|s| !s.is_empty()) {
            Some(sub) => format!("{protocol}://{sub}.{}/verify/{code}", self.base_domain),
            None => format!("{protocol}://{}/verify/{code}", self.base_domain),
        }
    }
}
