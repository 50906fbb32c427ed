//! Image XObject construction for background and field images.
//!
//! JPEG files pass straight through as DCTDecode streams; everything else
//! the `image` crate can decode (PNG in practice, including the generated
//! QR) is flattened to raw RGB8 samples and left for the document-level
//! compression pass.

use std::fs;
use std::path::Path;

use image::GenericImageView;
use lopdf::{dictionary, Stream};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read image file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Pixel size of a prepared XObject, needed by callers that scale to fit.
pub struct ImageXObject {
    pub stream: Stream,
    pub width: u32,
    pub height: u32,
}

/// Build an image XObject from a file on disk.
pub fn image_xobject(path: &Path) -> Result<ImageXObject, AssetError> {
    let is_jpeg = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg")
    );
    if is_jpeg {
        jpeg_xobject(path)
    } else {
        raster_xobject(path)
    }
}

/// JPEG bytes embed as-is; the PDF viewer decodes them.
fn jpeg_xobject(path: &Path) -> Result<ImageXObject, AssetError> {
    let bytes = fs::read(path).map_err(AssetError::Read)?;
    let (width, height) = image::image_dimensions(path)?;
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes,
    );
    Ok(ImageXObject {
        stream,
        width,
        height,
    })
}

/// Decode to RGB8 and embed raw samples. Alpha is dropped; certificate
/// backgrounds and QR images are opaque.
fn raster_xobject(path: &Path) -> Result<ImageXObject, AssetError> {
    let decoded = image::open(path)?;
    let (width, height) = decoded.dimensions();
    let rgb = decoded.to_rgb8();
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    );
    Ok(ImageXObject {
        stream,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_png_xobject_dimensions_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        RgbImage::from_pixel(4, 3, Rgb([10, 20, 30])).save(&path).unwrap();

        let xobject = image_xobject(&path).unwrap();
        assert_eq!(xobject.width, 4);
        assert_eq!(xobject.height, 3);
        assert_eq!(xobject.stream.content.len(), 4 * 3 * 3);
        assert!(!xobject.stream.dict.has(b"Filter"));
    }

    #[test]
    fn test_jpeg_passthrough_keeps_dct_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(8, 8, Rgb([200, 100, 50])).save(&path).unwrap();

        let xobject = image_xobject(&path).unwrap();
        assert_eq!(xobject.width, 8);
        assert_eq!(xobject.height, 8);
        let filter = xobject.stream.dict.get(b"Filter").unwrap();
        assert_eq!(filter.as_name_str().unwrap(), "DCTDecode");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        assert!(matches!(
            image_xobject(Path::new("/nonexistent/asset.png")),
            Err(AssetError::Read(_)) | Err(AssetError::Decode(_))
        ));
    }
}
