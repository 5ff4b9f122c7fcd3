//! Barcode extraction from image files.

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use crate::types::{Barcode, DecodedBarcode};

/// Errors raised while reading an image or decoding a barcode from it.
#[derive(Error, Debug)]
pub enum BarcodeError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("No barcode found in {path}")]
    NotFound { path: String },
}

impl BarcodeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BarcodeError::NotFound { .. })
    }
}

/// Convenience result type.
pub type BarcodeResult<T> = Result<T, BarcodeError>;

/// Something that can find and decode a 1D/2D barcode in an image.
pub trait BarcodeDecoder: Send + Sync {
    /// Decode the first barcode found in `img`.
    ///
    /// `origin` names the image in errors and logs.
    fn decode(&self, img: &DynamicImage, origin: &str) -> BarcodeResult<DecodedBarcode>;
}

/// Multi-format decoder backed by rxing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RxingDecoder;

impl BarcodeDecoder for RxingDecoder {
    fn decode(&self, img: &DynamicImage, origin: &str) -> BarcodeResult<DecodedBarcode> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(BarcodeError::NotFound {
                path: origin.to_string(),
            });
        }

        let luma = img.to_luma8().into_raw();
        let result = rxing::helpers::detect_in_luma(luma, width, height, None).map_err(|e| {
            tracing::debug!(path = origin, "rxing found nothing: {e}");
            BarcodeError::NotFound {
                path: origin.to_string(),
            }
        })?;

        let barcode = Barcode::new(result.getText()).ok_or_else(|| BarcodeError::NotFound {
            path: origin.to_string(),
        })?;

        Ok(DecodedBarcode {
            barcode,
            format: result.getBarcodeFormat().to_string(),
        })
    }
}

/// Load an image from a file path, rejecting non-raster extensions up front.
pub fn load_image(path: &Path) -> BarcodeResult<DynamicImage> {
    let display = path.display().to_string();
    if !is_supported_format(&display) {
        return Err(BarcodeError::UnsupportedFormat(display));
    }
    Ok(image::open(path)?)
}

/// Load `path` and decode the barcode it contains.
pub fn scan_file(decoder: &dyn BarcodeDecoder, path: &Path) -> BarcodeResult<DecodedBarcode> {
    let img = load_image(path)?;
    let origin = path.display().to_string();
    let decoded = decoder.decode(&img, &origin)?;
    tracing::info!(
        path = %origin,
        barcode = %decoded.barcode,
        format = %decoded.format,
        "found barcode"
    );
    Ok(decoded)
}

/// Check if a file path points to a supported image format.
pub fn is_supported_format(path: &str) -> bool {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    matches!(
        ext.as_str(),
        "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp" | "tiff" | "tif"
    )
}
