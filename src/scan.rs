//! Recover payloads from images of QR symbols.
//!
//! ```rust
//! use qr_studio::{decode, generate, ImageSource, QrConfig};
//!
//! let artifact = generate(&QrConfig::new("hello")).unwrap();
//! let result = decode(ImageSource::Bytes(artifact.raster_image.png)).unwrap();
//! assert_eq!(result.payload, "hello");
//! ```

use std::path::PathBuf;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::error::DecodeError;

/// Images wider or taller than this are shrunk before detection.
pub const MAX_SCAN_DIMENSION: u32 = 1024;

/// Something that may contain a QR symbol.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ImageSource {
    /// An image file on disk
    File(PathBuf),
    /// Encoded image contents (PNG, JPEG, WebP)
    Bytes(Vec<u8>),
    /// Raw RGBA pixels, as captured from a camera frame
    Frame {
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },
}

/// A decoded payload.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ScanResult {
    pub payload: String,
    /// File name of the source, when there is one
    pub source_label: Option<String>,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

/// Find a QR symbol in `source` and decode it.
///
/// Only the payload is returned; it isn't interpreted. See [classify](fn@crate::classify) for that.
///
/// # Errors
///
/// Will return [DecodeError::File] or [DecodeError::Image] if the source can't be read,
/// [DecodeError::NotFound] if no symbol is detected, and [DecodeError::Symbol] with the
/// decoder's message if symbols were found but none could be decoded.
pub fn decode(source: ImageSource) -> Result<ScanResult, DecodeError> {
    let (image, source_label) = load(source)?;
    let image = fit(image);
    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            luma.get_pixel(x as u32, y as u32).0[0]
        });
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Err(DecodeError::NotFound);
    }

    let mut last_error = DecodeError::NotFound;
    for grid in grids {
        match grid.decode() {
            Ok((meta, payload)) => {
                log::debug!(
                    "decoded {} bytes from a {}x{} image ({:?})",
                    payload.len(),
                    width,
                    height,
                    meta
                );
                return Ok(ScanResult {
                    payload,
                    source_label,
                    timestamp: crate::unix_millis(),
                });
            }
            Err(e) => last_error = symbol_error(&e),
        }
    }
    Err(last_error)
}

fn symbol_error(e: &rqrr::DeQRError) -> DecodeError {
    DecodeError::Symbol(e.to_string())
}

fn load(source: ImageSource) -> Result<(DynamicImage, Option<String>), DecodeError> {
    match source {
        ImageSource::File(path) => {
            let bytes = std::fs::read(&path).map_err(|e| DecodeError::File {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let label = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            Ok((from_bytes(&bytes)?, label))
        }
        ImageSource::Bytes(bytes) => Ok((from_bytes(&bytes)?, None)),
        ImageSource::Frame {
            width,
            height,
            rgba,
        } => {
            let len = rgba.len();
            let frame = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
                DecodeError::Image(format!(
                    "a {}x{} frame needs {} bytes, got {}",
                    width,
                    height,
                    width as usize * height as usize * 4,
                    len
                ))
            })?;
            Ok((DynamicImage::ImageRgba8(frame), None))
        }
    }
}

fn from_bytes(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    image::load_from_memory(bytes).map_err(|e| DecodeError::Image(e.to_string()))
}

fn fit(image: DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= MAX_SCAN_DIMENSION && height <= MAX_SCAN_DIMENSION {
        return image;
    }
    // resize keeps the aspect ratio
    image.resize(MAX_SCAN_DIMENSION, MAX_SCAN_DIMENSION, FilterType::Triangle)
}
