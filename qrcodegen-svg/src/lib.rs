//! Utility functions for drawing QR codes generated using `qrcodegen`
//! as SVG markup.
//!
//! The produced document only declares a `viewBox` whose side is the symbol
//! size plus twice the margin, one unit per module. Scaling to a pixel size
//! is left to whoever renders it.
use std::fmt::Write as _;

use qrcodegen::{QrCode, QrCodeEcc, QrSegment, Version};

pub use qrcodegen;

/// Failure to turn text into a QR symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Versions go from 1 to 40.
    #[error("Version must be between 1 and 40, not {0}")]
    InvalidVersion(u8),
    /// The payload doesn't fit the requested version and error correction level.
    #[error("{0}")]
    DataTooLong(String),
}

impl From<qrcodegen::DataTooLong> for EncodeError {
    fn from(e: qrcodegen::DataTooLong) -> Self {
        EncodeError::DataTooLong(e.to_string())
    }
}

/// How to encode and draw a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgOptions {
    /// `None` picks the smallest version that fits.
    pub version: Option<u8>,
    pub ecc: QrCodeEcc,
    /// Quiet zone width, in modules.
    pub margin: u32,
    /// Fill of dark modules. Written verbatim into the `fill` attribute.
    pub dark: String,
    /// Fill of the background. Written verbatim into the `fill` attribute.
    pub light: String,
}

impl Default for SvgOptions {
    fn default() -> Self {
        SvgOptions {
            version: None,
            ecc: QrCodeEcc::Medium,
            margin: 4,
            dark: "#000000".to_string(),
            light: "#FFFFFF".to_string(),
        }
    }
}

/// Encode `text` into a symbol following `options`.
///
/// The requested error correction level is never boosted, so the symbol
/// always carries the level that was asked for.
///
/// # Errors
///
/// Returns [`EncodeError::InvalidVersion`] for a version outside 1..=40 and
/// [`EncodeError::DataTooLong`] when `text` exceeds the capacity of the
/// allowed version range.
pub fn encode(text: &str, options: &SvgOptions) -> Result<QrCode, EncodeError> {
    let (min, max) = match options.version {
        Some(v) if (1..=40).contains(&v) => (Version::new(v), Version::new(v)),
        Some(v) => return Err(EncodeError::InvalidVersion(v)),
        None => (Version::MIN, Version::MAX),
    };
    let segments = QrSegment::make_segments(text);
    let qr = QrCode::encode_segments_advanced(&segments, options.ecc, min, max, None, false)?;
    Ok(qr)
}

/// Draw a QR code to SVG markup.
pub fn draw_svg(qr: &QrCode, margin: u32, dark: &str, light: &str) -> String {
    let size = qr.size();
    let border = margin as i32;
    let dimension = size + border * 2;

    let mut path = String::new();
    for y in 0..size {
        for x in 0..size {
            if qr.get_module(x, y) {
                if !path.is_empty() {
                    path.push(' ');
                }
                // Writing into a String can't fail
                let _ = write!(path, "M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }

    let mut svg = String::with_capacity(path.len() + 256);
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" shape-rendering=\"crispEdges\">",
        dimension
    );
    let _ = writeln!(
        svg,
        "<rect width=\"{0}\" height=\"{0}\" fill=\"{1}\"/>",
        dimension,
        escape(light)
    );
    let _ = writeln!(svg, "<path d=\"{}\" fill=\"{}\"/>", path, escape(dark));
    svg.push_str("</svg>\n");
    svg
}

/// Encode `text` and draw it in one go.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_svg(text: &str, options: &SvgOptions) -> Result<String, EncodeError> {
    let qr = encode(text, options)?;
    Ok(draw_svg(&qr, options.margin, &options.dark, &options.light))
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
