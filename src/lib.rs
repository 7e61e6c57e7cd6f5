//! This library renders customised QR codes as matching SVG markup and PNG images, with your own colours, quiet zone, symbol version and error correction level, and an optional logo placed in the centre. It can also read codes back from images and keep a local history of what was made and scanned.
//!
//! Be aware that a logo hides part of the symbol. Keep it small and pick a higher
//! error correction level (`Q` or `H`) when you use one.
//!
//! # Examples
//!
//! ```rust
//! use qr_studio::{generate, EcLevel, QrConfig};
//!
//! let config = QrConfig::new("https://example.com")
//!     .with_error_correction(EcLevel::Q)
//!     .with_pixel_size(512)
//!     .with_colors("#1a1a2e", "#ffffff");
//! let artifact = generate(&config).unwrap();
//! assert_eq!(artifact.raster_image.width, 512);
//! println!("{}", artifact.vector_markup);
//! ```
//!
//! ```rust
//! # #[cfg(feature = "scan")] {
//! use qr_studio::{classify, decode, generate, ImageSource, PayloadKind, QrConfig};
//!
//! let artifact = generate(&QrConfig::new("WIFI:T:WPA;S:MyNetwork;P:MyPassword;;")).unwrap();
//! let scanned = decode(ImageSource::Bytes(artifact.raster_image.png)).unwrap();
//! assert_eq!(classify(&scanned.payload).kind, PayloadKind::Wifi);
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod classify;
mod compose;
mod config;
mod error;
mod export;
mod logo;
mod raster;
mod vector;

#[cfg(feature = "history")]
#[cfg_attr(docsrs, doc(cfg(feature = "history")))]
pub mod history;
#[cfg(feature = "scan")]
mod scan;

pub use classify::{classify, Classification, PayloadKind};
pub use compose::{generate, QrArtifact};
pub use config::{
    is_valid_color, EcLevel, Logo, LogoOptions, LogoSource, Preset, QrConfig, QrOptions,
    QrVersion, DEFAULT_COLOR_DARK, DEFAULT_COLOR_LIGHT, DEFAULT_LOGO_SIZE, DEFAULT_MARGIN,
    DEFAULT_PIXEL_SIZE, MAX_LOGO_BYTES, MAX_MARGIN, MAX_PIXEL_SIZE, MIN_PIXEL_SIZE,
};
pub use error::{
    CompositingError, DecodeError, EncodingError, ExportError, GenerateError,
    RasterizationError, ValidationError,
};
pub use export::{
    artifact_filename, filename, format_file_size, history_filename, save_artifact,
    save_history, ExportFormat, JPEG_QUALITY,
};
pub use logo::{
    composite_logo, try_composite_logo, Element, LogoPlacement, SvgDocument, ViewBox,
    LOGO_PADDING_PX,
};
pub use raster::{rasterize, RasterImage};
pub use vector::render_vector;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use compose::generate_async;
#[cfg(feature = "history")]
pub use error::HistoryError;
#[cfg(feature = "scan")]
#[cfg_attr(docsrs, doc(cfg(feature = "scan")))]
pub use scan::{decode, ImageSource, ScanResult, MAX_SCAN_DIMENSION};

pub use qrcodegen_svg;

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Milliseconds since the unix epoch, or 0 if the clock is set before it.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// `len` random characters from `[0-9a-z]`.
pub(crate) fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}
