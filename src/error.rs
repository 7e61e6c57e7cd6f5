use thiserror::Error;

/// A configuration failed one or more field checks.
///
/// Every violation is listed, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid QR configuration: {}", .errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// The encoder refused the payload for the requested version and error correction level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to generate QR code: {0}")]
pub struct EncodingError(#[from] pub qrcodegen_svg::EncodeError);

/// Markup didn't have the structure needed to place a logo.
///
/// [compose::generate](crate::generate) never returns this: the logo is skipped
/// and the plain symbol is used instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositingError {
    #[error("No <svg> root element found")]
    MissingRoot,
    #[error("The <svg> root element has no viewBox")]
    MissingViewBox,
    #[error("Could not parse viewBox \"{0}\"")]
    InvalidViewBox(String),
    #[error("No closing </svg> tag found")]
    MissingClosingTag,
    #[error("Target pixel size must be positive")]
    ZeroPixelSize,
    #[error("Logo is not a recognised image: {0}")]
    UnsupportedLogo(String),
}

/// Vector markup could not be turned into pixels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterizationError {
    #[error("Could not load SVG: {0}")]
    Parse(String),
    #[error("SVG has an empty viewport")]
    EmptyViewport,
    #[error("Could not create a {width}x{height} surface")]
    Surface { width: u32, height: u32 },
    #[error("Could not encode image: {0}")]
    Encode(String),
    #[error("Rendering task failed: {0}")]
    Task(String),
}

/// No payload could be recovered from an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Failed to read \"{path}\": {message}")]
    File { path: String, message: String },
    #[error("Failed to load image: {0}")]
    Image(String),
    #[error("No QR code found")]
    NotFound,
    #[error("Failed to decode QR code: {0}")]
    Symbol(String),
}

/// Outcome of a failed [generate](crate::generate) call. Nothing is returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Rasterization(#[from] RasterizationError),
    #[error("Generation was cancelled")]
    Cancelled,
}

/// An artifact couldn't be written to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rasterization(#[from] RasterizationError),
}

/// The history store couldn't be read or written.
#[cfg(feature = "history")]
#[cfg_attr(docsrs, doc(cfg(feature = "history")))]
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History storage failed: {0}")]
    Storage(#[from] std::io::Error),
    #[error("History data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
