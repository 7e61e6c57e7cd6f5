use core::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::compose::QrArtifact;
use crate::error::ExportError;

/// Quality used for JPEG exports.
pub const JPEG_QUALITY: u8 = 90;

/// File format an artifact can be saved as.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde_support", serde(rename_all = "lowercase"))]
pub enum ExportFormat {
    Png,
    Svg,
    Jpg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Jpg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Jpg => "image/jpeg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            other => Err(format!("Unsupported export format: {}", other)),
        }
    }
}

/// `<base>-<timestamp>.<extension>`
pub fn filename(base: &str, format: ExportFormat, timestamp: u64) -> String {
    format!("{}-{}.{}", base, timestamp, format.extension())
}

pub fn artifact_filename(format: ExportFormat, timestamp: u64) -> String {
    filename("qr-code", format, timestamp)
}

pub fn history_filename(timestamp: u64) -> String {
    format!("qr-history-{}.json", timestamp)
}

/// Human readable size, with at most two decimals: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rounded, UNITS[unit])
}

impl QrArtifact {
    /// File contents of the artifact in `format`.
    ///
    /// # Errors
    ///
    /// Will return an error if the raster can't be re-encoded as JPEG.
    pub fn encode(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        Ok(match format {
            ExportFormat::Png => self.raster_image.png.clone(),
            ExportFormat::Svg => self.vector_markup.as_bytes().to_vec(),
            ExportFormat::Jpg => self.raster_image.to_jpeg(JPEG_QUALITY)?,
        })
    }

    /// The vector markup as a `data:image/svg+xml` URI, ready for an `<img src>`.
    pub fn svg_data_uri(&self) -> String {
        format!(
            "data:image/svg+xml;charset=utf-8,{}",
            urlencoding::encode(&self.vector_markup)
        )
    }
}

/// Write `artifact` into `dir` as `qr-code-<timestamp>.<extension>`.
///
/// # Errors
///
/// Will return an error if the file can't be written, or if JPEG encoding fails.
pub fn save_artifact(
    dir: &Path,
    artifact: &QrArtifact,
    format: ExportFormat,
    timestamp: u64,
) -> Result<PathBuf, ExportError> {
    let contents = artifact.encode(format)?;
    let path = dir.join(artifact_filename(format, timestamp));
    std::fs::write(&path, &contents)?;
    log::info!(
        "saved {} ({})",
        path.display(),
        format_file_size(contents.len() as u64)
    );
    Ok(path)
}

/// Write exported history JSON into `dir` as `qr-history-<timestamp>.json`.
///
/// # Errors
///
/// Will return an error if the file can't be written.
pub fn save_history(dir: &Path, json: &str, timestamp: u64) -> Result<PathBuf, ExportError> {
    let path = dir.join(history_filename(timestamp));
    std::fs::write(&path, json)?;
    log::info!("saved {}", path.display());
    Ok(path)
}
