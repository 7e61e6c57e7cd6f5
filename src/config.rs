//! Rendering requests: what to encode, how large, in which colours, with which logo.
//!
//! A [QrConfig] is a plain value. Editing one means building a new one, either with the
//! `with_*` methods or by resolving a partial [QrOptions] against the defaults.
//!
//! # Examples
//!
//! ```
//! use qr_studio::{EcLevel, QrConfig, QrOptions};
//!
//! let config = QrConfig::new("https://example.com")
//!     .with_error_correction(EcLevel::H)
//!     .with_pixel_size(512);
//! assert!(config.validate().is_ok());
//!
//! let resolved = QrConfig::resolve(QrOptions {
//!     data: "https://example.com".to_string(),
//!     margin: Some(2),
//!     ..QrOptions::default()
//! });
//! assert_eq!(resolved.pixel_size, 300);
//! assert_eq!(resolved.margin, 2);
//! ```

use core::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use qrcodegen_svg::{qrcodegen::QrCodeEcc, SvgOptions};

#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

use crate::error::{CompositingError, ValidationError};

pub const DEFAULT_PIXEL_SIZE: u32 = 300;
pub const DEFAULT_MARGIN: u32 = 4;
pub const DEFAULT_COLOR_DARK: &str = "#000000";
pub const DEFAULT_COLOR_LIGHT: &str = "#FFFFFF";
pub const DEFAULT_LOGO_SIZE: u32 = 40;

pub const MIN_PIXEL_SIZE: u32 = 50;
pub const MAX_PIXEL_SIZE: u32 = 2000;
pub const MAX_MARGIN: u32 = 20;
/// Raw logo images larger than this are refused.
pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;

/// Error correction level, from the least to the most redundant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub enum EcLevel {
    /// Recovers about 7% of the symbol
    L,
    /// Recovers about 15% of the symbol
    #[default]
    M,
    /// Recovers about 25% of the symbol
    Q,
    /// Recovers about 30% of the symbol
    H,
}

impl EcLevel {
    /// Share of the symbol, in percent, that can be damaged and still decode.
    pub fn recovery_percent(&self) -> u8 {
        match self {
            EcLevel::L => 7,
            EcLevel::M => 15,
            EcLevel::Q => 25,
            EcLevel::H => 30,
        }
    }

    pub(crate) fn to_qrcodegen(self) -> QrCodeEcc {
        match self {
            EcLevel::L => QrCodeEcc::Low,
            EcLevel::M => QrCodeEcc::Medium,
            EcLevel::Q => QrCodeEcc::Quartile,
            EcLevel::H => QrCodeEcc::High,
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcLevel::L => f.write_str("L"),
            EcLevel::M => f.write_str("M"),
            EcLevel::Q => f.write_str("Q"),
            EcLevel::H => f.write_str("H"),
        }
    }
}

impl FromStr for EcLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::L),
            "M" => Ok(EcLevel::M),
            "Q" => Ok(EcLevel::Q),
            "H" => Ok(EcLevel::H),
            _ => Err("Error correction must be one of: L, M, Q, H".to_string()),
        }
    }
}

/// Symbol version. `Auto` lets the encoder pick the smallest one the payload fits in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum QrVersion {
    #[default]
    Auto,
    Fixed(u8),
}

impl QrVersion {
    /// `None` stands for "auto".
    pub fn resolve(&self) -> Option<u8> {
        match self {
            QrVersion::Auto => None,
            QrVersion::Fixed(v) => Some(*v),
        }
    }
}

impl fmt::Display for QrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrVersion::Auto => f.write_str("auto"),
            QrVersion::Fixed(v) => write!(f, "{}", v),
        }
    }
}

// Written as `"auto"` or a bare number.
#[cfg(feature = "serde_support")]
impl Serialize for QrVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QrVersion::Auto => serializer.serialize_str("auto"),
            QrVersion::Fixed(v) => serializer.serialize_u8(*v),
        }
    }
}

#[cfg(feature = "serde_support")]
impl<'de> Deserialize<'de> for QrVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u8),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(QrVersion::Fixed(v)),
            Repr::Text(s) if s == "auto" => Ok(QrVersion::Auto),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "Version must be \"auto\" or a number, not \"{}\"",
                s
            ))),
        }
    }
}

/// Where the logo image comes from.
///
/// Serialized as the data URI [LogoSource::to_href] builds, and read back as [LogoSource::DataUri].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LogoSource {
    /// Encoded image file contents (PNG, JPEG, GIF, WebP...).
    Bytes(Vec<u8>),
    /// A `data:image/...` URI, embedded as is.
    DataUri(String),
}

impl LogoSource {
    /// Reference to embed in an `<image href="...">` attribute.
    ///
    /// # Errors
    ///
    /// Will return an error if raw bytes aren't a recognised image, or if the data URI isn't an image one.
    pub fn to_href(&self) -> Result<String, CompositingError> {
        match self {
            LogoSource::Bytes(bytes) => {
                let mime = image_mime(bytes).ok_or_else(|| {
                    CompositingError::UnsupportedLogo("unknown image format".to_string())
                })?;
                Ok(format!(
                    "data:{};base64,{}",
                    mime,
                    general_purpose::STANDARD.encode(bytes)
                ))
            }
            LogoSource::DataUri(uri) => {
                if uri.starts_with("data:image/") {
                    Ok(uri.clone())
                } else {
                    Err(CompositingError::UnsupportedLogo(
                        "expected a data:image/ URI".to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(feature = "serde_support")]
impl Serialize for LogoSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let href = self.to_href().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&href)
    }
}

#[cfg(feature = "serde_support")]
impl<'de> Deserialize<'de> for LogoSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(LogoSource::DataUri(String::deserialize(deserializer)?))
    }
}

fn image_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::Gif => Some("image/gif"),
        image::ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Logo drawn in the centre of the symbol.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Logo {
    pub source: LogoSource,
    /// Diameter in the same pixel space as [QrConfig::pixel_size]
    pub display_size: u32,
}

impl Logo {
    pub fn new(source: LogoSource) -> Logo {
        Logo {
            source,
            display_size: DEFAULT_LOGO_SIZE,
        }
    }
}

/// A fully resolved rendering request.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct QrConfig {
    /// Payload to encode. Must not be blank.
    pub data: String,
    pub error_correction: EcLevel,
    pub version: QrVersion,
    /// Width and height of the raster image, between 50 and 2000
    pub pixel_size: u32,
    /// Quiet zone width in modules, between 0 and 20
    pub margin: u32,
    /// Any CSS colour
    pub color_dark: String,
    /// Any CSS colour
    pub color_light: String,
    pub logo: Option<Logo>,
}

impl QrConfig {
    /// A config for `data` with every other field at its default.
    pub fn new(data: impl Into<String>) -> QrConfig {
        QrConfig {
            data: data.into(),
            error_correction: EcLevel::default(),
            version: QrVersion::Auto,
            pixel_size: DEFAULT_PIXEL_SIZE,
            margin: DEFAULT_MARGIN,
            color_dark: DEFAULT_COLOR_DARK.to_string(),
            color_light: DEFAULT_COLOR_LIGHT.to_string(),
            logo: None,
        }
    }

    /// Fill every unset field of `options` with its default.
    pub fn resolve(options: QrOptions) -> QrConfig {
        let logo = options.logo.and_then(|logo| {
            logo.source.map(|source| Logo {
                source,
                display_size: logo.size.unwrap_or(DEFAULT_LOGO_SIZE),
            })
        });
        QrConfig {
            data: options.data,
            error_correction: options.error_correction.unwrap_or_default(),
            version: options.version.unwrap_or_default(),
            pixel_size: options.pixel_size.unwrap_or(DEFAULT_PIXEL_SIZE),
            margin: options.margin.unwrap_or(DEFAULT_MARGIN),
            color_dark: options
                .color_dark
                .unwrap_or_else(|| DEFAULT_COLOR_DARK.to_string()),
            color_light: options
                .color_light
                .unwrap_or_else(|| DEFAULT_COLOR_LIGHT.to_string()),
            logo,
        }
    }

    pub fn with_data(self, data: impl Into<String>) -> QrConfig {
        QrConfig {
            data: data.into(),
            ..self
        }
    }

    pub fn with_error_correction(self, error_correction: EcLevel) -> QrConfig {
        QrConfig {
            error_correction,
            ..self
        }
    }

    pub fn with_version(self, version: QrVersion) -> QrConfig {
        QrConfig { version, ..self }
    }

    pub fn with_pixel_size(self, pixel_size: u32) -> QrConfig {
        QrConfig { pixel_size, ..self }
    }

    pub fn with_margin(self, margin: u32) -> QrConfig {
        QrConfig { margin, ..self }
    }

    pub fn with_colors(self, dark: impl Into<String>, light: impl Into<String>) -> QrConfig {
        QrConfig {
            color_dark: dark.into(),
            color_light: light.into(),
            ..self
        }
    }

    pub fn with_logo(self, logo: Option<Logo>) -> QrConfig {
        QrConfig { logo, ..self }
    }

    /// Run every field check and report all violations together.
    ///
    /// # Errors
    ///
    /// Will return a [ValidationError] listing, in field order, each check that failed
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.data.trim().is_empty() {
            errors.push("Data must be a non-empty string".to_string());
        }
        if let QrVersion::Fixed(v) = self.version {
            if !(1..=40).contains(&v) {
                errors.push("Version must be \"auto\" or a number between 1 and 40".to_string());
            }
        }
        if !(MIN_PIXEL_SIZE..=MAX_PIXEL_SIZE).contains(&self.pixel_size) {
            errors.push(format!(
                "Size must be a number between {} and {}",
                MIN_PIXEL_SIZE, MAX_PIXEL_SIZE
            ));
        }
        if self.margin > MAX_MARGIN {
            errors.push(format!("Margin must be a number between 0 and {}", MAX_MARGIN));
        }
        if !is_valid_color(&self.color_dark) {
            errors.push("Color dark must be a valid color".to_string());
        }
        if !is_valid_color(&self.color_light) {
            errors.push("Color light must be a valid color".to_string());
        }
        if let Some(logo) = &self.logo {
            validate_logo(logo, self.pixel_size, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }

    pub(crate) fn svg_options(&self) -> SvgOptions {
        SvgOptions {
            version: self.version.resolve(),
            ecc: self.error_correction.to_qrcodegen(),
            margin: self.margin,
            dark: self.color_dark.clone(),
            light: self.color_light.clone(),
        }
    }
}

fn validate_logo(logo: &Logo, pixel_size: u32, errors: &mut Vec<String>) {
    match &logo.source {
        LogoSource::Bytes(bytes) => {
            if bytes.len() > MAX_LOGO_BYTES {
                errors.push("Logo must be smaller than 5 MB".to_string());
            } else if image_mime(bytes).is_none() {
                errors.push("Logo must be a PNG, JPEG, GIF or WebP image".to_string());
            }
        }
        LogoSource::DataUri(uri) => {
            if !uri.starts_with("data:image/") {
                errors.push("Logo must be a data:image/ URI".to_string());
            }
        }
    }
    if logo.display_size == 0 || logo.display_size > pixel_size {
        errors.push(format!(
            "Logo size must be a number between 1 and {}",
            pixel_size
        ));
    }
}

/// Whether `color` is a CSS colour the renderer understands.
pub fn is_valid_color(color: &str) -> bool {
    !color.trim().is_empty() && svgtypes::Color::from_str(color.trim()).is_ok()
}

/// Partial logo settings, as a user edits them.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_support", serde(default, rename_all = "camelCase"))]
pub struct LogoOptions {
    #[cfg_attr(
        feature = "serde_support",
        serde(rename = "src", skip_serializing_if = "Option::is_none")
    )]
    pub source: Option<LogoSource>,
    #[cfg_attr(feature = "serde_support", serde(skip_serializing_if = "Option::is_none"))]
    pub size: Option<u32>,
}

/// Partial user configuration. Unset fields take their default in [QrConfig::resolve].
///
/// Serialized with the field names of the history file format: `errorCorrection`, `size`,
/// `colorDark`, `colorLight` and `logo.src`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_support", serde(default, rename_all = "camelCase"))]
pub struct QrOptions {
    pub data: String,
    #[cfg_attr(feature = "serde_support", serde(skip_serializing_if = "Option::is_none"))]
    pub version: Option<QrVersion>,
    #[cfg_attr(feature = "serde_support", serde(skip_serializing_if = "Option::is_none"))]
    pub error_correction: Option<EcLevel>,
    #[cfg_attr(
        feature = "serde_support",
        serde(rename = "size", skip_serializing_if = "Option::is_none")
    )]
    pub pixel_size: Option<u32>,
    #[cfg_attr(feature = "serde_support", serde(skip_serializing_if = "Option::is_none"))]
    pub margin: Option<u32>,
    #[cfg_attr(feature = "serde_support", serde(skip_serializing_if = "Option::is_none"))]
    pub color_dark: Option<String>,
    #[cfg_attr(feature = "serde_support", serde(skip_serializing_if = "Option::is_none"))]
    pub color_light: Option<String>,
    #[cfg_attr(feature = "serde_support", serde(skip_serializing_if = "Option::is_none"))]
    pub logo: Option<LogoOptions>,
}

impl QrOptions {
    /// Layer `other` on top of `self`: every field set in `other` wins.
    pub fn merge(self, other: QrOptions) -> QrOptions {
        QrOptions {
            data: if other.data.is_empty() {
                self.data
            } else {
                other.data
            },
            version: other.version.or(self.version),
            error_correction: other.error_correction.or(self.error_correction),
            pixel_size: other.pixel_size.or(self.pixel_size),
            margin: other.margin.or(self.margin),
            color_dark: other.color_dark.or(self.color_dark),
            color_light: other.color_light.or(self.color_light),
            logo: other.logo.or(self.logo),
        }
    }
}

impl From<&QrConfig> for QrOptions {
    fn from(config: &QrConfig) -> Self {
        QrOptions {
            data: config.data.clone(),
            version: Some(config.version),
            error_correction: Some(config.error_correction),
            pixel_size: Some(config.pixel_size),
            margin: Some(config.margin),
            color_dark: Some(config.color_dark.clone()),
            color_light: Some(config.color_light.clone()),
            logo: config.logo.as_ref().map(|logo| LogoOptions {
                source: Some(logo.source.clone()),
                size: Some(logo.display_size),
            }),
        }
    }
}

/// Ready-made starting points for common payloads.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Preset {
    Url,
    Text,
    Wifi,
    VCard,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Url, Preset::Text, Preset::Wifi, Preset::VCard];

    /// Payload and encoding settings of the preset. Layer them with [QrOptions::merge].
    pub fn options(&self) -> QrOptions {
        let data = match self {
            Preset::Url => "https://example.com",
            Preset::Text => "Hello, World!",
            Preset::Wifi => "WIFI:T:WPA;S:MyNetwork;P:MyPassword;;",
            Preset::VCard => "BEGIN:VCARD\nVERSION:3.0\nFN:John Doe\nTEL:+1234567890\nEMAIL:john@example.com\nEND:VCARD",
        };
        QrOptions {
            data: data.to_string(),
            version: Some(QrVersion::Auto),
            error_correction: Some(EcLevel::M),
            ..QrOptions::default()
        }
    }
}
