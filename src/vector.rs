use crate::config::QrConfig;
use crate::error::EncodingError;

/// Encode `config.data` into SVG markup.
///
/// The markup is sized by its own `viewBox`, one unit per module including the margin,
/// which has nothing to do with [QrConfig::pixel_size].
///
/// # Errors
///
/// Will return an [EncodingError] when the payload doesn't fit the requested version and
/// error correction level, or when no version up to 40 can hold it.
pub fn render_vector(config: &QrConfig) -> Result<String, EncodingError> {
    let options = config.svg_options();
    let qr = qrcodegen_svg::encode(&config.data, &options)?;
    log::debug!(
        "encoded {} bytes as version {} ({}x{} modules, ecc {})",
        config.data.len(),
        qr.version().value(),
        qr.size(),
        qr.size(),
        config.error_correction
    );
    Ok(qrcodegen_svg::draw_svg(
        &qr,
        options.margin,
        &options.dark,
        &options.light,
    ))
}
