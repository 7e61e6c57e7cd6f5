use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use resvg::{tiny_skia, usvg};

use crate::error::RasterizationError;

/// A lossless bitmap rendering of vector markup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// PNG-encoded pixels
    pub png: Vec<u8>,
}

impl RasterImage {
    /// Decode the PNG back into pixels.
    ///
    /// # Errors
    ///
    /// Will return an error if the PNG can't be decoded. This shouldn't happen for images built by [rasterize].
    pub fn to_rgba(&self) -> Result<RgbaImage, RasterizationError> {
        let image = image::load_from_memory_with_format(&self.png, ImageFormat::Png)
            .map_err(|e| RasterizationError::Encode(e.to_string()))?;
        Ok(image.to_rgba8())
    }

    /// Re-encode as JPEG. Transparency is dropped.
    ///
    /// # Errors
    ///
    /// Will return an error if either decoding the PNG or encoding the JPEG fails.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, RasterizationError> {
        let rgb = image::DynamicImage::ImageRgba8(self.to_rgba()?).to_rgb8();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
            .write_image(rgb.as_raw(), self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| RasterizationError::Encode(e.to_string()))?;
        Ok(jpeg)
    }
}

/// Render `markup` onto a `pixel_size` x `pixel_size` surface and export it as PNG.
///
/// The markup's own size (its `viewBox` when it has no `width`/`height`) is stretched to
/// fill the surface.
///
/// # Errors
///
/// Will return a [RasterizationError] if the markup can't be parsed, declares an empty
/// viewport, if the surface can't be allocated, or if PNG encoding fails.
pub fn rasterize(markup: &str, pixel_size: u32) -> Result<RasterImage, RasterizationError> {
    let pixmap = render(markup, pixel_size)?;
    let (width, height) = (pixmap.width(), pixmap.height());

    // tiny-skia stores premultiplied alpha, PNG wants it straight
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| RasterizationError::Encode(e.to_string()))?;

    log::debug!("rasterized {}x{} ({} bytes)", width, height, png.len());
    Ok(RasterImage { width, height, png })
}

fn render(markup: &str, pixel_size: u32) -> Result<tiny_skia::Pixmap, RasterizationError> {
    let tree = usvg::Tree::from_str(markup, &usvg::Options::default())
        .map_err(|e| RasterizationError::Parse(e.to_string()))?;
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(RasterizationError::EmptyViewport);
    }

    let mut pixmap =
        tiny_skia::Pixmap::new(pixel_size, pixel_size).ok_or(RasterizationError::Surface {
            width: pixel_size,
            height: pixel_size,
        })?;
    let transform = tiny_skia::Transform::from_scale(
        pixel_size as f32 / size.width(),
        pixel_size as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}
