//! PNG export format
//!
//! Encodes surfaces with the `image` crate. Surfaces with an alpha channel
//! hold premultiplied color and are converted to straight alpha first.

use image::{ImageBuffer, ImageEncoder, RgbaImage};
use swraster_core::{ExportError, Exporter, RasterError, Result, Surface};

/// Encode `surface` as an RGBA PNG.
pub fn encode_surface_to_png(surface: &Surface<'_>) -> Result<Vec<u8>> {
    let pixels = surface.pixels().ok_or(RasterError::NotAllocated)?;
    let format = surface.pixel_format();
    let (width, height) = surface.dimensions();
    if width <= 0 || height <= 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }

    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let mut c = format.read_color(&pixels[surface.offset_of(x, y)..]);
            if format.has_alpha() {
                c = c.unpremultiplied();
            }
            rgba.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    let img: RgbaImage = ImageBuffer::from_raw(width as u32, height as u32, rgba).ok_or_else(|| {
        ExportError::EncodingFailed("Failed to create image buffer from surface".into())
    })?;

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new_with_quality(
        &mut png_data,
        image::codecs::png::CompressionType::Default,
        image::codecs::png::FilterType::Sub,
    );
    encoder
        .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgba8)
        .map_err(|e| ExportError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

    Ok(png_data)
}

/// PNG exporter for surfaces
///
/// ```
/// use swraster_core::Exporter;
/// use swraster_export::PngExporter;
///
/// assert_eq!(PngExporter::new().mime_type(), "image/png");
/// ```
pub struct PngExporter;

impl PngExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for PngExporter {
    fn name(&self) -> &'static str {
        "png"
    }

    fn export(&self, surface: &Surface<'_>) -> Result<Vec<u8>> {
        encode_surface_to_png(surface)
    }

    fn extension(&self) -> &'static str {
        "png"
    }

    fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

impl Default for PngExporter {
    fn default() -> Self {
        Self::new()
    }
}
