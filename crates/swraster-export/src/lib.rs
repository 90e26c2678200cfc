// this_file: crates/swraster-export/src/lib.rs

//! Export module for swraster
//!
//! Surfaces can be written as plain-text PNM (handy for eyeballing a
//! frame while debugging) or as PNG.

use std::io::Write;
use std::path::Path;

use swraster_core::{Color, Exporter, RasterError, Result, Surface};

pub mod png;

pub use png::{encode_surface_to_png, PngExporter};

/// PNM (Portable Any Map) exporter, ASCII variants only
pub struct PnmExporter {
    format: PnmFormat,
    alpha_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnmFormat {
    /// PGM - Portable Graymap (`P2`)
    Pgm,
    /// PPM - Portable Pixmap (`P3`)
    Ppm,
}

impl PnmExporter {
    pub fn new(format: PnmFormat) -> Self {
        Self {
            format,
            alpha_only: false,
        }
    }

    /// Create a PPM (color) exporter
    pub fn ppm() -> Self {
        Self::new(PnmFormat::Ppm)
    }

    /// Create a PGM (grayscale) exporter
    pub fn pgm() -> Self {
        Self::new(PnmFormat::Pgm)
    }

    /// Write each pixel's alpha instead of its color.
    pub fn alpha_only(mut self, alpha_only: bool) -> Self {
        self.alpha_only = alpha_only;
        self
    }

    /// Encode `surface`, with an optional `#` comment line after the magic.
    ///
    /// Channel values are written as stored, so premultiplied surfaces
    /// come out premultiplied.
    pub fn export_surface(&self, surface: &Surface<'_>, comment: Option<&str>) -> Result<Vec<u8>> {
        let pixels = surface.pixels().ok_or(RasterError::NotAllocated)?;
        let format = surface.pixel_format();
        let (width, height) = surface.dimensions();
        let mut output = Vec::new();

        let magic = match self.format {
            PnmFormat::Ppm => "P3",
            PnmFormat::Pgm => "P2",
        };
        writeln!(&mut output, "{magic}")?;
        if let Some(comment) = comment {
            writeln!(&mut output, "# {comment}")?;
        }
        writeln!(&mut output, "{} {}", width, height)?;
        writeln!(&mut output, "255")?;

        for y in 0..height {
            for x in 0..width {
                let c: Color = format.read_color(&pixels[surface.offset_of(x, y)..]);
                match (self.format, self.alpha_only) {
                    (PnmFormat::Ppm, true) => write!(&mut output, "{:03} {:03} {:03} \t", c.a, c.a, c.a)?,
                    (PnmFormat::Ppm, false) => write!(&mut output, "{:03} {:03} {:03} \t", c.r, c.g, c.b)?,
                    (PnmFormat::Pgm, true) => write!(&mut output, "{:03} \t", c.a)?,
                    (PnmFormat::Pgm, false) => write!(&mut output, "{:03} \t", luminance(c))?,
                }
            }
            writeln!(&mut output)?;
        }

        Ok(output)
    }
}

fn luminance(c: Color) -> u8 {
    let (r, g, b) = (c.r as u32, c.g as u32, c.b as u32);
    ((r * 299 + g * 587 + b * 114) / 1000) as u8
}

impl Exporter for PnmExporter {
    fn name(&self) -> &'static str {
        match self.format {
            PnmFormat::Pgm => "pgm",
            PnmFormat::Ppm => "ppm",
        }
    }

    fn export(&self, surface: &Surface<'_>) -> Result<Vec<u8>> {
        self.export_surface(surface, None)
    }

    fn extension(&self) -> &'static str {
        self.name()
    }

    fn mime_type(&self) -> &'static str {
        match self.format {
            PnmFormat::Pgm => "image/x-portable-graymap",
            PnmFormat::Ppm => "image/x-portable-pixmap",
        }
    }
}

impl Default for PnmExporter {
    fn default() -> Self {
        Self::ppm()
    }
}

/// Dump `surface` to `path` as a `P3` file whose comment line is the path.
///
/// With `alpha_only`, each pixel is written as its alpha three times.
pub fn write_ppm_file(path: &Path, surface: &Surface<'_>, alpha_only: bool) -> Result<()> {
    let comment = path.display().to_string();
    let data = PnmExporter::ppm()
        .alpha_only(alpha_only)
        .export_surface(surface, Some(&comment))?;
    std::fs::write(path, data)?;
    log::debug!("Wrote {}x{} PPM to {}", surface.width(), surface.height(), comment);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swraster_core::{PixelFormatType, SurfaceCategory};

    fn quad(format_type: PixelFormatType) -> Surface<'static> {
        let mut s = Surface::create(2, 2, format_type, SurfaceCategory::Scratch).unwrap();
        let pf = *s.pixel_format();
        let colors = [
            Color::rgb(255, 0, 0),
            Color::rgb(0, 255, 0),
            Color::rgb(0, 0, 255),
            Color::rgba(255, 255, 255, 128),
        ];
        for (i, c) in colors.into_iter().enumerate() {
            let off = s.offset_of(i as i32 % 2, i as i32 / 2);
            pf.write_color(&mut s.pixels_mut().unwrap()[off..], c);
        }
        s
    }

    #[test]
    fn test_ppm_layout() {
        let text = String::from_utf8(PnmExporter::ppm().export(&quad(PixelFormatType::Argb)).unwrap()).unwrap();
        let expected = "P3\n2 2\n255\n255 000 000 \t000 255 000 \t\n000 000 255 \t255 255 255 \t\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_ppm_reads_each_format() {
        for ft in [PixelFormatType::Rgba, PixelFormatType::Xrgb, PixelFormatType::Rgb] {
            let text = String::from_utf8(PnmExporter::ppm().export(&quad(ft)).unwrap()).unwrap();
            assert!(text.contains("255 000 000 \t000 255 000"), "{:?}", ft);
        }
    }

    #[test]
    fn test_alpha_only() {
        let exporter = PnmExporter::ppm().alpha_only(true);
        let text = String::from_utf8(exporter.export(&quad(PixelFormatType::Argb)).unwrap()).unwrap();
        assert!(text.ends_with("255 255 255 \t128 128 128 \t\n"));

        // Formats without alpha read as opaque.
        let text = String::from_utf8(exporter.export(&quad(PixelFormatType::Xrgb)).unwrap()).unwrap();
        assert!(text.ends_with("255 255 255 \t255 255 255 \t\n"));
    }

    #[test]
    fn test_pgm_luminance() {
        let text = String::from_utf8(PnmExporter::pgm().export(&quad(PixelFormatType::Argb)).unwrap()).unwrap();
        assert!(text.starts_with("P2\n2 2\n255\n"));
        assert!(text.contains("076 \t149 \t\n029 \t255 \t\n"));
    }

    #[test]
    fn test_unallocated_surface() {
        assert!(matches!(
            PnmExporter::ppm().export(&Surface::new()),
            Err(RasterError::NotAllocated)
        ));
    }

    #[test]
    fn test_extension_and_mime() {
        let ppm = PnmExporter::ppm();
        assert_eq!(ppm.extension(), "ppm");
        assert_eq!(ppm.mime_type(), "image/x-portable-pixmap");

        let pgm = PnmExporter::pgm();
        assert_eq!(pgm.extension(), "pgm");
        assert_eq!(pgm.mime_type(), "image/x-portable-graymap");
    }
}
