//! The raster engine
//!
//! [`RasterEngine`] is the entry point callers hold on to. It owns the
//! configuration and the scratch buffers that would otherwise be allocated
//! on every draw, and exposes surface creation, primitives, image drawing
//! and glyph drawing as one interface. There is no process-wide instance;
//! callers pass the engine to whatever needs to draw.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use swraster_core::{
    Color, GlyphTexture, Matrix2D, NativeColor, PixelFormat, PixelFormatType, RasterConfig,
    RasterError, Rect, Result, Surface, SurfaceCategory,
};

use crate::blit;
use crate::compress;
use crate::glyph::{composite_glyphs, GlyphDrawInfo, TextEffect};
use crate::primitives::{self, Orientation, PolygonScratch};
use crate::transform;

/// The surface an image draw actually reads from
///
/// Either the caller's surface or an intermediate produced by unpacking,
/// fading or transforming it. Intermediates are dropped with this value;
/// the caller's surface never is.
#[derive(Debug)]
pub enum DrawSource<'s, 'a> {
    Borrowed(&'s Surface<'a>),
    Owned(Surface<'static>),
}

impl DrawSource<'_, '_> {
    pub fn surface(&self) -> &Surface<'_> {
        match self {
            DrawSource::Borrowed(s) => s,
            DrawSource::Owned(s) => s,
        }
    }

    /// True when the source is an intermediate rather than the caller's surface.
    pub fn is_owned(&self) -> bool {
        matches!(self, DrawSource::Owned(_))
    }
}

/// Software raster engine
#[derive(Debug)]
pub struct RasterEngine {
    config: RasterConfig,
    glyph_scratch: RefCell<Vec<u8>>,
    polygon_scratch: RefCell<PolygonScratch>,
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self::new(RasterConfig::default())
    }
}

impl RasterEngine {
    pub fn new(config: RasterConfig) -> Self {
        let glyph_scratch = Vec::with_capacity(config.glyph_scratch_pixels * 4);
        log::debug!("Raster engine created with {:?}", config);
        Self {
            config,
            glyph_scratch: RefCell::new(glyph_scratch),
            polygon_scratch: RefCell::new(PolygonScratch::new()),
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    // Surfaces

    /// An empty surface with no storage.
    pub fn create_surface(&self) -> Surface<'static> {
        Surface::new()
    }

    pub fn create_surface_sized(
        &self,
        width: i32,
        height: i32,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<Surface<'static>> {
        Surface::create(width, height, format_type, category)
    }

    /// A surface holding a copy of `data`.
    pub fn create_surface_from_data(
        &self,
        data: &[u8],
        width: i32,
        height: i32,
        stride: usize,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<Surface<'static>> {
        Surface::from_data(data, width, height, stride, format_type, category)
    }

    /// A surface drawing straight into `data`.
    pub fn create_surface_borrowed<'a>(
        &self,
        data: &'a mut [u8],
        width: i32,
        height: i32,
        stride: usize,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<Surface<'a>> {
        Surface::borrowed(data, width, height, stride, format_type, category)
    }

    pub fn convert_color(&self, native: NativeColor, format: &PixelFormat) -> Color {
        format.decode(native)
    }

    // Primitives

    /// Overwrite `rect` with `color`, alpha included.
    pub fn clear(&self, surface: &mut Surface<'_>, rect: &Rect, color: Color) -> Result<()> {
        primitives::fill_rect_solid(surface, Some(rect), color)
    }

    pub fn rectangle_filled(&self, surface: &mut Surface<'_>, rect: &Rect, color: Color) -> Result<()> {
        if color.is_opaque() {
            primitives::fill_rect_solid(surface, Some(rect), color)
        } else {
            primitives::fill_rect_blend(surface, Some(rect), color)
        }
    }

    pub fn rectangle_outlined(&self, surface: &mut Surface<'_>, rect: &Rect, color: Color) -> Result<()> {
        primitives::rectangle_outline(surface, rect, color)
    }

    pub fn line(&self, surface: &mut Surface<'_>, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Result<()> {
        primitives::line(surface, x1, y1, x2, y2, color)
    }

    pub fn ellipse_filled(&self, surface: &mut Surface<'_>, x: i32, y: i32, rx: i32, ry: i32, color: Color) -> Result<()> {
        primitives::ellipse_filled(surface, x, y, rx, ry, color)
    }

    pub fn ellipse_outlined(&self, surface: &mut Surface<'_>, x: i32, y: i32, rx: i32, ry: i32, color: Color) -> Result<()> {
        primitives::ellipse_outline(surface, x, y, rx, ry, color)
    }

    pub fn triangle_oriented(
        &self,
        surface: &mut Surface<'_>,
        x: i32,
        y: i32,
        size: i32,
        orientation: Orientation,
        color: Color,
    ) -> Result<()> {
        primitives::simple_triangle(surface, x, y, size, orientation, color)
    }

    /// Even-odd polygon fill using the engine's intersection buffer.
    pub fn polygon_filled(&self, surface: &mut Surface<'_>, vx: &[i32], vy: &[i32], color: Color) -> Result<()> {
        let mut scratch = self
            .polygon_scratch
            .try_borrow_mut()
            .map_err(|_| RasterError::other("polygon scratch buffer is already in use"))?;
        primitives::polygon_filled(surface, vx, vy, color, &mut scratch)
    }

    // Images

    /// Resolve what an image draw reads from.
    ///
    /// Compressed surfaces are unpacked, `alpha < 1` fades a copy by
    /// `round(alpha * 255)`, and a non-identity `transform` resamples the
    /// source rect, in which case `src_rect` is reset to cover the whole
    /// result. Each step drops the intermediate it replaces.
    ///
    /// `Ok(None)` means there is nothing to draw: the surface has no pixels
    /// or the transform collapses it.
    pub fn surface_to_draw<'s, 'a>(
        &self,
        surface: &'s Surface<'a>,
        src_rect: &mut Rect,
        transform: &Matrix2D,
        alpha: f32,
    ) -> Result<Option<DrawSource<'s, 'a>>> {
        let mut source = match compress::unpack_compressed(surface)? {
            Some(unpacked) => {
                log::debug!("Unpacked compressed {}x{} surface for drawing", unpacked.width(), unpacked.height());
                DrawSource::Owned(unpacked)
            }
            None => DrawSource::Borrowed(surface),
        };
        if !source.surface().is_allocated() {
            log::debug!("Surface has no pixels, nothing to draw");
            return Ok(None);
        }

        if alpha < 1.0 {
            let a = (alpha.max(0.0) * 255.0).round() as u8;
            source = DrawSource::Owned(transform::create_transparent_surface(source.surface(), a)?);
        }

        if !transform.is_identity() {
            let bounds = transform.map_rect_bounds(&Rect::from_size(src_rect.w, src_rect.h));
            if transform.inverse().is_none() || bounds.is_empty() {
                log::debug!("Transform {:?} collapses the image, nothing to draw", transform);
                return Ok(None);
            }
            let transformed = transform::transform_surface(
                source.surface(),
                src_rect,
                transform,
                self.config.transform_filter,
            )?;
            *src_rect = transformed.bounds();
            source = DrawSource::Owned(transformed);
        }
        Ok(Some(source))
    }

    /// Draw `source_rect` of `image` at `dest_rect` of `dest`.
    pub fn draw_surface(
        &self,
        image: &Surface<'_>,
        source_rect: &Rect,
        dest: &mut Surface<'_>,
        dest_rect: &Rect,
        transform: &Matrix2D,
        alpha: f32,
    ) -> Result<()> {
        let mut rect = *source_rect;
        match self.surface_to_draw(image, &mut rect, transform, alpha)? {
            Some(source) => blit::blit(source.surface(), &rect, dest, dest_rect, None),
            None => Ok(()),
        }
    }

    /// Repeat the image over `dest_rect`, one tile per source-rect step
    /// starting at its top-left corner, clipped to `clip_rect`.
    pub fn draw_surface_tiled(
        &self,
        image: &Surface<'_>,
        source_rect: &Rect,
        dest: &mut Surface<'_>,
        dest_rect: &Rect,
        clip_rect: &Rect,
        transform: &Matrix2D,
        alpha: f32,
    ) -> Result<()> {
        let mut rect = *source_rect;
        let Some(source) = self.surface_to_draw(image, &mut rect, transform, alpha)? else {
            return Ok(());
        };
        if rect.w <= 0 || rect.h <= 0 {
            return Ok(());
        }

        let mut x = dest_rect.x;
        while x <= dest_rect.right() {
            let mut y = dest_rect.y;
            while y <= dest_rect.bottom() {
                let tile = Rect::new(x, y, rect.w, rect.h);
                blit::blit(source.surface(), &rect, dest, &tile, Some(clip_rect))?;
                y += rect.h;
            }
            x += rect.w;
        }
        Ok(())
    }

    /// Pack `image` to save memory when compression is enabled and the
    /// image is large enough. Returns the packed size.
    pub fn compress_image(&self, image: &mut Surface<'_>, has_alpha: bool, size_total: usize) -> Result<Option<usize>> {
        if !self.config.compression_enabled() {
            return Ok(None);
        }
        compress::compress_image(image, has_alpha, size_total, self.config.min_compress_bytes)
    }

    // Text

    /// Composite `glyphs` from `texture` into a `source_rect`-sized ARGB
    /// buffer and draw it at `dest_rect`.
    ///
    /// Runs of up to `glyph_scratch_pixels` pixels reuse the engine's
    /// buffer; larger ones get their own.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_glyphs(
        &self,
        glyphs: &[GlyphDrawInfo],
        texture: &GlyphTexture<'_>,
        dest: &mut Surface<'_>,
        source_rect: &Rect,
        dest_rect: &Rect,
        pen: Color,
        transform: &Matrix2D,
        alpha: f32,
        effect: TextEffect,
    ) -> Result<()> {
        if glyphs.is_empty() || source_rect.w <= 0 || source_rect.h <= 0 {
            return Ok(());
        }
        let pixels = source_rect.w as usize * source_rect.h as usize;
        let bytes = pixels
            .checked_mul(4)
            .ok_or(RasterError::OutOfMemory { bytes: usize::MAX })?;

        let draw = |buffer: &mut [u8], dest: &mut Surface<'_>| -> Result<()> {
            composite_glyphs(glyphs, texture, pen, effect, source_rect.w, source_rect.h, buffer);
            let text = Surface::borrowed(
                buffer,
                source_rect.w,
                source_rect.h,
                source_rect.w as usize * 4,
                PixelFormatType::Argb,
                SurfaceCategory::Text,
            )?;
            self.draw_surface(&text, source_rect, dest, dest_rect, transform, alpha)
        };

        if pixels <= self.config.glyph_scratch_pixels {
            let mut pooled = self
                .glyph_scratch
                .try_borrow_mut()
                .map_err(|_| RasterError::other("glyph scratch buffer is already in use"))?;
            pooled.clear();
            pooled.resize(bytes, 0);
            draw(&mut pooled[..], dest)
        } else {
            log::trace!("Glyph run of {} pixels uses its own buffer", pixels);
            let mut buffer = swraster_core::try_alloc_pixels(bytes)?;
            draw(&mut buffer, dest)
        }
    }

    // Debugging

    /// Write `surface` as a plain-text PPM file.
    pub fn write_surface_to_file(&self, path: &Path, surface: &Surface<'_>, alpha_only: bool) -> Result<()> {
        swraster_export::write_ppm_file(path, surface, alpha_only)
    }

    /// Write `surface` to `<dump_dir>/<name>.ppm` when a dump directory is
    /// configured. Returns the path written.
    pub fn dump_surface(&self, name: &str, surface: &Surface<'_>) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.config.dump_dir else {
            return Ok(None);
        };
        let path = dir.join(format!("{name}.ppm"));
        self.write_surface_to_file(&path, surface, false)?;
        log::debug!("Dumped surface to {}", path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::get_color;
    use swraster_core::{CompressionMode, SurfaceFlags};

    fn filled(w: i32, h: i32, c: Color) -> Surface<'static> {
        let mut s = Surface::create(w, h, PixelFormatType::Argb, SurfaceCategory::Image).unwrap();
        primitives::fill_rect_solid(&mut s, None, c).unwrap();
        s
    }

    #[test]
    fn identity_draw_borrows_the_source() {
        let engine = RasterEngine::default();
        let image = filled(4, 4, Color::rgb(1, 2, 3));
        let mut rect = image.bounds();
        let source = engine
            .surface_to_draw(&image, &mut rect, &Matrix2D::IDENTITY, 1.0)
            .unwrap()
            .unwrap();
        assert!(!source.is_owned());
        assert_eq!(rect, Rect::new(0, 0, 4, 4));
    }

    #[test]
    fn alpha_fades_a_copy() {
        let engine = RasterEngine::default();
        let image = filled(2, 2, Color::rgb(200, 100, 0));
        let mut rect = image.bounds();
        let source = engine
            .surface_to_draw(&image, &mut rect, &Matrix2D::IDENTITY, 0.5)
            .unwrap()
            .unwrap();
        assert!(source.is_owned());
        assert_eq!(source.surface().pixel_format().surface_alpha, 128);
        assert_eq!(get_color(source.surface(), 0, 0), Some(Color::rgba(100, 50, 0, 128)));
        assert_eq!(get_color(&image, 0, 0), Some(Color::rgb(200, 100, 0)));
    }

    #[test]
    fn transform_resets_source_rect() {
        let engine = RasterEngine::default();
        let image = filled(4, 2, Color::white());
        let mut rect = Rect::new(0, 0, 4, 2);
        let source = engine
            .surface_to_draw(&image, &mut rect, &Matrix2D::scale(2.0, 2.0), 1.0)
            .unwrap()
            .unwrap();
        assert_eq!(rect, Rect::new(0, 0, 8, 4));
        assert_eq!(source.surface().dimensions(), (8, 4));
    }

    #[test]
    fn singular_transform_draws_nothing() {
        let engine = RasterEngine::default();
        let image = filled(4, 4, Color::white());
        let mut dest = filled(4, 4, Color::black());
        let m = Matrix2D::scale(0.0, 1.0);
        let dest_rect = dest.bounds();
        engine
            .draw_surface(&image, &image.bounds(), &mut dest, &dest_rect, &m, 1.0)
            .unwrap();
        assert_eq!(get_color(&dest, 1, 1), Some(Color::black()));
    }

    #[test]
    fn tiled_draw_covers_dest_rect() {
        let engine = RasterEngine::default();
        let mut tile = Surface::create(2, 2, PixelFormatType::Xrgb, SurfaceCategory::Image).unwrap();
        primitives::fill_rect_solid(&mut tile, None, Color::rgb(0, 0, 255)).unwrap();
        let mut dest = Surface::create(8, 8, PixelFormatType::Xrgb, SurfaceCategory::MainView).unwrap();
        let area = Rect::new(1, 1, 5, 5);
        engine
            .draw_surface_tiled(&tile, &tile.bounds(), &mut dest, &area, &area, &Matrix2D::IDENTITY, 1.0)
            .unwrap();

        for y in 0..8 {
            for x in 0..8 {
                let inside = (1..6).contains(&x) && (1..6).contains(&y);
                let expected = if inside { Color::rgb(0, 0, 255) } else { Color::black() };
                assert_eq!(get_color(&dest, x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn compression_follows_config() {
        let mut s = filled(32, 32, Color::rgb(9, 9, 9));
        let total = s.size_bytes();

        let off = RasterEngine::default();
        assert_eq!(off.compress_image(&mut s, false, total).unwrap(), None);
        assert!(s.is_allocated());

        let on = RasterEngine::new(RasterConfig {
            compression: CompressionMode::Rle,
            ..RasterConfig::default()
        });
        assert!(on.compress_image(&mut s, false, total).unwrap().is_some());
        assert!(s.flags().contains(SurfaceFlags::COMPRESSED_RLE));

        // A compressed image still draws.
        let mut dest = Surface::create(32, 32, PixelFormatType::Argb, SurfaceCategory::MainView).unwrap();
        let dest_rect = dest.bounds();
        on.draw_surface(&s, &Rect::from_size(32, 32), &mut dest, &dest_rect, &Matrix2D::IDENTITY, 1.0)
            .unwrap();
        assert_eq!(get_color(&dest, 31, 31), Some(Color::rgb(9, 9, 9)));
    }

    #[test]
    fn polygon_scratch_is_reused() {
        let engine = RasterEngine::default();
        let mut dest = filled(10, 10, Color::black());
        engine
            .polygon_filled(&mut dest, &[1, 8, 8, 1], &[1, 1, 8, 8], Color::white())
            .unwrap();
        assert!(engine.polygon_scratch.borrow().capacity() >= 4);
        assert_eq!(get_color(&dest, 4, 4), Some(Color::white()));
    }

    #[test]
    fn dump_without_dir_is_skipped() {
        let engine = RasterEngine::default();
        let image = filled(1, 1, Color::white());
        assert_eq!(engine.dump_surface("frame", &image).unwrap(), None);
    }
}
