//! Glyph run layout and drawing
//!
//! A run is laid out pen-relative with y pointing up, measured, flipped
//! into a top-down buffer and handed to [`RasterEngine::draw_glyphs`].

use swraster_core::{
    Color, Font, GlyphCache, GlyphId, GlyphMetrics, Matrix2D, Point, RasterError, Rect, Result,
    Surface,
};

use crate::engine::RasterEngine;
use crate::glyph::{GlyphDrawInfo, TextEffect};

/// Drawing state shared by a sequence of draw calls on one surface
pub struct GraphicsContext<'e, 's, 'a> {
    engine: &'e RasterEngine,
    surface: &'s mut Surface<'a>,
    pub fill_color: Color,
    /// Applied to images and text; `None` draws untransformed
    pub transform: Option<Matrix2D>,
    /// Offset added to every coordinate
    pub origin: Point,
    /// Opacity of images and text, 0.0 to 1.0
    pub transparency: f32,
    pub text_effect: TextEffect,
}

impl<'e, 's, 'a> GraphicsContext<'e, 's, 'a> {
    pub fn new(engine: &'e RasterEngine, surface: &'s mut Surface<'a>) -> Self {
        Self {
            engine,
            surface,
            fill_color: Color::black(),
            transform: None,
            origin: Point::default(),
            transparency: 1.0,
            text_effect: TextEffect::None,
        }
    }

    pub fn engine(&self) -> &'e RasterEngine {
        self.engine
    }

    pub fn surface(&self) -> &Surface<'a> {
        self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface<'a> {
        self.surface
    }

    fn placed(&self, rect: &Rect) -> Rect {
        rect.translated(self.origin.x, self.origin.y)
    }

    pub fn fill_rect(&mut self, rect: &Rect) -> Result<()> {
        let rect = self.placed(rect);
        self.engine.rectangle_filled(self.surface, &rect, self.fill_color)
    }

    pub fn stroke_rect(&mut self, rect: &Rect) -> Result<()> {
        let rect = self.placed(rect);
        self.engine.rectangle_outlined(self.surface, &rect, self.fill_color)
    }

    pub fn draw_line(&mut self, from: Point, to: Point) -> Result<()> {
        let (ox, oy) = (self.origin.x, self.origin.y);
        self.engine
            .line(self.surface, from.x + ox, from.y + oy, to.x + ox, to.y + oy, self.fill_color)
    }

    /// Draw `source_rect` of `image` at `dest_rect` with the context's
    /// transform and transparency.
    pub fn draw_image(&mut self, image: &Surface<'_>, source_rect: &Rect, dest_rect: &Rect) -> Result<()> {
        let dest_rect = self.placed(dest_rect);
        let transform = self.transform.unwrap_or_default();
        self.engine
            .draw_surface(image, source_rect, self.surface, &dest_rect, &transform, self.transparency)
    }
}

/// Glyph ids and the pen advance after each
#[derive(Debug, Clone, Copy)]
pub struct GlyphRun<'r> {
    pub glyphs: &'r [GlyphId],
    pub advances: &'r [f32],
}

impl<'r> GlyphRun<'r> {
    pub fn new(glyphs: &'r [GlyphId], advances: &'r [f32]) -> Self {
        Self { glyphs, advances }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Place every glyph of `run` relative to the pen.
///
/// Boxes have y pointing up (`y2 <= y1`). Glyphs without metrics are
/// replaced by the font's fallback glyph. Glyphs missing from the atlas
/// are added to it; those with nothing to draw, or that the cache cannot
/// take, get an empty box.
pub fn layout_glyph_run(
    font: &dyn Font,
    cache: &mut dyn GlyphCache,
    run: &GlyphRun<'_>,
) -> Result<Vec<GlyphDrawInfo>> {
    if run.glyphs.len() != run.advances.len() {
        return Err(RasterError::other(format!(
            "{} glyphs but {} advances",
            run.glyphs.len(),
            run.advances.len()
        )));
    }

    let mut placed = Vec::with_capacity(run.len());
    let mut offset = 0.0f32;
    let mut prev: Option<GlyphId> = None;

    for (i, (&requested, &advance)) in run.glyphs.iter().zip(run.advances).enumerate() {
        let (glyph, metrics) = match cache.glyph_metrics(font, requested) {
            Some(m) => (requested, m),
            None => {
                let fallback = font.fallback_glyph();
                log::warn!(
                    "No metrics for glyph {} in font {}, using fallback glyph {}",
                    requested,
                    font.id(),
                    fallback
                );
                let m = cache.glyph_metrics(font, fallback).unwrap_or_default();
                (fallback, m)
            }
        };

        let texture_info = match cache.glyph_texture_info(font, glyph) {
            Some(info) => Some(info),
            None => cache.add_glyph(font, glyph).unwrap_or_else(|e| {
                log::warn!("Failed to add glyph {} of font {} to cache: {}", glyph, font.id(), e);
                None
            }),
        }
        .filter(|uv| uv.u1 > uv.u0 && uv.v1 > uv.v0);

        if let Some(p) = prev {
            offset += font.kerning(p, glyph).unwrap_or(0.0);
        }

        let GlyphMetrics {
            h_bearing_x: bx,
            h_bearing_y: by,
            size_x: sx,
            size_y: sy,
            ..
        } = metrics;
        let x1 = (offset + bx) as i32;
        let y1 = by as i32;
        let gdi = match texture_info {
            Some(uv) => GlyphDrawInfo {
                x1,
                x2: (offset + bx + sx) as i32,
                y1,
                y2: (by - sy) as i32,
                u0: uv.u0,
                v0: uv.v0,
                u1: uv.u1,
                v1: uv.v1,
            },
            None => GlyphDrawInfo {
                x1,
                x2: x1,
                y1,
                y2: y1,
                ..GlyphDrawInfo::default()
            },
        };
        placed.push(gdi);

        offset += advance;
        // A first glyph hanging left of the pen pushes the rest right.
        if i == 0 && bx < 0.0 {
            offset -= bx;
        }
        prev = Some(glyph);
    }
    Ok(placed)
}

/// Draw `run` with its baseline starting at `point`.
///
/// Without a glyph cache, or a cache without a texture, nothing is drawn.
/// A run with nothing to draw (all spaces) is not an error.
pub fn draw_glyph_run(
    ctx: &mut GraphicsContext<'_, '_, '_>,
    font: &dyn Font,
    cache: Option<&mut dyn GlyphCache>,
    run: &GlyphRun<'_>,
    point: Point,
) -> Result<()> {
    let Some(cache) = cache else {
        if cfg!(debug_assertions) {
            log::warn!("No glyph cache, dropping run of {} glyphs", run.len());
        }
        return Ok(());
    };
    if run.is_empty() {
        return Ok(());
    }
    if cache.texture().is_none() {
        if cfg!(debug_assertions) {
            log::warn!("Glyph cache has no texture, dropping run");
        }
        return Ok(());
    }

    let mut glyphs = layout_glyph_run(font, cache, run)?;

    let x_min = glyphs.iter().map(|g| g.x1).min().unwrap_or(0);
    let x_max = glyphs.iter().map(|g| g.x2).max().unwrap_or(0);
    let y_min = glyphs.iter().map(|g| g.y2).min().unwrap_or(0);
    let y_max = glyphs.iter().map(|g| g.y1).max().unwrap_or(0);
    let dest_w = x_min.abs() + x_max;
    let dest_h = y_max - y_min;
    if dest_w <= 0 || dest_h <= 0 {
        log::debug!("Glyph run has an empty box, nothing to draw");
        return Ok(());
    }

    let flip = dest_h + y_min;
    for g in &mut glyphs {
        g.y1 = flip - g.y1;
        g.y2 = flip - g.y2;
    }

    let mut x_offset = 0;
    if let Some(first) = glyphs.first_mut() {
        if first.x1 < 0 {
            x_offset = first.x1;
            first.x1 = 0;
        }
    }

    let Some(texture) = cache.texture() else {
        return Ok(());
    };

    let source_rect = Rect::new(0, 0, dest_w, dest_h);
    let (surface_w, surface_h) = ctx.surface.dimensions();
    let mut dest_rect = Rect::new(
        point.x + x_offset + ctx.origin.x,
        point.y - y_max + ctx.origin.y,
        surface_w,
        surface_h,
    );

    let mut text_transform = Matrix2D::IDENTITY;
    if let Some(m) = ctx.transform {
        let (x, y) = m.map_point(dest_rect.x as f64, dest_rect.y as f64);
        dest_rect.x = x.round() as i32;
        dest_rect.y = y.round() as i32;
        text_transform = Matrix2D::new(m.m11, m.m12, m.m21, m.m22, 0.0, 0.0);
    }

    log::trace!(
        "Drawing {} glyphs as {}x{} at ({}, {})",
        glyphs.len(),
        dest_w,
        dest_h,
        dest_rect.x,
        dest_rect.y
    );
    ctx.engine.draw_glyphs(
        &glyphs,
        &texture,
        ctx.surface,
        &source_rect,
        &dest_rect,
        ctx.fill_color,
        &text_transform,
        ctx.transparency,
        ctx.text_effect,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use swraster_core::{GlyphBitmap, GlyphTextureInfo, PixelFormatType, SurfaceCategory, TextureFormat};

    use crate::atlas::AtlasGlyphCache;
    use crate::pixel::get_color;

    /// Glyph `g` is a solid `g` x 3 block sitting on the baseline;
    /// glyph 0 is the fallback and 32 is a space.
    struct BlockFont;

    impl Font for BlockFont {
        fn id(&self) -> u32 {
            9
        }

        fn kerning(&self, prev: GlyphId, glyph: GlyphId) -> Option<f32> {
            ((prev, glyph) == (2, 3)).then_some(-1.0)
        }

        fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics> {
            match glyph {
                32 => Some(GlyphMetrics { h_advance_x: 2.0, ..Default::default() }),
                0..=8 => Some(GlyphMetrics {
                    h_bearing_x: 0.0,
                    h_bearing_y: 3.0,
                    size_x: glyph.max(1) as f32,
                    size_y: 3.0,
                    h_advance_x: glyph.max(1) as f32 + 1.0,
                }),
                _ => None,
            }
        }

        fn fallback_glyph(&self) -> GlyphId {
            0
        }

        fn rasterize_glyph(&self, glyph: GlyphId) -> Option<GlyphBitmap> {
            let m = self.glyph_metrics(glyph)?;
            let (w, h) = (m.size_x as u32, m.size_y as u32);
            (w > 0).then(|| GlyphBitmap {
                width: w,
                height: h,
                format: TextureFormat::Alpha8,
                data: vec![255; (w * h) as usize],
            })
        }
    }

    #[test]
    fn layout_applies_kerning_and_advances() {
        let mut cache = AtlasGlyphCache::new(64, TextureFormat::Alpha8).unwrap();
        let run = GlyphRun::new(&[1, 2, 3], &[2.0, 3.0, 4.0]);
        let boxes = layout_glyph_run(&BlockFont, &mut cache, &run).unwrap();

        assert_eq!((boxes[0].x1, boxes[0].x2), (0, 1));
        assert_eq!((boxes[1].x1, boxes[1].x2), (2, 4));
        // Kerning pulls glyph 3 one pixel left.
        assert_eq!((boxes[2].x1, boxes[2].x2), (4, 7));
        assert!(boxes.iter().all(|b| b.y1 == 3 && b.y2 == 0));
    }

    #[test]
    fn unknown_glyphs_use_fallback() {
        let mut cache = AtlasGlyphCache::new(64, TextureFormat::Alpha8).unwrap();
        let run = GlyphRun::new(&[99], &[2.0]);
        let boxes = layout_glyph_run(&BlockFont, &mut cache, &run).unwrap();
        assert_eq!((boxes[0].x1, boxes[0].x2), (0, 1));
        assert!(cache.glyph_texture_info(&BlockFont, 0).is_some());
    }

    #[test]
    fn mismatched_advances_are_rejected() {
        let mut cache = AtlasGlyphCache::new(64, TextureFormat::Alpha8).unwrap();
        let run = GlyphRun::new(&[1, 2], &[1.0]);
        assert!(layout_glyph_run(&BlockFont, &mut cache, &run).is_err());
    }

    fn canvas() -> Surface<'static> {
        Surface::create(16, 8, PixelFormatType::Argb, SurfaceCategory::MainView).unwrap()
    }

    #[test]
    fn run_lands_above_the_baseline() {
        let engine = RasterEngine::default();
        let mut cache = AtlasGlyphCache::new(64, TextureFormat::Alpha8).unwrap();
        let mut surface = canvas();
        let mut ctx = GraphicsContext::new(&engine, &mut surface);
        ctx.fill_color = Color::rgb(255, 0, 0);

        let run = GlyphRun::new(&[2], &[3.0]);
        draw_glyph_run(&mut ctx, &BlockFont, Some(&mut cache), &run, Point::new(4, 5)).unwrap();

        // Rows 2..5 and columns 4..6 are inked.
        assert_eq!(get_color(&surface, 4, 2), Some(Color::rgb(255, 0, 0)));
        assert_eq!(get_color(&surface, 5, 4), Some(Color::rgb(255, 0, 0)));
        assert_eq!(get_color(&surface, 6, 2), Some(Color::TRANSPARENT));
        assert_eq!(get_color(&surface, 4, 5), Some(Color::TRANSPARENT));
        assert_eq!(get_color(&surface, 4, 1), Some(Color::TRANSPARENT));
    }

    #[test]
    fn space_only_run_is_a_no_op() {
        let engine = RasterEngine::default();
        let mut cache = AtlasGlyphCache::new(64, TextureFormat::Alpha8).unwrap();
        let mut surface = canvas();
        let mut ctx = GraphicsContext::new(&engine, &mut surface);

        let run = GlyphRun::new(&[32, 32], &[2.0, 2.0]);
        draw_glyph_run(&mut ctx, &BlockFont, Some(&mut cache), &run, Point::new(1, 5)).unwrap();
        assert!(surface.pixels().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn missing_cache_is_a_no_op() {
        let engine = RasterEngine::default();
        let mut surface = canvas();
        let mut ctx = GraphicsContext::new(&engine, &mut surface);
        let run = GlyphRun::new(&[1], &[2.0]);
        draw_glyph_run(&mut ctx, &BlockFont, None, &run, Point::new(1, 5)).unwrap();
        assert!(surface.pixels().unwrap().iter().all(|&b| b == 0));
    }

    #[derive(Default)]
    struct NoTexture {
        added: u32,
    }

    impl GlyphCache for NoTexture {
        fn glyph_texture_info(&self, _font: &dyn Font, _glyph: GlyphId) -> Option<GlyphTextureInfo> {
            None
        }

        fn add_glyph(&mut self, _font: &dyn Font, _glyph: GlyphId) -> Result<Option<GlyphTextureInfo>> {
            self.added += 1;
            Ok(Some(GlyphTextureInfo { u0: 0.0, v0: 0.0, u1: 0.5, v1: 0.5 }))
        }

        fn texture(&self) -> Option<swraster_core::GlyphTexture<'_>> {
            None
        }
    }

    #[test]
    fn cache_without_texture_is_a_no_op() {
        let engine = RasterEngine::default();
        let mut surface = canvas();
        let mut cache = NoTexture::default();
        let mut ctx = GraphicsContext::new(&engine, &mut surface);
        let run = GlyphRun::new(&[3, 4], &[4.0, 5.0]);
        draw_glyph_run(&mut ctx, &BlockFont, Some(&mut cache), &run, Point::new(1, 5)).unwrap();
        assert!(surface.pixels().unwrap().iter().all(|&b| b == 0));
        assert_eq!(cache.added, 0);
    }

    #[test]
    fn full_atlas_skips_glyphs_and_draws_the_rest() {
        let engine = RasterEngine::default();
        // Glyphs 4 and 8 take both shelves of the 8x8 atlas, 3 no longer fits.
        let mut cache = AtlasGlyphCache::new(8, TextureFormat::Alpha8).unwrap();
        let mut surface = Surface::create(24, 8, PixelFormatType::Argb, SurfaceCategory::MainView).unwrap();
        let mut ctx = GraphicsContext::new(&engine, &mut surface);
        ctx.fill_color = Color::rgb(255, 0, 0);

        let run = GlyphRun::new(&[4, 8, 3], &[5.0, 9.0, 4.0]);
        draw_glyph_run(&mut ctx, &BlockFont, Some(&mut cache), &run, Point::new(1, 5)).unwrap();

        let red = Some(Color::rgb(255, 0, 0));
        assert_eq!(get_color(&surface, 1, 2), red);
        assert_eq!(get_color(&surface, 4, 4), red);
        assert_eq!(get_color(&surface, 6, 2), red);
        assert_eq!(get_color(&surface, 13, 4), red);
        for x in 14..24 {
            assert_eq!(get_color(&surface, x, 3), Some(Color::TRANSPARENT), "column {x}");
        }
        assert!(cache.glyph_texture_info(&BlockFont, 3).is_none());
    }

    #[test]
    fn layout_gives_unpackable_glyphs_an_empty_box() {
        let mut cache = AtlasGlyphCache::new(4, TextureFormat::Alpha8).unwrap();
        let run = GlyphRun::new(&[2, 8], &[3.0, 9.0]);
        let boxes = layout_glyph_run(&BlockFont, &mut cache, &run).unwrap();
        assert_eq!((boxes[0].x1, boxes[0].x2), (0, 2));
        assert_eq!((boxes[1].x1, boxes[1].x2), (3, 3));
        assert_eq!(boxes[1].y1, boxes[1].y2);
    }

    #[test]
    fn context_helpers_honor_origin() {
        let engine = RasterEngine::default();
        let mut surface = canvas();
        let mut ctx = GraphicsContext::new(&engine, &mut surface);
        ctx.origin = Point::new(2, 1);
        ctx.fill_color = Color::white();
        ctx.fill_rect(&Rect::new(0, 0, 2, 2)).unwrap();
        assert_eq!(get_color(ctx.surface(), 2, 1), Some(Color::white()));
        assert_eq!(get_color(ctx.surface(), 3, 2), Some(Color::white()));
        assert_eq!(get_color(ctx.surface(), 1, 1), Some(Color::TRANSPARENT));
    }
}
