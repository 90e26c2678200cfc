//! Demo command implementation
//!
//! Draws a fixed scene covering the primitives, tiled and 9-slice images,
//! a rotated translucent image and text runs.

use anyhow::Result;
use swraster_core::{Color, Matrix2D, PixelFormatType, Point, Rect, Surface, SurfaceCategory, TextureFormat};
use swraster_render::{blit_edge_tiled, primitives, AtlasGlyphCache, GraphicsContext, Orientation, RasterEngine};

use crate::cli::DemoArgs;
use crate::font::{draw_text, BitmapFont};

pub const WIDTH: i32 = 320;
pub const HEIGHT: i32 = 240;

const BACKGROUND: Color = Color::rgba(240, 240, 236, 255);
const CHECKER_A: Color = Color::rgba(60, 60, 70, 255);
const CHECKER_B: Color = Color::rgba(200, 200, 210, 255);

pub fn run(args: &DemoArgs) -> Result<()> {
    let engine = RasterEngine::new(super::resolve_config(&args.raster));
    let canvas = draw_demo(&engine)?;
    engine.dump_surface("demo", &canvas)?;
    super::write_output(&canvas, &args.output)
}

pub fn draw_demo(engine: &RasterEngine) -> Result<Surface<'static>> {
    let mut canvas = engine.create_surface_sized(WIDTH, HEIGHT, PixelFormatType::Xrgb, SurfaceCategory::MainView)?;
    let bounds = canvas.bounds();
    engine.clear(&mut canvas, &bounds, BACKGROUND)?;

    draw_primitives(engine, &mut canvas)?;
    draw_images(engine, &mut canvas)?;
    draw_labels(engine, &mut canvas)?;
    Ok(canvas)
}

fn draw_primitives(engine: &RasterEngine, canvas: &mut Surface<'_>) -> Result<()> {
    engine.rectangle_filled(canvas, &Rect::new(10, 10, 40, 30), Color::rgb(30, 80, 200))?;
    engine.rectangle_filled(canvas, &Rect::new(30, 25, 40, 30), Color::rgba(255, 0, 0, 128))?;
    engine.rectangle_outlined(canvas, &Rect::new(80, 10, 40, 40), Color::black())?;

    engine.line(canvas, 130, 10, 170, 50, Color::black())?;
    primitives::aa_line(canvas, 130, 50, 170, 14, Color::rgb(0, 110, 40))?;

    engine.ellipse_filled(canvas, 200, 30, 20, 14, Color::rgb(240, 140, 20))?;
    engine.ellipse_outlined(canvas, 250, 30, 20, 14, Color::black())?;
    primitives::aa_ellipse(canvas, 295, 30, 16, 16, Color::rgb(120, 40, 160))?;

    let orientations = [Orientation::Left, Orientation::Up, Orientation::Right, Orientation::Down];
    for (i, orientation) in orientations.into_iter().enumerate() {
        engine.triangle_oriented(canvas, 10 + i as i32 * 24, 62, 8, orientation, Color::rgb(90, 90, 90))?;
    }

    let (vx, vy) = star(150, 80, 22, 9);
    engine.polygon_filled(canvas, &vx, &vy, Color::rgb(220, 180, 0))?;
    let (vx, vy) = star(205, 80, 22, 9);
    primitives::polygon_outline(canvas, &vx, &vy, Color::black())?;

    // Only the left half of this circle lands inside the clip.
    canvas.set_clip_rect(Some(Rect::new(250, 58, 30, 44)));
    engine.ellipse_filled(canvas, 280, 80, 20, 20, Color::rgb(0, 150, 150))?;
    canvas.set_clip_rect(None);
    Ok(())
}

/// Five-pointed star, alternating outer and inner radius.
fn star(cx: i32, cy: i32, outer: i32, inner: i32) -> (Vec<i32>, Vec<i32>) {
    (0..10)
        .map(|i| {
            let r = f64::from(if i % 2 == 0 { outer } else { inner });
            let angle = std::f64::consts::PI * (i as f64 / 5.0 - 0.5);
            (cx + (r * angle.cos()).round() as i32, cy + (r * angle.sin()).round() as i32)
        })
        .unzip()
}

fn draw_images(engine: &RasterEngine, canvas: &mut Surface<'_>) -> Result<()> {
    let tile = checker(engine)?;
    let area = Rect::new(10, 110, 90, 60);
    engine.draw_surface_tiled(&tile, &tile.bounds(), canvas, &area, &area, &Matrix2D::IDENTITY, 1.0)?;

    let button = button(engine)?;
    blit_edge_tiled(&button, &button.bounds(), canvas, &Rect::new(110, 110, 90, 40), &Rect::new(4, 4, 4, 4))?;

    let mut image = gradient(engine)?;
    let size = image.size_bytes();
    if let Some(packed) = engine.compress_image(&mut image, true, size)? {
        log::info!("Demo image packed from {} to {} bytes", size, packed);
    }
    let transform = Matrix2D::rotate(0.5).then(&Matrix2D::scale(1.3, 1.3));
    engine.draw_surface(&image, &image.bounds(), canvas, &Rect::new(220, 110, 96, 96), &transform, 0.75)?;
    Ok(())
}

fn new_image(engine: &RasterEngine, size: i32) -> Result<Surface<'static>> {
    Ok(engine.create_surface_sized(size, size, PixelFormatType::Argb, SurfaceCategory::Image)?)
}

fn checker(engine: &RasterEngine) -> Result<Surface<'static>> {
    let mut tile = new_image(engine, 8)?;
    engine.clear(&mut tile, &Rect::new(0, 0, 8, 8), CHECKER_A)?;
    engine.clear(&mut tile, &Rect::new(4, 0, 4, 4), CHECKER_B)?;
    engine.clear(&mut tile, &Rect::new(0, 4, 4, 4), CHECKER_B)?;
    Ok(tile)
}

/// A 12x12 rounded button face for 9-slice stretching.
fn button(engine: &RasterEngine) -> Result<Surface<'static>> {
    let mut face = new_image(engine, 12)?;
    engine.clear(&mut face, &Rect::new(0, 0, 12, 12), Color::rgb(40, 70, 130))?;
    engine.clear(&mut face, &Rect::new(2, 2, 8, 8), Color::rgb(120, 160, 230))?;
    for (x, y) in [(0, 0), (11, 0), (0, 11), (11, 11)] {
        engine.clear(&mut face, &Rect::new(x, y, 1, 1), Color::TRANSPARENT)?;
    }
    Ok(face)
}

fn gradient(engine: &RasterEngine) -> Result<Surface<'static>> {
    let mut img = new_image(engine, 32)?;
    for x in 0..32u8 {
        let color = Color::rgb(x * 8, 64, 255 - x * 8);
        engine.clear(&mut img, &Rect::new(x as i32, 0, 1, 32), color)?;
    }
    engine.ellipse_filled(&mut img, 16, 16, 8, 8, Color::white())?;
    Ok(img)
}

fn draw_labels(engine: &RasterEngine, canvas: &mut Surface<'_>) -> Result<()> {
    let mut atlas = AtlasGlyphCache::new(256, TextureFormat::Alpha8)?;
    let large = BitmapFont::new(2);
    let small = BitmapFont::new(1);

    let mut ctx = GraphicsContext::new(engine, canvas);
    ctx.fill_color = Color::rgb(20, 20, 20);
    draw_text(&mut ctx, &large, &mut atlas, "SWRASTER", Point::new(10, 228))?;

    ctx.transparency = 0.6;
    draw_text(&mut ctx, &small, &mut atlas, "primitives, images, text", Point::new(120, 226))?;

    ctx.transparency = 1.0;
    ctx.fill_color = Color::rgb(170, 30, 30);
    ctx.transform = Some(Matrix2D::rotate(-0.2));
    draw_text(&mut ctx, &large, &mut atlas, "AVATAR", Point::new(120, 200))?;

    let stats = atlas.stats();
    log::debug!("Demo atlas: {} glyphs, hit rate {:.2}", stats.glyphs, stats.hit_rate());
    Ok(())
}
