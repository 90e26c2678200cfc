//! End-to-end behavior of blits, glyph compositing and image drawing

use proptest::prelude::*;
use swraster_core::color::multiply_color_alpha;
use swraster_core::{
    Color, GlyphTexture, Matrix2D, PixelFormatType, RasterConfig, Rect, SampleFilter, Surface,
    SurfaceCategory, TextureFormat,
};
use swraster_render::pixel::get_color;
use swraster_render::primitives::{self, fill_rect_solid};
use swraster_render::{
    blit, blit_edge_tiled, composite_glyphs, GlyphDrawInfo, Orientation, RasterEngine, TextEffect,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn surface(w: i32, h: i32, ft: PixelFormatType) -> Surface<'static> {
    Surface::create(w, h, ft, SurfaceCategory::Scratch).unwrap()
}

fn paint(s: &mut Surface<'_>, f: impl Fn(i32, i32) -> Color) {
    let pf = *s.pixel_format();
    let (w, h) = s.dimensions();
    for y in 0..h {
        for x in 0..w {
            let off = s.offset_of(x, y);
            pf.write_color(&mut s.pixels_mut().unwrap()[off..], f(x, y));
        }
    }
}

fn read_px(buf: &[u8], index: usize) -> u32 {
    let o = index * 4;
    u32::from_ne_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]])
}

proptest! {
    #[test]
    fn opaque_blit_reproduces_source(
        w in 1i32..12,
        h in 1i32..12,
        dx in 0i32..20,
        dy in 0i32..20,
        seed in any::<u32>(),
    ) {
        let mut src = surface(w, h, PixelFormatType::Xrgb);
        paint(&mut src, |x, y| {
            let v = seed.wrapping_mul(31).wrapping_add((x * 7 + y * 13) as u32);
            Color::from_argb(0xff00_0000 | (v & 0x00ff_ffff))
        });
        let mut dst = surface(32, 32, PixelFormatType::Xrgb);
        blit(&src, &src.bounds(), &mut dst, &Rect::new(dx, dy, w, h), None).unwrap();

        for y in 0..h {
            for x in 0..w {
                prop_assert_eq!(get_color(&dst, dx + x, dy + y), get_color(&src, x, y));
            }
        }
    }

    #[test]
    fn blit_past_the_edge_keeps_the_inside(w in 1i32..10, h in 1i32..10, dx in 0i32..10, dy in 0i32..10) {
        let mut src = surface(w, h, PixelFormatType::Argb);
        paint(&mut src, |x, y| Color::rgb(x as u8 * 20, y as u8 * 20, 77));
        let mut dst = surface(8, 8, PixelFormatType::Argb);
        blit(&src, &src.bounds(), &mut dst, &Rect::new(dx, dy, w, h), None).unwrap();

        for y in 0..8 {
            for x in 0..8 {
                let inside = x >= dx && y >= dy && x < dx + w && y < dy + h;
                let expected = if inside { get_color(&src, x - dx, y - dy) } else { Some(Color::TRANSPARENT) };
                prop_assert_eq!(get_color(&dst, x, y), expected);
            }
        }
    }

    #[test]
    fn primitives_stay_inside_the_clip(
        x1 in coord(),
        y1 in coord(),
        x2 in coord(),
        y2 in coord(),
        rx in coord(),
        ry in coord(),
    ) {
        let clip = Rect::new(3, 4, 8, 6);
        let mut s = surface(16, 16, PixelFormatType::Argb);
        s.set_clip_rect(Some(clip));
        let red = Color::rgb(255, 0, 0);
        let ghost = Color::rgba(0, 0, 255, 90);

        primitives::line(&mut s, x1, y1, x2, y2, red).unwrap();
        primitives::aa_line(&mut s, x1, y1, x2, y2, ghost).unwrap();
        primitives::hline(&mut s, x1, x2, y1, red).unwrap();
        primitives::vline(&mut s, x1, y1, y2, red).unwrap();
        primitives::ellipse_outline(&mut s, x1, y1, rx, ry, red).unwrap();
        primitives::ellipse_filled(&mut s, x2, y2, rx, ry, ghost).unwrap();
        primitives::aa_ellipse(&mut s, x1, y2, rx, ry, ghost).unwrap();
        primitives::simple_triangle(&mut s, x2, y1, rx, Orientation::Right, red).unwrap();

        for y in 0..16 {
            for x in 0..16 {
                if !(x >= clip.x && y >= clip.y && x < clip.right() && y < clip.bottom()) {
                    prop_assert_eq!(get_color(&s, x, y), Some(Color::TRANSPARENT), "({}, {})", x, y);
                }
            }
        }
    }
}

/// Mostly near the canvas, sometimes anywhere in `i32`.
fn coord() -> impl Strategy<Value = i32> {
    prop_oneof![3 => -24i32..40, 1 => any::<i32>(), 1 => Just(i32::MIN), 1 => Just(i32::MAX)]
}

#[test]
fn blit_converts_between_formats() {
    let mut src = surface(3, 1, PixelFormatType::Rgb);
    paint(&mut src, |x, _| [Color::rgb(255, 0, 0), Color::rgb(0, 255, 0), Color::rgb(1, 2, 3)][x as usize]);
    let mut dst = surface(3, 1, PixelFormatType::Rgba);
    let dst_rect = dst.bounds();
    blit(&src, &src.bounds(), &mut dst, &dst_rect, None).unwrap();
    assert_eq!(get_color(&dst, 0, 0), Some(Color::rgb(255, 0, 0)));
    assert_eq!(get_color(&dst, 2, 0), Some(Color::rgb(1, 2, 3)));
}

#[test]
fn blit_outside_clip_is_a_no_op() {
    let src = surface(4, 4, PixelFormatType::Argb);
    let mut dst = surface(4, 4, PixelFormatType::Argb);
    let before = dst.pixels().unwrap().to_vec();
    blit(&src, &src.bounds(), &mut dst, &Rect::new(10, 10, 4, 4), None).unwrap();
    blit(&src, &src.bounds(), &mut dst, &Rect::new(0, 0, 4, 4), Some(&Rect::new(0, 0, 0, 0))).unwrap();
    assert_eq!(dst.pixels().unwrap(), &before[..]);
}

#[test]
fn overlapping_glyphs_keep_earlier_alpha() {
    // Columns 0..2 have coverage 200, columns 2..4 coverage 100.
    let mut atlas = vec![0u8; 16];
    atlas[..2].fill(200);
    atlas[2..4].fill(100);
    let texture = GlyphTexture { data: &atlas, stride: 4, format: TextureFormat::Alpha8, size: 4 };
    let first = GlyphDrawInfo { x1: 0, x2: 2, y1: 0, y2: 1, ..Default::default() };
    let second = GlyphDrawInfo { x1: 1, x2: 3, y1: 0, y2: 1, u0: 0.5, ..Default::default() };

    let mut out = vec![0u8; 3 * 4];
    composite_glyphs(&[first, second], &texture, Color::white(), TextEffect::None, 3, 1, &mut out);

    let overlap = read_px(&out, 1) >> 24;
    assert_eq!(overlap, 200 | 100);
    assert!(overlap >= 200);
    assert_eq!(read_px(&out, 0) >> 24, 200);
    assert_eq!(read_px(&out, 2) >> 24, 100);
    assert_eq!(read_px(&out, 1) & 0x00ff_ffff, multiply_color_alpha(0x00ff_ffff, overlap));
}

#[test]
fn multi_color_overlap_takes_the_stronger_glyph() {
    // Texels 0..2 are red at alpha 200, 2..4 blue at alpha 100.
    let mut atlas = vec![0u8; 4 * 4 * 4];
    for x in 0..4 {
        let argb: u32 = if x < 2 { 0xc8ff_0000 } else { 0x6400_00ff };
        atlas[x * 4..x * 4 + 4].copy_from_slice(&argb.to_ne_bytes());
    }
    let texture = GlyphTexture { data: &atlas, stride: 16, format: TextureFormat::Argb32, size: 4 };
    let red = GlyphDrawInfo { x1: 0, x2: 2, y1: 0, y2: 1, ..Default::default() };
    let blue = GlyphDrawInfo { x1: 1, x2: 3, y1: 0, y2: 1, u0: 0.5, ..Default::default() };
    let strong_red = (200 << 24) | multiply_color_alpha(0x00ff_0000, 200);

    for order in [[red, blue], [blue, red]] {
        let mut out = vec![0u8; 3 * 4];
        composite_glyphs(&order, &texture, Color::white(), TextEffect::MultiColor, 3, 1, &mut out);
        assert_eq!(read_px(&out, 1), strong_red);
    }
}

#[test]
fn edge_tiled_keeps_corners_and_tiles_the_middle() {
    init_logging();
    let mut src = surface(6, 6, PixelFormatType::Xrgb);
    paint(&mut src, |x, y| Color::rgb(x as u8 * 40, y as u8 * 40, 0));
    let mut dst = surface(10, 10, PixelFormatType::Xrgb);
    let dst_rect = dst.bounds();
    blit_edge_tiled(&src, &src.bounds(), &mut dst, &dst_rect, &Rect::new(2, 2, 2, 2)).unwrap();

    let at = |s: &Surface<'_>, x, y| get_color(s, x, y).unwrap();
    assert_eq!(at(&dst, 0, 0), at(&src, 0, 0));
    assert_eq!(at(&dst, 9, 0), at(&src, 5, 0));
    assert_eq!(at(&dst, 0, 9), at(&src, 0, 5));
    assert_eq!(at(&dst, 9, 9), at(&src, 5, 5));
    assert_eq!(at(&dst, 5, 1), at(&src, 3, 1));
    assert_eq!(at(&dst, 4, 4), at(&src, 2, 2));
    assert_eq!(at(&dst, 5, 5), at(&src, 3, 3));
}

#[test]
fn translucent_draw_blends_over_dest() {
    init_logging();
    let engine = RasterEngine::default();
    let mut image = surface(4, 4, PixelFormatType::Argb);
    fill_rect_solid(&mut image, None, Color::white()).unwrap();
    let mut dest = surface(4, 4, PixelFormatType::Xrgb);

    let dest_rect = dest.bounds();
    engine
        .draw_surface(&image, &image.bounds(), &mut dest, &dest_rect, &Matrix2D::IDENTITY, 0.5)
        .unwrap();
    assert_eq!(get_color(&dest, 2, 2), Some(Color::rgb(128, 128, 128)));
}

#[test]
fn scaled_draw_fills_the_transformed_box() {
    let engine = RasterEngine::new(RasterConfig {
        transform_filter: SampleFilter::Nearest,
        ..RasterConfig::default()
    });
    let mut image = surface(4, 4, PixelFormatType::Argb);
    fill_rect_solid(&mut image, None, Color::rgb(0, 200, 0)).unwrap();
    let mut dest = surface(12, 12, PixelFormatType::Xrgb);

    let dest_rect = dest.bounds();
    engine
        .draw_surface(&image, &image.bounds(), &mut dest, &dest_rect, &Matrix2D::scale(2.0, 2.0), 1.0)
        .unwrap();
    assert_eq!(get_color(&dest, 0, 0), Some(Color::rgb(0, 200, 0)));
    assert_eq!(get_color(&dest, 7, 7), Some(Color::rgb(0, 200, 0)));
    assert_eq!(get_color(&dest, 8, 8), Some(Color::black()));
}
