//! Glyph run compositing
//!
//! A run of glyphs is stamped from the atlas into one linear ARGB buffer,
//! which is then blitted like any other surface. Glyph boxes are already
//! remapped to top-down buffer space when they get here.

use swraster_core::color::{div255_round, multiply_color_alpha};
use swraster_core::{Color, GlyphTexture, TextureFormat};

/// Placement of one glyph in the run buffer and its atlas source box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphDrawInfo {
    /// Left edge in the buffer
    pub x1: i32,
    /// Right edge (exclusive)
    pub x2: i32,
    /// Top row; before remapping this is the upper (larger) y
    pub y1: i32,
    /// Bottom row (exclusive); before remapping the lower y
    pub y2: i32,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// How glyph color is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEffect {
    /// Pen color, atlas supplies coverage
    #[default]
    None,
    /// Colors come from an ARGB atlas; the strongest alpha wins where
    /// glyphs overlap
    MultiColor,
}

/// Read a native ARGB pixel from the run buffer.
#[inline]
fn read_px(buf: &[u8], index: usize) -> u32 {
    let o = index * 4;
    u32::from_ne_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]])
}

#[inline]
fn write_px(buf: &mut [u8], index: usize, value: u32) {
    let o = index * 4;
    buf[o..o + 4].copy_from_slice(&value.to_ne_bytes());
}

/// Stamp `glyphs` from `texture` into `out`, a `width` x `height` native
/// ARGB buffer that the caller has zeroed.
///
/// With the pen color, each pixel's alpha is `pen_a * coverage / 255` OR'd
/// with the alpha already there, so a kerned neighbor never erases pixels
/// an earlier glyph wrote; RGB is the pen color premultiplied by that
/// alpha. [`TextEffect::MultiColor`] on an ARGB atlas keeps the texel's
/// own color and only writes where its alpha beats the existing one.
///
/// Buffer pixels and texels that fall outside their storage are skipped.
pub fn composite_glyphs(
    glyphs: &[GlyphDrawInfo],
    texture: &GlyphTexture<'_>,
    pen: Color,
    effect: TextEffect,
    width: i32,
    height: i32,
    out: &mut [u8],
) {
    if width <= 0 || height <= 0 {
        return;
    }
    let w = width as usize;
    let pixel_count = (w * height as usize).min(out.len() / 4);
    let pen_a = pen.a as u32;
    let pen_rgb = pen.rgb24();
    let size = texture.size as f32;
    let bpt = texture.format.bytes_per_texel();
    let multi_color = effect == TextEffect::MultiColor && texture.format == TextureFormat::Argb32;

    for gdi in glyphs {
        let glyph_w = gdi.x2 - gdi.x1;
        let glyph_h = gdi.y2 - gdi.y1;
        if glyph_w <= 0 || glyph_h <= 0 {
            continue;
        }
        // A glyph reaching left of the buffer start is drawn from index 0.
        let base = (gdi.y1 as i64 * w as i64 + gdi.x1 as i64).max(0) as usize;
        let tx = (gdi.u0 * size) as i64;
        let ty = (gdi.v0 * size) as i64;
        if tx < 0 || ty < 0 {
            continue;
        }
        let tex_base = ty as usize * texture.stride + tx as usize * bpt;

        for row in 0..glyph_h as usize {
            for col in 0..glyph_w as usize {
                let index = base + row * w + col;
                if index >= pixel_count {
                    continue;
                }
                let texel = tex_base + row * texture.stride + col * bpt;
                if texel + bpt > texture.data.len() {
                    continue;
                }
                let existing_a = read_px(out, index) >> 24;

                match texture.format {
                    TextureFormat::Alpha8 => {
                        let coverage = texture.data[texel] as u32;
                        let a = div255_round(pen_a * coverage) | existing_a;
                        write_px(out, index, (a << 24) | multiply_color_alpha(pen_rgb, a));
                    }
                    TextureFormat::Argb32 => {
                        let tex = u32::from_ne_bytes([
                            texture.data[texel],
                            texture.data[texel + 1],
                            texture.data[texel + 2],
                            texture.data[texel + 3],
                        ]);
                        let glyph_a = tex >> 24;
                        if multi_color {
                            if glyph_a > existing_a {
                                let rgb = multiply_color_alpha(tex & 0x00ff_ffff, glyph_a);
                                write_px(out, index, (glyph_a << 24) | rgb);
                            }
                        } else {
                            let a = div255_round(pen_a * glyph_a) | existing_a;
                            write_px(out, index, (a << 24) | multiply_color_alpha(pen_rgb, a));
                        }
                    }
                }
            }
        }
    }
}
