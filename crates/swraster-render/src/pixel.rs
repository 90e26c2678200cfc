//! Single-pixel and span access in a surface's own format
//!
//! The `_no_clip` variants only check the surface bounds; everything else
//! also honors the clip rect. Translucent writes blend the straight-alpha
//! color over what is already there.

use swraster_core::color::{blend_straight_channel, div255_round};
use swraster_core::{Color, NativeColor, PixelFormat, Surface};

#[inline]
fn in_bounds(surface: &Surface<'_>, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && x < surface.width() && y < surface.height()
}

#[inline]
fn in_clip(surface: &Surface<'_>, x: i32, y: i32) -> bool {
    let clip = surface.clip_rect();
    x >= clip.x && y >= clip.y && x < clip.right() && y < clip.bottom()
}

/// Blend `color` over the pixel stored at the start of `bytes`.
#[inline]
pub fn blend_into(format: &PixelFormat, bytes: &mut [u8], color: Color) {
    match color.a {
        0 => {}
        255 => format.write_color(bytes, color),
        sa => {
            let dst = format.read_color(bytes);
            let sa = sa as u32;
            let out = Color {
                r: blend_straight_channel(color.r as u32, dst.r as u32, sa) as u8,
                g: blend_straight_channel(color.g as u32, dst.g as u32, sa) as u8,
                b: blend_straight_channel(color.b as u32, dst.b as u32, sa) as u8,
                a: (sa + div255_round(dst.a as u32 * (255 - sa))) as u8,
            };
            format.write_color(bytes, out);
        }
    }
}

/// Native value at `(x, y)`, or `None` outside the surface.
pub fn get_pixel(surface: &Surface<'_>, x: i32, y: i32) -> Option<NativeColor> {
    if !in_bounds(surface, x, y) {
        return None;
    }
    let offset = surface.offset_of(x, y);
    let format = surface.pixel_format();
    surface
        .pixels()
        .map(|p| format.read_native(&p[offset..offset + format.bpp()]))
}

/// Decoded color at `(x, y)`.
pub fn get_color(surface: &Surface<'_>, x: i32, y: i32) -> Option<Color> {
    get_pixel(surface, x, y).map(|n| surface.pixel_format().decode(n))
}

pub fn set_pixel_solid(surface: &mut Surface<'_>, x: i32, y: i32, native: NativeColor) {
    if in_clip(surface, x, y) {
        set_pixel_solid_no_clip(surface, x, y, native);
    }
}

pub fn set_pixel_solid_no_clip(surface: &mut Surface<'_>, x: i32, y: i32, native: NativeColor) {
    if !in_bounds(surface, x, y) {
        return;
    }
    let offset = surface.offset_of(x, y);
    let format = *surface.pixel_format();
    if let Some(p) = surface.pixels_mut() {
        format.write_native(&mut p[offset..offset + format.bpp()], native);
    }
}

pub fn set_pixel_blend(surface: &mut Surface<'_>, x: i32, y: i32, color: Color) {
    if in_clip(surface, x, y) {
        set_pixel_blend_no_clip(surface, x, y, color);
    }
}

pub fn set_pixel_blend_no_clip(surface: &mut Surface<'_>, x: i32, y: i32, color: Color) {
    if !in_bounds(surface, x, y) {
        return;
    }
    let offset = surface.offset_of(x, y);
    let format = *surface.pixel_format();
    if let Some(p) = surface.pixels_mut() {
        blend_into(&format, &mut p[offset..offset + format.bpp()], color);
    }
}

/// Plot `color`, taking the solid path when it is opaque.
#[inline]
pub fn plot(surface: &mut Surface<'_>, x: i32, y: i32, color: Color) {
    if color.is_opaque() {
        let native = surface.pixel_format().encode(color);
        set_pixel_solid(surface, x, y, native);
    } else {
        set_pixel_blend(surface, x, y, color);
    }
}

/// Fill the end-inclusive horizontal span `x1..=x2` on row `y`, clipped.
pub(crate) fn span(surface: &mut Surface<'_>, x1: i32, x2: i32, y: i32, color: Color, solid: bool) {
    let clip = surface.clip_rect();
    if y < clip.y || y >= clip.bottom() {
        return;
    }
    let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
    let lo = lo.max(clip.x);
    let hi = hi.min(clip.right() - 1);
    if lo > hi {
        return;
    }

    let format = *surface.pixel_format();
    let bpp = format.bpp();
    let start = surface.offset_of(lo, y);
    let end = start + (hi - lo + 1) as usize * bpp;
    let Some(pixels) = surface.pixels_mut() else {
        return;
    };
    let row = &mut pixels[start..end];

    if solid {
        let mut encoded = [0u8; 4];
        format.write_color(&mut encoded, color);
        for px in row.chunks_exact_mut(bpp) {
            px.copy_from_slice(&encoded[..bpp]);
        }
    } else {
        for px in row.chunks_exact_mut(bpp) {
            blend_into(&format, px, color);
        }
    }
}
