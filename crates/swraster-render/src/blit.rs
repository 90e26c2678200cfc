//! Clipped surface-to-surface copies
//!
//! A blit copies a source rect to a position in the destination. The area
//! actually touched is the three-way intersection of the source rect with
//! the source bounds, the destination rect, and the destination clip rect
//! (optionally narrowed further by an explicit clip). An empty intersection
//! is a successful no-op.
//!
//! Surfaces with an alpha channel are treated as premultiplied and blended
//! source-over; everything else is copied, converting formats as needed.

use swraster_core::color::{blend_premultiplied_channel, NativeColor};
use swraster_core::{Color, PixelFormat, RasterError, Rect, Result, Surface, SurfaceFlags};

/// How pixels move from source to destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitMode {
    /// Identical formats, no blending: row copies
    Copy,
    /// Premultiplied source-over
    Blend,
    /// Differing formats, no blending: per-pixel conversion
    Convert,
}

/// Pick the blit routine for a source/destination pair.
pub fn select_blit_mode(src_format: &PixelFormat, src_flags: SurfaceFlags, dst_format: &PixelFormat) -> BlitMode {
    if src_format.has_alpha() && !src_flags.contains(SurfaceFlags::DISABLE_ALPHA) {
        BlitMode::Blend
    } else if src_format.format_type == dst_format.format_type {
        BlitMode::Copy
    } else {
        BlitMode::Convert
    }
}

/// Source and destination pixels of one clipped blit
#[derive(Debug)]
pub struct BlitInfo<'s, 'd> {
    pub src: &'s [u8],
    pub src_stride: usize,
    pub src_format: PixelFormat,
    pub dst: &'d mut [u8],
    pub dst_stride: usize,
    pub dst_format: PixelFormat,
    /// Size of the copied area in pixels
    pub width: usize,
    pub height: usize,
}

impl BlitInfo<'_, '_> {
    pub fn run(&mut self, mode: BlitMode) {
        match mode {
            BlitMode::Copy => self.copy_rows(),
            BlitMode::Blend => self.blend_rows(),
            BlitMode::Convert => self.convert_rows(),
        }
    }

    fn rows(&mut self) -> impl Iterator<Item = (&[u8], &mut [u8])> {
        let src_len = self.width * self.src_format.bpp();
        let dst_len = self.width * self.dst_format.bpp();
        self.src
            .chunks(self.src_stride)
            .zip(self.dst.chunks_mut(self.dst_stride))
            .take(self.height)
            .map(move |(s, d)| (&s[..src_len], &mut d[..dst_len]))
    }

    fn copy_rows(&mut self) {
        for (s, d) in self.rows() {
            d.copy_from_slice(s);
        }
    }

    fn convert_rows(&mut self) {
        let (sf, df) = (self.src_format, self.dst_format);
        for (s, d) in self.rows() {
            for (sp, dp) in s.chunks_exact(sf.bpp()).zip(d.chunks_exact_mut(df.bpp())) {
                df.write_color(dp, sf.read_color(sp));
            }
        }
    }

    fn blend_rows(&mut self) {
        let (sf, df) = (self.src_format, self.dst_format);
        for (s, d) in self.rows() {
            for (sp, dp) in s.chunks_exact(sf.bpp()).zip(d.chunks_exact_mut(df.bpp())) {
                let src = sf.read_color(sp);
                match src.a {
                    0 if src.r == 0 && src.g == 0 && src.b == 0 => {}
                    255 => df.write_color(dp, src),
                    _ => {
                        let dst = df.read_color(dp);
                        df.write_color(dp, blend_over(src, dst));
                    }
                }
            }
        }
    }
}

#[inline]
fn blend_over(src: Color, dst: Color) -> Color {
    let sa = src.a as u32;
    Color {
        r: blend_premultiplied_channel(src.r as u32, dst.r as u32, sa) as u8,
        g: blend_premultiplied_channel(src.g as u32, dst.g as u32, sa) as u8,
        b: blend_premultiplied_channel(src.b as u32, dst.b as u32, sa) as u8,
        a: blend_premultiplied_channel(sa, dst.a as u32, sa) as u8,
    }
}

/// Blend one premultiplied native pixel over another of the same format.
pub fn blend_native(format: &PixelFormat, src: NativeColor, dst: NativeColor) -> NativeColor {
    format.encode(blend_over(format.decode(src), format.decode(dst)))
}

/// Clip a blit against source bounds, destination rect and `dest_clip`.
///
/// Returns the matching source and destination areas, or `None` when
/// nothing is left to copy.
fn clip_areas(src_bounds: Rect, src_rect: &Rect, dst_rect: &Rect, dest_clip: Rect) -> Option<(Rect, Rect)> {
    let (mut sx, mut sy, mut w, mut h) = (src_rect.x, src_rect.y, src_rect.w, src_rect.h);
    let (mut dx, mut dy) = (dst_rect.x, dst_rect.y);

    if sx < src_bounds.x {
        let d = src_bounds.x - sx;
        sx += d;
        dx += d;
        w -= d;
    }
    if sy < src_bounds.y {
        let d = src_bounds.y - sy;
        sy += d;
        dy += d;
        h -= d;
    }
    w = w.min(src_bounds.right() - sx).min(dst_rect.w);
    h = h.min(src_bounds.bottom() - sy).min(dst_rect.h);

    if dx < dest_clip.x {
        let d = dest_clip.x - dx;
        sx += d;
        dx += d;
        w -= d;
    }
    if dy < dest_clip.y {
        let d = dest_clip.y - dy;
        sy += d;
        dy += d;
        h -= d;
    }
    w = w.min(dest_clip.right() - dx);
    h = h.min(dest_clip.bottom() - dy);

    if w <= 0 || h <= 0 {
        return None;
    }
    Some((Rect::new(sx, sy, w, h), Rect::new(dx, dy, w, h)))
}

/// Source and destination areas of a blit after clipping, or `None` when
/// the blit would touch nothing.
pub fn clip_for_blit(
    src: &Surface<'_>,
    src_rect: &Rect,
    dst: &Surface<'_>,
    dst_rect: &Rect,
) -> Option<(Rect, Rect)> {
    clip_areas(src.bounds(), src_rect, dst_rect, dst.clip_rect())
}

fn blit_areas(src: &Surface<'_>, src_area: Rect, dst: &mut Surface<'_>, dst_area: Rect) -> Result<()> {
    let mode = select_blit_mode(src.pixel_format(), src.flags(), dst.pixel_format());
    log::trace!("blit {:?} -> {:?} ({:?})", src_area, dst_area, mode);

    let src_format = *src.pixel_format();
    let dst_format = *dst.pixel_format();
    let src_stride = src.stride();
    let dst_stride = dst.stride();
    let src_start = src.offset_of(src_area.x, src_area.y);
    let dst_start = dst.offset_of(dst_area.x, dst_area.y);

    let src_pixels = src.pixels().ok_or(RasterError::NotAllocated)?;
    let dst_pixels = dst.pixels_mut().ok_or(RasterError::NotAllocated)?;

    let mut info = BlitInfo {
        src: &src_pixels[src_start..],
        src_stride,
        src_format,
        dst: &mut dst_pixels[dst_start..],
        dst_stride,
        dst_format,
        width: src_area.w as usize,
        height: src_area.h as usize,
    };
    info.run(mode);
    Ok(())
}

/// Copy `src_rect` of `src` to `dst_rect` of `dst`, clipped to the
/// destination clip rect and, when given, `clip`.
pub fn blit(
    src: &Surface<'_>,
    src_rect: &Rect,
    dst: &mut Surface<'_>,
    dst_rect: &Rect,
    clip: Option<&Rect>,
) -> Result<()> {
    let dest_clip = match clip {
        Some(c) => c.intersection(&dst.clip_rect()),
        None => dst.clip_rect(),
    };
    match clip_areas(src.bounds(), src_rect, dst_rect, dest_clip) {
        Some((src_area, dst_area)) => blit_areas(src, src_area, dst, dst_area),
        None => {
            log::trace!("blit {:?} -> {:?} clipped away", src_rect, dst_rect);
            Ok(())
        }
    }
}

/// Like [`blit`] but ignoring the destination clip rect; only the
/// destination bounds limit the copy.
pub fn blit_no_clip(src: &Surface<'_>, src_rect: &Rect, dst: &mut Surface<'_>, dst_rect: &Rect) -> Result<()> {
    match clip_areas(src.bounds(), src_rect, dst_rect, dst.bounds()) {
        Some((src_area, dst_area)) => blit_areas(src, src_area, dst, dst_area),
        None => Ok(()),
    }
}

/// Repeat `src_rect` over `dst_rect`.
///
/// The tile grid is anchored `(offset_x, offset_y)` pixels into the
/// destination rect, so a tile starts at `dst_rect.x + offset_x` and the
/// grid extends both ways from there. Tiles are clipped to `dst_rect`.
pub fn blit_tiled(
    src: &Surface<'_>,
    src_rect: &Rect,
    dst: &mut Surface<'_>,
    dst_rect: &Rect,
    offset_x: i32,
    offset_y: i32,
) -> Result<()> {
    let tile = src_rect.intersection(&src.bounds());
    if tile.is_empty() || dst_rect.is_empty() {
        return Ok(());
    }
    let ox = offset_x.rem_euclid(tile.w);
    let oy = offset_y.rem_euclid(tile.h);
    let start_x = dst_rect.x + ox - if ox > 0 { tile.w } else { 0 };
    let start_y = dst_rect.y + oy - if oy > 0 { tile.h } else { 0 };

    let mut y = start_y;
    while y < dst_rect.bottom() {
        let mut x = start_x;
        while x < dst_rect.right() {
            blit(src, &tile, dst, &Rect::new(x, y, tile.w, tile.h), Some(dst_rect))?;
            x += tile.w;
        }
        y += tile.h;
    }
    Ok(())
}

/// 9-slice draw of `src_rect` over `dst_rect`.
///
/// `center` is relative to `src_rect` and splits it into corners, edges
/// and middle. Corners keep their size, edges tile along their length and
/// the middle tiles both ways. A destination smaller than the corners
/// leaves the middle row and column empty.
pub fn blit_edge_tiled(
    src: &Surface<'_>,
    src_rect: &Rect,
    dst: &mut Surface<'_>,
    dst_rect: &Rect,
    center: &Rect,
) -> Result<()> {
    if src_rect.is_empty() || dst_rect.is_empty() {
        return Ok(());
    }
    let left = center.x.clamp(0, src_rect.w);
    let top = center.y.clamp(0, src_rect.h);
    let right = (src_rect.w - center.right()).clamp(0, src_rect.w - left);
    let bottom = (src_rect.h - center.bottom()).clamp(0, src_rect.h - top);

    let src_cols = [
        (src_rect.x, left),
        (src_rect.x + left, src_rect.w - left - right),
        (src_rect.right() - right, right),
    ];
    let src_rows = [
        (src_rect.y, top),
        (src_rect.y + top, src_rect.h - top - bottom),
        (src_rect.bottom() - bottom, bottom),
    ];
    let mid_w = (dst_rect.w - left - right).max(0);
    let mid_h = (dst_rect.h - top - bottom).max(0);
    let dst_cols = [
        (dst_rect.x, left),
        (dst_rect.x + left, mid_w),
        (dst_rect.x + left + mid_w, right),
    ];
    let dst_rows = [
        (dst_rect.y, top),
        (dst_rect.y + top, mid_h),
        (dst_rect.y + top + mid_h, bottom),
    ];

    for (row, (&(sy, sh), &(dy, dh))) in src_rows.iter().zip(dst_rows.iter()).enumerate() {
        for (col, (&(sx, sw), &(dx, dw))) in src_cols.iter().zip(dst_cols.iter()).enumerate() {
            let src_cell = Rect::new(sx, sy, sw, sh);
            let dst_cell = Rect::new(dx, dy, dw, dh).intersection(dst_rect);
            if src_cell.is_empty() || dst_cell.is_empty() {
                continue;
            }
            if row != 1 && col != 1 {
                blit(src, &src_cell, dst, &dst_cell, Some(dst_rect))?;
            } else {
                blit_tiled(src, &src_cell, dst, &dst_cell, 0, 0)?;
            }
        }
    }
    Ok(())
}
