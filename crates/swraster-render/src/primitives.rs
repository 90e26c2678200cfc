//! Rectangles, lines, ellipses and polygons
//!
//! Coordinates are integer pixels. Two-point draws (`hline`, `line`, ...)
//! include both end points; rect fills cover `x..x+w` like a blit. Every
//! draw clips to the surface clip rect, and a draw that lands entirely
//! outside it is a successful no-op.

use swraster_core::{Color, RasterError, Rect, Result, Surface};

use crate::pixel::{plot, set_pixel_blend, span};

/// Which way a [`simple_triangle`] points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Left,
    Up,
    Right,
    Down,
}

fn fill_rows(surface: &mut Surface<'_>, rect: &Rect, color: Color, solid: bool) -> Result<()> {
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    let area = rect.intersection(&surface.clip_rect());
    if area.is_empty() {
        return Ok(());
    }
    log::trace!("fill {:?} solid={} color={:08x}", area, solid, color.to_argb());
    for y in area.y..area.bottom() {
        span(surface, area.x, area.right() - 1, y, color, solid);
    }
    Ok(())
}

/// Overwrite `rect` with `color`, alpha included. `None` fills the clip rect.
pub fn fill_rect_solid(surface: &mut Surface<'_>, rect: Option<&Rect>, color: Color) -> Result<()> {
    let rect = rect.copied().unwrap_or_else(|| surface.clip_rect());
    fill_rows(surface, &rect, color, true)
}

/// Blend `color` over `rect`. `None` blends over the clip rect.
pub fn fill_rect_blend(surface: &mut Surface<'_>, rect: Option<&Rect>, color: Color) -> Result<()> {
    let rect = rect.copied().unwrap_or_else(|| surface.clip_rect());
    fill_rows(surface, &rect, color, false)
}

/// Fill `rect`, taking the solid path for opaque colors.
pub fn fill_rect(surface: &mut Surface<'_>, rect: &Rect, color: Color) -> Result<()> {
    fill_rows(surface, rect, color, color.is_opaque())
}

/// One-pixel outline along the inside edge of `rect`.
pub fn rectangle_outline(surface: &mut Surface<'_>, rect: &Rect, color: Color) -> Result<()> {
    if rect.is_empty() {
        return Ok(());
    }
    let (x1, y1) = (rect.x, rect.y);
    let (x2, y2) = (rect.right() - 1, rect.bottom() - 1);

    hline(surface, x1, x2, y1, color)?;
    if y2 != y1 {
        hline(surface, x1, x2, y2, color)?;
    }
    if y2 - y1 > 1 {
        vline(surface, x1, y1 + 1, y2 - 1, color)?;
        if x2 != x1 {
            vline(surface, x2, y1 + 1, y2 - 1, color)?;
        }
    }
    Ok(())
}

/// Horizontal line from `x1` to `x2` inclusive.
pub fn hline(surface: &mut Surface<'_>, x1: i32, x2: i32, y: i32, color: Color) -> Result<()> {
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    span(surface, x1, x2, y, color, color.is_opaque());
    Ok(())
}

/// Vertical line from `y1` to `y2` inclusive.
pub fn vline(surface: &mut Surface<'_>, x: i32, y1: i32, y2: i32, color: Color) -> Result<()> {
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    let clip = surface.clip_rect();
    if x < clip.x || x >= clip.right() {
        return Ok(());
    }
    let (lo, hi) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
    for y in lo.max(clip.y)..=hi.min(clip.bottom() - 1) {
        plot(surface, x, y, color);
    }
    Ok(())
}

/// Narrow an intermediate coordinate back to pixel space. Values past
/// `i32` are off every surface, so saturating keeps them off.
fn to_px(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Pixels of the clip rect along one axis, end-inclusive.
fn clip_span(clip: &Rect, horizontal: bool) -> (i64, i64) {
    if horizontal {
        (i64::from(clip.x), i64::from(clip.right()) - 1)
    } else {
        (i64::from(clip.y), i64::from(clip.bottom()) - 1)
    }
}

/// Bresenham line, both end points included.
///
/// Only the stretch of the major axis inside the clip rect is walked; the
/// minor coordinate of each step is solved directly.
pub fn line(surface: &mut Surface<'_>, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Result<()> {
    if y1 == y2 {
        return hline(surface, x1, x2, y1, color);
    }
    if x1 == x2 {
        return vline(surface, x1, y1, y2, color);
    }
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    let clip = surface.clip_rect();
    if clip.is_empty() {
        return Ok(());
    }

    let (x1, y1, x2, y2) = (i64::from(x1), i64::from(y1), i64::from(x2), i64::from(y2));
    let x_major = (x2 - x1).abs() >= (y2 - y1).abs();
    let (a1, b1, a2, b2) = if x_major { (x1, y1, x2, y2) } else { (y1, x1, y2, x2) };
    let (da, db) = (i128::from((a2 - a1).abs()), i128::from((b2 - b1).abs()));
    let sb = (b2 - b1).signum();
    let (lo, hi) = clip_span(&clip, x_major);

    for a in a1.min(a2).max(lo)..=a1.max(a2).min(hi) {
        let t = i128::from((a - a1).abs());
        let step = ((2 * t * db + da) / (2 * da)) as i64;
        let b = b1 + sb * step;
        let (x, y) = if x_major { (a, b) } else { (b, a) };
        plot(surface, to_px(x), to_px(y), color);
    }
    Ok(())
}

/// Xiaolin Wu antialiased line.
pub fn aa_line(surface: &mut Surface<'_>, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Result<()> {
    if x1 == x2 || y1 == y2 {
        return line(surface, x1, y1, x2, y2, color);
    }
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }

    let (mut ax, mut ay, mut bx, mut by) = (f64::from(x1), f64::from(y1), f64::from(x2), f64::from(y2));
    let steep = (by - ay).abs() > (bx - ax).abs();
    if steep {
        std::mem::swap(&mut ax, &mut ay);
        std::mem::swap(&mut bx, &mut by);
    }
    if ax > bx {
        std::mem::swap(&mut ax, &mut bx);
        std::mem::swap(&mut ay, &mut by);
    }
    let gradient = (by - ay) / (bx - ax);
    let (lo, hi) = clip_span(&surface.clip_rect(), !steep);

    let mut put = |major: i64, minor: f64, coverage: f64| {
        let a = (color.a as f64 * coverage).round() as u8;
        if a == 0 {
            return;
        }
        let c = color.with_alpha(a);
        // `as` saturates, and saturated values fall outside the clip.
        let (major, minor) = (to_px(major), minor as i32);
        if steep {
            set_pixel_blend(surface, minor, major, c);
        } else {
            set_pixel_blend(surface, major, minor, c);
        }
    };

    for major in (ax as i64).max(lo)..=(bx as i64).min(hi) {
        let inter_y = ay + gradient * (major as f64 - ax);
        let base = inter_y.floor();
        let frac = inter_y - base;
        put(major, base, 1.0 - frac);
        put(major, base + 1.0, frac);
    }
    Ok(())
}

/// Half-width of an ellipse row `dy` away from the center.
fn ellipse_half_width(rx: i64, ry: i64, dy: i64) -> i64 {
    let t = dy as f64 / ry as f64;
    (rx as f64 * (1.0 - t * t).max(0.0).sqrt()).round() as i64
}

fn degenerate_ellipse(surface: &mut Surface<'_>, x: i32, y: i32, rx: i32, ry: i32, color: Color) -> Result<()> {
    match (rx, ry) {
        (0, 0) => {
            plot(surface, x, y, color);
            Ok(())
        }
        (0, _) => vline(surface, x, y.saturating_sub(ry), y.saturating_add(ry), color),
        _ => hline(surface, x.saturating_sub(rx), x.saturating_add(rx), y, color),
    }
}

/// Horizontal span `x1..=x2` on row `y` with 64-bit inputs.
fn span_wide(surface: &mut Surface<'_>, x1: i64, x2: i64, y: i64, color: Color) {
    span(surface, to_px(x1), to_px(x2), to_px(y), color, color.is_opaque());
}

/// Whether the box `x - rx ..= x + rx` by `y - ry ..= y + ry` misses `clip`.
fn outside_clip(clip: &Rect, x: i64, y: i64, rx: i64, ry: i64) -> bool {
    let (left, right) = clip_span(clip, true);
    let (top, bottom) = clip_span(clip, false);
    x + rx < left || x - rx > right || y + ry < top || y - ry > bottom
}

/// Ellipse outline centered on `(x, y)`. Each pixel is touched once, so
/// translucent outlines blend evenly.
pub fn ellipse_outline(surface: &mut Surface<'_>, x: i32, y: i32, rx: i32, ry: i32, color: Color) -> Result<()> {
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    if rx < 0 || ry < 0 {
        return Ok(());
    }
    if rx == 0 || ry == 0 {
        return degenerate_ellipse(surface, x, y, rx, ry, color);
    }
    let clip = surface.clip_rect();
    let (x, y, rx, ry) = (i64::from(x), i64::from(y), i64::from(rx), i64::from(ry));
    if outside_clip(&clip, x, y, rx, ry) {
        return Ok(());
    }
    let (top, bottom) = clip_span(&clip, false);

    // Lower half first (dy >= 0), then the mirrored upper half (dy >= 1).
    for sign in [1i64, -1] {
        let (lo, hi) = if sign == 1 { (top - y, bottom - y) } else { (y - bottom, y - top) };
        let first = lo.max(if sign == 1 { 0 } else { 1 });
        for dy in first..=hi.min(ry) {
            let outer = ellipse_half_width(rx, ry, dy);
            let inner = if dy == ry { -1 } else { ellipse_half_width(rx, ry, dy + 1) };
            let lo = (inner + 1).min(outer);
            let row = y + sign * dy;
            if lo == 0 {
                span_wide(surface, x - outer, x + outer, row, color);
            } else {
                span_wide(surface, x - outer, x - lo, row, color);
                span_wide(surface, x + lo, x + outer, row, color);
            }
        }
    }
    Ok(())
}

pub fn circle(surface: &mut Surface<'_>, x: i32, y: i32, r: i32, color: Color) -> Result<()> {
    ellipse_outline(surface, x, y, r, r, color)
}

/// Filled ellipse centered on `(x, y)`.
pub fn ellipse_filled(surface: &mut Surface<'_>, x: i32, y: i32, rx: i32, ry: i32, color: Color) -> Result<()> {
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    if rx < 0 || ry < 0 {
        return Ok(());
    }
    if rx == 0 || ry == 0 {
        return degenerate_ellipse(surface, x, y, rx, ry, color);
    }
    let clip = surface.clip_rect();
    let (x, y, rx, ry) = (i64::from(x), i64::from(y), i64::from(rx), i64::from(ry));
    if outside_clip(&clip, x, y, rx, ry) {
        return Ok(());
    }
    let (top, bottom) = clip_span(&clip, false);
    for dy in (-ry).max(top - y)..=ry.min(bottom - y) {
        let w = ellipse_half_width(rx, ry, dy);
        span_wide(surface, x - w, x + w, y + dy, color);
    }
    Ok(())
}

/// Antialiased ellipse outline: coverage falls off with distance from the
/// ideal curve.
pub fn aa_ellipse(surface: &mut Surface<'_>, x: i32, y: i32, rx: i32, ry: i32, color: Color) -> Result<()> {
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    if rx <= 0 || ry <= 0 {
        return ellipse_outline(surface, x, y, rx, ry, color);
    }
    let clip = surface.clip_rect();
    let (cx, cy, erx, ery) = (i64::from(x), i64::from(y), i64::from(rx) + 1, i64::from(ry) + 1);
    if outside_clip(&clip, cx, cy, erx, ery) {
        return Ok(());
    }
    let (left, right) = clip_span(&clip, true);
    let (top, bottom) = clip_span(&clip, false);
    let (frx, fry) = (f64::from(rx), f64::from(ry));
    let scale = frx.min(fry);

    for py in (cy - ery).max(top)..=(cy + ery).min(bottom) {
        for px in (cx - erx).max(left)..=(cx + erx).min(right) {
            let nx = (px - cx) as f64 / frx;
            let ny = (py - cy) as f64 / fry;
            let distance = ((nx * nx + ny * ny).sqrt() - 1.0) * scale;
            let coverage = (1.0 - distance.abs()).clamp(0.0, 1.0);
            if coverage > 0.0 {
                let a = (color.a as f64 * coverage).round() as u8;
                set_pixel_blend(surface, to_px(px), to_px(py), color.with_alpha(a));
            }
        }
    }
    Ok(())
}

/// Filled isosceles triangle inside the box at `(x, y)` whose base is
/// `2 * size - 1` pixels, pointing toward `orientation`.
pub fn simple_triangle(
    surface: &mut Surface<'_>,
    x: i32,
    y: i32,
    size: i32,
    orientation: Orientation,
    color: Color,
) -> Result<()> {
    if size <= 0 {
        return Ok(());
    }
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }
    let (x, y, last) = (i64::from(x), i64::from(y), i64::from(size) - 1);
    let horizontal_rows = matches!(orientation, Orientation::Up | Orientation::Down);
    let (lo, hi) = clip_span(&surface.clip_rect(), !horizontal_rows);
    let origin = if horizontal_rows { y } else { x };
    for i in (lo - origin).max(0)..=(hi - origin).min(last) {
        let (a, b, at) = match orientation {
            Orientation::Down => (x + i, x + 2 * last - i, y + i),
            Orientation::Up => (x + last - i, x + last + i, y + i),
            Orientation::Right => (y + i, y + 2 * last - i, x + i),
            Orientation::Left => (y + last - i, y + last + i, x + i),
        };
        if horizontal_rows {
            hline(surface, to_px(a), to_px(b), to_px(at), color)?;
        } else {
            vline(surface, to_px(at), to_px(a), to_px(b), color)?;
        }
    }
    Ok(())
}

fn check_vertices(vx: &[i32], vy: &[i32]) -> Result<()> {
    if vx.len() != vy.len() {
        return Err(RasterError::other(format!(
            "polygon has {} x and {} y coordinates",
            vx.len(),
            vy.len()
        )));
    }
    Ok(())
}

/// Closed polygon outline.
pub fn polygon_outline(surface: &mut Surface<'_>, vx: &[i32], vy: &[i32], color: Color) -> Result<()> {
    check_vertices(vx, vy)?;
    let n = vx.len();
    if n < 3 {
        return Ok(());
    }
    for i in 0..n {
        let j = (i + 1) % n;
        line(surface, vx[i], vy[i], vx[j], vy[j], color)?;
    }
    Ok(())
}

/// Reusable edge-intersection buffer for [`polygon_filled`]
#[derive(Debug, Default)]
pub struct PolygonScratch {
    ints: Vec<i64>,
}

impl PolygonScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(&self) -> usize {
        self.ints.capacity()
    }
}

/// Scanline polygon fill with the even-odd rule.
///
/// Edge crossings are kept in 16.16 fixed point and rounded to the nearest
/// pixel, so abutting polygons share no pixels.
pub fn polygon_filled(
    surface: &mut Surface<'_>,
    vx: &[i32],
    vy: &[i32],
    color: Color,
    scratch: &mut PolygonScratch,
) -> Result<()> {
    check_vertices(vx, vy)?;
    let n = vx.len();
    if n < 3 {
        return Ok(());
    }
    if !surface.is_allocated() {
        return Err(RasterError::NotAllocated);
    }

    let (Some(&miny), Some(&maxy)) = (vy.iter().min(), vy.iter().max()) else {
        return Ok(());
    };
    let clip = surface.clip_rect();
    let solid = color.is_opaque();
    let ints = &mut scratch.ints;

    for y in miny.max(clip.y)..=maxy.min(clip.bottom() - 1) {
        ints.clear();
        for i in 0..n {
            let prev = if i == 0 { n - 1 } else { i - 1 };
            let (mut ya, mut yb) = (vy[prev], vy[i]);
            let (mut xa, mut xb) = (vx[prev], vx[i]);
            if ya > yb {
                std::mem::swap(&mut ya, &mut yb);
                std::mem::swap(&mut xa, &mut xb);
            } else if ya == yb {
                continue;
            }
            if (y >= ya && y < yb) || (y == maxy && y > ya && y <= yb) {
                let t = 65536 * (i64::from(y) - i64::from(ya)) / (i64::from(yb) - i64::from(ya));
                ints.push(t * (i64::from(xb) - i64::from(xa)) + 65536 * i64::from(xa));
            }
        }
        ints.sort_unstable();

        for pair in ints.chunks_exact(2) {
            let a = pair[0] + 1;
            let a = (a >> 16) + ((a & 32768) >> 15);
            let b = pair[1] - 1;
            let b = (b >> 16) + ((b & 32768) >> 15);
            span(surface, to_px(a), to_px(b), y, color, solid);
        }
    }
    Ok(())
}
