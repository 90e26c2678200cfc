//! Intermediate surfaces for alpha, affine transforms and resampling
//!
//! Every function here returns a new ARGB surface holding premultiplied
//! color and leaves its input untouched.

use swraster_core::color::div255_round;
use swraster_core::{
    Color, Matrix2D, PixelFormatType, RasterError, Rect, Result, SampleFilter, Surface,
    SurfaceCategory,
};

/// Premultiplied ARGB texel in floating point, used while filtering.
#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl Accum {
    fn add(&mut self, c: Color, weight: f64) {
        self.r += c.r as f64 * weight;
        self.g += c.g as f64 * weight;
        self.b += c.b as f64 * weight;
        self.a += c.a as f64 * weight;
    }

    fn to_color(self) -> Color {
        let q = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Color::rgba(q(self.r), q(self.g), q(self.b), q(self.a))
    }
}

/// Read-only view over the source pixels, restricted to one rect.
struct Sampler<'s, 'a> {
    src: &'s Surface<'a>,
    pixels: &'s [u8],
    /// Requested rect; texel `(0, 0)` is its top-left corner
    rect: Rect,
    /// Part of `rect` that lies on the source
    area: Rect,
}

impl<'s, 'a> Sampler<'s, 'a> {
    fn new(src: &'s Surface<'a>, rect: Rect) -> Result<Self> {
        let pixels = src.pixels().ok_or(RasterError::NotAllocated)?;
        Ok(Self {
            src,
            pixels,
            rect,
            area: rect.intersection(&src.bounds()),
        })
    }

    /// Texel relative to the requested rect; transparent off the source.
    fn texel(&self, x: i32, y: i32) -> Color {
        let sx = i64::from(self.rect.x) + i64::from(x);
        let sy = i64::from(self.rect.y) + i64::from(y);
        let area = &self.area;
        if sx < i64::from(area.x)
            || sy < i64::from(area.y)
            || sx >= i64::from(area.right())
            || sy >= i64::from(area.bottom())
        {
            return Color::TRANSPARENT;
        }
        let offset = self.src.offset_of(sx as i32, sy as i32);
        self.src.pixel_format().read_color(&self.pixels[offset..])
    }

    fn nearest(&self, u: f64, v: f64) -> Color {
        self.texel(u.floor() as i32, v.floor() as i32)
    }

    /// Bilinear sample at `(u, v)` in area space, texel centers at `+0.5`.
    fn bilinear(&self, u: f64, v: f64) -> Color {
        let (u, v) = (u - 0.5, v - 0.5);
        let (x0, y0) = (u.floor(), v.floor());
        let (fx, fy) = (u - x0, v - y0);
        let (x0, y0) = (x0 as i32, y0 as i32);

        let mut acc = Accum::default();
        acc.add(self.texel(x0, y0), (1.0 - fx) * (1.0 - fy));
        acc.add(self.texel(x0 + 1, y0), fx * (1.0 - fy));
        acc.add(self.texel(x0, y0 + 1), (1.0 - fx) * fy);
        acc.add(self.texel(x0 + 1, y0 + 1), fx * fy);
        acc.to_color()
    }

    fn sample(&self, u: f64, v: f64, filter: SampleFilter) -> Color {
        match filter {
            SampleFilter::Nearest => self.nearest(u, v),
            SampleFilter::Bilinear => self.bilinear(u, v),
        }
    }
}

fn write_argb(out: &mut Surface<'_>, x: i32, y: i32, color: Color) {
    let offset = out.offset_of(x, y);
    let format = *out.pixel_format();
    if let Some(p) = out.pixels_mut() {
        format.write_color(&mut p[offset..], color);
    }
}

/// Copy of `src` with every channel scaled by `alpha / 255`.
///
/// The copy keeps premultiplied sources premultiplied and records `alpha`
/// as its surface alpha.
pub fn create_transparent_surface(src: &Surface<'_>, alpha: u8) -> Result<Surface<'static>> {
    let (w, h) = src.dimensions();
    let mut out = Surface::create(w, h, PixelFormatType::Argb, SurfaceCategory::Scratch)?;
    out.set_surface_alpha(alpha);

    let pixels = src.pixels().ok_or(RasterError::NotAllocated)?;
    let src_format = *src.pixel_format();
    let a = alpha as u32;
    let scale = |c: u8| div255_round(c as u32 * a) as u8;

    for y in 0..h {
        for x in 0..w {
            let c = src_format.read_color(&pixels[src.offset_of(x, y)..]);
            let faded = Color::rgba(scale(c.r), scale(c.g), scale(c.b), scale(c.a));
            write_argb(&mut out, x, y, faded);
        }
    }
    log::debug!("Created {}x{} transparent surface at alpha {}", w, h, alpha);
    Ok(out)
}

/// Resample `src_rect` of `src` through `matrix`.
///
/// The result covers the transformed bounding box of the rect and nothing
/// else, so callers draw all of it. A singular matrix has no image and is
/// reported as an error.
pub fn transform_surface(
    src: &Surface<'_>,
    src_rect: &Rect,
    matrix: &Matrix2D,
    filter: SampleFilter,
) -> Result<Surface<'static>> {
    let inverse = matrix
        .inverse()
        .ok_or_else(|| RasterError::other("transform is not invertible"))?;
    let local = Rect::from_size(src_rect.w, src_rect.h);
    let bounds = matrix.map_rect_bounds(&local);
    if bounds.is_empty() {
        return Err(RasterError::InvalidDimensions {
            width: bounds.w,
            height: bounds.h,
        });
    }

    let sampler = Sampler::new(src, *src_rect)?;
    let mut out = Surface::create(bounds.w, bounds.h, PixelFormatType::Argb, SurfaceCategory::Zoom)?;

    for oy in 0..bounds.h {
        for ox in 0..bounds.w {
            let cx = (bounds.x + ox) as f64 + 0.5;
            let cy = (bounds.y + oy) as f64 + 0.5;
            let (u, v) = inverse.map_point(cx, cy);
            let c = sampler.sample(u, v, filter);
            if c.a != 0 || c.r != 0 || c.g != 0 || c.b != 0 {
                write_argb(&mut out, ox, oy, c);
            }
        }
    }
    log::debug!(
        "Transformed {:?} into {}x{} surface ({:?})",
        src_rect,
        bounds.w,
        bounds.h,
        filter
    );
    Ok(out)
}

/// Size of a surface zoomed by `zoom_x` x `zoom_y`, never below 1x1.
pub fn zoom_surface_size(width: i32, height: i32, zoom_x: f64, zoom_y: f64) -> (i32, i32) {
    let w = ((width as f64) * zoom_x.abs()).round().max(1.0) as i32;
    let h = ((height as f64) * zoom_y.abs()).round().max(1.0) as i32;
    (w, h)
}

/// Scale the whole of `src`. Negative factors mirror; `smooth` selects
/// bilinear filtering.
pub fn zoom_surface(src: &Surface<'_>, zoom_x: f64, zoom_y: f64, smooth: bool) -> Result<Surface<'static>> {
    if zoom_x == 0.0 || zoom_y == 0.0 {
        return Err(RasterError::other("zoom factor must be non-zero"));
    }
    let (w, h) = src.dimensions();
    let (out_w, out_h) = zoom_surface_size(w, h, zoom_x, zoom_y);
    let sx = out_w as f64 / w.max(1) as f64;
    let sy = out_h as f64 / h.max(1) as f64;
    let filter = if smooth { SampleFilter::Bilinear } else { SampleFilter::Nearest };

    let sampler = Sampler::new(src, src.bounds())?;
    let mut out = Surface::create(out_w, out_h, PixelFormatType::Argb, SurfaceCategory::Zoom)?;
    for oy in 0..out_h {
        for ox in 0..out_w {
            let tx = if zoom_x < 0.0 { out_w - 1 - ox } else { ox };
            let ty = if zoom_y < 0.0 { out_h - 1 - oy } else { oy };
            let u = (tx as f64 + 0.5) / sx;
            let v = (ty as f64 + 0.5) / sy;
            write_argb(&mut out, ox, oy, sampler.sample(u, v, filter));
        }
    }
    Ok(out)
}

/// Shrink by integer factors, averaging each `factor_x` x `factor_y` box.
pub fn shrink_surface(src: &Surface<'_>, factor_x: i32, factor_y: i32) -> Result<Surface<'static>> {
    if factor_x <= 0 || factor_y <= 0 {
        return Err(RasterError::other("shrink factors must be positive"));
    }
    let (w, h) = src.dimensions();
    let out_w = (w / factor_x).max(1);
    let out_h = (h / factor_y).max(1);

    let sampler = Sampler::new(src, src.bounds())?;
    let mut out = Surface::create(out_w, out_h, PixelFormatType::Argb, SurfaceCategory::Zoom)?;
    for oy in 0..out_h {
        for ox in 0..out_w {
            let mut acc = Accum::default();
            let mut n = 0.0;
            for y in oy * factor_y..((oy + 1) * factor_y).min(h) {
                for x in ox * factor_x..((ox + 1) * factor_x).min(w) {
                    acc.add(sampler.texel(x, y), 1.0);
                    n += 1.0;
                }
            }
            if n > 0.0 {
                let avg = Accum {
                    r: acc.r / n,
                    g: acc.g / n,
                    b: acc.b / n,
                    a: acc.a / n,
                };
                write_argb(&mut out, ox, oy, avg.to_color());
            }
        }
    }
    Ok(out)
}

/// Rotate by `turns` quarter turns clockwise (negative is counter-clockwise).
pub fn rotate_surface_90(src: &Surface<'_>, turns: i32) -> Result<Surface<'static>> {
    let turns = turns.rem_euclid(4);
    let (w, h) = src.dimensions();
    let (out_w, out_h) = if turns % 2 == 0 { (w, h) } else { (h, w) };

    let sampler = Sampler::new(src, src.bounds())?;
    let mut out = Surface::create(out_w, out_h, PixelFormatType::Argb, SurfaceCategory::Scratch)?;
    for y in 0..h {
        for x in 0..w {
            let (ox, oy) = match turns {
                0 => (x, y),
                1 => (h - 1 - y, x),
                2 => (w - 1 - x, h - 1 - y),
                _ => (y, w - 1 - x),
            };
            write_argb(&mut out, ox, oy, sampler.texel(x, y));
        }
    }
    Ok(out)
}
