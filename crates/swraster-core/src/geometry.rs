//! Integer points and rects, plus the 2D affine matrix used for image and
//! text transforms.

/// Integer pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// `x, y, w, h` rectangle
///
/// Blits treat it as half-open (`x..x+w`). Primitive draws that take two
/// corners are end-inclusive instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// `(0, 0, w, h)`
    pub const fn from_size(w: i32, h: i32) -> Self {
        Self::new(0, 0, w, h)
    }

    /// One past the last column, saturating at `i32::MAX`
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub const fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.w as i64 * self.h as i64
        }
    }

    /// End-inclusive containment test.
    pub const fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Overlap of two rects.
    ///
    /// The result keeps the clamped origin even when there is no overlap,
    /// in which case width and/or height are zero.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let w = self.right().min(other.right()).saturating_sub(x).max(0);
        let y = self.y.max(other.y);
        let h = self.bottom().min(other.bottom()).saturating_sub(y).max(0);
        Rect { x, y, w, h }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Smallest rect containing both. Empty inputs are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            w: self.right().max(other.right()) - x,
            h: self.bottom().max(other.bottom()) - y,
        }
    }

    pub const fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Trim `r` to this rect. A rect entirely outside gets a zero width or
    /// height and is otherwise left alone.
    pub fn constrain(&self, r: &mut Rect) {
        if r.x > self.right() || r.right() < self.x {
            r.w = 0;
            return;
        }
        if r.y > self.bottom() || r.bottom() < self.y {
            r.h = 0;
            return;
        }
        if r.x < self.x {
            r.w -= self.x - r.x;
            r.x = self.x;
        }
        if r.right() > self.right() {
            r.w -= r.right() - self.right();
        }
        if r.y < self.y {
            r.h -= self.y - r.y;
            r.y = self.y;
        }
        if r.bottom() > self.bottom() {
            r.h -= r.bottom() - self.bottom();
        }
    }
}

/// Intersect `a` and `b`; the flag is false when the overlap has no area.
pub fn intersect_rect(a: &Rect, b: &Rect) -> (Rect, bool) {
    let result = a.intersection(b);
    let overlaps = result.w != 0 && result.h != 0;
    (result, overlaps)
}

/// Affine transform `[m11 m12; m21 m22] + (dx, dy)`
///
/// Points map as `x' = m11*x + m21*y + dx`, `y' = m12*x + m22*y + dy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix2D {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Matrix2D {
    pub const IDENTITY: Matrix2D = Matrix2D::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self {
            m11,
            m12,
            m21,
            m22,
            dx,
            dy,
        }
    }

    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotate(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// True when the transform only moves pixels by whole-pixel amounts.
    pub fn is_integer_translation(&self) -> bool {
        self.m11 == 1.0
            && self.m12 == 0.0
            && self.m21 == 0.0
            && self.m22 == 1.0
            && self.dx.fract() == 0.0
            && self.dy.fract() == 0.0
    }

    pub fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m11 * x + self.m21 * y + self.dx,
            self.m12 * x + self.m22 * y + self.dy,
        )
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &Matrix2D) -> Matrix2D {
        Matrix2D {
            m11: self.m11 * other.m11 + self.m12 * other.m21,
            m12: self.m11 * other.m12 + self.m12 * other.m22,
            m21: self.m21 * other.m11 + self.m22 * other.m21,
            m22: self.m21 * other.m12 + self.m22 * other.m22,
            dx: self.dx * other.m11 + self.dy * other.m21 + other.dx,
            dy: self.dx * other.m12 + self.dy * other.m22 + other.dy,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.m11 * self.m22 - self.m12 * self.m21
    }

    /// `None` for singular matrices.
    pub fn inverse(&self) -> Option<Matrix2D> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let m11 = self.m22 * inv;
        let m12 = -self.m12 * inv;
        let m21 = -self.m21 * inv;
        let m22 = self.m11 * inv;
        Some(Matrix2D {
            m11,
            m12,
            m21,
            m22,
            dx: -(self.dx * m11 + self.dy * m21),
            dy: -(self.dx * m12 + self.dy * m22),
        })
    }

    /// Integer bounding box of `rect` after transformation.
    pub fn map_rect_bounds(&self, rect: &Rect) -> Rect {
        let x0 = rect.x as f64;
        let y0 = rect.y as f64;
        let x1 = rect.right() as f64;
        let y1 = rect.bottom() as f64;
        let corners = [
            self.map_point(x0, y0),
            self.map_point(x1, y0),
            self.map_point(x0, y1),
            self.map_point(x1, y1),
        ];

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        // Absorb float noise so exact transforms don't grow by a pixel.
        const EPS: f64 = 1e-6;
        let left = (min_x + EPS).floor() as i32;
        let top = (min_y + EPS).floor() as i32;
        let right = (max_x - EPS).ceil() as i32;
        let bottom = (max_y - EPS).ceil() as i32;
        Rect::new(left, top, (right - left).max(0), (bottom - top).max(0))
    }
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}
