//! Device-independent ARGB color and the integer blend helpers shared by
//! every raster path.

/// A color in a surface's own pixel format, as stored in memory.
pub type NativeColor = u32;

/// Straight (non-premultiplied) 8-bit ARGB color
///
/// The packed form is `0xAARRGGBB`, which is also what the document layer
/// hands us as a fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Unpack `0xAARRGGBB`.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Pack as `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// The low 24 bits of [`Color::to_argb`].
    pub const fn rgb24(self) -> u32 {
        self.to_argb() & 0x00ff_ffff
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn is_opaque(self) -> bool {
        self.a == 0xff
    }

    /// Scale the color channels by alpha, keeping alpha itself.
    pub fn premultiplied(self) -> Self {
        let a = self.a as u32;
        Self {
            r: div255_round(self.r as u32 * a) as u8,
            g: div255_round(self.g as u32 * a) as u8,
            b: div255_round(self.b as u32 * a) as u8,
            a: self.a,
        }
    }

    /// Inverse of [`Color::premultiplied`], saturating on rounding overshoot.
    pub fn unpremultiplied(self) -> Self {
        match self.a {
            0 => Self::TRANSPARENT,
            255 => self,
            a => {
                let a = a as u32;
                let un = |c: u8| ((c as u32 * 255 + a / 2) / a).min(255) as u8;
                Self {
                    r: un(self.r),
                    g: un(self.g),
                    b: un(self.b),
                    a: self.a,
                }
            }
        }
    }
}

impl From<u32> for Color {
    fn from(argb: u32) -> Self {
        Self::from_argb(argb)
    }
}

/// `round(x / 255)` for `x` in `0..=255*255` using only shifts.
#[inline]
pub const fn div255_round(x: u32) -> u32 {
    let t = x + 128;
    (t + (t >> 8)) >> 8
}

/// Premultiply the 24-bit RGB part of `rgb` by `alpha`.
#[inline]
pub const fn multiply_color_alpha(rgb: u32, alpha: u32) -> u32 {
    let r = div255_round(((rgb >> 16) & 0xff) * alpha);
    let g = div255_round(((rgb >> 8) & 0xff) * alpha);
    let b = div255_round((rgb & 0xff) * alpha);
    (r << 16) | (g << 8) | b
}

/// Premultiplied source-over for one channel: `s + d * (255 - sa) / 255`.
#[inline]
pub const fn blend_premultiplied_channel(s: u32, d: u32, sa: u32) -> u32 {
    let v = s + div255_round(d * (255 - sa));
    if v > 255 {
        255
    } else {
        v
    }
}

/// Straight-alpha source-over for one channel: `d + (s - d) * sa / 255`.
#[inline]
pub const fn blend_straight_channel(s: u32, d: u32, sa: u32) -> u32 {
    if s >= d {
        d + div255_round((s - d) * sa)
    } else {
        d - div255_round((d - s) * sa)
    }
}
