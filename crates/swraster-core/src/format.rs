//! Pixel format descriptors
//!
//! Every format-specific decision in the raster paths goes through a
//! [`PixelFormat`]: channel masks and shifts say where each channel lives in
//! the native 32-bit value, `bytes_per_pixel` says how that value is laid out
//! in memory. Adding a format means adding a row to [`layout_for`], not a new
//! branch in every blitter.

use crate::color::{Color, NativeColor};

/// Which channel layout a surface uses.
///
/// The 32-bit formats are described as the native `u32` value; their byte
/// order in memory follows the host endianness. The 24-bit [`PixelFormatType::Rgb`]
/// format is always `R, G, B` in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormatType {
    Invalid,
    /// `0xAARRGGBB`
    #[default]
    Argb,
    /// `0xRRGGBBAA`
    Rgba,
    /// `0xXXRRGGBB`, the X byte is ignored and reads back as opaque
    Xrgb,
    /// `0xRRGGBBXX`
    Rgbx,
    /// 24-bit `0xRRGGBB`
    Rgb,
}

impl PixelFormatType {
    pub const ALL: [PixelFormatType; 5] = [
        PixelFormatType::Argb,
        PixelFormatType::Rgba,
        PixelFormatType::Xrgb,
        PixelFormatType::Rgbx,
        PixelFormatType::Rgb,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PixelFormatType::Invalid => "invalid",
            PixelFormatType::Argb => "argb",
            PixelFormatType::Rgba => "rgba",
            PixelFormatType::Xrgb => "xrgb",
            PixelFormatType::Rgbx => "rgbx",
            PixelFormatType::Rgb => "rgb",
        }
    }
}

impl std::str::FromStr for PixelFormatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "argb" => Ok(PixelFormatType::Argb),
            "rgba" => Ok(PixelFormatType::Rgba),
            "xrgb" => Ok(PixelFormatType::Xrgb),
            "rgbx" => Ok(PixelFormatType::Rgbx),
            "rgb" => Ok(PixelFormatType::Rgb),
            other => Err(format!("unknown pixel format '{other}'")),
        }
    }
}

/// Channel layout of a surface, fixed by its [`PixelFormatType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub format_type: PixelFormatType,
    pub bytes_per_pixel: u8,
    /// Alpha applied to the whole surface. Already multiplied into the
    /// pixels of surfaces produced by the alpha pipeline.
    pub surface_alpha: u8,
    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
    pub a_mask: u32,
    pub r_shift: u8,
    pub g_shift: u8,
    pub b_shift: u8,
    pub a_shift: u8,
}

// (r_mask, g_mask, b_mask, a_mask, r_shift, g_shift, b_shift, a_shift)
type Layout = (u32, u32, u32, u32, u8, u8, u8, u8);

const fn layout_for(format_type: PixelFormatType) -> Layout {
    match format_type {
        PixelFormatType::Invalid => (0, 0, 0, 0, 0, 0, 0, 0),
        PixelFormatType::Argb => (0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000, 16, 8, 0, 24),
        PixelFormatType::Rgba => (0xff00_0000, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 24, 16, 8, 0),
        PixelFormatType::Xrgb => (0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0, 16, 8, 0, 24),
        PixelFormatType::Rgbx => (0xff00_0000, 0x00ff_0000, 0x0000_ff00, 0, 24, 16, 8, 0),
        PixelFormatType::Rgb => (0xff00_0000, 0x00ff_0000, 0x0000_ff00, 0, 24, 16, 8, 0),
    }
}

impl PixelFormat {
    pub const fn new(format_type: PixelFormatType) -> Self {
        let (r_mask, g_mask, b_mask, a_mask, r_shift, g_shift, b_shift, a_shift) =
            layout_for(format_type);
        let bytes_per_pixel = match format_type {
            PixelFormatType::Rgb => 3,
            _ => 4,
        };

        Self {
            format_type,
            bytes_per_pixel,
            surface_alpha: 255,
            r_mask,
            g_mask,
            b_mask,
            a_mask,
            r_shift,
            g_shift,
            b_shift,
            a_shift,
        }
    }

    pub const fn has_alpha(&self) -> bool {
        self.a_mask != 0
    }

    pub const fn bpp(&self) -> usize {
        self.bytes_per_pixel as usize
    }

    /// Convert a device-independent color into this format's native value.
    #[inline]
    pub fn encode(&self, color: Color) -> NativeColor {
        (((color.r as u32) << self.r_shift) & self.r_mask)
            | (((color.g as u32) << self.g_shift) & self.g_mask)
            | (((color.b as u32) << self.b_shift) & self.b_mask)
            | (((color.a as u32) << self.a_shift) & self.a_mask)
    }

    /// Convert a native value back to ARGB. Formats without alpha read as opaque.
    #[inline]
    pub fn decode(&self, native: NativeColor) -> Color {
        let a = if self.has_alpha() {
            ((native & self.a_mask) >> self.a_shift) as u8
        } else {
            0xff
        };
        Color {
            r: ((native & self.r_mask) >> self.r_shift) as u8,
            g: ((native & self.g_mask) >> self.g_shift) as u8,
            b: ((native & self.b_mask) >> self.b_shift) as u8,
            a,
        }
    }

    /// Read one native pixel from the start of `bytes`.
    #[inline]
    pub fn read_native(&self, bytes: &[u8]) -> NativeColor {
        if self.bytes_per_pixel == 3 {
            ((bytes[0] as u32) << 24) | ((bytes[1] as u32) << 16) | ((bytes[2] as u32) << 8)
        } else {
            u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        }
    }

    /// Write one native pixel to the start of `bytes`.
    #[inline]
    pub fn write_native(&self, bytes: &mut [u8], native: NativeColor) {
        if self.bytes_per_pixel == 3 {
            bytes[0] = (native >> 24) as u8;
            bytes[1] = (native >> 16) as u8;
            bytes[2] = (native >> 8) as u8;
        } else {
            bytes[..4].copy_from_slice(&native.to_ne_bytes());
        }
    }

    #[inline]
    pub fn read_color(&self, bytes: &[u8]) -> Color {
        self.decode(self.read_native(bytes))
    }

    #[inline]
    pub fn write_color(&self, bytes: &mut [u8], color: Color) {
        self.write_native(bytes, self.encode(color))
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::new(PixelFormatType::Argb)
    }
}

impl From<PixelFormatType> for PixelFormat {
    fn from(format_type: PixelFormatType) -> Self {
        Self::new(format_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_table_matches_documented_bits() {
        let argb = PixelFormat::new(PixelFormatType::Argb);
        assert_eq!(argb.bytes_per_pixel, 4);
        assert_eq!(
            (argb.r_mask, argb.g_mask, argb.b_mask, argb.a_mask),
            (0x00ff0000, 0x0000ff00, 0x000000ff, 0xff000000)
        );
        assert_eq!((argb.r_shift, argb.g_shift, argb.b_shift, argb.a_shift), (16, 8, 0, 24));

        let rgba = PixelFormat::new(PixelFormatType::Rgba);
        assert_eq!(
            (rgba.r_mask, rgba.g_mask, rgba.b_mask, rgba.a_mask),
            (0xff000000, 0x00ff0000, 0x0000ff00, 0x000000ff)
        );
        assert_eq!((rgba.r_shift, rgba.g_shift, rgba.b_shift, rgba.a_shift), (24, 16, 8, 0));

        let xrgb = PixelFormat::new(PixelFormatType::Xrgb);
        assert_eq!(xrgb.a_mask, 0);
        assert_eq!(xrgb.a_shift, 24);
        assert_eq!(xrgb.r_mask, 0x00ff0000);

        let rgbx = PixelFormat::new(PixelFormatType::Rgbx);
        assert_eq!((rgbx.r_mask, rgbx.a_mask, rgbx.a_shift), (0xff000000, 0, 0));

        let rgb = PixelFormat::new(PixelFormatType::Rgb);
        assert_eq!(rgb.bytes_per_pixel, 3);
        assert_eq!((rgb.r_shift, rgb.g_shift, rgb.b_shift), (24, 16, 8));
        assert_eq!(rgb.surface_alpha, 255);
    }

    #[test]
    fn encode_decode_is_lossless_for_alpha_formats() {
        let c = Color::rgba(10, 20, 30, 40);
        for ft in [PixelFormatType::Argb, PixelFormatType::Rgba] {
            let pf = PixelFormat::new(ft);
            assert_eq!(pf.decode(pf.encode(c)), c, "{ft:?}");
        }
        assert_eq!(PixelFormat::new(PixelFormatType::Argb).encode(c), 0x280a141e);
        assert_eq!(PixelFormat::new(PixelFormatType::Rgba).encode(c), 0x0a141e28);
    }

    #[test]
    fn formats_without_alpha_decode_opaque() {
        let c = Color::rgba(10, 20, 30, 40);
        for ft in [PixelFormatType::Xrgb, PixelFormatType::Rgbx, PixelFormatType::Rgb] {
            let pf = PixelFormat::new(ft);
            assert_eq!(pf.decode(pf.encode(c)), c.with_alpha(255), "{ft:?}");
        }
    }

    #[test]
    fn rgb24_memory_order_is_r_g_b() {
        let pf = PixelFormat::new(PixelFormatType::Rgb);
        let mut bytes = [0u8; 3];
        pf.write_color(&mut bytes, Color::rgb(1, 2, 3));
        assert_eq!(bytes, [1, 2, 3]);
        assert_eq!(pf.read_color(&bytes), Color::rgb(1, 2, 3));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("RGBA".parse::<PixelFormatType>(), Ok(PixelFormatType::Rgba));
        assert!("bgr".parse::<PixelFormatType>().is_err());
    }
}
