//! The seams between the raster core and its collaborators
//!
//! - [`Font`] - kerning, metrics, fallback glyph and glyph rasterization
//! - [`GlyphCache`] - glyph metrics, atlas placement and the atlas texture
//! - [`Exporter`] - surfaces out to bytes
//!
//! Text shaping and font parsing live on the far side of these traits.

use crate::error::Result;
use crate::surface::Surface;

pub type GlyphId = u32;

/// Per-glyph horizontal metrics in pixels.
///
/// `h_bearing_y` is measured upward from the baseline; the glyph box spans
/// `h_bearing_y - size_y ..= h_bearing_y` vertically.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    pub h_bearing_x: f32,
    pub h_bearing_y: f32,
    pub size_x: f32,
    pub size_y: f32,
    pub h_advance_x: f32,
}

/// Where a glyph sits in the atlas, in normalized texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphTextureInfo {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// Storage format of a glyph atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// One coverage byte per texel
    #[default]
    Alpha8,
    /// Straight-alpha `0xAARRGGBB` per texel, host byte order
    Argb32,
}

impl TextureFormat {
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::Alpha8 => 1,
            TextureFormat::Argb32 => 4,
        }
    }
}

/// Read-only view of an atlas texture, borrowed for one draw call.
#[derive(Debug, Clone, Copy)]
pub struct GlyphTexture<'t> {
    pub data: &'t [u8],
    /// Bytes between texel rows
    pub stride: usize,
    pub format: TextureFormat,
    /// The atlas is `size` x `size` texels
    pub size: u32,
}

impl GlyphTexture<'_> {
    /// Alpha of texel `(x, y)`, or `None` outside the texture.
    pub fn alpha_at(&self, x: i32, y: i32) -> Option<u8> {
        self.texel_offset(x, y).map(|o| match self.format {
            TextureFormat::Alpha8 => self.data[o],
            TextureFormat::Argb32 => {
                let v = u32::from_ne_bytes([
                    self.data[o],
                    self.data[o + 1],
                    self.data[o + 2],
                    self.data[o + 3],
                ]);
                (v >> 24) as u8
            }
        })
    }

    /// The `0xAARRGGBB` texel at `(x, y)`; alpha-only atlases read as white.
    pub fn argb_at(&self, x: i32, y: i32) -> Option<u32> {
        self.texel_offset(x, y).map(|o| match self.format {
            TextureFormat::Alpha8 => ((self.data[o] as u32) << 24) | 0x00ff_ffff,
            TextureFormat::Argb32 => u32::from_ne_bytes([
                self.data[o],
                self.data[o + 1],
                self.data[o + 2],
                self.data[o + 3],
            ]),
        })
    }

    fn texel_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.size || y as u32 >= self.size {
            return None;
        }
        let bpt = self.format.bytes_per_texel();
        let offset = y as usize * self.stride + x as usize * bpt;
        (offset + bpt <= self.data.len()).then_some(offset)
    }
}

/// A rasterized glyph ready to be packed into an atlas
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Tightly packed rows in `format`
    pub data: Vec<u8>,
}

/// What the raster core needs from a font
pub trait Font {
    /// Distinguishes fonts sharing one glyph cache.
    fn id(&self) -> u32;

    /// Horizontal kerning between two glyphs, in pixels.
    fn kerning(&self, prev: GlyphId, glyph: GlyphId) -> Option<f32>;

    fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics>;

    /// Glyph drawn in place of glyphs the font cannot describe.
    fn fallback_glyph(&self) -> GlyphId;

    /// Rasterize a glyph for the atlas. `None` for glyphs without ink.
    fn rasterize_glyph(&self, glyph: GlyphId) -> Option<GlyphBitmap>;
}

/// Glyph atlas owned outside the raster core
pub trait GlyphCache {
    fn glyph_metrics(&self, font: &dyn Font, glyph: GlyphId) -> Option<GlyphMetrics> {
        font.glyph_metrics(glyph)
    }

    /// Atlas placement of a glyph that was already added.
    fn glyph_texture_info(&self, font: &dyn Font, glyph: GlyphId) -> Option<GlyphTextureInfo>;

    /// Rasterize `glyph` with `font` and pack it into the atlas.
    fn add_glyph(&mut self, font: &dyn Font, glyph: GlyphId) -> Result<Option<GlyphTextureInfo>>;

    /// The atlas texture, or `None` while no atlas exists.
    fn texture(&self) -> Option<GlyphTexture<'_>>;
}

/// Turns a surface into file bytes
pub trait Exporter {
    fn name(&self) -> &'static str;

    fn export(&self, surface: &Surface<'_>) -> Result<Vec<u8>>;

    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_reads_are_bounds_checked() {
        let data = [10u8, 20, 30, 40];
        let tex = GlyphTexture {
            data: &data,
            stride: 2,
            format: TextureFormat::Alpha8,
            size: 2,
        };
        assert_eq!(tex.alpha_at(1, 1), Some(40));
        assert_eq!(tex.alpha_at(2, 0), None);
        assert_eq!(tex.alpha_at(-1, 0), None);
        assert_eq!(tex.argb_at(0, 0), Some(0x0aff_ffff));
    }

    #[test]
    fn argb_texels_use_host_order() {
        let data = 0x8011_2233u32.to_ne_bytes();
        let tex = GlyphTexture {
            data: &data,
            stride: 4,
            format: TextureFormat::Argb32,
            size: 1,
        };
        assert_eq!(tex.argb_at(0, 0), Some(0x8011_2233));
        assert_eq!(tex.alpha_at(0, 0), Some(0x80));
    }
}
