//! In-memory glyph atlas
//!
//! Glyph bitmaps are packed onto shelves of a square texture the first
//! time they are drawn and looked up by (font, glyph) afterwards. The
//! atlas side is a power of two so normalized coordinates map back to
//! exact texel positions.

use std::cell::Cell;
use std::collections::HashMap;

use swraster_core::{
    Font, GlyphBitmap, GlyphCache, GlyphId, GlyphTexture, GlyphTextureInfo, RasterError, Result,
    TextureFormat,
};

/// Gap between packed glyphs so filtering never bleeds into a neighbor.
const PADDING: u32 = 1;

/// Cache key for packed glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasKey {
    pub font_id: u32,
    pub glyph_id: GlyphId,
}

/// Shelf-packed glyph atlas implementing [`GlyphCache`]
#[derive(Debug)]
pub struct AtlasGlyphCache {
    size: u32,
    format: TextureFormat,
    data: Vec<u8>,
    /// `None` marks glyphs known to have no ink
    entries: HashMap<AtlasKey, Option<GlyphTextureInfo>>,
    cursor_x: u32,
    cursor_y: u32,
    shelf_height: u32,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl AtlasGlyphCache {
    /// Create an empty atlas at least `size` texels wide.
    pub fn new(size: u32, format: TextureFormat) -> Result<Self> {
        let size = size.max(1).next_power_of_two();
        let bytes = (size as usize)
            .checked_mul(size as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_texel()))
            .ok_or(RasterError::OutOfMemory { bytes: usize::MAX })?;
        let data = swraster_core::try_alloc_pixels(bytes)?;
        log::debug!("Created {}x{} {:?} glyph atlas", size, size, format);

        Ok(Self {
            size,
            format,
            data,
            entries: HashMap::new(),
            cursor_x: 0,
            cursor_y: 0,
            shelf_height: 0,
            hits: Cell::new(0),
            misses: Cell::new(0),
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    fn stride(&self) -> usize {
        self.size as usize * self.format.bytes_per_texel()
    }

    /// Reserve a `w` x `h` slot, opening a new shelf when the row is full.
    fn allocate(&mut self, w: u32, h: u32) -> Result<(u32, u32)> {
        if w > self.size || h > self.size {
            return Err(RasterError::other(format!(
                "{}x{} glyph does not fit a {} texel atlas",
                w, h, self.size
            )));
        }
        if self.cursor_x + w > self.size {
            self.cursor_y += self.shelf_height + PADDING;
            self.cursor_x = 0;
            self.shelf_height = 0;
        }
        if self.cursor_y + h > self.size {
            return Err(RasterError::other("glyph atlas is full"));
        }
        let slot = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + PADDING;
        self.shelf_height = self.shelf_height.max(h);
        Ok(slot)
    }

    fn blit_bitmap(&mut self, bitmap: &GlyphBitmap, x: u32, y: u32) -> Result<()> {
        let src_bpt = bitmap.format.bytes_per_texel();
        let row_len = bitmap.width as usize * src_bpt;
        let needed = row_len * bitmap.height as usize;
        if bitmap.data.len() < needed {
            return Err(RasterError::BufferTooSmall {
                expected: needed,
                actual: bitmap.data.len(),
            });
        }

        let stride = self.stride();
        let dst_bpt = self.format.bytes_per_texel();
        for (row, src_row) in bitmap.data.chunks(row_len).take(bitmap.height as usize).enumerate() {
            let start = (y as usize + row) * stride + x as usize * dst_bpt;
            let dst_row = &mut self.data[start..start + bitmap.width as usize * dst_bpt];
            match (bitmap.format, self.format) {
                (a, b) if a == b => dst_row.copy_from_slice(src_row),
                (TextureFormat::Alpha8, TextureFormat::Argb32) => {
                    for (texel, &coverage) in dst_row.chunks_exact_mut(4).zip(src_row) {
                        let argb = ((coverage as u32) << 24) | 0x00ff_ffff;
                        texel.copy_from_slice(&argb.to_ne_bytes());
                    }
                }
                _ => {
                    for (dst, texel) in dst_row.iter_mut().zip(src_row.chunks_exact(4)) {
                        let argb = u32::from_ne_bytes([texel[0], texel[1], texel[2], texel[3]]);
                        *dst = (argb >> 24) as u8;
                    }
                }
            }
        }
        Ok(())
    }

    /// Pack `bitmap` and return its normalized box.
    pub fn insert(&mut self, key: AtlasKey, bitmap: &GlyphBitmap) -> Result<GlyphTextureInfo> {
        let (x, y) = self.allocate(bitmap.width, bitmap.height)?;
        self.blit_bitmap(bitmap, x, y)?;

        let size = self.size as f32;
        let info = GlyphTextureInfo {
            u0: x as f32 / size,
            v0: y as f32 / size,
            u1: (x + bitmap.width) as f32 / size,
            v1: (y + bitmap.height) as f32 / size,
        };
        log::trace!("Packed glyph {:?} at ({}, {})", key, x, y);
        self.entries.insert(key, Some(info));
        Ok(info)
    }

    /// Drop every glyph and start packing from the top again.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.entries.clear();
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.shelf_height = 0;
    }

    pub fn stats(&self) -> AtlasStats {
        AtlasStats {
            glyphs: self.entries.len(),
            size: self.size,
            used_height: (self.cursor_y + self.shelf_height).min(self.size),
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }
}

impl GlyphCache for AtlasGlyphCache {
    fn glyph_texture_info(&self, font: &dyn Font, glyph: GlyphId) -> Option<GlyphTextureInfo> {
        let key = AtlasKey {
            font_id: font.id(),
            glyph_id: glyph,
        };
        match self.entries.get(&key) {
            Some(entry) => {
                self.hits.set(self.hits.get() + 1);
                Some(entry.unwrap_or_default())
            }
            None => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    fn add_glyph(&mut self, font: &dyn Font, glyph: GlyphId) -> Result<Option<GlyphTextureInfo>> {
        let key = AtlasKey {
            font_id: font.id(),
            glyph_id: glyph,
        };
        if let Some(entry) = self.entries.get(&key) {
            return Ok(*entry);
        }
        match font.rasterize_glyph(glyph) {
            Some(bitmap) if bitmap.width > 0 && bitmap.height > 0 => self.insert(key, &bitmap).map(Some),
            _ => {
                self.entries.insert(key, None);
                Ok(None)
            }
        }
    }

    fn texture(&self) -> Option<GlyphTexture<'_>> {
        Some(GlyphTexture {
            data: &self.data,
            stride: self.stride(),
            format: self.format,
            size: self.size,
        })
    }
}

/// Glyph atlas statistics
#[derive(Debug, Clone)]
pub struct AtlasStats {
    pub glyphs: usize,
    pub size: u32,
    /// Rows consumed by packed shelves
    pub used_height: u32,
    pub hits: u64,
    pub misses: u64,
}

impl AtlasStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swraster_core::GlyphMetrics;

    struct BoxFont {
        id: u32,
    }

    impl Font for BoxFont {
        fn id(&self) -> u32 {
            self.id
        }

        fn kerning(&self, _prev: GlyphId, _glyph: GlyphId) -> Option<f32> {
            None
        }

        fn glyph_metrics(&self, _glyph: GlyphId) -> Option<GlyphMetrics> {
            None
        }

        fn fallback_glyph(&self) -> GlyphId {
            0
        }

        fn rasterize_glyph(&self, glyph: GlyphId) -> Option<GlyphBitmap> {
            (glyph != 32).then(|| GlyphBitmap {
                width: 3,
                height: 4,
                format: TextureFormat::Alpha8,
                data: vec![glyph as u8; 12],
            })
        }
    }

    #[test]
    fn size_rounds_up_to_power_of_two() {
        let atlas = AtlasGlyphCache::new(100, TextureFormat::Alpha8).unwrap();
        assert_eq!(atlas.size(), 128);
    }

    #[test]
    fn added_glyphs_are_found_again() {
        let font = BoxFont { id: 1 };
        let mut atlas = AtlasGlyphCache::new(16, TextureFormat::Alpha8).unwrap();
        assert!(atlas.glyph_texture_info(&font, 65).is_none());

        let info = atlas.add_glyph(&font, 65).unwrap().unwrap();
        assert_eq!(atlas.glyph_texture_info(&font, 65), Some(info));
        assert_eq!(info.u1 * 16.0, 3.0);
        assert_eq!(info.v1 * 16.0, 4.0);

        let tex = atlas.texture().unwrap();
        assert_eq!(tex.alpha_at(2, 3), Some(65));
        assert_eq!(tex.alpha_at(3, 0), Some(0));

        let stats = atlas.stats();
        assert_eq!((stats.hits, stats.misses, stats.glyphs), (1, 1, 1));
    }

    #[test]
    fn blank_glyphs_are_remembered_without_space() {
        let font = BoxFont { id: 1 };
        let mut atlas = AtlasGlyphCache::new(16, TextureFormat::Alpha8).unwrap();
        assert_eq!(atlas.add_glyph(&font, 32).unwrap(), None);
        assert_eq!(atlas.glyph_texture_info(&font, 32), Some(GlyphTextureInfo::default()));
        assert_eq!(atlas.stats().used_height, 0);
    }

    #[test]
    fn shelves_wrap_and_fill_up() {
        let font = BoxFont { id: 7 };
        let mut atlas = AtlasGlyphCache::new(16, TextureFormat::Alpha8).unwrap();
        // Four 3x4 glyphs per shelf, shelves at rows 0, 5 and 10.
        let infos: Vec<_> = (1..=12)
            .map(|g| atlas.add_glyph(&font, g).unwrap().unwrap())
            .collect();
        assert_eq!((infos[1].u0 * 16.0, infos[1].v0), (4.0, 0.0));
        assert_eq!((infos[4].u0, infos[4].v0 * 16.0), (0.0, 5.0));
        assert_eq!((infos[11].u0 * 16.0, infos[11].v0 * 16.0), (12.0, 10.0));
        assert!(atlas.add_glyph(&font, 13).is_err());
    }

    #[test]
    fn argb_atlas_widens_coverage() {
        let font = BoxFont { id: 2 };
        let mut atlas = AtlasGlyphCache::new(8, TextureFormat::Argb32).unwrap();
        atlas.add_glyph(&font, 200).unwrap();
        let tex = atlas.texture().unwrap();
        assert_eq!(tex.argb_at(0, 0), Some(0xc8ff_ffff));
    }
}
