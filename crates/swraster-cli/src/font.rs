//! Built-in 5x7 bitmap font
//!
//! Enough of ASCII to label a scene: upper-case letters (lower case maps
//! onto them), digits and common punctuation. Each font pixel becomes a
//! `scale` x `scale` block. Characters outside the set are left for the
//! renderer's fallback glyph, a hollow box.

use swraster_core::{Font, GlyphBitmap, GlyphCache, GlyphId, GlyphMetrics, Point, Result, TextureFormat};
use swraster_render::{draw_glyph_run, GlyphRun, GraphicsContext};

const CELL_W: u32 = 5;
const CELL_H: u32 = 7;
const SPACE: GlyphId = ' ' as GlyphId;
const FALLBACK: GlyphId = 0;

// Rows top to bottom, bit 4 is the leftmost column.
#[rustfmt::skip]
const GLYPHS: &[(char, [u8; 7])] = &[
    ('A', [0x0e, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11]),
    ('B', [0x1e, 0x11, 0x11, 0x1e, 0x11, 0x11, 0x1e]),
    ('C', [0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e]),
    ('D', [0x1e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1e]),
    ('E', [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x1f]),
    ('F', [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x10]),
    ('G', [0x0e, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0f]),
    ('H', [0x11, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11]),
    ('I', [0x0e, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0e]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0c]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f]),
    ('M', [0x11, 0x1b, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('P', [0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10]),
    ('Q', [0x0e, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0d]),
    ('R', [0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11]),
    ('S', [0x0f, 0x10, 0x10, 0x0e, 0x01, 0x01, 0x1e]),
    ('T', [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0a, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0a]),
    ('X', [0x11, 0x11, 0x0a, 0x04, 0x0a, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0a, 0x04, 0x04, 0x04]),
    ('Z', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1f]),
    ('0', [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e]),
    ('1', [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e]),
    ('2', [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f]),
    ('3', [0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e]),
    ('4', [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02]),
    ('5', [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e]),
    ('6', [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e]),
    ('7', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e]),
    ('9', [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x0c]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x0c, 0x04, 0x08]),
    (':', [0x00, 0x0c, 0x0c, 0x00, 0x0c, 0x0c, 0x00]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04]),
    ('?', [0x0e, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04]),
    ('-', [0x00, 0x00, 0x00, 0x1f, 0x00, 0x00, 0x00]),
    ('+', [0x00, 0x04, 0x04, 0x1f, 0x04, 0x04, 0x00]),
    ('/', [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10]),
    ('\'', [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00]),
];

const BOX: [u8; 7] = [0x1f, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1f];

// Pairs whose diagonals leave a visible gap at full advance.
const KERN_PAIRS: &[(char, char)] = &[
    ('A', 'V'),
    ('V', 'A'),
    ('A', 'T'),
    ('T', 'A'),
    ('A', 'Y'),
    ('Y', 'A'),
    ('L', 'T'),
    ('L', 'V'),
];

/// The built-in font at an integer pixel scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    pub fn new(scale: u32) -> Self {
        Self { scale: scale.max(1) }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Glyph id for `ch`. Characters the font lacks keep their code point
    /// and are replaced by the fallback glyph at layout.
    pub fn glyph_id(&self, ch: char) -> GlyphId {
        ch.to_ascii_uppercase() as GlyphId
    }

    /// Glyph ids and pen advances for `text`.
    pub fn shape(&self, text: &str) -> (Vec<GlyphId>, Vec<f32>) {
        let advance = ((CELL_W + 1) * self.scale) as f32;
        let glyphs: Vec<GlyphId> = text.chars().map(|ch| self.glyph_id(ch)).collect();
        let advances = vec![advance; glyphs.len()];
        (glyphs, advances)
    }

    /// Advance width of `text` in pixels.
    pub fn measure(&self, text: &str) -> i32 {
        (text.chars().count() as u32 * (CELL_W + 1) * self.scale) as i32
    }

    fn rows(glyph: GlyphId) -> Option<&'static [u8; 7]> {
        if glyph == FALLBACK {
            return Some(&BOX);
        }
        let ch = char::from_u32(glyph)?;
        GLYPHS.iter().find(|(c, _)| *c == ch).map(|(_, rows)| rows)
    }
}

impl Font for BitmapFont {
    fn id(&self) -> u32 {
        0x5357_0000 | self.scale
    }

    fn kerning(&self, prev: GlyphId, glyph: GlyphId) -> Option<f32> {
        let pair = (char::from_u32(prev)?, char::from_u32(glyph)?);
        KERN_PAIRS
            .contains(&pair)
            .then_some(-(self.scale as f32))
    }

    fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics> {
        let s = self.scale as f32;
        let advance = (CELL_W + 1) as f32 * s;
        if glyph == SPACE {
            return Some(GlyphMetrics { h_advance_x: advance, ..Default::default() });
        }
        Self::rows(glyph)?;
        Some(GlyphMetrics {
            h_bearing_x: 0.0,
            h_bearing_y: CELL_H as f32 * s,
            size_x: CELL_W as f32 * s,
            size_y: CELL_H as f32 * s,
            h_advance_x: advance,
        })
    }

    fn fallback_glyph(&self) -> GlyphId {
        FALLBACK
    }

    fn rasterize_glyph(&self, glyph: GlyphId) -> Option<GlyphBitmap> {
        let rows = Self::rows(glyph)?;
        let (width, height) = (CELL_W * self.scale, CELL_H * self.scale);
        let mut data = vec![0u8; (width * height) as usize];
        for y in 0..height {
            let bits = rows[(y / self.scale) as usize];
            for x in 0..width {
                if bits & (0x10 >> (x / self.scale)) != 0 {
                    data[(y * width + x) as usize] = 255;
                }
            }
        }
        Some(GlyphBitmap { width, height, format: TextureFormat::Alpha8, data })
    }
}

/// Draw `text` with its baseline starting at `baseline`, using the
/// context's fill color, transform and transparency.
pub fn draw_text(
    ctx: &mut GraphicsContext<'_, '_, '_>,
    font: &BitmapFont,
    cache: &mut dyn GlyphCache,
    text: &str,
    baseline: Point,
) -> Result<()> {
    let (glyphs, advances) = font.shape(text);
    let run = GlyphRun::new(&glyphs, &advances);
    draw_glyph_run(ctx, font, Some(cache), &run, baseline)
}
