//! JSON scene descriptions
//!
//! ```json
//! {
//!   "width": 64, "height": 48, "background": "#ffffff",
//!   "commands": [
//!     { "op": "fill_rect", "rect": [4, 4, 20, 10], "color": "#ff000080" },
//!     { "op": "text", "at": [4, 40], "text": "Hi", "color": "black", "scale": 2 }
//!   ]
//! }
//! ```
//!
//! Colors are `#rrggbb`, `#rrggbbaa` or one of a few names. Rects are
//! `[x, y, w, h]`, points `[x, y]`.

use anyhow::{Context, Result};
use serde::Deserialize;
use swraster_core::{Color, Matrix2D, PixelFormatType, Point, Rect, Surface, SurfaceCategory, TextureFormat};
use swraster_render::{primitives, AtlasGlyphCache, GraphicsContext, Orientation, RasterEngine};

use crate::font::{draw_text, BitmapFont};

const ATLAS_SIZE: u32 = 512;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_background")]
    pub background: SceneColor,
    /// Pixel format of the canvas, `argb` when omitted
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub commands: Vec<DrawCommand>,
}

fn default_background() -> SceneColor {
    SceneColor(Color::white())
}

fn default_true() -> bool {
    true
}

fn default_scale() -> u32 {
    1
}

fn default_opacity() -> f32 {
    1.0
}

/// One drawing operation, tagged by `op`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum DrawCommand {
    FillRect {
        rect: [i32; 4],
        color: SceneColor,
    },
    OutlineRect {
        rect: [i32; 4],
        color: SceneColor,
    },
    Line {
        from: [i32; 2],
        to: [i32; 2],
        color: SceneColor,
        #[serde(default)]
        antialias: bool,
    },
    Ellipse {
        center: [i32; 2],
        radii: [i32; 2],
        color: SceneColor,
        #[serde(default)]
        fill: bool,
        #[serde(default)]
        antialias: bool,
    },
    Polygon {
        points: Vec<[i32; 2]>,
        color: SceneColor,
        #[serde(default = "default_true")]
        fill: bool,
    },
    Triangle {
        at: [i32; 2],
        size: i32,
        pointing: Pointing,
        color: SceneColor,
    },
    /// Text with its baseline starting at `at`
    Text {
        at: [i32; 2],
        text: String,
        color: SceneColor,
        #[serde(default = "default_scale")]
        scale: u32,
        /// Degrees, clockwise on screen
        #[serde(default)]
        rotate: f64,
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
    /// Restrict later commands to `rect`; without one the clip is reset.
    Clip {
        #[serde(default)]
        rect: Option<[i32; 4]>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pointing {
    Left,
    Up,
    Right,
    Down,
}

impl From<Pointing> for Orientation {
    fn from(p: Pointing) -> Self {
        match p {
            Pointing::Left => Orientation::Left,
            Pointing::Up => Orientation::Up,
            Pointing::Right => Orientation::Right,
            Pointing::Down => Orientation::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SceneColor(pub Color);

impl TryFrom<String> for SceneColor {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        parse_color(&s).map(SceneColor)
    }
}

/// Parse `#rrggbb`, `#rrggbbaa` or a color name.
pub fn parse_color(s: &str) -> std::result::Result<Color, String> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "black" => return Ok(Color::black()),
        "white" => return Ok(Color::white()),
        "transparent" => return Ok(Color::TRANSPARENT),
        "red" => return Ok(Color::rgb(255, 0, 0)),
        "green" => return Ok(Color::rgb(0, 128, 0)),
        "blue" => return Ok(Color::rgb(0, 0, 255)),
        _ => {}
    }

    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| format!("color '{s}' is neither a name nor #rrggbb[aa]"))?;
    if !matches!(hex.len(), 6 | 8) {
        return Err(format!("color '{s}' must have 6 or 8 hex digits"));
    }
    let value = u32::from_str_radix(hex, 16).map_err(|e| format!("color '{s}': {e}"))?;
    let (rgb, a) = if hex.len() == 6 { (value, 0xff) } else { (value >> 8, value & 0xff) };
    Ok(Color::rgba((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, a as u8))
}

fn rect(r: &[i32; 4]) -> Rect {
    Rect::new(r[0], r[1], r[2], r[3])
}

impl Scene {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse scene")
    }

    pub fn pixel_format(&self) -> Result<PixelFormatType> {
        match &self.format {
            Some(name) => name.parse().map_err(anyhow::Error::msg),
            None => Ok(PixelFormatType::Argb),
        }
    }

    /// Draw every command, in order, onto a fresh canvas.
    pub fn render(&self, engine: &RasterEngine) -> Result<Surface<'static>> {
        let format = self.pixel_format()?;
        let mut surface = engine
            .create_surface_sized(self.width, self.height, format, SurfaceCategory::Canvas)
            .with_context(|| format!("Failed to create {}x{} canvas", self.width, self.height))?;
        let canvas = surface.bounds();
        engine.clear(&mut surface, &canvas, self.background.0)?;

        let mut atlas = AtlasGlyphCache::new(ATLAS_SIZE, TextureFormat::Alpha8)?;
        for (i, command) in self.commands.iter().enumerate() {
            log::debug!("Scene command {}: {:?}", i, command);
            draw_command(engine, &mut surface, &mut atlas, command)
                .with_context(|| format!("Scene command {} failed", i))?;
        }

        let stats = atlas.stats();
        if stats.glyphs > 0 {
            log::info!(
                "Glyph atlas: {} glyphs, {} rows used, hit rate {:.0}%",
                stats.glyphs,
                stats.used_height,
                stats.hit_rate() * 100.0
            );
        }
        Ok(surface)
    }
}

fn draw_command(
    engine: &RasterEngine,
    surface: &mut Surface<'_>,
    atlas: &mut AtlasGlyphCache,
    command: &DrawCommand,
) -> Result<()> {
    match command {
        DrawCommand::FillRect { rect: r, color } => engine.rectangle_filled(surface, &rect(r), color.0)?,
        DrawCommand::OutlineRect { rect: r, color } => engine.rectangle_outlined(surface, &rect(r), color.0)?,
        DrawCommand::Line { from, to, color, antialias } => {
            if *antialias {
                primitives::aa_line(surface, from[0], from[1], to[0], to[1], color.0)?
            } else {
                engine.line(surface, from[0], from[1], to[0], to[1], color.0)?
            }
        }
        DrawCommand::Ellipse { center, radii, color, fill, antialias } => {
            let [x, y] = *center;
            let [rx, ry] = *radii;
            match (fill, antialias) {
                (true, _) => engine.ellipse_filled(surface, x, y, rx, ry, color.0)?,
                (false, true) => primitives::aa_ellipse(surface, x, y, rx, ry, color.0)?,
                (false, false) => engine.ellipse_outlined(surface, x, y, rx, ry, color.0)?,
            }
        }
        DrawCommand::Polygon { points, color, fill } => {
            let vx: Vec<i32> = points.iter().map(|p| p[0]).collect();
            let vy: Vec<i32> = points.iter().map(|p| p[1]).collect();
            if *fill {
                engine.polygon_filled(surface, &vx, &vy, color.0)?
            } else {
                primitives::polygon_outline(surface, &vx, &vy, color.0)?
            }
        }
        DrawCommand::Triangle { at, size, pointing, color } => {
            engine.triangle_oriented(surface, at[0], at[1], *size, (*pointing).into(), color.0)?
        }
        DrawCommand::Text { at, text, color, scale, rotate, opacity } => {
            let font = BitmapFont::new(*scale);
            let mut ctx = GraphicsContext::new(engine, surface);
            ctx.fill_color = color.0;
            ctx.transparency = opacity.clamp(0.0, 1.0);
            if *rotate != 0.0 {
                ctx.transform = Some(Matrix2D::rotate(rotate.to_radians()));
            }
            draw_text(&mut ctx, &font, atlas, text, Point::new(at[0], at[1]))?
        }
        DrawCommand::Clip { rect: r } => surface.set_clip_rect(r.as_ref().map(rect)),
    }
    Ok(())
}
