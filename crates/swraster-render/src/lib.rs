// this_file: crates/swraster-render/src/lib.rs

//! Swraster Render: drawing into [`Surface`](swraster_core::Surface)s
//!
//! Most callers only need [`RasterEngine`], which ties the pieces together:
//!
//! - [`pixel`] and [`primitives`] - clipped pixels, rects, lines, ellipses, polygons
//! - [`blit`] - clipped copies with format conversion and premultiplied blending
//! - [`transform`] - fading, affine resampling, zoom, shrink, quarter turns
//! - [`compress`] - RLE packing of idle images
//! - [`glyph`], [`atlas`], [`text`] - glyph atlases and text runs
//!
//! ```
//! use swraster_core::{Color, Matrix2D, PixelFormatType, Rect, Surface, SurfaceCategory};
//! use swraster_render::RasterEngine;
//!
//! let engine = RasterEngine::default();
//! let mut canvas = engine.create_surface_sized(32, 32, PixelFormatType::Argb, SurfaceCategory::MainView)?;
//! engine.rectangle_filled(&mut canvas, &Rect::new(0, 0, 32, 32), Color::white())?;
//! engine.ellipse_filled(&mut canvas, 16, 16, 8, 6, Color::rgba(255, 0, 0, 128))?;
//!
//! let mut copy = engine.create_surface_sized(32, 32, PixelFormatType::Xrgb, SurfaceCategory::Scratch)?;
//! let copy_rect = copy.bounds();
//! engine.draw_surface(&canvas, &canvas.bounds(), &mut copy, &copy_rect, &Matrix2D::IDENTITY, 1.0)?;
//! # Ok::<(), swraster_core::RasterError>(())
//! ```

pub mod atlas;
pub mod blit;
pub mod compress;
pub mod engine;
pub mod glyph;
pub mod pixel;
pub mod primitives;
pub mod text;
pub mod transform;

pub use atlas::{AtlasGlyphCache, AtlasKey, AtlasStats};
pub use blit::{blit, blit_edge_tiled, blit_no_clip, blit_tiled, clip_for_blit, BlitInfo, BlitMode};
pub use compress::{compress_image, pack_rle, unpack_compressed};
pub use engine::{DrawSource, RasterEngine};
pub use glyph::{composite_glyphs, GlyphDrawInfo, TextEffect};
pub use primitives::{Orientation, PolygonScratch};
pub use text::{draw_glyph_run, layout_glyph_run, GlyphRun, GraphicsContext};
pub use transform::{create_transparent_surface, rotate_surface_90, shrink_surface, transform_surface, zoom_surface};
