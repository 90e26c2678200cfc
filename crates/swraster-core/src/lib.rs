// this_file: crates/swraster-core/src/lib.rs

//! Swraster Core: the data model of a software rasterizer
//!
//! Everything the raster paths agree on lives here:
//!
//! - [`format`] - pixel layouts, table driven per [`PixelFormatType`]
//! - [`color`] - straight ARGB [`Color`] and the integer blend helpers
//! - [`geometry`] - [`Rect`], [`Point`], [`Matrix2D`]
//! - [`surface`] - owned or borrowed 2D pixel buffers with a clip rect
//! - [`traits`] - the font, glyph cache and exporter seams
//! - [`config`] - engine settings, passed explicitly
//!
//! ```
//! use swraster_core::{Color, PixelFormatType, Rect, Surface, SurfaceCategory};
//!
//! let mut surface = Surface::create(16, 16, PixelFormatType::Argb, SurfaceCategory::Scratch)?;
//! surface.set_clip_rect(Some(Rect::new(4, 4, 100, 100)));
//! assert_eq!(surface.clip_rect(), Rect::new(4, 4, 12, 12));
//!
//! let argb = surface.pixel_format().encode(Color::rgb(255, 0, 0));
//! assert_eq!(argb, 0xffff0000);
//! # Ok::<(), swraster_core::RasterError>(())
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod geometry;
pub mod surface;
pub mod traits;

pub use color::{div255_round, multiply_color_alpha, Color, NativeColor};
pub use config::{CompressionMode, RasterConfig, SampleFilter};
pub use error::{ExportError, RasterError, Result};
pub use format::{PixelFormat, PixelFormatType};
pub use geometry::{intersect_rect, Matrix2D, Point, Rect};
pub use surface::{
    try_alloc_pixels, PixelStore, SharedSurface, Surface, SurfaceCategory, SurfaceFlags,
    SurfaceLock,
};
pub use traits::{
    Exporter, Font, GlyphBitmap, GlyphCache, GlyphId, GlyphMetrics, GlyphTexture,
    GlyphTextureInfo, TextureFormat,
};
