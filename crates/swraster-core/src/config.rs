//! Raster engine configuration
//!
//! Settings travel with the engine as a plain value. [`RasterConfig::from_env`]
//! seeds them from the environment:
//!
//! ```bash
//! SWRASTER_COMPRESSION=rle SWRASTER_FILTER=nearest ./my_app
//! ```
//!
//! | Variable | Values |
//! |---|---|
//! | `SWRASTER_COMPRESSION` | `rle`, `off`, or a flag (`1`/`true`/`yes`/`on` means `rle`) |
//! | `SWRASTER_MIN_COMPRESS_BYTES` | integer |
//! | `SWRASTER_FILTER` | `nearest`, `bilinear` |
//! | `SWRASTER_DUMP_DIR` | directory for debug dumps |

use std::path::PathBuf;
use std::str::FromStr;

/// Images smaller than this are never worth packing.
pub const DEFAULT_MIN_COMPRESS_BYTES: usize = 1024;

/// Glyph runs up to this many pixels fit the preallocated scratch buffer.
pub const DEFAULT_GLYPH_SCRATCH_PIXELS: usize = 500;

/// In-memory image compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMode {
    #[default]
    Off,
    Rle,
}

impl FromStr for CompressionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rle" | "1" | "true" | "yes" | "on" => Ok(CompressionMode::Rle),
            "off" | "none" | "0" | "false" | "no" => Ok(CompressionMode::Off),
            other => Err(format!("unknown compression mode '{other}'")),
        }
    }
}

/// Sampling used when resampling a transformed surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFilter {
    Nearest,
    #[default]
    Bilinear,
}

impl FromStr for SampleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(SampleFilter::Nearest),
            "bilinear" | "linear" => Ok(SampleFilter::Bilinear),
            other => Err(format!("unknown sample filter '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterConfig {
    pub compression: CompressionMode,
    pub min_compress_bytes: usize,
    pub glyph_scratch_pixels: usize,
    pub transform_filter: SampleFilter,
    /// Directory for PPM debug dumps; dumps are off when unset.
    pub dump_dir: Option<PathBuf>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            compression: CompressionMode::Off,
            min_compress_bytes: DEFAULT_MIN_COMPRESS_BYTES,
            glyph_scratch_pixels: DEFAULT_GLYPH_SCRATCH_PIXELS,
            transform_filter: SampleFilter::Bilinear,
            dump_dir: None,
        }
    }
}

impl RasterConfig {
    /// Defaults overridden by `SWRASTER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`RasterConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("SWRASTER_COMPRESSION") {
            match val.parse() {
                Ok(mode) => {
                    config.compression = mode;
                    log::info!("Image compression set to {:?} via SWRASTER_COMPRESSION", mode);
                }
                Err(e) => log::warn!("Ignoring SWRASTER_COMPRESSION: {}", e),
            }
        }

        if let Some(val) = lookup("SWRASTER_MIN_COMPRESS_BYTES") {
            match val.trim().parse() {
                Ok(n) => config.min_compress_bytes = n,
                Err(e) => log::warn!("Ignoring SWRASTER_MIN_COMPRESS_BYTES={}: {}", val, e),
            }
        }

        if let Some(val) = lookup("SWRASTER_FILTER") {
            match val.parse() {
                Ok(filter) => config.transform_filter = filter,
                Err(e) => log::warn!("Ignoring SWRASTER_FILTER: {}", e),
            }
        }

        if let Some(dir) = lookup("SWRASTER_DUMP_DIR").filter(|d| !d.is_empty()) {
            config.dump_dir = Some(PathBuf::from(dir));
        }

        config
    }

    pub fn compression_enabled(&self) -> bool {
        self.compression != CompressionMode::Off
    }
}
