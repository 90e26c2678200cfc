//! Error types for swraster
//!
//! Every fallible raster operation returns [`Result`]. Degenerate geometry
//! (empty clip intersections, zero-sized glyph runs) is not an error and
//! comes back as `Ok(())`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RasterError>;

/// Main error type for swraster
#[derive(Debug, Error)]
pub enum RasterError {
    /// A pixel buffer could not be allocated. No partial surface is left behind.
    #[error("Out of memory allocating {bytes} bytes of pixel data")]
    OutOfMemory { bytes: usize },

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Invalid pixel format")]
    InvalidPixelFormat,

    /// The surface has no pixel storage (never allocated, freed, or compressed).
    #[error("Surface has no pixel data")]
    NotAllocated,

    #[error("Buffer too small: expected {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("Compression failed: {0}")]
    Compression(String),

    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl RasterError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingResource(what.into())
    }
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}
