//! The pixel surface: a 2D buffer plus format, stride, clip rect and category.
//!
//! A [`Surface`] either owns its pixels or borrows a buffer that somebody
//! else owns (the "other owner" case). Borrowed storage is expressed as a
//! lifetime, so a surface can never outlive the buffer it points into and
//! never frees it. Surfaces are uniquely owned; the few long-lived surfaces
//! with several holders go through [`SharedSurface`].

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::{RasterError, Result};
use crate::format::{PixelFormat, PixelFormatType};
use crate::geometry::Rect;

bitflags! {
    /// Storage and drawing flags of a surface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        /// Pixels live in a hardware texture rather than RAM.
        const TEXTURE = 0x01;
        /// Pixel memory belongs to someone else and is never freed here.
        const OTHER_OWNER = 0x02;
        /// Ignore source alpha when this surface is blitted.
        const DISABLE_ALPHA = 0x04;
        /// RLE packing was tried and did not pay off.
        const IGNORE_COMPRESS_RLE = 0x08;
        /// Reserved for the YCoCg-DXT5 block codec.
        const IGNORE_COMPRESS_YCOCG_DXT5 = 0x10;
        /// Pixels are held RLE-packed in the compressed side buffer.
        const COMPRESSED_RLE = 0x20;
        /// Reserved for the YCoCg-DXT5 block codec.
        const COMPRESSED_YCOCG_DXT5 = 0x40;
    }
}

impl SurfaceFlags {
    pub const COMPRESSED: SurfaceFlags =
        SurfaceFlags::COMPRESSED_RLE.union(SurfaceFlags::COMPRESSED_YCOCG_DXT5);
}

/// What a surface is used for. Only informational (allocation accounting,
/// debug dumps); no raster path changes behavior on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceCategory {
    #[default]
    Default,
    MainView,
    Image,
    /// Scratch target of image decompression
    ImageCompression,
    /// A string of composited glyphs
    Text,
    Movie,
    /// Zoomed or shrunk scratch surface
    Zoom,
    Scratch,
    SelectDropDown,
    Tooltip,
    Canvas,
    External,
}

/// Backing store of a surface
#[derive(Debug, Default)]
pub enum PixelStore<'a> {
    #[default]
    Empty,
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl PixelStore<'_> {
    fn as_slice(&self) -> Option<&[u8]> {
        match self {
            PixelStore::Empty => None,
            PixelStore::Owned(v) => Some(v.as_slice()),
            PixelStore::Borrowed(s) => Some(&s[..]),
        }
    }

    fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match self {
            PixelStore::Empty => None,
            PixelStore::Owned(v) => Some(v.as_mut_slice()),
            PixelStore::Borrowed(s) => Some(&mut s[..]),
        }
    }
}

/// Surface shared between several long-lived holders, e.g. a decoded image
/// referenced from more than one place. Cloning is `AddRef`, dropping is
/// `Release`. Deliberately `!Send`: one thread owns every surface.
pub type SharedSurface = Rc<RefCell<Surface<'static>>>;

/// Allocate a zero-filled pixel buffer, reporting failure instead of aborting.
pub fn try_alloc_pixels(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| RasterError::OutOfMemory { bytes: len })?;
    data.resize(len, 0);
    Ok(data)
}

fn byte_size(width: i32, height: i32, bpp: usize) -> Result<usize> {
    if width < 0 || height < 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(bpp))
        .ok_or(RasterError::OutOfMemory { bytes: usize::MAX })
}

/// Minimum length of a buffer holding `height` rows of `row_bytes` at `stride`.
fn required_len(height: i32, stride: usize, row_bytes: usize) -> usize {
    if height <= 0 {
        0
    } else {
        stride * (height as usize - 1) + row_bytes
    }
}

/// A rectangular 2D pixel surface
#[derive(Debug)]
pub struct Surface<'a> {
    format: PixelFormat,
    flags: SurfaceFlags,
    store: PixelStore<'a>,
    width: i32,
    height: i32,
    stride: usize,
    lock_count: u32,
    clip: Rect,
    category: SurfaceCategory,
    compressed: Option<Vec<u8>>,
}

impl Default for Surface<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Surface<'a> {
    /// An empty ARGB surface with no pixel storage and an empty clip rect.
    pub fn new() -> Self {
        Self {
            format: PixelFormat::new(PixelFormatType::Argb),
            flags: SurfaceFlags::empty(),
            store: PixelStore::Empty,
            width: 0,
            height: 0,
            stride: 0,
            lock_count: 0,
            clip: Rect::default(),
            category: SurfaceCategory::Default,
            compressed: None,
        }
    }

    /// Allocate a zeroed `width` x `height` surface.
    ///
    /// On allocation failure nothing is returned; there is no half-built surface.
    pub fn create(
        width: i32,
        height: i32,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<Self> {
        let mut surface = Self::new();
        surface.set_pixel_format(format_type)?;
        surface.set_category(category);
        surface.resize(width, height)?;
        Ok(surface)
    }

    /// Allocate a surface holding a copy of `data`.
    pub fn from_data(
        data: &[u8],
        width: i32,
        height: i32,
        stride: usize,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<Self> {
        let mut surface = Self::new();
        surface.set(data, width, height, stride, format_type, category)?;
        Ok(surface)
    }

    /// Wrap a buffer owned by somebody else. The surface never frees it.
    pub fn borrowed(
        data: &'a mut [u8],
        width: i32,
        height: i32,
        stride: usize,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<Self> {
        let mut surface = Self::new();
        surface.set_borrowed(data, width, height, stride, format_type, category)?;
        Ok(surface)
    }

    /// Replace the contents with a copy of `data`.
    ///
    /// Source rows are `stride` bytes apart and are copied row by row, so the
    /// source stride need not match ours.
    ///
    /// The old pixels are released before the new buffer is allocated. If
    /// that allocation fails the surface is left empty, not restored.
    pub fn set(
        &mut self,
        data: &[u8],
        width: i32,
        height: i32,
        stride: usize,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<()> {
        self.free_data();

        let format = PixelFormat::new(format_type);
        let row_bytes = byte_size(width, 1, format.bpp())?;
        if stride < row_bytes {
            return Err(RasterError::other(format!(
                "stride {stride} shorter than a {width} pixel row"
            )));
        }
        let needed = required_len(height, stride, row_bytes);
        if data.len() < needed {
            return Err(RasterError::BufferTooSmall {
                expected: needed,
                actual: data.len(),
            });
        }

        self.format = format;
        self.category = category;
        self.resize(width, height)?;

        if needed == 0 {
            return Ok(());
        }
        let dest_stride = self.stride;
        let Some(dest) = self.store.as_mut_slice() else {
            return Err(RasterError::NotAllocated);
        };
        if dest_stride == stride {
            dest[..needed].copy_from_slice(&data[..needed]);
        } else {
            for (dest_row, src_row) in dest
                .chunks_mut(dest_stride)
                .zip(data.chunks(stride))
                .take(height as usize)
            {
                dest_row[..row_bytes].copy_from_slice(&src_row[..row_bytes]);
            }
        }
        Ok(())
    }

    /// Point this surface at an externally owned buffer.
    pub fn set_borrowed(
        &mut self,
        data: &'a mut [u8],
        width: i32,
        height: i32,
        stride: usize,
        format_type: PixelFormatType,
        category: SurfaceCategory,
    ) -> Result<()> {
        self.free_data();

        let format = PixelFormat::new(format_type);
        let row_bytes = byte_size(width, 1, format.bpp())?;
        if height < 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        if stride < row_bytes {
            return Err(RasterError::other(format!(
                "stride {stride} shorter than a {width} pixel row"
            )));
        }
        let needed = required_len(height, stride, row_bytes);
        if data.len() < needed {
            return Err(RasterError::BufferTooSmall {
                expected: needed,
                actual: data.len(),
            });
        }

        self.format = format;
        self.category = category;
        self.store = PixelStore::Borrowed(data);
        self.width = width;
        self.height = height;
        self.stride = stride;
        self.flags |= SurfaceFlags::OTHER_OWNER;
        self.set_clip_rect(None);
        Ok(())
    }

    /// Become an owned copy of `source`, including its format and category.
    pub fn set_from(&mut self, source: &Surface<'_>) -> Result<()> {
        let data = source.pixels().ok_or(RasterError::NotAllocated)?;
        self.set(
            data,
            source.width,
            source.height,
            source.stride,
            source.format.format_type,
            source.category,
        )
    }

    /// Drop the current pixels and allocate `width * height * bpp` zeroed bytes.
    ///
    /// The clip rect is reset to the full surface. On failure the surface
    /// is left without pixel data.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        self.free_data();

        let size = byte_size(width, height, self.format.bpp())?;
        let data = try_alloc_pixels(size)?;

        self.store = PixelStore::Owned(data);
        self.width = width;
        self.height = height;
        self.stride = width as usize * self.format.bpp();
        self.set_clip_rect(None);
        Ok(())
    }

    /// Release pixel storage and any compressed side buffer.
    ///
    /// Borrowed pixels are only let go of, never freed. Returns whether
    /// anything was released.
    pub fn free_data(&mut self) -> bool {
        let mut released = false;

        if self.flags.intersects(SurfaceFlags::COMPRESSED) && self.compressed.is_some() {
            self.compressed = None;
            self.flags.remove(SurfaceFlags::COMPRESSED);
            released = true;
        }

        match std::mem::take(&mut self.store) {
            PixelStore::Owned(_) => {
                self.flags = SurfaceFlags::empty();
                released = true;
            }
            PixelStore::Borrowed(_) => {
                self.flags.remove(SurfaceFlags::OTHER_OWNER);
            }
            PixelStore::Empty => {}
        }

        released
    }

    /// Restrict drawing to `rect`, or to the whole surface for `None`.
    /// The clip rect never extends past the surface bounds.
    pub fn set_clip_rect(&mut self, rect: Option<Rect>) {
        let full = self.bounds();
        self.clip = match rect {
            Some(r) => r.intersection(&full),
            None => full,
        };
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip
    }

    /// `(0, 0, width, height)`
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Switch to another format's channel layout.
    ///
    /// Changing the pixel size of an allocated surface would reinterpret its
    /// rows, so that is refused.
    pub fn set_pixel_format(&mut self, format_type: PixelFormatType) -> Result<()> {
        let format = PixelFormat::new(format_type);
        if self.is_allocated() && format.bytes_per_pixel != self.format.bytes_per_pixel {
            return Err(RasterError::InvalidPixelFormat);
        }
        self.format = format;
        Ok(())
    }

    pub fn pixel_format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn set_surface_alpha(&mut self, alpha: u8) {
        self.format.surface_alpha = alpha;
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Row pitch in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Uncompressed size: `width * height * bytes_per_pixel`.
    pub fn size_bytes(&self) -> usize {
        byte_size(self.width, self.height, self.format.bpp()).unwrap_or(0)
    }

    pub fn compressed_size_bytes(&self) -> usize {
        self.compressed.as_ref().map_or(0, Vec::len)
    }

    pub fn compressed_data(&self) -> Option<&[u8]> {
        self.compressed.as_deref()
    }

    /// Replace the pixels with a compressed representation.
    ///
    /// Owned pixel storage is released; dimensions and format are kept so
    /// the image can be unpacked later.
    pub fn store_compressed(&mut self, packed: Vec<u8>, flag: SurfaceFlags) {
        if let PixelStore::Owned(_) = self.store {
            self.store = PixelStore::Empty;
        }
        self.compressed = Some(packed);
        self.flags.insert(flag);
    }

    pub fn is_compressed(&self) -> bool {
        self.flags.intersects(SurfaceFlags::COMPRESSED) && self.compressed.is_some()
    }

    pub fn is_allocated(&self) -> bool {
        !matches!(self.store, PixelStore::Empty)
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.store, PixelStore::Borrowed(_))
    }

    pub fn category(&self) -> SurfaceCategory {
        self.category
    }

    pub fn set_category(&mut self, category: SurfaceCategory) {
        self.category = category;
    }

    pub fn flags(&self) -> SurfaceFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: SurfaceFlags) {
        self.flags = flags;
    }

    pub fn lock_count(&self) -> u32 {
        self.lock_count
    }

    /// Direct pixel access for the lifetime of the returned guard.
    ///
    /// `None` when there is no RAM storage to expose (never allocated,
    /// compressed, or texture-backed).
    pub fn lock(&mut self) -> Option<SurfaceLock<'_, 'a>> {
        if !self.is_allocated() {
            return None;
        }
        self.lock_count += 1;
        Some(SurfaceLock { surface: self })
    }

    pub fn pixels(&self) -> Option<&[u8]> {
        self.store.as_slice()
    }

    pub fn pixels_mut(&mut self) -> Option<&mut [u8]> {
        self.store.as_mut_slice()
    }

    /// Bytes of row `y` covering exactly `width` pixels.
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        if y < 0 || y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let len = self.width as usize * self.format.bpp();
        self.pixels().map(|p| &p[start..start + len])
    }

    pub fn row_mut(&mut self, y: i32) -> Option<&mut [u8]> {
        if y < 0 || y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let len = self.width as usize * self.format.bpp();
        self.pixels_mut().map(|p| &mut p[start..start + len])
    }

    /// Byte offset of pixel `(x, y)`. The caller guarantees it is in bounds.
    #[inline]
    pub fn offset_of(&self, x: i32, y: i32) -> usize {
        y as usize * self.stride + x as usize * self.format.bpp()
    }

    /// Move into a reference-counted handle.
    pub fn into_shared(self) -> SharedSurface
    where
        'a: 'static,
    {
        Rc::new(RefCell::new(self))
    }
}

/// Scoped pixel access; the surface is unlocked when this is dropped.
#[derive(Debug)]
pub struct SurfaceLock<'s, 'a> {
    surface: &'s mut Surface<'a>,
}

impl SurfaceLock<'_, '_> {
    pub fn data(&self) -> &[u8] {
        self.surface.store.as_slice().unwrap_or(&[])
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.surface.store.as_mut_slice().unwrap_or(&mut [])
    }

    pub fn stride(&self) -> usize {
        self.surface.stride
    }

    pub fn dimensions(&self) -> (i32, i32) {
        self.surface.dimensions()
    }

    pub fn pixel_format(&self) -> &PixelFormat {
        &self.surface.format
    }
}

impl Drop for SurfaceLock<'_, '_> {
    fn drop(&mut self) {
        self.surface.lock_count = self.surface.lock_count.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn create_allocates_and_resets_clip() {
        let s = Surface::create(8, 4, PixelFormatType::Argb, SurfaceCategory::Image).unwrap();
        assert_eq!(s.dimensions(), (8, 4));
        assert_eq!(s.size_bytes(), 8 * 4 * 4);
        assert_eq!(s.stride(), 32);
        assert_eq!(s.clip_rect(), Rect::new(0, 0, 8, 4));
        assert_eq!(s.category(), SurfaceCategory::Image);
        assert!(s.is_allocated());
    }

    #[test]
    fn resize_reports_new_dimensions() {
        let mut s = Surface::create(2, 2, PixelFormatType::Rgb, SurfaceCategory::Default).unwrap();
        s.set_clip_rect(Some(Rect::new(1, 1, 1, 1)));
        s.resize(5, 3).unwrap();
        assert_eq!(s.dimensions(), (5, 3));
        assert_eq!(s.size_bytes(), 5 * 3 * 3);
        assert_eq!(s.clip_rect(), Rect::new(0, 0, 5, 3));
    }

    #[test]
    fn absurd_sizes_fail_without_partial_surface() {
        let err = Surface::create(i32::MAX, i32::MAX, PixelFormatType::Argb, SurfaceCategory::Default)
            .unwrap_err();
        assert!(matches!(err, RasterError::OutOfMemory { .. }));

        let mut s = Surface::create(2, 2, PixelFormatType::Argb, SurfaceCategory::Default).unwrap();
        assert!(s.resize(i32::MAX, i32::MAX).is_err());
        assert!(!s.is_allocated());
    }

    #[test]
    fn negative_dimensions_are_rejected() {
        let err = Surface::create(-1, 4, PixelFormatType::Argb, SurfaceCategory::Default).unwrap_err();
        assert!(matches!(err, RasterError::InvalidDimensions { .. }));
    }

    #[test]
    fn clip_rect_never_exceeds_bounds() {
        let mut s = Surface::create(10, 10, PixelFormatType::Argb, SurfaceCategory::Default).unwrap();
        s.set_clip_rect(Some(Rect::new(-5, 5, 100, 100)));
        assert_eq!(s.clip_rect(), Rect::new(0, 5, 10, 5));
        s.set_clip_rect(None);
        assert_eq!(s.clip_rect(), s.bounds());
    }

    #[test]
    fn set_copies_with_differing_stride() {
        // 3x2 ARGB rows padded to 16 bytes.
        let mut src = vec![0xEEu8; 32];
        for y in 0..2 {
            for b in 0..12 {
                src[y * 16 + b] = (y * 12 + b) as u8;
            }
        }
        let s = Surface::from_data(&src, 3, 2, 16, PixelFormatType::Argb, SurfaceCategory::Image)
            .unwrap();
        assert_eq!(s.stride(), 12);
        let expected: Vec<u8> = (0..24).collect();
        assert_eq!(s.pixels().unwrap(), expected.as_slice());
    }

    #[test]
    fn set_rejects_short_buffers() {
        let mut s = Surface::new();
        let err = s
            .set(&[0; 10], 2, 2, 8, PixelFormatType::Argb, SurfaceCategory::Default)
            .unwrap_err();
        assert!(matches!(err, RasterError::BufferTooSmall { expected: 16, actual: 10 }));
    }

    #[test]
    fn borrowed_surface_marks_other_owner_and_writes_through() {
        let mut buffer = vec![0u8; 2 * 2 * 4];
        {
            let mut s = Surface::borrowed(
                &mut buffer,
                2,
                2,
                8,
                PixelFormatType::Argb,
                SurfaceCategory::Text,
            )
            .unwrap();
            assert!(s.flags().contains(SurfaceFlags::OTHER_OWNER));
            let mut lock = s.lock().unwrap();
            lock.data_mut()[0] = 0xAB;
        }
        assert_eq!(buffer[0], 0xAB);
    }

    #[test]
    fn free_data_lets_go_of_borrowed_pixels() {
        let mut buffer = vec![7u8; 4];
        let mut s =
            Surface::borrowed(&mut buffer, 1, 1, 4, PixelFormatType::Argb, SurfaceCategory::Default)
                .unwrap();
        assert!(!s.free_data());
        assert!(!s.is_allocated());
        assert!(!s.flags().contains(SurfaceFlags::OTHER_OWNER));
        drop(s);
        assert_eq!(buffer, vec![7u8; 4]);
    }

    #[test]
    fn lock_guard_tracks_lock_count() {
        let mut s = Surface::create(1, 1, PixelFormatType::Argb, SurfaceCategory::Default).unwrap();
        {
            let lock = s.lock().unwrap();
            assert_eq!(lock.stride(), 4);
            assert_eq!(lock.data().len(), 4);
        }
        assert_eq!(s.lock_count(), 0);
        assert!(Surface::new().lock().is_none());
    }

    #[test]
    fn compressed_storage_releases_pixels() {
        let mut s = Surface::create(4, 4, PixelFormatType::Argb, SurfaceCategory::Image).unwrap();
        s.store_compressed(vec![1, 2, 3], SurfaceFlags::COMPRESSED_RLE);
        assert!(s.is_compressed());
        assert!(!s.is_allocated());
        assert_eq!(s.compressed_size_bytes(), 3);
        assert_eq!(s.dimensions(), (4, 4));
        assert!(s.free_data());
        assert!(!s.is_compressed());
    }

    #[test]
    fn pixel_size_change_on_allocated_surface_is_refused() {
        let mut s = Surface::create(1, 1, PixelFormatType::Argb, SurfaceCategory::Default).unwrap();
        assert!(s.set_pixel_format(PixelFormatType::Rgba).is_ok());
        assert!(matches!(
            s.set_pixel_format(PixelFormatType::Rgb),
            Err(RasterError::InvalidPixelFormat)
        ));
    }

    #[test]
    fn shared_surface_counts_holders() {
        let shared = Surface::create(1, 1, PixelFormatType::Argb, SurfaceCategory::Image)
            .unwrap()
            .into_shared();
        let second = Rc::clone(&shared);
        assert_eq!(Rc::strong_count(&shared), 2);
        drop(second);
        assert_eq!(Rc::strong_count(&shared), 1);
        assert_eq!(shared.borrow().dimensions(), (1, 1));
    }

    proptest! {
        #[test]
        fn prop_set_round_trips_rows(
            width in 1i32..12,
            height in 1i32..8,
            pad in 0usize..9,
            rgb in any::<bool>(),
        ) {
            let format = if rgb { PixelFormatType::Rgb } else { PixelFormatType::Rgba };
            let bpp = PixelFormat::new(format).bpp();
            let row = width as usize * bpp;
            let stride = row + pad;
            let src: Vec<u8> = (0..stride * height as usize).map(|i| (i * 31 % 251) as u8).collect();

            let s = Surface::from_data(&src, width, height, stride, format, SurfaceCategory::Default)
                .unwrap();
            for y in 0..height {
                let start = y as usize * stride;
                prop_assert_eq!(s.row(y).unwrap(), &src[start..start + row]);
            }
        }
    }
}
