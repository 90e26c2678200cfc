//! Run-length packing of decoded images
//!
//! Large images that sit idle in a cache can be packed to save memory and
//! unpacked into a scratch surface when drawn. The stream is independent
//! of the surface's pixel layout:
//!
//! ```text
//! [has_alpha: u8] then runs of
//!   0x00..=0x7f  n + 1 literal pixels follow
//!   0x80..=0xff  next pixel repeats n - 126 times (2..=129)
//! pixel = r, g, b [, a]
//! ```

use swraster_core::{
    Color, PixelFormat, RasterError, Result, Surface, SurfaceCategory, SurfaceFlags,
};

const MAX_LITERAL: usize = 128;
const MAX_REPEAT: usize = 129;

fn push_pixel(out: &mut Vec<u8>, c: Color, has_alpha: bool) {
    out.extend_from_slice(&[c.r, c.g, c.b]);
    if has_alpha {
        out.push(c.a);
    }
}

/// RLE-pack the pixels of `surface`.
pub fn pack_rle(surface: &Surface<'_>, has_alpha: bool) -> Result<Vec<u8>> {
    let pixels = surface.pixels().ok_or(RasterError::NotAllocated)?;
    let format = *surface.pixel_format();
    let (w, h) = surface.dimensions();

    let mut colors = Vec::with_capacity((w.max(0) * h.max(0)) as usize);
    for y in 0..h {
        for x in 0..w {
            let c = format.read_color(&pixels[surface.offset_of(x, y)..]);
            colors.push(if has_alpha { c } else { c.with_alpha(255) });
        }
    }

    let mut out = vec![u8::from(has_alpha)];
    let mut i = 0;
    while i < colors.len() {
        let mut run = 1;
        while i + run < colors.len() && run < MAX_REPEAT && colors[i + run] == colors[i] {
            run += 1;
        }
        if run >= 2 {
            out.push((run + 126) as u8);
            push_pixel(&mut out, colors[i], has_alpha);
            i += run;
            continue;
        }

        // Literal run up to the next pair of equal pixels.
        let start = i;
        while i < colors.len()
            && i - start < MAX_LITERAL
            && !(i + 1 < colors.len() && colors[i + 1] == colors[i])
        {
            i += 1;
        }
        out.push((i - start - 1) as u8);
        for &c in &colors[start..i] {
            push_pixel(&mut out, c, has_alpha);
        }
    }
    Ok(out)
}

/// Decode a stream produced by [`pack_rle`] into the pixels of `out`.
fn unpack_rle_into(packed: &[u8], out: &mut Surface<'_>) -> Result<()> {
    let truncated = || RasterError::Compression("truncated RLE stream".into());
    let (&flag, mut rest) = packed.split_first().ok_or_else(truncated)?;
    let has_alpha = flag != 0;
    let px_len = if has_alpha { 4 } else { 3 };

    let format: PixelFormat = *out.pixel_format();
    let (w, h) = out.dimensions();
    let total = (w.max(0) as usize) * (h.max(0) as usize);
    let mut written = 0usize;

    let mut emit = |out: &mut Surface<'_>, bytes: &[u8]| -> Result<()> {
        if written >= total {
            return Err(RasterError::Compression("RLE stream longer than image".into()));
        }
        let a = if has_alpha { bytes[3] } else { 255 };
        let c = Color::rgba(bytes[0], bytes[1], bytes[2], a);
        let x = (written % w as usize) as i32;
        let y = (written / w as usize) as i32;
        let offset = out.offset_of(x, y);
        if let Some(p) = out.pixels_mut() {
            format.write_color(&mut p[offset..], c);
        }
        written += 1;
        Ok(())
    };

    while let Some((&control, tail)) = rest.split_first() {
        rest = tail;
        if control < 0x80 {
            let n = control as usize + 1;
            if rest.len() < n * px_len {
                return Err(truncated());
            }
            for px in rest[..n * px_len].chunks_exact(px_len) {
                emit(out, px)?;
            }
            rest = &rest[n * px_len..];
        } else {
            let n = control as usize - 126;
            if rest.len() < px_len {
                return Err(truncated());
            }
            for _ in 0..n {
                emit(out, &rest[..px_len])?;
            }
            rest = &rest[px_len..];
        }
    }

    if written != total {
        return Err(RasterError::Compression(format!(
            "RLE stream holds {written} of {total} pixels"
        )));
    }
    Ok(())
}

/// Pack `surface` in place when it is worth it.
///
/// Images of `size_total` bytes or less are left alone. When the packed
/// stream would not be smaller than the raw pixels the surface is flagged
/// [`SurfaceFlags::IGNORE_COMPRESS_RLE`] so it is not tried again.
/// Returns the packed size when the surface was compressed.
pub fn compress_image(
    surface: &mut Surface<'_>,
    has_alpha: bool,
    size_total: usize,
    min_bytes: usize,
) -> Result<Option<usize>> {
    let flags = surface.flags();
    if flags.contains(SurfaceFlags::IGNORE_COMPRESS_RLE) || surface.is_compressed() || surface.is_borrowed() {
        return Ok(None);
    }
    if !surface.is_allocated() || size_total <= min_bytes {
        return Ok(None);
    }

    let packed = pack_rle(surface, has_alpha)?;
    let raw = surface.size_bytes();
    if packed.len() >= raw {
        log::debug!("RLE packing {} bytes gave {}, keeping raw pixels", raw, packed.len());
        surface.set_flags(flags | SurfaceFlags::IGNORE_COMPRESS_RLE);
        return Ok(None);
    }

    let size = packed.len();
    log::debug!("RLE packed {} bytes into {}", raw, size);
    surface.store_compressed(packed, SurfaceFlags::COMPRESSED_RLE);
    Ok(Some(size))
}

/// Unpack a compressed surface into a new scratch surface, or `None` when
/// `surface` is not compressed.
pub fn unpack_compressed(surface: &Surface<'_>) -> Result<Option<Surface<'static>>> {
    if !surface.is_compressed() || !surface.flags().contains(SurfaceFlags::COMPRESSED_RLE) {
        return Ok(None);
    }
    let packed = surface.compressed_data().ok_or(RasterError::NotAllocated)?;
    let (w, h) = surface.dimensions();
    let mut out = Surface::create(
        w,
        h,
        surface.pixel_format().format_type,
        SurfaceCategory::ImageCompression,
    )?;
    unpack_rle_into(packed, &mut out)?;
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use swraster_core::PixelFormatType;

    fn striped(w: i32, h: i32) -> Surface<'static> {
        let mut s = Surface::create(w, h, PixelFormatType::Argb, SurfaceCategory::Image).unwrap();
        let pf = *s.pixel_format();
        for y in 0..h {
            for x in 0..w {
                let c = if y % 2 == 0 { Color::rgb(255, 0, 0) } else { Color::rgba(0, 0, 9, 9) };
                let off = s.offset_of(x, y);
                pf.write_color(&mut s.pixels_mut().unwrap()[off..], c);
            }
        }
        s
    }

    #[test]
    fn flat_images_pack_and_unpack() {
        let original = striped(32, 16);
        let mut s = striped(32, 16);
        let total = s.size_bytes();
        let size = compress_image(&mut s, true, total, 1024).unwrap().unwrap();
        assert!(size < original.size_bytes());
        assert!(s.is_compressed());
        assert!(!s.is_allocated());
        assert_eq!(s.compressed_size_bytes(), size);

        let unpacked = unpack_compressed(&s).unwrap().unwrap();
        assert_eq!(unpacked.category(), SurfaceCategory::ImageCompression);
        assert_eq!(unpacked.pixels(), original.pixels());
    }

    #[test]
    fn small_images_are_skipped() {
        let mut s = striped(4, 4);
        let total = s.size_bytes();
        assert_eq!(compress_image(&mut s, true, total, 1024).unwrap(), None);
        assert!(s.is_allocated());
    }

    #[test]
    fn noisy_images_are_flagged_ignore() {
        let mut s = Surface::create(32, 32, PixelFormatType::Argb, SurfaceCategory::Image).unwrap();
        for (i, b) in s.pixels_mut().unwrap().iter_mut().enumerate() {
            *b = (i * 7 % 251) as u8;
        }
        assert_eq!(compress_image(&mut s, true, 4096, 1024).unwrap(), None);
        assert!(s.flags().contains(SurfaceFlags::IGNORE_COMPRESS_RLE));
        assert!(s.is_allocated());
    }

    #[test]
    fn literal_and_repeat_runs_mix() {
        let mut s = Surface::create(5, 1, PixelFormatType::Rgb, SurfaceCategory::Image).unwrap();
        s.pixels_mut().unwrap().copy_from_slice(&[1, 1, 1, 2, 2, 2, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
        let packed = pack_rle(&s, false).unwrap();
        assert_eq!(packed, vec![0, 0, 1, 1, 1, 128, 2, 2, 2, 1, 3, 3, 3, 4, 4, 4]);

        let mut out = Surface::create(5, 1, PixelFormatType::Rgb, SurfaceCategory::Scratch).unwrap();
        unpack_rle_into(&packed, &mut out).unwrap();
        assert_eq!(out.pixels(), s.pixels());
    }

    #[test]
    fn corrupt_streams_are_rejected() {
        let mut out = Surface::create(2, 1, PixelFormatType::Argb, SurfaceCategory::Scratch).unwrap();
        assert!(unpack_rle_into(&[1, 0x80], &mut out).is_err());
        assert!(unpack_rle_into(&[0, 0x85, 1, 2, 3], &mut out).is_err());
        assert!(unpack_rle_into(&[], &mut out).is_err());
    }
}
