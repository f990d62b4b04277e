//! Per-page command frame emission.
//!
//! Each printed page is exactly three frames on the wire, in order:
//! init (speed, density, media type), raster (header + bitmap payload),
//! footer. The output is flushed after the footer so a finished page
//! reaches the device before the next one is assembled.

use crate::cmd;
use crate::error::{Error, Result};
use std::io::Write;

/// Per-page print parameters carried in the init frame.
#[derive(Debug, Clone, Copy)]
pub struct PageSettings {
    /// Print speed, 1-5.
    pub speed: u8,
    /// Burn density, 1-15.
    pub density: u8,
    /// Paper handling profile; opaque to the filter.
    pub media_type: u8,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            speed: cmd::DEFAULT_SPEED,
            density: cmd::DEFAULT_DENSITY,
            media_type: cmd::DEFAULT_MEDIA_TYPE,
        }
    }
}

/// Emit one page: init frame, raster frame, footer, flush.
///
/// `bitmap` must hold exactly `stride * rows` bytes of packed 1-bit rows in
/// scan order. `rows` is the observed row count, which may be less than the
/// page height after a truncated read.
pub fn write_page<W: Write>(
    out: &mut W,
    settings: &PageSettings,
    stride: u16,
    rows: u16,
    bitmap: &[u8],
) -> Result<()> {
    let expected = stride as usize * rows as usize;
    if bitmap.len() != expected {
        return Err(Error::InvalidParam(format!(
            "bitmap is {} bytes, expected {} ({} x {})",
            bitmap.len(),
            expected,
            stride,
            rows
        )));
    }

    log::debug!(
        "page frame: stride={stride} rows={rows} payload={} bytes",
        bitmap.len()
    );

    out.write_all(&cmd::make_speed(settings.speed))?;
    out.write_all(&cmd::make_density(settings.density))?;
    out.write_all(&cmd::make_media_type(settings.media_type))?;

    out.write_all(&cmd::make_raster_header(stride, rows))?;
    out.write_all(bitmap)?;

    out.write_all(&cmd::make_footer())?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_page_single_black_pixel() {
        let mut out = Vec::new();
        write_page(&mut out, &PageSettings::default(), 1, 1, &[0x80]).unwrap();
        assert_eq!(
            out,
            [
                0x1B, 0x4E, 0x0D, 0x05, // speed 5
                0x1B, 0x4E, 0x04, 0x0A, // density 10
                0x1F, 0x11, 0x0A, // media type 10
                0x1D, 0x76, 0x30, 0x00, 0x01, 0x00, 0x01, 0x00, // raster 1x1
                0x80, // payload
                0x1F, 0xF0, 0x05, 0x00, 0x1F, 0xF0, 0x03, 0x00, // footer
            ]
        );
    }

    #[test]
    fn test_write_page_custom_settings() {
        let settings = PageSettings {
            speed: 3,
            density: 15,
            media_type: 0x0B,
        };
        let mut out = Vec::new();
        write_page(&mut out, &settings, 1, 1, &[0x00]).unwrap();
        assert_eq!(&out[..11], &[
            0x1B, 0x4E, 0x0D, 0x03, 0x1B, 0x4E, 0x04, 0x0F, 0x1F, 0x11, 0x0B
        ]);
    }

    #[test]
    fn test_write_page_truncated_rows() {
        // 2 bytes/row, 3 of 5 rows survived a short read
        let bitmap = [0xFFu8; 6];
        let mut out = Vec::new();
        write_page(&mut out, &PageSettings::default(), 2, 3, &bitmap).unwrap();
        // raster header carries the observed count
        assert_eq!(&out[11..19], &[0x1D, 0x76, 0x30, 0x00, 0x02, 0x00, 0x03, 0x00]);
        assert_eq!(out.len(), 11 + 8 + 6 + 8);
    }

    #[test]
    fn test_write_page_zero_rows() {
        let mut out = Vec::new();
        write_page(&mut out, &PageSettings::default(), 2, 0, &[]).unwrap();
        // init + empty raster + footer
        assert_eq!(out.len(), 11 + 8 + 8);
        assert_eq!(&out[15..19], &[0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_write_page_rejects_size_mismatch() {
        let mut out = Vec::new();
        let err = write_page(&mut out, &PageSettings::default(), 2, 2, &[0x00; 3]);
        assert!(matches!(err, Err(Error::InvalidParam(_))));
        // Nothing may have been written for a rejected page
        assert!(out.is_empty());
    }
}
