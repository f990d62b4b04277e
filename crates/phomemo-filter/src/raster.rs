//! CUPS raster stream reader.
//!
//! Parses the CUPS raster container directly instead of binding to
//! libcupsimage: a 4-byte sync word selects version and byte order, then
//! each page is a 1796-byte `cups_page_header2_t` followed by pixel data
//! (plain scanlines for v3 streams, line-RLE for v2).

use std::io::Read;
use thiserror::Error;

/// Sync words, as the first four stream bytes. The forward spellings mean
/// big-endian header integers, the reversed spellings little-endian.
const SYNC_V1_BE: [u8; 4] = *b"RaSt";
const SYNC_V1_LE: [u8; 4] = *b"tSaR";
const SYNC_V2_BE: [u8; 4] = *b"RaS2";
const SYNC_V2_LE: [u8; 4] = *b"2SaR";
const SYNC_V3_BE: [u8; 4] = *b"RaS3";
const SYNC_V3_LE: [u8; 4] = *b"3SaR";

/// cups_page_header2_t is 1796 bytes on the wire.
pub const PAGE_HEADER_SIZE: usize = 1796;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("not a CUPS raster stream (sync word {0:02X?})")]
    BadSync([u8; 4]),

    #[error("unsupported CUPS raster version {0}")]
    UnsupportedVersion(u8),

    #[error("truncated page header")]
    TruncatedHeader,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Big,
    Little,
}

/// Decoded subset of `cups_page_header2_t`.
///
/// Field offsets from cups/raster.h (CUPS 2.x):
///   offset 372: cupsWidth
///   offset 376: cupsHeight
///   offset 380: cupsMediaType
///   offset 384: cupsBitsPerColor
///   offset 388: cupsBitsPerPixel
///   offset 392: cupsBytesPerLine
///   offset 396: cupsColorOrder
///   offset 400: cupsColorSpace
/// Everything else is padding as far as this filter is concerned.
#[derive(Debug, Clone, Default)]
pub struct PageHeader {
    pub width: u32,
    pub height: u32,
    pub media_type: u32,
    pub bits_per_pixel: u32,
    pub bytes_per_line: u32,
    pub color_space: u32,
}

fn u32_at(raw: &[u8; PAGE_HEADER_SIZE], off: usize, order: ByteOrder) -> u32 {
    let b = [raw[off], raw[off + 1], raw[off + 2], raw[off + 3]];
    match order {
        ByteOrder::Big => u32::from_be_bytes(b),
        ByteOrder::Little => u32::from_le_bytes(b),
    }
}

/// Read up to `buf.len()` bytes; stops short only at end of stream.
fn read_up_to<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match input.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Streaming CUPS raster reader.
#[derive(Debug)]
pub struct RasterReader<R: Read> {
    input: R,
    order: ByteOrder,
    compressed: bool,
    // Current page geometry and v2 line-RLE state
    bytes_per_line: usize,
    pixel_size: usize,
    line: Vec<u8>,
    pixel: Vec<u8>,
    line_repeat: u32,
}

impl<R: Read> RasterReader<R> {
    /// Read the sync word and set up version and byte order.
    pub fn open(mut input: R) -> Result<Self> {
        let mut sync = [0u8; 4];
        input.read_exact(&mut sync)?;

        let (order, compressed) = match sync {
            SYNC_V2_BE => (ByteOrder::Big, true),
            SYNC_V2_LE => (ByteOrder::Little, true),
            SYNC_V3_BE => (ByteOrder::Big, false),
            SYNC_V3_LE => (ByteOrder::Little, false),
            SYNC_V1_BE | SYNC_V1_LE => return Err(RasterError::UnsupportedVersion(1)),
            other => return Err(RasterError::BadSync(other)),
        };

        log::debug!(
            "cups raster stream: v{}, {} header integers",
            if compressed { 2 } else { 3 },
            match order {
                ByteOrder::Big => "big-endian",
                ByteOrder::Little => "little-endian",
            }
        );

        Ok(Self {
            input,
            order,
            compressed,
            bytes_per_line: 0,
            pixel_size: 1,
            line: Vec::new(),
            pixel: Vec::new(),
            line_repeat: 0,
        })
    }

    /// Read the next page header. `Ok(None)` at a clean end of stream.
    pub fn read_header(&mut self) -> Result<Option<PageHeader>> {
        let mut raw = [0u8; PAGE_HEADER_SIZE];
        let n = read_up_to(&mut self.input, &mut raw)?;
        if n == 0 {
            return Ok(None);
        }
        if n < PAGE_HEADER_SIZE {
            return Err(RasterError::TruncatedHeader);
        }

        let header = PageHeader {
            width: u32_at(&raw, 372, self.order),
            height: u32_at(&raw, 376, self.order),
            media_type: u32_at(&raw, 380, self.order),
            bits_per_pixel: u32_at(&raw, 388, self.order),
            bytes_per_line: u32_at(&raw, 392, self.order),
            color_space: u32_at(&raw, 400, self.order),
        };

        // Reset per-page decode state
        self.bytes_per_line = header.bytes_per_line as usize;
        self.pixel_size = (header.bits_per_pixel as usize).div_ceil(8).max(1);
        self.line.clear();
        self.line.resize(self.bytes_per_line, 0);
        self.pixel.clear();
        self.pixel.resize(self.pixel_size, 0);
        self.line_repeat = 0;

        Ok(Some(header))
    }

    /// Fill `buf` with the next scanline of the current page.
    ///
    /// `buf` must be exactly `bytes_per_line` from the current header. An
    /// error means the stream could not supply a full row.
    pub fn read_pixels(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.compressed {
            self.read_line_rle(buf)
        } else {
            self.input.read_exact(buf)?;
            Ok(())
        }
    }

    /// Serve one line from the v2 RLE stream, decoding a new line group
    /// when the previous one is exhausted.
    fn read_line_rle(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.line_repeat == 0 {
            // Line group: repeat byte (count+1 lines), then one encoded line
            let repeat = self.read_byte()?;
            self.decode_line()?;
            self.line_repeat = repeat as u32 + 1;
        }
        buf.copy_from_slice(&self.line);
        self.line_repeat -= 1;
        Ok(())
    }

    /// Decode one RLE line into `self.line`.
    ///
    /// Runs: a count byte c <= 127 repeats the following pixel c+1 times;
    /// c >= 128 is followed by 257-c literal pixels.
    fn decode_line(&mut self) -> Result<()> {
        let psz = self.pixel_size;
        let mut pos = 0;
        while pos < self.bytes_per_line {
            let count = self.read_byte()?;
            if count <= 127 {
                self.input.read_exact(&mut self.pixel)?;
                for _ in 0..=count {
                    let end = (pos + psz).min(self.bytes_per_line);
                    self.line[pos..end].copy_from_slice(&self.pixel[..end - pos]);
                    pos = end;
                    if pos >= self.bytes_per_line {
                        break;
                    }
                }
            } else {
                let literal = (257 - count as usize) * psz;
                let end = (pos + literal).min(self.bytes_per_line);
                self.input.read_exact(&mut self.line[pos..end])?;
                pos = end;
            }
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.input.read_exact(&mut b)?;
        Ok(b[0])
    }
}
