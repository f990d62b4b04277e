//! CUPS filter: rastertophomemo
//!
//! Reads CUPS raster from stdin (or a named spool file), thresholds each
//! 8-bit grayscale page into a packed 1-bit bitmap, and writes Phomemo
//! M110/M220 command frames to stdout.
//!
//! Usage (called by CUPS):
//!   rastertophomemo job-id user title copies options [filename]
//!
//! Per page the output is init frame (speed, density, media type), raster
//! frame (header + bitmap), footer frame, followed by a flush.

mod raster;

use phomemo_proto::bitmap::{row_stride, threshold_line};
use phomemo_proto::cmd;
use phomemo_proto::page::{write_page, PageSettings};
use raster::{RasterError, RasterReader};
use std::fs::File;
use std::io::{Read, Write};
use std::process;

/// Parse PhomemoDensity / PhomemoSpeed from the CUPS options string.
/// Options format: "key=value key2=value2 ...".
fn parse_settings(options: &str) -> PageSettings {
    let mut settings = PageSettings::default();
    for opt in options.split_whitespace() {
        if let Some(val) = opt.strip_prefix("PhomemoDensity=") {
            if let Ok(d) = val.parse::<u8>() {
                settings.density = d.clamp(1, 15);
            }
        } else if let Some(val) = opt.strip_prefix("PhomemoSpeed=") {
            if let Ok(s) = val.parse::<u8>() {
                settings.speed = s.clamp(1, 5);
            }
        }
    }
    settings
}

/// Allocate a zeroed buffer, reporting failure instead of aborting.
fn alloc_buf(len: usize) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| format!("unable to allocate {len} bytes"))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Run the filter over one raster stream, writing command frames to `out`.
/// Returns the number of pages read (emitted or skipped).
fn process<R: Read, W: Write>(
    input: R,
    out: &mut W,
    settings: PageSettings,
) -> Result<u32, Box<dyn std::error::Error>> {
    let mut reader =
        RasterReader::open(input).map_err(|e| format!("unable to open raster stream: {e}"))?;
    eprintln!("DEBUG: raster stream opened");

    let mut page = 0u32;
    loop {
        let header = match reader.read_header() {
            Ok(Some(h)) => h,
            Ok(None) => break,
            Err(RasterError::TruncatedHeader) => {
                eprintln!("WARNING: truncated page header, stopping");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        page += 1;

        eprintln!(
            "DEBUG: page {}: {}x{} pixels, {} bpp, colorspace={}, mediatype={}",
            page,
            header.width,
            header.height,
            header.bits_per_pixel,
            header.color_space,
            header.media_type
        );

        if header.width == 0 || header.height == 0 {
            eprintln!("DEBUG: empty page, skipping");
            continue;
        }
        if header.bits_per_pixel != 8 {
            return Err(format!("expected 8bpp grayscale, got {}bpp", header.bits_per_pixel).into());
        }
        if header.width > u16::MAX as u32 || header.height > u16::MAX as u32 {
            return Err(format!(
                "page {}x{} exceeds the 16-bit raster command fields",
                header.width, header.height
            )
            .into());
        }
        if header.bytes_per_line < header.width {
            return Err(format!(
                "bytes per line {} smaller than width {}",
                header.bytes_per_line, header.width
            )
            .into());
        }

        let stride = row_stride(header.width);
        let mut line_in = alloc_buf(header.bytes_per_line as usize)?;
        let mut line_out = alloc_buf(stride)?;
        let mut bitmap = alloc_buf(stride * header.height as usize)?;

        // Read and convert each line; a short read ends the page early
        let mut rows = 0usize;
        for y in 0..header.height {
            if let Err(e) = reader.read_pixels(&mut line_in) {
                eprintln!("DEBUG: error reading line {y}: {e}");
                break;
            }
            threshold_line(&line_in, header.width, &mut line_out);
            bitmap[rows * stride..(rows + 1) * stride].copy_from_slice(&line_out);
            rows += 1;
        }

        eprintln!("DEBUG: read {rows} lines, sending to printer");

        let page_settings = PageSettings {
            media_type: cmd::resolve_media_type(header.media_type),
            ..settings
        };
        bitmap.truncate(rows * stride);
        write_page(out, &page_settings, stride as u16, rows as u16, &bitmap)?;

        eprintln!("PAGE: {page} 1");
        eprintln!("DEBUG: page {page} sent");
    }

    Ok(page)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    // CUPS filter args: job-id user title copies options [filename]
    if args.len() < 6 || args.len() > 7 {
        eprintln!(
            "Usage: {} job-id user title copies options [filename]",
            args[0]
        );
        process::exit(1);
    }

    eprintln!("DEBUG: rastertophomemo filter starting");
    let settings = parse_settings(&args[5]);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let pages = if args.len() == 7 {
        let file = File::open(&args[6])
            .map_err(|e| format!("unable to open input file {}: {e}", args[6]))?;
        process(file, &mut out, settings)?
    } else {
        let stdin = std::io::stdin();
        process(stdin.lock(), &mut out, settings)?
    };

    eprintln!("DEBUG: filter complete, processed {pages} pages");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }
}
