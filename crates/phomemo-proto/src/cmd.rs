/// Command lead-in bytes.
pub const ESC: u8 = 0x1B;
pub const GS: u8 = 0x1D;
pub const US: u8 = 0x1F;

/// ESC N sub-commands.
pub const SUB_SPEED: u8 = 0x0D;
pub const SUB_DENSITY: u8 = 0x04;

/// Defaults used when the job carries no overrides.
pub const DEFAULT_SPEED: u8 = 5;
pub const DEFAULT_DENSITY: u8 = 10;

/// Media type substituted when the raster header leaves it unset (0).
pub const DEFAULT_MEDIA_TYPE: u8 = 0x0A;

/// Build the print speed command: ESC N 0x0D <speed>.
pub fn make_speed(speed: u8) -> [u8; 4] {
    [ESC, b'N', SUB_SPEED, speed]
}

/// Build the print density command: ESC N 0x04 <density>.
pub fn make_density(density: u8) -> [u8; 4] {
    [ESC, b'N', SUB_DENSITY, density]
}

/// Build the media type command: 0x1F 0x11 <type>.
pub fn make_media_type(media_type: u8) -> [u8; 3] {
    [US, 0x11, media_type]
}

/// Map the raster header's media type to the command byte.
///
/// The header value is forwarded as a single byte; zero means "unset" and
/// selects the default.
pub fn resolve_media_type(header_media_type: u32) -> u8 {
    if header_media_type == 0 {
        DEFAULT_MEDIA_TYPE
    } else {
        header_media_type as u8
    }
}

/// Build the raster transfer header: GS v 0 <mode> <stride LE> <rows LE>.
///
/// Layout:
///   [0]  0x1D   [1]  'v'
///   [2]  '0'    [3]  0x00   (mode = normal)
///   [4..5]  row stride in bytes, LE
///   [6..7]  row count, LE
///
/// The `stride * rows` bytes of bitmap data follow immediately.
pub fn make_raster_header(stride: u16, rows: u16) -> [u8; 8] {
    let mut hdr = [0u8; 8];
    hdr[0] = GS;
    hdr[1] = b'v';
    hdr[2] = b'0';
    // hdr[3] = 0x00;
    hdr[4] = (stride & 0xFF) as u8;
    hdr[5] = (stride >> 8) as u8;
    hdr[6] = (rows & 0xFF) as u8;
    hdr[7] = (rows >> 8) as u8;
    hdr
}

/// Build the end-of-job footer: 0x1F 0xF0 0x05 0x00, 0x1F 0xF0 0x03 0x00.
pub fn make_footer() -> [u8; 8] {
    [US, 0xF0, 0x05, 0x00, US, 0xF0, 0x03, 0x00]
}
