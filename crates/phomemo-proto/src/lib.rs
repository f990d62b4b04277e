//! Phomemo M110/M220 printer protocol.
//!
//! The M110/M220 family speaks a small ESC/POS-style dialect: a three-command
//! initialization sequence (print speed, density, media type), a `GS v 0`
//! raster transfer carrying a packed 1-bit bitmap, and a two-command
//! end-of-job footer. This crate builds those frames and converts 8-bit
//! grayscale scanlines into the inverted 1-bit rows the raster transfer
//! expects (set bit = energize the thermal head = black mark).

pub mod bitmap;
pub mod cmd;
pub mod error;
pub mod page;

pub use error::{Error, Result};
