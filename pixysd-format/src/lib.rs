//! Decoding of the recorder's on-card storage layout.
//!
//! Nothing in here touches a device: callers hand in the bytes they read,
//! and get back headers, images and statistics. Checksum failures are
//! reported through validity flags rather than errors, so a corrupted
//! frame can still be shown.

pub mod crc;
pub mod address;
pub mod cursor;
pub mod header;
pub mod image;
pub mod superblock;
pub mod latency;

pub use crate::address::*;
pub use crate::cursor::*;
pub use crate::header::*;
pub use crate::image::*;
pub use crate::superblock::*;
pub use crate::latency::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The input is shorter than the region being decoded.
    Truncated {
        what: &'static str,
        needed: usize,
        got: usize,
    },
}
impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated { what, needed, got } => {
                write!(f, "{} needs {} bytes, got {}", what, needed, got)
            },
        }
    }
}
impl std::error::Error for DecodeError {}

pub(crate) fn ensure_len(what: &'static str, buf: &[u8], needed: usize)
    -> Result<(), DecodeError>
{
    if buf.len() < needed {
        return Err(DecodeError::Truncated { what, needed, got: buf.len() });
    }
    Ok(())
}

pub(crate) fn le_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

pub(crate) fn le_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}
