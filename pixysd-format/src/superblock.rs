
use log::warn;
use pixysd_common::SuperblockLayout;
use crate::{ crc, ensure_len, le_u32, DecodeError };

/// One copy of the card's metadata block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuperblockHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Session (boot) counter
    pub counter: u32,
    pub checksum: u16,
    /// Magic and checksum both matched
    pub valid: bool,
}
impl SuperblockHeader {
    pub const VERSION: u32 = 1;

    pub fn decode(raw: &[u8], layout: &SuperblockLayout) -> Result<Self, DecodeError> {
        ensure_len("superblock", raw, layout.len())?;
        let body = &raw[..layout.fields_len()];
        let magic = [raw[0], raw[1], raw[2], raw[3]];
        let checksum = crc::read_stored(&raw[layout.fields_len()..], layout.checksum);
        let valid = magic == layout.magic && crc::verify(body, checksum, layout.checksum);
        Ok(Self {
            magic,
            version: le_u32(raw, 4),
            counter: le_u32(raw, 8),
            checksum,
            valid,
        })
    }

    /// Serialize a superblock the way the firmware formats the card.
    pub fn encode(counter: u32, layout: &SuperblockLayout) -> Vec<u8> {
        let mut out = Vec::with_capacity(layout.len());
        out.extend_from_slice(&layout.magic);
        out.extend_from_slice(&Self::VERSION.to_le_bytes());
        out.extend_from_slice(&counter.to_le_bytes());
        let sum = crc::compute(&out, layout.checksum);
        crc::write_stored(&mut out, sum, layout.checksum);
        out
    }
}

/// Outcome of reading both superblocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionLocation {
    /// Highest valid counter, or 0 when neither copy is valid
    pub counter: u32,
    pub slots: [Option<SuperblockHeader>; 2],
}
impl SessionLocation {
    /// Neither copy could be trusted and `counter` is only a default.
    pub fn is_degraded(&self) -> bool {
        !self.slots.iter().any(|s| matches!(s, Some(h) if h.valid))
    }
}

/// Pick the session counter from the two redundant superblocks.
///
/// The device alternates writes between the copies, so the newer one is
/// the valid copy with the larger counter. A slot too short to decode is
/// treated like an invalid one.
pub fn locate(slots: [&[u8]; 2], layout: &SuperblockLayout) -> SessionLocation {
    let decoded = slots.map(|raw| SuperblockHeader::decode(raw, layout).ok());
    let counter = decoded.iter()
        .flatten()
        .filter(|h| h.valid)
        .map(|h| h.counter)
        .max();

    let res = SessionLocation {
        counter: counter.unwrap_or(0),
        slots: decoded,
    };
    if res.is_degraded() {
        warn!("Both header blocks are invalid. Proceed with caution...");
    }
    res
}
