//! Table-driven CRCs used by the recorder firmware.

use pixysd_common::ChecksumKind;

const CRC8_POLY: u8 = 0x07;
const CRC16_POLY: u16 = 0x1021;
const CRC16_INIT: u16 = 0xffff;

const fn crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ CRC8_POLY } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ CRC16_POLY } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC8_TABLE: [u8; 256] = crc8_table();
static CRC16_TABLE: [u16; 256] = crc16_table();

pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |crc, b| CRC8_TABLE[(crc ^ b) as usize])
}

pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    data.iter().fold(CRC16_INIT, |crc, b| {
        let idx = ((crc >> 8) as u8 ^ b) as usize;
        (crc << 8) ^ CRC16_TABLE[idx]
    })
}

/// Compute the checksum of `data`, widened to 16 bits.
pub fn compute(data: &[u8], kind: ChecksumKind) -> u16 {
    match kind {
        ChecksumKind::Crc8 => crc8(data) as u16,
        ChecksumKind::Crc16CcittFalse => crc16_ccitt_false(data),
    }
}

/// Returns true if `stored` matches the checksum of `data`.
///
/// `data` must not include the checksum field itself.
pub fn verify(data: &[u8], stored: u16, kind: ChecksumKind) -> bool {
    compute(data, kind) == stored
}

/// Read a stored checksum (little-endian when it's two bytes wide)
pub fn read_stored(buf: &[u8], kind: ChecksumKind) -> u16 {
    match kind {
        ChecksumKind::Crc8 => buf[0] as u16,
        ChecksumKind::Crc16CcittFalse => crate::le_u16(buf, 0),
    }
}

/// Append a checksum in its stored representation
pub fn write_stored(out: &mut Vec<u8>, value: u16, kind: ChecksumKind) {
    match kind {
        ChecksumKind::Crc8 => out.push(value as u8),
        ChecksumKind::Crc16CcittFalse => out.extend_from_slice(&value.to_le_bytes()),
    }
}
