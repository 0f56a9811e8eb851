
use pixysd_common::{ BlobRect, FrameHeaderLayout, HeaderField, Timestamp };
use crate::{ crc, ensure_len, le_u16, le_u32, DecodeError };

/// Metadata the firmware stores in front of a frame.
///
/// Fields missing from the layout are `None`. When `valid` is false the
/// checksum didn't match and none of the other fields can be trusted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameHeader {
    pub session_count: u32,
    pub frame_count: Option<u32>,
    pub timestamp: Option<Timestamp>,
    pub last_write_time_us: Option<u32>,
    pub blob_count: Option<u16>,

    /// The meaningful blobs, i.e. at most `blob_count` of them
    pub blobs: Vec<BlobRect>,

    pub checksum: u16,
    pub valid: bool,
}

fn decode_blob(buf: &[u8]) -> BlobRect {
    BlobRect {
        signature: le_u16(buf, 0),
        left: le_u16(buf, 2),
        right: le_u16(buf, 4),
        top: le_u16(buf, 6),
        bottom: le_u16(buf, 8),
    }
}

fn encode_blob(out: &mut Vec<u8>, blob: &BlobRect) {
    for word in [blob.signature, blob.left, blob.right, blob.top, blob.bottom] {
        out.extend_from_slice(&word.to_le_bytes());
    }
}

impl FrameHeader {
    /// Parse a frame header.
    ///
    /// `raw` may be longer than the header (e.g. the whole header block).
    /// A checksum mismatch is not an error, see [FrameHeader::valid].
    pub fn decode(raw: &[u8], layout: &FrameHeaderLayout) -> Result<Self, DecodeError> {
        ensure_len("frame header", raw, layout.len())?;

        let mut hdr = FrameHeader::default();
        let mut all_blobs: Vec<BlobRect> = Vec::new();
        let mut off = 0;
        for field in layout.fields {
            match field {
                HeaderField::SessionCount => hdr.session_count = le_u32(raw, off),
                HeaderField::FrameCount => hdr.frame_count = Some(le_u32(raw, off)),
                HeaderField::TimestampUs => {
                    hdr.timestamp = Some(Timestamp::Micros(le_u32(raw, off)));
                },
                HeaderField::LastWriteTimeUs => {
                    hdr.last_write_time_us = Some(le_u32(raw, off));
                },
                HeaderField::BlobCount => hdr.blob_count = Some(le_u16(raw, off)),
                HeaderField::Blobs => {
                    // Always walk the whole array, the checksum sits after it
                    all_blobs = raw[off..off + field.width(layout.blob_capacity)]
                        .chunks_exact(BlobRect::WIRE_LEN)
                        .map(decode_blob)
                        .collect();
                },
            }
            off += field.width(layout.blob_capacity);
        }

        let meaningful = hdr.blob_count.map(|n| n as usize).unwrap_or(0);
        all_blobs.truncate(meaningful);
        hdr.blobs = all_blobs;

        let body = &raw[..layout.fields_len()];
        hdr.checksum = crc::read_stored(&raw[layout.fields_len()..], layout.checksum);
        hdr.valid = crc::verify(body, hdr.checksum, layout.checksum);
        Ok(hdr)
    }

    /// Serialize the header the way the firmware writes it, with a fresh
    /// checksum. `checksum` and `valid` are ignored.
    ///
    /// Blob slots beyond `blobs` are zero-filled; if `blob_count` is unset
    /// the number of blobs is written instead.
    pub fn encode(&self, layout: &FrameHeaderLayout) -> Vec<u8> {
        let mut out = Vec::with_capacity(layout.len());
        for field in layout.fields {
            match field {
                HeaderField::SessionCount => {
                    out.extend_from_slice(&self.session_count.to_le_bytes());
                },
                HeaderField::FrameCount => {
                    out.extend_from_slice(&self.frame_count.unwrap_or(0).to_le_bytes());
                },
                HeaderField::TimestampUs => {
                    let us = match self.timestamp {
                        Some(Timestamp::Micros(us)) => us,
                        Some(Timestamp::Boot { millis, .. }) => millis.wrapping_mul(1000),
                        None => 0,
                    };
                    out.extend_from_slice(&us.to_le_bytes());
                },
                HeaderField::LastWriteTimeUs => {
                    let us = self.last_write_time_us.unwrap_or(0);
                    out.extend_from_slice(&us.to_le_bytes());
                },
                HeaderField::BlobCount => {
                    let n = self.blob_count.unwrap_or(self.blobs.len() as u16);
                    out.extend_from_slice(&n.to_le_bytes());
                },
                HeaderField::Blobs => {
                    for slot in 0..layout.blob_capacity {
                        let blob = self.blobs.get(slot).copied().unwrap_or_default();
                        encode_blob(&mut out, &blob);
                    }
                },
            }
        }
        let sum = crc::compute(&out, layout.checksum);
        crc::write_stored(&mut out, sum, layout.checksum);
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pixysd_common::{ ChecksumKind, StorageLayout };

    fn blob_layout() -> FrameHeaderLayout {
        StorageLayout::BLOBS.frame_header.unwrap()
    }

    fn sample() -> FrameHeader {
        FrameHeader {
            session_count: 12,
            frame_count: Some(4711),
            timestamp: Some(Timestamp::Micros(93_000_123)),
            last_write_time_us: Some(8_250),
            blob_count: Some(2),
            blobs: vec![
                BlobRect { signature: 1, left: 10, right: 40, top: 20, bottom: 60 },
                BlobRect { signature: 2, left: 200, right: 210, top: 5, bottom: 9 },
            ],
            checksum: 0,
            valid: false,
        }
    }

    #[test]
    fn round_trip_is_valid() {
        let layout = blob_layout();
        let raw = sample().encode(&layout);
        assert_eq!(raw.len(), 219);

        let hdr = FrameHeader::decode(&raw, &layout).unwrap();
        assert!(hdr.valid);
        assert_eq!(hdr.checksum, raw[218] as u16);
        assert_eq!(FrameHeader { checksum: 0, valid: false, ..hdr }, sample());
    }

    #[test]
    fn field_offsets_match_packed_struct() {
        let raw = sample().encode(&blob_layout());
        assert_eq!(&raw[0..4], &12u32.to_le_bytes());
        assert_eq!(&raw[4..8], &4711u32.to_le_bytes());
        assert_eq!(&raw[12..16], &8_250u32.to_le_bytes());
        assert_eq!(&raw[16..18], &2u16.to_le_bytes());
        // Second blob starts 10 bytes into the array; left is its 2nd word
        assert_eq!(&raw[18 + 10 + 2..18 + 10 + 4], &200u16.to_le_bytes());
        assert_eq!(raw[218], crc::crc8(&raw[..218]));
    }

    #[test]
    fn any_flipped_byte_invalidates() {
        let layout = blob_layout();
        let raw = sample().encode(&layout);
        for i in 0..raw.len() {
            let mut bad = raw.clone();
            bad[i] ^= 0x5a;
            let hdr = FrameHeader::decode(&bad, &layout).unwrap();
            assert!(!hdr.valid, "flip at {} went unnoticed", i);
        }
    }

    #[test]
    fn invalid_header_is_still_parsed() {
        let layout = blob_layout();
        let mut raw = sample().encode(&layout);
        raw[218] = raw[218].wrapping_add(1);
        let hdr = FrameHeader::decode(&raw, &layout).unwrap();
        assert!(!hdr.valid);
        assert_eq!(hdr.session_count, 12);
        assert_eq!(hdr.blobs.len(), 2);
    }

    #[test]
    fn only_counted_blobs_are_kept() {
        let layout = blob_layout();
        let mut hdr = sample();
        hdr.blob_count = Some(1);
        let decoded = FrameHeader::decode(&hdr.encode(&layout), &layout).unwrap();
        assert!(decoded.valid);
        assert_eq!(decoded.blobs, vec![hdr.blobs[0]]);

        // A count larger than the array is clamped to its capacity
        hdr.blob_count = Some(500);
        let decoded = FrameHeader::decode(&hdr.encode(&layout), &layout).unwrap();
        assert!(decoded.valid);
        assert_eq!(decoded.blobs.len(), 20);
        assert_eq!(decoded.blobs[5], BlobRect::default());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let layout = blob_layout();
        let mut block = sample().encode(&layout);
        block.resize(512, 0xff);
        assert!(FrameHeader::decode(&block, &layout).unwrap().valid);
    }

    #[test]
    fn short_input_is_an_error() {
        let layout = blob_layout();
        let err = FrameHeader::decode(&[0u8; 100], &layout).unwrap_err();
        assert_eq!(err, DecodeError::Truncated {
            what: "frame header", needed: 219, got: 100
        });
    }

    #[test]
    fn layout_drives_the_shape() {
        static FIELDS: &[HeaderField] = &[
            HeaderField::SessionCount,
            HeaderField::LastWriteTimeUs,
        ];
        let layout = FrameHeaderLayout {
            fields: FIELDS,
            blob_capacity: 0,
            checksum: ChecksumKind::Crc16CcittFalse,
        };
        let hdr = FrameHeader {
            session_count: 3,
            last_write_time_us: Some(99),
            ..Default::default()
        };
        let raw = hdr.encode(&layout);
        assert_eq!(raw.len(), 10);

        let decoded = FrameHeader::decode(&raw, &layout).unwrap();
        assert!(decoded.valid);
        assert_eq!(decoded.last_write_time_us, Some(99));
        assert_eq!(decoded.frame_count, None);
        assert_eq!(decoded.blob_count, None);
        assert!(decoded.blobs.is_empty());
    }
}
