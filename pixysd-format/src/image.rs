
use pixysd_common::{ FrameImage, StorageLayout, Timestamp };
use crate::{ ensure_len, DecodeError };

/// Pixel data of a frame, plus the timestamp embedded in it (if any).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub image: FrameImage,
    pub timestamp: Option<Timestamp>,
}

/// Parse the big-endian `boot_count:u16, millis:u32` stamp.
fn parse_embedded_timestamp(buf: &[u8]) -> Timestamp {
    Timestamp::Boot {
        boot_count: u16::from_be_bytes([buf[0], buf[1]]),
        millis: u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]),
    }
}

/// Interpret a frame read as a grayscale image.
///
/// `raw` is the data returned for [crate::block_for]; pixel data starts
/// after the layout's header blocks. Firmware that stamps the frame
/// overwrites its first pixels, so those are returned as the timestamp
/// and blanked in the image.
pub fn decode_image(raw: &[u8], layout: &StorageLayout) -> Result<DecodedImage, DecodeError> {
    let start = layout.image_offset();
    let len = layout.image_bytes();
    ensure_len("frame image", raw, start + len)?;

    let mut pixels = raw[start..start + len].to_vec();
    let mut timestamp = None;
    let ts_len = layout.embedded_timestamp_len;
    if ts_len > 0 {
        ensure_len("embedded timestamp", &pixels, ts_len.max(6))?;
        timestamp = Some(parse_embedded_timestamp(&pixels));
        pixels[..ts_len].fill(0);
    }

    let image = FrameImage::new_from_slice(layout.frame_width, layout.frame_height, &pixels)
        .map_err(|e| DecodeError::Truncated {
            what: "frame image", needed: e.expected, got: e.got
        })?;
    Ok(DecodedImage { image, timestamp })
}

/// Stamp the first six pixels the way the boot-count firmware does.
pub fn stamp_image(pixels: &mut [u8], boot_count: u16, millis: u32) {
    pixels[..2].copy_from_slice(&boot_count.to_be_bytes());
    pixels[2..6].copy_from_slice(&millis.to_be_bytes());
}


#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8 | 1).collect()
    }

    #[test]
    fn blob_layout_skips_header_block() {
        let l = StorageLayout::BLOBS;
        let mut raw = vec![0xeeu8; l.bytes_per_frame()];
        let pixels = pattern(l.image_bytes());
        raw[512..512 + pixels.len()].copy_from_slice(&pixels);

        let dec = decode_image(&raw, &l).unwrap();
        assert_eq!(dec.timestamp, None);
        assert_eq!(dec.image.width(), 320);
        assert_eq!(dec.image.height(), 200);
        assert_eq!(dec.image.as_slice(), &pixels[..]);
    }

    #[test]
    fn embedded_timestamp_is_extracted_and_blanked() {
        let l = StorageLayout::BOOT_COUNT;
        let mut raw = pattern(l.bytes_per_frame());
        stamp_image(&mut raw, 0x0102, 0x0a0b0c0d);

        let dec = decode_image(&raw, &l).unwrap();
        assert_eq!(dec.timestamp, Some(Timestamp::Boot {
            boot_count: 0x0102,
            millis: 0x0a0b0c0d
        }));

        let px = dec.image.as_slice();
        assert_eq!(px.len(), 64000);
        assert!(px[..6].iter().all(|p| *p == 0));
        // The remaining 63994 pixels are copied as-is
        assert_eq!(&px[6..], &raw[6..64000]);
        assert!(px[6..].iter().all(|p| *p != 0));
    }

    #[test]
    fn short_frame_is_an_error() {
        let l = StorageLayout::BLOBS;
        let err = decode_image(&vec![0u8; 1000], &l).unwrap_err();
        assert_eq!(err, DecodeError::Truncated {
            what: "frame image", needed: 512 + 64000, got: 1000
        });
    }
}
