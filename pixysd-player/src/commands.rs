
use anyhow::{ bail, Result };
use pretty_hex::*;

use pixysd_device::{ BlockStorage, DeviceError, SdCard };
use pixysd_format::{
    aggregate, required_blocks, FrameHeader, PlaybackCursor, SuperblockHeader,
};

/// Work out which session to look at: either the 1-based number given on
/// the command line, or the one the superblocks point at.
pub fn session_cursor<S: BlockStorage>(card: &mut SdCard<S>, session: Option<u32>)
    -> Result<PlaybackCursor>
{
    let layout = *card.layout();
    match session {
        Some(n) if n < 1 || n > layout.max_sessions => {
            bail!("session must be within 1..={}", layout.max_sessions)
        },
        Some(n) => Ok(PlaybackCursor::new(n as i64 - 1, 0, &layout)),
        None => {
            let loc = card.locate_session()?;
            Ok(PlaybackCursor::from_session_count(loc.counter, &layout))
        },
    }
}

/// Move the cursor to a 1-based frame number.
pub fn frame_cursor(cursor: PlaybackCursor, frame: u32) -> Result<PlaybackCursor> {
    let frames = cursor.layout().frames_per_session;
    if frame < 1 || frame > frames {
        bail!("frame must be within 1..={}", frames);
    }
    Ok(cursor.goto_frame(frame as i64 - 1))
}

fn describe_slot(slot: &Option<SuperblockHeader>) -> String {
    match slot {
        Some(h) => format!("magic {:?}, version {}, counter {}, checksum {:#06x}, {}",
            String::from_utf8_lossy(&h.magic),
            h.version,
            h.counter,
            h.checksum,
            if h.valid { "valid" } else { "INVALID" }
        ),
        None => "unreadable".to_string(),
    }
}

pub fn info<S: BlockStorage>(card: &mut SdCard<S>, card_blocks: Option<u64>) -> Result<()> {
    let layout = *card.layout();
    let loc = card.locate_session()?;
    let cursor = PlaybackCursor::from_session_count(loc.counter, &layout);

    println!("layout:          {}", layout.name);
    println!("frame:           {}x{}, {} blocks", layout.frame_width,
        layout.frame_height, layout.blocks_per_frame());
    println!("sessions:        {} x {} frames", layout.max_sessions, layout.frames_per_session);
    println!("superblock A:    {}", describe_slot(&loc.slots[0]));
    println!("superblock B:    {}", describe_slot(&loc.slots[1]));
    if loc.is_degraded() {
        println!("session count:   0 (both superblocks invalid, proceed with caution)");
    } else {
        println!("session count:   {}", loc.counter);
    }
    println!("current session: {}", cursor.session_index() + 1);

    let needed = required_blocks(&layout);
    if let Some(blocks) = card_blocks {
        if blocks < needed {
            println!("card:            {} blocks, {} needed (truncated image?)", blocks, needed);
        } else {
            println!("card:            {} blocks", blocks);
        }
    }
    Ok(())
}

fn print_header(hdr: &FrameHeader) {
    if !hdr.valid {
        println!("header:     corrupted");
    }
    println!("session:    {}", hdr.session_count);
    if let Some(n) = hdr.frame_count {
        println!("frame:      {}", n);
    }
    if let Some(ts) = hdr.timestamp {
        println!("timestamp:  {}", ts);
    }
    if let Some(us) = hdr.last_write_time_us {
        println!("last write: {:.3} ms", us as f64 / 1000.0);
    }
    if let Some(n) = hdr.blob_count {
        println!("blobs:      {}", n);
    }
    for (i, blob) in hdr.blobs.iter().enumerate() {
        println!("  blob {}: {:?}, {:?}", i + 1, blob.top_left(), blob.bottom_right());
    }
}

pub fn show<S: BlockStorage>(card: &mut SdCard<S>, cursor: PlaybackCursor, hex: bool)
    -> Result<()>
{
    let layout = *card.layout();
    let frame = card.read_frame(cursor)?;
    println!("{} ({}%)", cursor, cursor.progress_percent());
    match &frame.header {
        Some(hdr) => print_header(hdr),
        None => println!("header:     none in this layout"),
    }
    if let Some(ts) = frame.timestamp {
        println!("stamp:      {}", ts);
    }

    if hex {
        let range = cursor.block_range();
        let len = if layout.header_len() > 0 {
            layout.header_len()
        } else {
            layout.embedded_timestamp_len
        };
        let raw = card.read_blocks(range.start, range.count)?;
        println!("{:?}", (&raw[..len]).hex_dump());
    }
    Ok(())
}

pub fn latency<S: BlockStorage>(
    card: &mut SdCard<S>,
    cursor: PlaybackCursor,
    threshold_us: u32,
) -> Result<()>
{
    if card.layout().frame_header.is_none() {
        bail!("the '{}' layout doesn't record write timings", card.layout().name);
    }

    let mut failure: Option<DeviceError> = None;
    let headers = card.session_headers(cursor.session_index())
        .map_while(|res| match res {
            Ok(hdr) => Some(hdr),
            Err(e) => {
                failure = Some(e);
                None
            },
        });
    let stats = aggregate(headers, threshold_us);
    if let Some(e) = failure {
        return Err(e.into());
    }

    println!("session: {}", cursor.session_index() + 1);
    match stats {
        Some(s) => {
            println!("cnt: {}", s.count);
            println!("min: {} ms", s.min_us as f64 / 1000.0);
            println!("max: {} ms", s.max_us as f64 / 1000.0);
            println!("avg: {:.3} ms", s.mean_us / 1000.0);
            println!("above {} ms: {:.1} %", threshold_us as f64 / 1000.0, s.pct_above);
        },
        None => println!("no data: no timed writes in this session"),
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use pixysd_common::StorageLayout;
    use pixysd_device::MemoryCard;

    fn card() -> SdCard<MemoryCard> {
        let layout = StorageLayout::BLOBS;
        let mut mem = MemoryCard::new(512, 2);
        mem.write_blocks(0, &SuperblockHeader::encode(83, &layout.superblock));
        SdCard::open(mem, &layout).unwrap()
    }

    #[test]
    fn explicit_session_is_one_based() {
        let mut card = card();
        let c = session_cursor(&mut card, Some(5)).unwrap();
        assert_eq!(c.session_index(), 4);
        assert!(session_cursor(&mut card, Some(0)).is_err());
        assert!(session_cursor(&mut card, Some(81)).is_err());
    }

    #[test]
    fn default_session_comes_from_superblocks() {
        let mut card = card();
        let c = session_cursor(&mut card, None).unwrap();
        assert_eq!(c.session_index(), 3);
    }

    #[test]
    fn frame_numbers_are_checked() {
        let c = PlaybackCursor::new(0, 0, &StorageLayout::BLOBS);
        assert_eq!(frame_cursor(c, 6000).unwrap().frame_index(), 5999);
        assert!(frame_cursor(c, 0).is_err());
        assert!(frame_cursor(c, 6001).is_err());
    }

    #[test]
    fn latency_requires_frame_headers() {
        let mem = MemoryCard::new(512, 2);
        let mut card = SdCard::open(mem, &StorageLayout::BOOT_COUNT).unwrap();
        let c = PlaybackCursor::new(0, 0, &StorageLayout::BOOT_COUNT);
        assert!(latency(&mut card, c, 20_000).is_err());
    }
}
