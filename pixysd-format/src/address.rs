
use pixysd_common::StorageLayout;

/// A contiguous run of blocks on the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockRange {
    pub start: u32,
    pub count: u32,
}
impl BlockRange {
    pub fn end(&self) -> u32 {
        self.start + self.count
    }
}

/// Wrap a session index into `0..max_sessions`.
pub fn wrap_session(session_index: i64, layout: &StorageLayout) -> u32 {
    session_index.rem_euclid(layout.max_sessions as i64) as u32
}

/// Wrap a frame index into `0..frames_per_session`.
pub fn wrap_frame(frame_index: i64, layout: &StorageLayout) -> u32 {
    frame_index.rem_euclid(layout.frames_per_session as i64) as u32
}

fn frame_start(session_index: i64, frame_index: i64, layout: &StorageLayout) -> u32 {
    let session = wrap_session(session_index, layout) as u64;
    let frame = wrap_frame(frame_index, layout) as u64;
    let per_frame = layout.blocks_per_frame() as u64;
    let per_session = per_frame * layout.frames_per_session as u64;

    let start = layout.session_block_start as u64
        + session * per_session
        + frame * per_frame;
    debug_assert!(start <= u32::MAX as u64);
    start as u32
}

/// Blocks holding the whole frame (header blocks and pixel data).
///
/// The card is used as a ring of sessions, each a ring of frame slots, so
/// out of range indices wrap around instead of failing.
pub fn block_for(session_index: i64, frame_index: i64, layout: &StorageLayout)
    -> BlockRange
{
    BlockRange {
        start: frame_start(session_index, frame_index, layout),
        count: layout.blocks_per_frame(),
    }
}

/// Only the blocks holding the frame header.
pub fn header_range(session_index: i64, frame_index: i64, layout: &StorageLayout)
    -> BlockRange
{
    BlockRange {
        start: frame_start(session_index, frame_index, layout),
        count: layout.header_blocks,
    }
}

/// Number of blocks a card must have to hold every session.
pub fn required_blocks(layout: &StorageLayout) -> u64 {
    layout.session_block_start as u64
        + layout.blocks_per_frame() as u64
            * layout.frames_per_session as u64
            * layout.max_sessions as u64
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const LAYOUTS: [StorageLayout; 2] = [
        StorageLayout::BLOBS,
        StorageLayout::BOOT_COUNT,
    ];

    #[test]
    fn first_frame_of_first_session() {
        let r = block_for(0, 0, &StorageLayout::BLOBS);
        assert_eq!(r, BlockRange { start: 2, count: 126 });
        let r = block_for(0, 0, &StorageLayout::BOOT_COUNT);
        assert_eq!(r, BlockRange { start: 2, count: 125 });
    }

    #[test]
    fn matches_firmware_arithmetic() {
        // session_block = 2 + id * BLOCKS_PER_FRAME * FRAMES_PER_SESSION
        let l = StorageLayout::BOOT_COUNT;
        let r = block_for(5, 10, &l);
        assert_eq!(r.start, 2 + 5 * 125 * 15000 + 10 * 125);

        let l = StorageLayout::BLOBS;
        let r = block_for(79, 5999, &l);
        assert_eq!(r.start, 2 + 79 * 126 * 6000 + 5999 * 126);
        assert_eq!(r.end() as u64, required_blocks(&l));
    }

    #[test]
    fn frames_wrap_around() {
        for l in LAYOUTS.iter() {
            let last = l.frames_per_session as i64 - 1;
            assert_eq!(block_for(3, -1, l), block_for(3, last, l));
            assert_eq!(block_for(3, last + 1, l), block_for(3, 0, l));
        }
    }

    #[test]
    fn sessions_wrap_around() {
        for l in LAYOUTS.iter() {
            let max = l.max_sessions as i64;
            assert_eq!(block_for(max, 7, l), block_for(0, 7, l));
            assert_eq!(block_for(-1, 7, l), block_for(max - 1, 7, l));
            assert_eq!(wrap_session(max * 3 + 2, l), 2);
        }
    }

    #[test]
    fn frames_of_a_session_do_not_overlap() {
        for l in LAYOUTS.iter() {
            let mut starts = HashSet::new();
            let mut prev_end = None;
            for f in 0..l.frames_per_session as i64 {
                let r = block_for(1, f, l);
                assert!(starts.insert(r.start));
                if let Some(end) = prev_end {
                    assert_eq!(r.start, end);
                }
                prev_end = Some(r.end());
            }
        }
    }

    #[test]
    fn header_range_covers_header_blocks_only() {
        let r = header_range(2, 3, &StorageLayout::BLOBS);
        assert_eq!(r.start, block_for(2, 3, &StorageLayout::BLOBS).start);
        assert_eq!(r.count, 1);
        assert_eq!(header_range(0, 0, &StorageLayout::BOOT_COUNT).count, 0);
    }
}
