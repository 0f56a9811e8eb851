
use pixysd_common::StorageLayout;
use crate::address::{ block_for, wrap_frame, wrap_session, BlockRange };

/// Position of playback on the card.
///
/// Navigation never mutates a cursor; every step returns a new one with
/// both indices wrapped back into range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaybackCursor {
    session_index: u32,
    frame_index: u32,
    layout: StorageLayout,
}
impl PlaybackCursor {
    pub fn new(session_index: i64, frame_index: i64, layout: &StorageLayout) -> Self {
        Self {
            session_index: wrap_session(session_index, layout),
            frame_index: wrap_frame(frame_index, layout),
            layout: *layout,
        }
    }

    /// Start at the first frame of the session the device is recording
    /// (or last recorded) under.
    pub fn from_session_count(session_count: u32, layout: &StorageLayout) -> Self {
        Self::new(session_count as i64, 0, layout)
    }

    pub fn session_index(&self) -> u32 {
        self.session_index
    }
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn step_frame(&self, step: i64) -> Self {
        self.goto_frame(self.frame_index as i64 + step)
    }

    /// Move to another session, rewinding to its first frame.
    pub fn step_session(&self, step: i64) -> Self {
        self.goto_session(self.session_index as i64 + step)
    }

    pub fn goto_frame(&self, frame_index: i64) -> Self {
        Self::new(self.session_index as i64, frame_index, &self.layout)
    }

    pub fn goto_session(&self, session_index: i64) -> Self {
        Self::new(session_index, 0, &self.layout)
    }

    /// Jump to a relative position within the session; `fraction` is
    /// clamped to [0, 1].
    pub fn seek_fraction(&self, fraction: f64) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        let index = (fraction * self.layout.frames_per_session as f64) as i64;
        self.goto_frame(index)
    }

    pub fn progress_percent(&self) -> u32 {
        (self.frame_index as u64 * 100 / self.layout.frames_per_session as u64) as u32
    }

    pub fn block_range(&self) -> BlockRange {
        block_for(self.session_index as i64, self.frame_index as i64, &self.layout)
    }
}
impl std::fmt::Display for PlaybackCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session {}, Frame {} of {}",
            self.session_index + 1,
            self.frame_index + 1,
            self.layout.frames_per_session
        )
    }
}
