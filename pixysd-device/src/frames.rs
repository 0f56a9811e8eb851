
use pixysd_common::{ FrameImage, Timestamp };
use pixysd_format::{ FrameHeader, PlaybackCursor };

use super::*;

/// A frame as read from the card.
#[derive(Clone, Debug)]
pub struct Frame {
    pub cursor: PlaybackCursor,
    /// `None` for layouts without a frame header
    pub header: Option<FrameHeader>,
    pub image: FrameImage,
    /// Timestamp embedded in the pixel data, if the layout has one
    pub timestamp: Option<Timestamp>,
}
impl Frame {
    /// Outline value used for blob overlays
    pub const OVERLAY_VALUE: u8 = 255;

    /// The frame has a header and its checksum didn't match.
    pub fn is_corrupted(&self) -> bool {
        matches!(&self.header, Some(h) if !h.valid)
    }

    /// Copy of the image with the detected blobs outlined.
    ///
    /// Blobs from a corrupted header aren't drawn.
    pub fn image_with_blobs(&self) -> FrameImage {
        let mut image = self.image.clone();
        if let Some(hdr) = self.header.as_ref().filter(|h| h.valid) {
            for blob in &hdr.blobs {
                image.draw_rect_outline(blob, Self::OVERLAY_VALUE);
            }
        }
        image
    }
}

/// Headers of a session's frame slots, read one at a time.
///
/// Yields nothing for layouts without frame headers. Stops after the
/// first transport error.
pub struct SessionHeaders<'a, S: BlockStorage> {
    card: &'a mut SdCard<S>,
    session_index: u32,
    next_frame: u32,
    failed: bool,
}
impl<'a, S: BlockStorage> SessionHeaders<'a, S> {
    pub(crate) fn new(card: &'a mut SdCard<S>, session_index: u32) -> Self {
        Self { card, session_index, next_frame: 0, failed: false }
    }
}
impl<'a, S: BlockStorage> Iterator for SessionHeaders<'a, S> {
    type Item = Result<FrameHeader, DeviceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_frame >= self.card.layout().frames_per_session {
            return None;
        }
        let frame = self.next_frame;
        self.next_frame += 1;
        match self.card.read_header(self.session_index, frame) {
            Ok(Some(hdr)) => Some(Ok(hdr)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            },
        }
    }
}
