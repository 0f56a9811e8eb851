
mod storage;
mod frames;

pub use storage::*;
pub use frames::*;

use log::{ debug, info, trace, warn };
use pretty_hex::*;
use std::time::Instant;

use pixysd_common::StorageLayout;
use pixysd_format::{
    header_range, locate, DecodeError, FrameHeader, PlaybackCursor, SessionLocation,
    decode_image,
};

#[derive(Debug)]
pub enum DeviceError {
    /// The transport failed
    Io(std::io::Error),
    /// The device returned fewer blocks than requested
    ShortRead { start: u32, count: u32 },
    /// The device's block size doesn't match the layout
    BlockSize { device: usize, layout: usize },
    /// The data read doesn't even have the shape of a frame
    Decode(DecodeError),
}
impl From<std::io::Error> for DeviceError {
    fn from(e: std::io::Error) -> Self { Self::Io(e) }
}
impl From<DecodeError> for DeviceError {
    fn from(e: DecodeError) -> Self { Self::Decode(e) }
}
impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "transport error: {}", e),
            Self::ShortRead { start, count } => {
                write!(f, "short read of {} blocks at block {}", count, start)
            },
            Self::BlockSize { device, layout } => {
                write!(f, "device block size {} doesn't match layout ({})", device, layout)
            },
            Self::Decode(e) => write!(f, "malformed data: {}", e),
        }
    }
}
impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

/// Linear block storage on the recorder.
///
/// This is all we need from the vendor transport: fixed-size block reads
/// and a way to send the device a named command.
pub trait BlockStorage {
    fn block_size(&self) -> usize;

    /// Read `count` blocks starting at `start`. Implementations must
    /// return exactly `count * block_size()` bytes.
    fn read_blocks(&mut self, start: u32, count: u32) -> Result<Vec<u8>, DeviceError>;

    fn send_command(&mut self, name: &str) -> Result<(), DeviceError>;
}

/// The recorder's SD card, seen through some [BlockStorage].
pub struct SdCard<S: BlockStorage> {
    storage: S,
    layout: StorageLayout,
}
impl<S: BlockStorage> SdCard<S> {
    /// Command that halts the default on-board program
    pub const STOP_COMMAND: &'static str = "stop";

    /// Take over the device.
    ///
    /// The on-board program is stopped first so it doesn't keep writing
    /// frames while we read.
    pub fn open(mut storage: S, layout: &StorageLayout) -> Result<Self, DeviceError> {
        if storage.block_size() != layout.bytes_per_block {
            return Err(DeviceError::BlockSize {
                device: storage.block_size(),
                layout: layout.bytes_per_block,
            });
        }
        storage.send_command(Self::STOP_COMMAND)?;
        info!("opened card with '{}' layout ({} blocks per frame)",
            layout.name, layout.blocks_per_frame()
        );
        Ok(Self { storage, layout: *layout })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Raw block read, without any decoding.
    pub fn read_blocks(&mut self, start: u32, count: u32) -> Result<Vec<u8>, DeviceError> {
        let t = Instant::now();
        let data = self.storage.read_blocks(start, count)?;
        debug!("read {} blocks at {}, took {:?}", count, start, t.elapsed());
        trace!("{:?}", (&data[..data.len().min(0x40)]).hex_dump());
        Ok(data)
    }

    /// Read both superblocks and work out the current session counter.
    pub fn locate_session(&mut self) -> Result<SessionLocation, DeviceError> {
        let [a, b] = self.layout.superblock_slots;
        let slot_a = self.read_blocks(a, 1)?;
        let slot_b = self.read_blocks(b, 1)?;
        let loc = locate([&slot_a[..], &slot_b[..]], &self.layout.superblock);
        info!("session count is {}", loc.counter);
        Ok(loc)
    }

    /// Read and decode the frame under the cursor.
    ///
    /// A corrupted header doesn't fail the read, see [Frame::is_corrupted].
    pub fn read_frame(&mut self, cursor: PlaybackCursor) -> Result<Frame, DeviceError> {
        debug_assert_eq!(cursor.layout(), &self.layout);
        let range = cursor.block_range();
        let data = self.read_blocks(range.start, range.count)?;

        let header = match &self.layout.frame_header {
            Some(hl) => Some(FrameHeader::decode(&data, hl)?),
            None => None,
        };
        if let Some(hdr) = &header {
            if !hdr.valid {
                warn!("{}: image header corrupted", cursor);
            }
        }

        let decoded = decode_image(&data, &self.layout)?;
        Ok(Frame {
            cursor,
            header,
            image: decoded.image,
            timestamp: decoded.timestamp,
        })
    }

    /// Read just the header of a frame, without the pixel data.
    ///
    /// Returns `None` if the layout has no frame header.
    pub fn read_header(&mut self, session_index: u32, frame_index: u32)
        -> Result<Option<FrameHeader>, DeviceError>
    {
        let hl = match self.layout.frame_header {
            Some(hl) => hl,
            None => return Ok(None),
        };
        let range = header_range(session_index as i64, frame_index as i64, &self.layout);
        let data = self.read_blocks(range.start, range.count)?;
        Ok(Some(FrameHeader::decode(&data, &hl)?))
    }

    /// Walk the headers of every frame slot in a session, in order.
    pub fn session_headers(&mut self, session_index: u32) -> SessionHeaders<'_, S> {
        SessionHeaders::new(self, session_index)
    }
}
