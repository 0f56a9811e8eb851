
use log::debug;
use std::fs::File;
use std::io::{ Read, Seek, SeekFrom };
use std::path::Path;

use super::*;

/// Raw dump of the recorder's SD card (e.g. taken with `dd`).
pub struct CardImage {
    file: File,
    block_size: usize,
    len: u64,
}
impl CardImage {
    pub const DEFAULT_BLOCK_SIZE: usize = 512;

    pub fn open(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
        Self::open_with_block_size(path, Self::DEFAULT_BLOCK_SIZE)
    }

    pub fn open_with_block_size(path: impl AsRef<Path>, block_size: usize)
        -> Result<Self, DeviceError>
    {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        debug!("opened card image {} ({} bytes)", path.as_ref().display(), len);
        Ok(Self { file, block_size, len })
    }

    /// Number of whole blocks in the image
    pub fn block_count(&self) -> u64 {
        self.len / self.block_size as u64
    }
}
impl BlockStorage for CardImage {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read_blocks(&mut self, start: u32, count: u32) -> Result<Vec<u8>, DeviceError> {
        if start as u64 + count as u64 > self.block_count() {
            return Err(DeviceError::ShortRead { start, count });
        }
        let mut buf = vec![0u8; count as usize * self.block_size];
        self.file.seek(SeekFrom::Start(start as u64 * self.block_size as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// There's no program running on a card image.
    fn send_command(&mut self, name: &str) -> Result<(), DeviceError> {
        debug!("card image ignores command '{}'", name);
        Ok(())
    }
}


/// Card held in memory. Commands sent to it are recorded.
#[derive(Clone, Debug)]
pub struct MemoryCard {
    data: Vec<u8>,
    block_size: usize,
    commands: Vec<String>,
}
impl MemoryCard {
    /// A card of `blocks` erased (0xff) blocks
    pub fn new(block_size: usize, blocks: usize) -> Self {
        Self {
            data: vec![0xff; block_size * blocks],
            block_size,
            commands: Vec::new(),
        }
    }

    /// Copy `data` onto the card starting at block `start`.
    ///
    /// The card grows if needed. `data` doesn't have to be a whole number
    /// of blocks.
    pub fn write_blocks(&mut self, start: u32, data: &[u8]) {
        let off = start as usize * self.block_size;
        let end = off + data.len();
        if end > self.data.len() {
            let blocks = end.div_ceil(self.block_size);
            self.data.resize(blocks * self.block_size, 0xff);
        }
        self.data[off..end].copy_from_slice(data);
    }

    pub fn block_count(&self) -> usize {
        self.data.len() / self.block_size
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
impl BlockStorage for MemoryCard {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read_blocks(&mut self, start: u32, count: u32) -> Result<Vec<u8>, DeviceError> {
        let off = start as usize * self.block_size;
        let end = off + count as usize * self.block_size;
        match self.data.get(off..end) {
            Some(buf) => Ok(buf.to_vec()),
            None => Err(DeviceError::ShortRead { start, count }),
        }
    }

    fn send_command(&mut self, name: &str) -> Result<(), DeviceError> {
        self.commands.push(name.to_string());
        Ok(())
    }
}
