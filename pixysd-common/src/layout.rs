
/// CRC profile used to protect a header region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecksumKind {
    /// CRC-8, polynomial 0x07, initial value 0x00
    Crc8,
    /// CRC-16/CCITT-FALSE, polynomial 0x1021, initial value 0xffff
    Crc16CcittFalse,
}
impl ChecksumKind {
    /// Width of the stored checksum [in bytes]
    pub const fn len(&self) -> usize {
        match self {
            Self::Crc8 => 1,
            Self::Crc16CcittFalse => 2,
        }
    }
}

/// A field of the per-frame header, in the order the firmware writes them.
///
/// Everything is little-endian and packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    /// Session (boot) counter the frame was recorded under, u32
    SessionCount,
    /// Frame counter, u32
    FrameCount,
    /// Microseconds since boot, u32
    TimestampUs,
    /// Duration of the previous card write [in microseconds], u32
    LastWriteTimeUs,
    /// Number of meaningful entries in the blob array, u16
    BlobCount,
    /// Fixed array of `blob_capacity` blob records
    Blobs,
}
impl HeaderField {
    pub const fn width(&self, blob_capacity: usize) -> usize {
        match self {
            Self::SessionCount
            | Self::FrameCount
            | Self::TimestampUs
            | Self::LastWriteTimeUs => 4,
            Self::BlobCount => 2,
            Self::Blobs => blob_capacity * crate::BlobRect::WIRE_LEN,
        }
    }
}

/// Shape of the header stored in front of each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeaderLayout {
    pub fields: &'static [HeaderField],
    pub blob_capacity: usize,
    pub checksum: ChecksumKind,
}
impl FrameHeaderLayout {
    /// Length of everything before the checksum
    pub const fn fields_len(&self) -> usize {
        let mut len = 0;
        let mut i = 0;
        while i < self.fields.len() {
            len += self.fields[i].width(self.blob_capacity);
            i += 1;
        }
        len
    }

    /// Total header length, including the trailing checksum
    pub const fn len(&self) -> usize {
        self.fields_len() + self.checksum.len()
    }

    pub fn has_field(&self, field: HeaderField) -> bool {
        self.fields.contains(&field)
    }
}

/// Shape of the two redundant superblocks at the start of the card.
///
/// The field order is fixed: magic, version (u32), counter (u32), checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuperblockLayout {
    pub magic: [u8; 4],
    pub checksum: ChecksumKind,
}
impl SuperblockLayout {
    pub const MAGIC: [u8; 4] = *b"MTTR";

    /// Length of everything before the checksum
    pub const fn fields_len(&self) -> usize {
        12
    }

    pub const fn len(&self) -> usize {
        self.fields_len() + self.checksum.len()
    }
}

/// Everything needed to find and interpret frames on a card written by a
/// particular firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    pub name: &'static str,
    pub bytes_per_block: usize,
    pub frame_width: usize,
    pub frame_height: usize,
    pub frames_per_session: u32,
    pub max_sessions: u32,

    /// First block of the first session
    pub session_block_start: u32,

    /// Blocks occupied by the frame header ahead of the pixel data.
    /// Zero when the header (if any) is embedded in the pixel data.
    pub header_blocks: u32,

    pub frame_header: Option<FrameHeaderLayout>,

    /// Length of the big-endian timestamp overwriting the first pixels
    pub embedded_timestamp_len: usize,

    pub superblock: SuperblockLayout,

    /// Block numbers of the two superblock copies
    pub superblock_slots: [u32; 2],
}

const BLOB_HEADER_FIELDS: &[HeaderField] = &[
    HeaderField::SessionCount,
    HeaderField::FrameCount,
    HeaderField::TimestampUs,
    HeaderField::LastWriteTimeUs,
    HeaderField::BlobCount,
    HeaderField::Blobs,
];

impl StorageLayout {
    /// Firmware that logs detected blobs in a dedicated header block ahead
    /// of every frame.
    pub const BLOBS: Self = Self {
        name: "blobs",
        bytes_per_block: 512,
        frame_width: 320,
        frame_height: 200,
        frames_per_session: 6000,
        max_sessions: 80,
        session_block_start: 2,
        header_blocks: 1,
        frame_header: Some(FrameHeaderLayout {
            fields: BLOB_HEADER_FIELDS,
            blob_capacity: 20,
            checksum: ChecksumKind::Crc8,
        }),
        embedded_timestamp_len: 0,
        superblock: SuperblockLayout {
            magic: SuperblockLayout::MAGIC,
            checksum: ChecksumKind::Crc8,
        },
        superblock_slots: [0, 1],
    };

    /// Firmware that stamps the boot counter and uptime into the first six
    /// bytes of the pixel data and keeps no separate frame header.
    pub const BOOT_COUNT: Self = Self {
        name: "boot-count",
        bytes_per_block: 512,
        frame_width: 320,
        frame_height: 200,
        frames_per_session: 15000,
        max_sessions: 32,
        session_block_start: 2,
        header_blocks: 0,
        frame_header: None,
        embedded_timestamp_len: 6,
        superblock: SuperblockLayout {
            magic: SuperblockLayout::MAGIC,
            checksum: ChecksumKind::Crc16CcittFalse,
        },
        superblock_slots: [0, 1],
    };

    pub fn image_bytes(&self) -> usize {
        self.frame_width * self.frame_height
    }

    /// Blocks per frame, including any dedicated header blocks
    pub fn blocks_per_frame(&self) -> u32 {
        let image_blocks = self.image_bytes().div_ceil(self.bytes_per_block) as u32;
        image_blocks + self.header_blocks
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.blocks_per_frame() as usize * self.bytes_per_block
    }

    /// Offset of the first pixel within a frame read
    pub fn image_offset(&self) -> usize {
        self.header_blocks as usize * self.bytes_per_block
    }

    pub fn header_len(&self) -> usize {
        self.frame_header.map(|h| h.len()).unwrap_or(0)
    }

    pub fn blob_capacity(&self) -> usize {
        self.frame_header.map(|h| h.blob_capacity).unwrap_or(0)
    }

    pub fn checksum_kind(&self) -> ChecksumKind {
        self.frame_header.map(|h| h.checksum).unwrap_or(self.superblock.checksum)
    }

    pub fn checksum_len(&self) -> usize {
        self.checksum_kind().len()
    }
}
