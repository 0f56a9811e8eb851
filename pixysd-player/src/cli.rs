
use clap::{ Parser, Subcommand, ValueEnum };
use std::path::PathBuf;

use pixysd_common::StorageLayout;
use pixysd_format::SLOW_WRITE_US;

/// Browse and export frames recorded on the Pixy's SD card.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Raw image of the SD card
    pub card: PathBuf,

    /// Firmware the card was recorded with
    #[arg(long, value_enum, default_value_t = LayoutArg::Blobs)]
    pub layout: LayoutArg,

    /// env_logger-style filter string (e.g. "debug"); overrides RUST_LOG
    #[arg(long)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// Dedicated header block with blobs and write timings
    Blobs,
    /// Boot counter and uptime stamped into the pixel data
    BootCount,
}
impl LayoutArg {
    pub fn layout(&self) -> &'static StorageLayout {
        match self {
            Self::Blobs => &StorageLayout::BLOBS,
            Self::BootCount => &StorageLayout::BOOT_COUNT,
        }
    }
}

/// Session and frame numbers are 1-based. Without `--session`, the
/// session the card's superblocks point at is used.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the superblocks and the current session
    Info,

    /// Print the header of a frame
    Show {
        #[arg(long)]
        session: Option<u32>,
        #[arg(long, default_value_t = 1)]
        frame: u32,
        /// Also dump the raw header bytes
        #[arg(long)]
        hex: bool,
    },

    /// Save one frame as a bitmap
    ExportFrame {
        #[arg(long)]
        session: Option<u32>,
        #[arg(long, default_value_t = 1)]
        frame: u32,
        /// Outline detected blobs
        #[arg(long)]
        blobs: bool,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Save a range of frames as numbered bitmaps
    ExportSession {
        #[arg(long)]
        session: Option<u32>,
        /// First frame
        #[arg(long)]
        start: u32,
        /// Last frame (inclusive)
        #[arg(long)]
        end: u32,
        /// Outline detected blobs
        #[arg(long)]
        blobs: bool,
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// Card write timing statistics for a session
    Latency {
        #[arg(short, long)]
        session: Option<u32>,
        /// Writes slower than this count as slow
        #[arg(long, default_value_t = SLOW_WRITE_US)]
        threshold_us: u32,
    },
}
