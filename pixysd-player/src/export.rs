
use anyhow::{ bail, Context, Result };
use image::{ GrayImage, ImageFormat };
use log::{ info, warn };
use std::path::{ Path, PathBuf };

use pixysd_common::FrameImage;
use pixysd_device::{ BlockStorage, Frame, SdCard };
use pixysd_format::PlaybackCursor;

/// File name used for a frame in a session export, e.g. `pixy_3_120.bmp`.
pub fn frame_file_name(session_index: u32, frame_index: u32) -> String {
    format!("pixy_{}_{}.bmp", session_index + 1, frame_index + 1)
}

/// Write an 8-bit grayscale bitmap.
pub fn save_bmp(image: &FrameImage, path: &Path) -> Result<()> {
    let buf = GrayImage::from_raw(
        image.width() as u32,
        image.height() as u32,
        image.as_slice().to_vec(),
    ).context("image buffer doesn't match its dimensions")?;
    buf.save_with_format(path, ImageFormat::Bmp)
        .with_context(|| format!("couldn't write {}", path.display()))
}

fn frame_pixels(frame: &Frame, blobs: bool) -> FrameImage {
    if frame.is_corrupted() {
        warn!("{}: image header corrupted", frame.cursor);
    }
    if blobs {
        frame.image_with_blobs()
    } else {
        frame.image.clone()
    }
}

pub fn export_frame<S: BlockStorage>(
    card: &mut SdCard<S>,
    cursor: PlaybackCursor,
    blobs: bool,
    path: &Path,
) -> Result<()>
{
    let frame = card.read_frame(cursor)?;
    save_bmp(&frame_pixels(&frame, blobs), path)?;
    info!("saved {} to {}", cursor, path.display());
    Ok(())
}

/// Export frames `start..=end` (1-based) of the cursor's session into `dir`.
///
/// Returns the paths written, in frame order.
pub fn export_session<S: BlockStorage>(
    card: &mut SdCard<S>,
    cursor: PlaybackCursor,
    start: u32,
    end: u32,
    blobs: bool,
    dir: &Path,
) -> Result<Vec<PathBuf>>
{
    let frames = cursor.layout().frames_per_session;
    if start < 1 || start > end || end > frames {
        bail!("frame range {}..={} must lie within 1..={}", start, end, frames);
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("couldn't create {}", dir.display()))?;

    let mut written = Vec::with_capacity((end - start + 1) as usize);
    for frame_index in (start - 1)..end {
        let at = cursor.goto_frame(frame_index as i64);
        let frame = card.read_frame(at)?;
        let path = dir.join(frame_file_name(at.session_index(), at.frame_index()));
        save_bmp(&frame_pixels(&frame, blobs), &path)?;
        written.push(path);
    }
    info!("saved {} frames of session {} to {}",
        written.len(), cursor.session_index() + 1, dir.display()
    );
    Ok(written)
}
