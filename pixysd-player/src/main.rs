
mod cli;
mod commands;
mod export;
mod logging;

use anyhow::{ Context, Result };
use clap::Parser;

use crate::cli::{ Cli, Command };
use crate::commands::{ frame_cursor, session_cursor };
use pixysd_device::{ CardImage, SdCard };

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_filter.as_deref());
    let layout = cli.layout.layout();

    // Nothing works without the card, so bail out right away
    let image = CardImage::open(&cli.card)
        .with_context(|| format!("couldn't open card image {}", cli.card.display()))?;
    let card_blocks = image.block_count();
    let mut card = SdCard::open(image, layout)?;

    match cli.cmd {
        Command::Info => {
            commands::info(&mut card, Some(card_blocks))
        },
        Command::Show { session, frame, hex } => {
            let cursor = frame_cursor(session_cursor(&mut card, session)?, frame)?;
            commands::show(&mut card, cursor, hex)
        },
        Command::ExportFrame { session, frame, blobs, output } => {
            let cursor = frame_cursor(session_cursor(&mut card, session)?, frame)?;
            export::export_frame(&mut card, cursor, blobs, &output)
        },
        Command::ExportSession { session, start, end, blobs, dir } => {
            let cursor = session_cursor(&mut card, session)?;
            export::export_session(&mut card, cursor, start, end, blobs, &dir)
                .map(|paths| println!("wrote {} frames to {}", paths.len(), dir.display()))
        },
        Command::Latency { session, threshold_us } => {
            let cursor = session_cursor(&mut card, session)?;
            commands::latency(&mut card, cursor, threshold_us)
        },
    }
}
