use std::io::Write;

use anyhow::{Result, bail};
use indicatif::MultiProgress;
use log::{info, warn};
use spdif::process::decode::SpdifDecoder;
use spdif::process::hooks::ReaderSource;

use super::command::{Cli, UnwrapArgs};
use super::progress::{create_progress_bar, finish_progress, set_progress};
use crate::input::InputReader;
use crate::output::OutputWriter;

const CHUNK_SIZE: usize = 64 * 1024;

pub fn cmd_unwrap(args: &UnwrapArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let format = args.format.to_audio_format();

    info!("Unwrapping {format} stream: {}", args.input.display());

    let input = InputReader::new(&args.input)?;
    let pb = multi
        .map(|m| create_progress_bar(m, input.size_hint(), "unwrapping"))
        .transpose()?;

    let mut decoder = SpdifDecoder::new(format, ReaderSource::new(input))?;
    let mut output = OutputWriter::create(args.output.as_deref())?;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = decoder.read(&mut buffer)?;
        if n == 0 {
            break;
        }

        output.write_all(&buffer[..n])?;
        total += n as u64;
        set_progress(
            pb.as_ref(),
            decoder.source().get_ref().bytes_read(),
            decoder.bursts_read(),
        );

        if cli.strict && decoder.bytes_skipped_since_sync() > 0 {
            bail!(
                "{} bytes between bursts are not part of any {format} burst",
                decoder.bytes_skipped_since_sync()
            );
        }
    }

    output.flush()?;
    finish_progress(pb);

    if decoder.bursts_read() == 0 {
        warn!("No {format} burst found in the input");
    } else {
        info!(
            "Extracted {total} bytes from {} {} bursts (rate x{})",
            decoder.bursts_read(),
            decoder.data_type(),
            decoder.rate_multiplier()
        );
    }

    if decoder.bytes_skipped_since_sync() > 0 {
        warn!(
            "Skipped {} bytes between bursts",
            decoder.bytes_skipped_since_sync()
        );
    }

    Ok(())
}
