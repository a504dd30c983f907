use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar};
use log::{info, warn};
use spdif::process::encode::{EncoderOptions, SpdifEncoder};
use spdif::process::hooks::{BurstSink, WriterSink};

use super::command::{Cli, Container, WrapArgs};
use super::progress::{create_progress_bar, finish_progress, update_progress};
use crate::input::InputReader;
use crate::output::{OutputWriter, is_stdout};
use crate::wav::WavWriter;

const CHUNK_SIZE: usize = 64 * 1024;

/// Sample rate written into the WAV header until the first frame is seen.
const PROVISIONAL_SAMPLE_RATE: u32 = 48000;

pub fn cmd_wrap(args: &WrapArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let format = args.format.to_audio_format();
    if !SpdifEncoder::<Vec<u8>>::is_format_supported(format) {
        bail!("{format} cannot be carried in IEC 61937 bursts");
    }

    let options = EncoderOptions {
        dts_type_i: args.dts_type_i,
    };

    info!("Wrapping {format} stream: {}", args.input.display());

    let mut input = InputReader::new(&args.input)?;
    let pb = multi
        .map(|m| create_progress_bar(m, input.size_hint(), "wrapping"))
        .transpose()?;

    match args.container {
        Container::Raw => {
            let output = OutputWriter::create(args.output.as_deref())?;
            let mut encoder = SpdifEncoder::with_options(format, options, WriterSink::new(output))?;

            run_encoder(&mut encoder, &mut input, cli, pb.as_ref())?;
            encoder.sink_mut().get_mut().flush()?;

            log_summary(&encoder);
        }
        Container::Wav => {
            let path = args
                .output
                .as_deref()
                .filter(|path| !is_stdout(path))
                .context("WAV output needs a seekable file, pass --output PATH")?;
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let wav = WavWriter::new(file, PROVISIONAL_SAMPLE_RATE)?;
            let mut encoder = SpdifEncoder::with_options(format, options, wav)?;

            run_encoder(&mut encoder, &mut input, cli, pb.as_ref())?;

            let rate = encoder.sample_rate() * encoder.rate_multiplier();
            let wav = encoder.sink_mut();
            wav.set_sample_rate(rate);
            wav.finish()?;
            info!(
                "WAV output: {} Hz, {} data bytes",
                wav.format().sample_rate,
                wav.data_written()
            );

            log_summary(&encoder);
        }
    }

    finish_progress(pb);

    Ok(())
}

fn run_encoder<S: BurstSink>(
    encoder: &mut SpdifEncoder<S>,
    input: &mut InputReader,
    cli: &Cli,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    input.process_chunks(CHUNK_SIZE, |chunk| {
        encoder.write(chunk);
        check_encoder(encoder, cli)?;
        update_progress(pb, chunk.len(), encoder.bursts_written());
        Ok(true)
    })?;

    encoder.flush();
    check_encoder(encoder, cli)?;

    if encoder.frame_scanner().frames_recognized() == 0 {
        warn!("No {} sync frame found in the input", encoder.format());
    }

    Ok(())
}

fn check_encoder<S: BurstSink>(encoder: &mut SpdifEncoder<S>, cli: &Cli) -> Result<()> {
    if !cli.strict {
        return Ok(());
    }

    if let Some(err) = encoder.take_sink_error() {
        return Err(err.into());
    }

    let skipped = encoder.frame_scanner().bytes_skipped();
    if skipped > 0 {
        bail!("{skipped} input bytes are not part of any sync frame");
    }

    Ok(())
}

fn log_summary<S: BurstSink>(encoder: &SpdifEncoder<S>) {
    let scanner = encoder.frame_scanner();

    info!(
        "Wrapped {} frames into {} bursts ({} Hz x{})",
        scanner.frames_recognized(),
        encoder.bursts_written(),
        encoder.sample_rate(),
        encoder.rate_multiplier()
    );

    if scanner.bytes_skipped() > 0 {
        warn!("Skipped {} bytes outside sync frames", scanner.bytes_skipped());
    }

    if let Some(err) = encoder.sink_error() {
        warn!("Output stopped early: {err}");
    }
}
