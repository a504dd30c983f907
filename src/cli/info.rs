use std::collections::BTreeMap;

use anyhow::{Result, bail};
use indicatif::MultiProgress;
use log::{info, warn};
use serde::Serialize;
use spdif::process::encode::EncoderOptions;
use spdif::process::scan::FrameScanner;
use spdif::structs::format::AudioFormat;
use spdif::structs::frame_info::FrameInfo;

use super::command::{Cli, InfoArgs};
use super::progress::{create_progress_bar, finish_progress, update_progress};
use crate::input::InputReader;

const CHUNK_SIZE: usize = 64 * 1024;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let format = args.format.to_audio_format();
    info!("Analyzing {format} stream: {}", args.input.display());

    let mut input = InputReader::new(&args.input)?;
    let pb = multi
        .map(|m| create_progress_bar(m, input.size_hint(), "analyzing"))
        .transpose()?;

    let mut analyzer = StreamAnalyzer::new(format)?;
    input.process_chunks(CHUNK_SIZE, |chunk| {
        analyzer.push(chunk);
        update_progress(pb.as_ref(), chunk.len(), analyzer.bursts);
        Ok(true)
    })?;
    finish_progress(pb);

    let report = analyzer.into_report();

    if report.frames == 0 {
        println!("No {format} sync frame found in the input.");
        return Ok(());
    }

    if args.yaml {
        print!("{}", serde_yaml_ng::to_string(&report)?);
    } else {
        display_report(&report);
    }

    if report.bytes_skipped > 0 {
        if cli.strict {
            bail!("{} bytes are not part of any sync frame", report.bytes_skipped);
        }
        warn!("{} bytes are not part of any sync frame", report.bytes_skipped);
    }

    Ok(())
}

#[derive(Debug, Default, Serialize)]
pub struct StreamReport {
    pub format: String,
    pub data_type: String,
    pub sample_rate: u32,
    pub rate_multiplier: u32,
    /// Rate of the IEC 61937 stream carrying the bursts.
    pub iec_sample_rate: u32,
    pub frames: u64,
    pub bursts: u64,
    pub frame_size_min: usize,
    pub frame_size_max: usize,
    pub pcm_frames: u64,
    pub duration: String,
    pub average_bitrate_kbps: f64,
    /// Frames per data type, e.g. AC3 frames inside an E-AC3 stream.
    pub data_types: BTreeMap<String, u64>,
    pub bytes_total: u64,
    pub bytes_skipped: u64,
}

/// Walks a compressed stream frame by frame, grouping frames into bursts
/// the same way the encoder does.
struct StreamAnalyzer {
    format: AudioFormat,
    scanner: FrameScanner,
    payload_bytes_pending: usize,
    burst_open: bool,
    first: Option<FrameInfo>,
    frames: u64,
    bursts: u64,
    pcm_frames: u64,
    frame_size_min: usize,
    frame_size_max: usize,
    frame_bytes: u64,
    data_types: BTreeMap<String, u64>,
    bytes_total: u64,
}

impl StreamAnalyzer {
    fn new(format: AudioFormat) -> Result<Self> {
        Ok(Self {
            format,
            scanner: FrameScanner::for_encoder(format, EncoderOptions::default())?,
            payload_bytes_pending: 0,
            burst_open: false,
            first: None,
            frames: 0,
            bursts: 0,
            pcm_frames: 0,
            frame_size_min: usize::MAX,
            frame_size_max: 0,
            frame_bytes: 0,
            data_types: BTreeMap::new(),
            bytes_total: 0,
        })
    }

    fn push(&mut self, chunk: &[u8]) {
        self.bytes_total += chunk.len() as u64;

        let mut pos = 0;
        while pos < chunk.len() {
            if self.payload_bytes_pending > 0 {
                let n = self.payload_bytes_pending.min(chunk.len() - pos);
                pos += n;
                self.payload_bytes_pending -= n;
                if self.payload_bytes_pending == 0 {
                    self.end_frame();
                }
                continue;
            }

            let byte = chunk[pos];
            pos += 1;
            if self.scanner.scan(byte) {
                self.begin_frame();
            }
        }
    }

    fn begin_frame(&mut self) {
        let info = *self.scanner.frame_info();

        if !self.burst_open || self.scanner.is_first_in_burst() {
            if self.burst_open {
                self.scanner.reset_burst();
            }
            self.burst_open = true;
            self.bursts += 1;
            self.pcm_frames += (info.samples_per_sync_frame / info.rate_multiplier as usize) as u64;
        }

        self.first.get_or_insert(info);
        self.frames += 1;
        self.frame_size_min = self.frame_size_min.min(info.frame_size_bytes);
        self.frame_size_max = self.frame_size_max.max(info.frame_size_bytes);
        self.frame_bytes += info.frame_size_bytes as u64;
        *self
            .data_types
            .entry(info.data_type.to_string())
            .or_default() += 1;

        self.payload_bytes_pending = info
            .frame_size_bytes
            .saturating_sub(self.scanner.header_size_bytes());
        if self.payload_bytes_pending == 0 {
            self.end_frame();
        }
    }

    fn end_frame(&mut self) {
        if self.scanner.is_last_in_burst() {
            self.scanner.reset_burst();
            self.burst_open = false;
        }
    }

    fn into_report(self) -> StreamReport {
        let Some(first) = self.first else {
            return StreamReport {
                format: self.format.to_string(),
                bytes_total: self.bytes_total,
                bytes_skipped: self.scanner.bytes_skipped(),
                ..Default::default()
            };
        };

        let seconds = if first.sample_rate > 0 {
            self.pcm_frames as f64 / first.sample_rate as f64
        } else {
            0.0
        };
        let average_bitrate_kbps = if seconds > 0.0 {
            (self.frame_bytes as f64 * 8.0) / (seconds * 1000.0)
        } else {
            0.0
        };

        StreamReport {
            format: self.format.to_string(),
            data_type: first.data_type.to_string(),
            sample_rate: first.sample_rate,
            rate_multiplier: first.rate_multiplier,
            iec_sample_rate: first.sample_rate * first.rate_multiplier,
            frames: self.frames,
            bursts: self.bursts,
            frame_size_min: self.frame_size_min,
            frame_size_max: self.frame_size_max,
            pcm_frames: self.pcm_frames,
            duration: duration_str(self.pcm_frames, first.sample_rate),
            average_bitrate_kbps,
            data_types: self.data_types,
            bytes_total: self.bytes_total,
            bytes_skipped: self.scanner.bytes_skipped(),
        }
    }
}

/// `hh:mm:ss.mmm` for `pcm_frames` at `sample_rate`.
fn duration_str(pcm_frames: u64, sample_rate: u32) -> String {
    if sample_rate == 0 {
        return "unknown".to_string();
    }

    let ms = pcm_frames * 1000 / sample_rate as u64;
    let hours = ms / 3_600_000;
    let minutes = ms / 60_000 % 60;
    let seconds = ms / 1000 % 60;
    let milliseconds = ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
}

fn display_report(report: &StreamReport) {
    println!();
    println!("{} Stream Information", report.format);
    println!("==============================");
    println!();

    println!("Stream Information");
    println!("  Data type                 {}", report.data_type);
    println!("  Sampling rate             {} Hz", report.sample_rate);
    println!(
        "  IEC 61937 rate            {} Hz (x{})",
        report.iec_sample_rate, report.rate_multiplier
    );
    if report.frame_size_min == report.frame_size_max {
        println!("  Frame size                {} bytes", report.frame_size_min);
    } else {
        println!(
            "  Frame size                {}-{} bytes",
            report.frame_size_min, report.frame_size_max
        );
    }
    if report.data_types.len() > 1 {
        for (data_type, count) in &report.data_types {
            println!("    {data_type:<24}{count} frames");
        }
    }
    println!();

    println!("Analysis Summary");
    println!("  Frames                    {}", report.frames);
    println!("  Bursts                    {}", report.bursts);

    let size_mb = report.bytes_total as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        report.bytes_total
    );
    println!("  Duration                  {}", report.duration);
    if report.average_bitrate_kbps > 0.0 {
        println!(
            "  Average data rate         {:.1} kbps",
            report.average_bitrate_kbps
        );
    }
    println!("  Bytes skipped             {}", report.bytes_skipped);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use spdif::process::{
        AC3_EXAMPLE, AC3_EXAMPLE_FRAME_BYTES, EAC3_EXAMPLE, EAC3_EXAMPLE_FRAME_BYTES,
    };

    fn frame(prefix: &[u8], size: usize) -> Vec<u8> {
        let mut frame = prefix.to_vec();
        frame.extend((prefix.len()..size).map(|i| (i % 0x60) as u8 + 0x10));
        frame
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(duration_str(6144, 48000), "00:00:00.128");
        assert_eq!(duration_str(48000 * 3725, 48000), "01:02:05.000");
        assert_eq!(duration_str(1536, 0), "unknown");
    }

    #[test]
    fn analyze_ac3() -> Result<()> {
        let mut analyzer = StreamAnalyzer::new(AudioFormat::Ac3)?;

        analyzer.push(&[0x00; 5]);
        for _ in 0..4 {
            analyzer.push(&frame(AC3_EXAMPLE, AC3_EXAMPLE_FRAME_BYTES));
        }

        let report = analyzer.into_report();
        assert_eq!(report.frames, 4);
        assert_eq!(report.bursts, 4);
        assert_eq!(report.sample_rate, 48000);
        assert_eq!(report.iec_sample_rate, 48000);
        assert_eq!(report.frame_size_min, AC3_EXAMPLE_FRAME_BYTES);
        assert_eq!(report.frame_size_max, AC3_EXAMPLE_FRAME_BYTES);
        assert_eq!(report.pcm_frames, 6144);
        assert_eq!(report.duration, "00:00:00.128");
        assert_eq!(report.bytes_skipped, 5);
        assert_eq!(report.bytes_total, 5 + 4 * AC3_EXAMPLE_FRAME_BYTES as u64);
        assert_eq!(report.data_types.get("AC3 (0x01)"), Some(&4));
        Ok(())
    }

    #[test]
    fn analyze_eac3() -> Result<()> {
        let mut analyzer = StreamAnalyzer::new(AudioFormat::EAc3)?;

        let stream: Vec<u8> = (0..3)
            .flat_map(|_| frame(EAC3_EXAMPLE, EAC3_EXAMPLE_FRAME_BYTES))
            .collect();
        for chunk in stream.chunks(100) {
            analyzer.push(chunk);
        }

        let report = analyzer.into_report();
        assert_eq!(report.frames, 3);
        assert_eq!(report.bursts, 3);
        assert_eq!(report.rate_multiplier, 4);
        assert_eq!(report.iec_sample_rate, 192000);
        assert_eq!(report.pcm_frames, 3 * 1536);
        assert_eq!(report.bytes_skipped, 0);
        Ok(())
    }

    #[test]
    fn yaml_report() -> Result<()> {
        let report = StreamReport {
            format: "AC3".to_string(),
            frames: 2,
            ..Default::default()
        };

        let yaml = serde_yaml_ng::to_string(&report)?;
        assert!(yaml.contains("format: AC3"));
        assert!(yaml.contains("frames: 2"));
        Ok(())
    }
}
