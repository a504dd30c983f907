//! Compressed sync frames to IEC 61937 data bursts.
//!
//! ## Burst assembly
//!
//! 1. Bytes are fed to the [`FrameScanner`] until it recognizes a header.
//! 2. The first frame of a burst writes the preamble; Pd is left at zero.
//! 3. Header and payload bytes are appended with each byte pair transposed.
//! 4. Once the last frame of the burst is complete, Pd is patched, the burst
//!    is zero-padded to its repetition period and handed to the [`BurstSink`].
//!
//! AC3 and DTS carry one frame per burst. E-AC3 collects frames until six
//! audio blocks of substream 0 are present, which is only known once the
//! next burst-opening frame arrives or [`SpdifEncoder::flush`] is called.

use log::{debug, info, trace, warn};

use crate::process::hooks::BurstSink;
use crate::process::scan::FrameScanner;
use crate::structs::burst::BurstBuffer;
use crate::structs::format::AudioFormat;
use crate::structs::frame_info::FrameInfo;
use crate::structs::preamble::{BYTES_PER_OUTPUT_FRAME, PREAMBLE_BYTES, Preamble};
use crate::utils::errors::SpdifError;

/// Index of Pd within the preamble.
const LENGTH_CODE_WORD: usize = 3;

const DEFAULT_SAMPLE_RATE: u32 = 48000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Restrict DTS to type I bursts (512 samples per frame at most).
    pub dts_type_i: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderState {
    Seek,
    Payload,
}

#[derive(Debug)]
pub struct SpdifEncoder<S: BurstSink> {
    format: AudioFormat,
    scanner: FrameScanner,
    burst: BurstBuffer,
    sink: S,
    state: EncoderState,
    rate_multiplier: u32,
    sample_rate: u32,
    payload_bytes_pending: usize,
    /// Burst length up to the end of the last complete frame.
    complete_bytes: usize,
    /// Parameters of the frame that opened the current burst.
    burst_info: Option<FrameInfo>,
    bursts_written: u64,
    sink_error: Option<SpdifError>,
}

impl<S: BurstSink> SpdifEncoder<S> {
    pub fn new(format: AudioFormat, sink: S) -> Result<Self, SpdifError> {
        Self::with_options(format, EncoderOptions::default(), sink)
    }

    pub fn with_options(
        format: AudioFormat,
        options: EncoderOptions,
        sink: S,
    ) -> Result<Self, SpdifError> {
        let scanner = FrameScanner::for_encoder(format, options)?;
        let burst =
            BurstBuffer::new(scanner.max_samples_per_sync_frame() * BYTES_PER_OUTPUT_FRAME);

        debug!(
            "{format} encoder: {} byte burst buffer, {options:?}",
            burst.capacity()
        );

        Ok(Self {
            format,
            scanner,
            burst,
            sink,
            state: EncoderState::Seek,
            rate_multiplier: 1,
            sample_rate: DEFAULT_SAMPLE_RATE,
            payload_bytes_pending: 0,
            complete_bytes: 0,
            burst_info: None,
            bursts_written: 0,
            sink_error: None,
        })
    }

    pub fn is_format_supported(format: AudioFormat) -> bool {
        format.is_spdif_supported()
    }

    /// Consumes all of `data`, emitting every burst it completes.
    ///
    /// Sink failures do not stop consumption; see [`Self::sink_error`].
    pub fn write(&mut self, data: &[u8]) -> usize {
        let mut pos = 0;

        while pos < data.len() {
            match self.state {
                EncoderState::Seek => {
                    let byte = data[pos];
                    pos += 1;
                    if self.scanner.scan(byte) {
                        self.begin_frame();
                    }
                }
                EncoderState::Payload => {
                    let n = self.payload_bytes_pending.min(data.len() - pos);
                    let pushed = self.burst.push_swapped(&data[pos..pos + n]);
                    debug_assert!(pushed, "frame was checked against the burst size");
                    pos += n;
                    self.payload_bytes_pending -= n;
                    if self.payload_bytes_pending == 0 {
                        self.end_frame();
                    }
                }
            }
        }

        data.len()
    }

    /// Sends the pending burst, up to its last complete frame.
    ///
    /// A frame still waiting for payload bytes is discarded.
    pub fn flush(&mut self) {
        if self.state == EncoderState::Payload {
            debug!(
                "Dropping incomplete {} frame, {} bytes missing",
                self.scanner.data_type(),
                self.payload_bytes_pending
            );
            self.state = EncoderState::Seek;
            self.payload_bytes_pending = 0;
        }

        self.flush_burst();
    }

    /// Forgets the burst in progress and any partial header.
    pub fn reset(&mut self) {
        self.burst.clear();
        self.scanner.reset();
        self.state = EncoderState::Seek;
        self.payload_bytes_pending = 0;
        self.complete_bytes = 0;
        self.burst_info = None;
    }

    fn begin_frame(&mut self) {
        if self.burst.is_empty() {
            self.start_data_burst();
        } else if self.scanner.is_first_in_burst() {
            self.flush_burst();
            self.start_data_burst();
        }

        self.start_sync_frame();
    }

    fn start_data_burst(&mut self) {
        let info = *self.scanner.frame_info();

        if info.rate_multiplier != self.rate_multiplier || info.sample_rate != self.sample_rate {
            info!(
                "IEC 61937 output: {} Hz x{} for {}",
                info.sample_rate, info.rate_multiplier, info.data_type
            );
            self.rate_multiplier = info.rate_multiplier;
            self.sample_rate = info.sample_rate;
        }

        let preamble = Preamble::new(info.data_type, info.data_type_info);
        self.burst.push_words(&preamble.to_words());
        self.complete_bytes = self.burst.len();
        self.burst_info = Some(info);
    }

    fn start_sync_frame(&mut self) {
        let frame_size = self.scanner.frame_size_bytes();
        let available = self
            .burst_info
            .map_or(0, |info| info.burst_size_bytes())
            .saturating_sub(self.burst.len());

        if frame_size > available {
            warn!(
                "{}",
                SpdifError::FrameTooLarge {
                    size: frame_size,
                    capacity: available,
                }
            );
            if self.complete_bytes <= PREAMBLE_BYTES {
                self.burst.clear();
                self.burst_info = None;
            }
            return;
        }

        self.burst.push_swapped(self.scanner.header_bytes());
        self.payload_bytes_pending = frame_size - self.scanner.header_size_bytes();
        self.state = EncoderState::Payload;

        if self.payload_bytes_pending == 0 {
            self.end_frame();
        }
    }

    fn end_frame(&mut self) {
        self.complete_bytes = self.burst.len();
        self.state = EncoderState::Seek;

        if self.scanner.is_last_in_burst() {
            self.flush_burst();
        }
    }

    fn flush_burst(&mut self) {
        let payload_bytes = self.complete_bytes.saturating_sub(PREAMBLE_BYTES);

        if let Some(info) = self.burst_info.take() {
            if payload_bytes > 0 {
                self.burst.truncate(self.complete_bytes);
                self.burst
                    .set_word(LENGTH_CODE_WORD, info.data_type.length_code(payload_bytes));
                self.burst.pad_to(info.burst_size_bytes());

                trace!(
                    "Burst {}: {}, {} payload bytes in {} bytes",
                    self.bursts_written,
                    info.data_type,
                    payload_bytes,
                    self.burst.len()
                );
                self.send_burst();
            }
        }

        self.burst.clear();
        self.scanner.reset_burst();
        self.complete_bytes = 0;
    }

    fn send_burst(&mut self) {
        let expected = self.burst.len();

        match self.sink.write_output(self.burst.as_slice()) {
            Ok(written) if written == expected => self.bursts_written += 1,
            Ok(written) => self.fail(SpdifError::ShortWrite { written, expected }),
            Err(err) => self.fail(SpdifError::Sink(err)),
        }
    }

    fn fail(&mut self, err: SpdifError) {
        warn!("{err}");
        self.sink_error.get_or_insert(err);
    }

    /// First sink failure since construction or the last [`Self::take_sink_error`].
    pub fn sink_error(&self) -> Option<&SpdifError> {
        self.sink_error.as_ref()
    }

    pub fn take_sink_error(&mut self) -> Option<SpdifError> {
        self.sink_error.take()
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn rate_multiplier(&self) -> u32 {
        self.rate_multiplier
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bytes_per_output_frame(&self) -> usize {
        BYTES_PER_OUTPUT_FRAME
    }

    pub fn burst_buffer_size_bytes(&self) -> usize {
        self.burst.capacity()
    }

    pub fn payload_bytes_pending(&self) -> usize {
        self.payload_bytes_pending
    }

    pub fn bursts_written(&self) -> u64 {
        self.bursts_written
    }

    pub fn frame_scanner(&self) -> &FrameScanner {
        &self.scanner
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
