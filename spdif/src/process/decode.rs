//! IEC 61937 data bursts back to compressed frames.
//!
//! The decoder pulls wire bytes from its [`BurstSource`] into a read-ahead
//! queue and walks three states:
//!
//! - **Seek**: bytes go through the preamble scanner and are dropped.
//! - **Payload**: byte pairs are transposed back and handed to the caller.
//! - **Pad**: the rest of the burst up to its repetition period is dropped.
//!
//! Burst boundaries are not visible to the caller; payloads of consecutive
//! bursts are delivered back to back.

use std::collections::VecDeque;
use std::io;

use log::{debug, trace};

use crate::process::hooks::BurstSource;
use crate::process::scan::FrameScanner;
use crate::structs::data_type::DataType;
use crate::structs::format::AudioFormat;
use crate::structs::preamble::PREAMBLE_BYTES;
use crate::utils::errors::SpdifError;

const READ_CHUNK_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Seek,
    Payload,
    Pad,
}

#[derive(Debug)]
pub struct SpdifDecoder<S: BurstSource> {
    format: AudioFormat,
    scanner: FrameScanner,
    source: S,
    input: VecDeque<u8>,
    state: DecoderState,
    payload_bytes_remaining: usize,
    pad_bytes_remaining: usize,
    /// Second byte of a word that did not fit the caller's buffer.
    carry: Option<u8>,
    bursts_read: u64,
    /// Scanner skip count when the first burst was found.
    leading_bytes_skipped: Option<u64>,
}

impl<S: BurstSource> SpdifDecoder<S> {
    pub fn new(format: AudioFormat, source: S) -> Result<Self, SpdifError> {
        let scanner = FrameScanner::for_decoder(format)?;

        Ok(Self {
            format,
            scanner,
            source,
            input: VecDeque::with_capacity(READ_CHUNK_BYTES * 2),
            state: DecoderState::Seek,
            payload_bytes_remaining: 0,
            pad_bytes_remaining: 0,
            carry: None,
            bursts_read: 0,
            leading_bytes_skipped: None,
        })
    }

    /// Fills `out` with payload bytes.
    ///
    /// Returns less than `out.len()` only when the source reached its end or
    /// failed after some bytes were produced. A source error with nothing
    /// produced is returned unchanged and leaves the decoder as it was.
    pub fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut produced = 0;

        while produced < out.len() {
            if let Some(byte) = self.carry.take() {
                out[produced] = byte;
                produced += 1;
                self.consume_payload(1);
                continue;
            }

            let needed = match self.state {
                DecoderState::Payload => 2,
                DecoderState::Seek | DecoderState::Pad => 1,
            };
            if self.input.len() < needed {
                match self.fill() {
                    Ok(0) => break,
                    Ok(_) => continue,
                    Err(err) if produced == 0 => return Err(err),
                    Err(err) => {
                        debug!("Source failed after {produced} bytes: {err}");
                        break;
                    }
                }
            }

            match self.state {
                DecoderState::Seek => self.seek(),
                DecoderState::Payload => produced += self.unswap(&mut out[produced..]),
                DecoderState::Pad => self.skip_pad(),
            }
        }

        Ok(produced)
    }

    fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_BYTES];

        loop {
            match self.source.read_input(&mut chunk) {
                Ok(n) => {
                    self.input.extend(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn seek(&mut self) {
        while let Some(byte) = self.input.pop_front() {
            if self.scanner.scan(byte) {
                self.start_burst();
                return;
            }
        }
    }

    fn start_burst(&mut self) {
        let info = *self.scanner.frame_info();
        let burst_size = info.burst_size_bytes();
        let payload_wire_bytes = info.frame_size_bytes.next_multiple_of(2);

        if PREAMBLE_BYTES + payload_wire_bytes > burst_size {
            debug!(
                "Ignoring {} burst: {} payload bytes exceed the {burst_size}-byte period",
                info.data_type, info.frame_size_bytes
            );
            self.scanner.discard_header();
            return;
        }

        trace!(
            "Burst {}: {}, {} payload bytes",
            self.bursts_read, info.data_type, info.frame_size_bytes
        );

        self.leading_bytes_skipped
            .get_or_insert(self.scanner.bytes_skipped());
        self.bursts_read += 1;
        self.payload_bytes_remaining = info.frame_size_bytes;
        self.pad_bytes_remaining = burst_size - PREAMBLE_BYTES - payload_wire_bytes;
        self.state = DecoderState::Payload;
        self.consume_payload(0);
    }

    /// Moves whole wire words from the read-ahead into `out`.
    fn unswap(&mut self, out: &mut [u8]) -> usize {
        let words = (self.input.len() / 2)
            .min(self.payload_bytes_remaining.div_ceil(2))
            .min(out.len().div_ceil(2));
        let mut produced = 0;

        for _ in 0..words {
            let (Some(lo), Some(hi)) = (self.input.pop_front(), self.input.pop_front()) else {
                break;
            };

            out[produced] = hi;
            produced += 1;
            self.payload_bytes_remaining -= 1;

            // An odd payload ends on the high byte; the low byte is filler.
            if self.payload_bytes_remaining > 0 {
                if produced < out.len() {
                    out[produced] = lo;
                    produced += 1;
                    self.payload_bytes_remaining -= 1;
                } else {
                    self.carry = Some(lo);
                }
            }
        }

        self.consume_payload(0);
        produced
    }

    fn consume_payload(&mut self, n: usize) {
        self.payload_bytes_remaining -= n;

        if self.payload_bytes_remaining == 0 && self.carry.is_none() {
            self.state = if self.pad_bytes_remaining > 0 {
                DecoderState::Pad
            } else {
                DecoderState::Seek
            };
        }
    }

    fn skip_pad(&mut self) {
        let n = self.pad_bytes_remaining.min(self.input.len());
        self.input.drain(..n);
        self.pad_bytes_remaining -= n;

        if self.pad_bytes_remaining == 0 {
            self.state = DecoderState::Seek;
        }
    }

    /// Abandons the current burst and looks for the next preamble.
    ///
    /// Bytes already read ahead from the source are kept and scanned.
    pub fn reset(&mut self) {
        self.scanner.reset();
        self.state = DecoderState::Seek;
        self.payload_bytes_remaining = 0;
        self.pad_bytes_remaining = 0;
        self.carry = None;
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn frame_scanner(&self) -> &FrameScanner {
        &self.scanner
    }

    pub fn payload_bytes_remaining(&self) -> usize {
        self.payload_bytes_remaining
    }

    /// Data type of the last recognized burst.
    pub fn data_type(&self) -> DataType {
        self.scanner.data_type()
    }

    pub fn rate_multiplier(&self) -> u32 {
        self.scanner.rate_multiplier()
    }

    pub fn bursts_read(&self) -> u64 {
        self.bursts_read
    }

    /// Bytes dropped between bursts, not counting anything in front of the
    /// first burst such as a container header.
    pub fn bytes_skipped_since_sync(&self) -> u64 {
        self.leading_bytes_skipped
            .map_or(0, |leading| self.scanner.bytes_skipped() - leading)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: BurstSource> io::Read for SpdifDecoder<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        SpdifDecoder::read(self, buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::process::encode::SpdifEncoder;
    use crate::process::hooks::{ReaderSource, WriterSink};
    use crate::process::{
        AC3_EXAMPLE, AC3_EXAMPLE_FRAME_BYTES, DTS_EXAMPLE, DTS_EXAMPLE_FRAME_BYTES, EAC3_EXAMPLE,
        EAC3_EXAMPLE_FRAME_BYTES, IEC61937_EAC3_EXAMPLE, example_frame,
    };

    const EAC3_BURST_BYTES: usize = 24576;

    /// E-AC3 burst with a counting pattern after the example bytes, running
    /// on through the pad.
    fn eac3_burst(seed: usize) -> Vec<u8> {
        let mut burst = IEC61937_EAC3_EXAMPLE.to_vec();
        let start = burst.len();
        burst.extend((start..EAC3_BURST_BYTES).map(|i| ((i - start + seed) % 256) as u8));
        burst
    }

    fn unswap(wire: &[u8]) -> Vec<u8> {
        wire.chunks(2).flat_map(|pair| [pair[1], pair[0]]).collect()
    }

    fn payload(burst: &[u8]) -> Vec<u8> {
        unswap(&burst[PREAMBLE_BYTES..PREAMBLE_BYTES + EAC3_EXAMPLE_FRAME_BYTES])
    }

    /// Hands out its bytes, then fails every call.
    struct ThenFail<'a> {
        data: &'a [u8],
    }

    impl BurstSource for ThenFail<'_> {
        fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"));
            }
            self.data.read_input(buf)
        }
    }

    #[test]
    fn read_eac3() -> anyhow::Result<()> {
        let mut stream = eac3_burst(0);
        stream.extend(eac3_burst(7));

        let mut decoder = SpdifDecoder::new(AudioFormat::EAc3, stream.as_slice())?;
        let mut buf = vec![0u8; EAC3_EXAMPLE_FRAME_BYTES];

        assert_eq!(decoder.read(&mut buf)?, EAC3_EXAMPLE_FRAME_BYTES);
        // The fixture carries the first payload bytes of the example frame.
        let known = IEC61937_EAC3_EXAMPLE.len() - PREAMBLE_BYTES;
        assert_eq!(&buf[..known], &EAC3_EXAMPLE[..known]);
        assert_eq!(buf, payload(&stream));
        assert_eq!(decoder.data_type(), DataType::EAc3);
        assert_eq!(decoder.rate_multiplier(), 4);

        assert_eq!(decoder.read(&mut buf)?, EAC3_EXAMPLE_FRAME_BYTES);
        assert_eq!(buf, payload(&stream[EAC3_BURST_BYTES..]));
        assert_eq!(decoder.bursts_read(), 2);

        assert_eq!(decoder.read(&mut buf)?, 0);
        Ok(())
    }

    #[test]
    fn read_error_eac3() -> anyhow::Result<()> {
        let mut decoder = SpdifDecoder::new(AudioFormat::EAc3, ThenFail { data: &[] })?;
        let mut buf = [0u8; 16];
        assert!(decoder.read(&mut buf).is_err());

        let burst = eac3_burst(0);
        let mut decoder = SpdifDecoder::new(AudioFormat::EAc3, ThenFail { data: &burst })?;
        let mut buf = vec![0u8; 1000];

        // The payload is complete before the source fails.
        assert_eq!(decoder.read(&mut buf)?, EAC3_EXAMPLE_FRAME_BYTES);
        assert_eq!(&buf[..EAC3_EXAMPLE_FRAME_BYTES], payload(&burst));
        assert!(decoder.read(&mut buf).is_err());
        assert!(decoder.read(&mut buf).is_err());
        Ok(())
    }

    #[test]
    fn read_after_reset_eac3() -> anyhow::Result<()> {
        let mut stream = eac3_burst(0);
        stream.extend(eac3_burst(7));

        let mut decoder = SpdifDecoder::new(AudioFormat::EAc3, stream.as_slice())?;
        let mut buf = vec![0u8; EAC3_EXAMPLE_FRAME_BYTES];

        assert_eq!(decoder.read(&mut buf[..100])?, 100);
        assert_eq!(decoder.payload_bytes_remaining(), EAC3_EXAMPLE_FRAME_BYTES - 100);

        decoder.reset();
        decoder.reset();
        assert_eq!(decoder.payload_bytes_remaining(), 0);

        assert_eq!(decoder.read(&mut buf)?, EAC3_EXAMPLE_FRAME_BYTES);
        assert_eq!(buf, payload(&stream[EAC3_BURST_BYTES..]));
        Ok(())
    }

    #[test]
    fn odd_payload_through_small_reads() -> anyhow::Result<()> {
        let mut stream = Vec::new();
        for payload in [&[1u8, 2, 3, 4, 5][..], &[6, 7]] {
            let length_code = (payload.len() * 8) as u16;
            stream.extend([0x72, 0xF8, 0x1F, 0x4E, 0x0B, 0x00]);
            stream.extend(length_code.to_le_bytes());
            for pair in payload.chunks(2) {
                stream.extend([pair.get(1).copied().unwrap_or(0), pair[0]]);
            }
            stream.resize(stream.len().next_multiple_of(2048), 0);
        }

        let mut decoder = SpdifDecoder::new(AudioFormat::Dts, stream.as_slice())?;
        let mut buf = [0u8; 3];

        assert_eq!(decoder.read(&mut buf)?, 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(decoder.read(&mut buf)?, 3);
        assert_eq!(buf, [4, 5, 6]);
        assert_eq!(decoder.read(&mut buf)?, 1);
        assert_eq!(buf[0], 7);
        assert_eq!(decoder.data_type(), DataType::DtsI);
        Ok(())
    }

    #[test]
    fn oversized_burst_is_skipped() -> anyhow::Result<()> {
        // Pd announces a full period of payload, leaving no room for Pa-Pd.
        let mut stream = vec![0x72, 0xF8, 0x1F, 0x4E, 0x0B, 0x00];
        stream.extend(((2048 * 8) as u16).to_le_bytes());
        stream.extend([0x72, 0xF8, 0x1F, 0x4E, 0x0B, 0x00, 0x20, 0x00]);
        stream.extend([0x02, 0x01, 0x04, 0x03]);
        stream.resize(8 + 2048, 0);

        let mut decoder = SpdifDecoder::new(AudioFormat::Dts, stream.as_slice())?;
        let mut buf = [0u8; 16];

        assert_eq!(decoder.read(&mut buf)?, 4);
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert_eq!(decoder.bursts_read(), 1);
        assert_eq!(decoder.frame_scanner().bytes_skipped(), PREAMBLE_BYTES as u64);
        assert_eq!(decoder.read(&mut buf)?, 0);
        Ok(())
    }

    #[test]
    fn round_trip_ac3() -> anyhow::Result<()> {
        let frames: Vec<u8> = (0..4u8)
            .flat_map(|i| {
                let mut frame = example_frame(AC3_EXAMPLE, AC3_EXAMPLE_FRAME_BYTES);
                frame[40] = i;
                frame
            })
            .collect();

        let mut encoder = SpdifEncoder::new(AudioFormat::Ac3, WriterSink::new(Vec::new()))?;
        // A container header in front of the bursts is skipped by the scanner.
        encoder.sink_mut().get_mut().extend_from_slice(b"RIFF\0\0\0\0WAVE");
        for chunk in frames.chunks(500) {
            encoder.write(chunk);
        }
        encoder.flush();
        let wire = encoder.into_sink().into_inner();

        let mut decoder = SpdifDecoder::new(AudioFormat::Ac3, ReaderSource::new(wire.as_slice()))?;
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;

        assert_eq!(decoded, frames);
        assert_eq!(decoder.bursts_read(), 4);
        assert_eq!(decoder.frame_scanner().bytes_skipped(), 12);
        assert_eq!(decoder.bytes_skipped_since_sync(), 0);
        Ok(())
    }

    #[test]
    fn round_trip_eac3() -> anyhow::Result<()> {
        let frame = example_frame(EAC3_EXAMPLE, EAC3_EXAMPLE_FRAME_BYTES);

        let mut encoder = SpdifEncoder::new(AudioFormat::EAc3, Vec::new())?;
        encoder.write(&frame);
        encoder.flush();
        let wire = encoder.into_sink();

        let mut decoder = SpdifDecoder::new(AudioFormat::EAc3, wire.as_slice())?;
        let mut buf = vec![0u8; EAC3_EXAMPLE_FRAME_BYTES];
        assert_eq!(decoder.read(&mut buf)?, EAC3_EXAMPLE_FRAME_BYTES);
        assert_eq!(buf, frame);
        Ok(())
    }

    #[test]
    fn round_trip_dts() -> anyhow::Result<()> {
        let frames: Vec<u8> = (0..3u8)
            .flat_map(|i| {
                let mut frame = example_frame(DTS_EXAMPLE, DTS_EXAMPLE_FRAME_BYTES);
                frame[100] = i;
                frame
            })
            .collect();

        let mut encoder = SpdifEncoder::new(AudioFormat::Dts, Vec::new())?;
        for chunk in frames.chunks(333) {
            encoder.write(chunk);
        }
        encoder.flush();
        let wire = encoder.into_sink();
        assert_eq!(wire.len(), 3 * 2048);

        let mut decoder = SpdifDecoder::new(AudioFormat::Dts, ReaderSource::new(wire.as_slice()))?;
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;

        assert_eq!(decoded, frames);
        assert_eq!(decoder.bursts_read(), 3);
        assert_eq!(decoder.data_type(), DataType::DtsI);
        assert_eq!(decoder.frame_scanner().bytes_skipped(), 0);
        Ok(())
    }

    #[test]
    fn unsupported_format() {
        assert!(matches!(
            SpdifDecoder::new(AudioFormat::Mp3, &[0u8; 0][..]),
            Err(SpdifError::UnsupportedFormat(AudioFormat::Mp3))
        ));
    }
}
