//! Byte-at-a-time sync frame recognition.
//!
//! One engine matches the sync word and accumulates the fixed-length header;
//! the scanner kind decides how that header is parsed:
//!
//! - **AC3 / E-AC3**: `0B 77`, 6 header bytes, see [`Ac3SyncInfo`]
//! - **DTS**: `7F FE 80 01`, 12 header bytes, see [`DtsCoreHeader`]
//! - **IEC 61937**: `72 F8 1F 4E`, the 8-byte burst preamble, see [`Preamble`]
//!
//! A header that fails to parse is dropped and the scan continues with the
//! next byte; the caller only ever sees recognized headers.

use log::{debug, info, warn};

use crate::process::encode::EncoderOptions;
use crate::structs::ac3::{
    AC3_HEADER_BYTES, AC3_MAX_BLOCKS_PER_SYNC_FRAME, AC3_SYNC_BYTES, Ac3SyncInfo,
    EAC3_MAX_SUBSTREAMS, EAC3_STREAM_TYPE_0, EAC3_STREAM_TYPE_2,
};
use crate::structs::data_type::DataType;
use crate::structs::dts::{DTS_HEADER_BYTES, DTS_SYNC_BYTES, DtsCoreHeader};
use crate::structs::format::AudioFormat;
use crate::structs::frame_info::FrameInfo;
use crate::structs::preamble::{
    BYTES_PER_OUTPUT_FRAME, PREAMBLE_BYTES, PREAMBLE_SYNC_BYTES, Preamble,
};
use crate::utils::errors::{HeaderError, SpdifError};

/// Largest header any scanner accumulates.
pub const MAX_HEADER_BYTES: usize = 16;

const AC3_FAMILY: &[DataType] = &[DataType::Ac3];
const EAC3_FAMILY: &[DataType] = &[DataType::EAc3, DataType::Ac3];
const DTS_FAMILY: &[DataType] = &[
    DataType::DtsI,
    DataType::DtsII,
    DataType::DtsIII,
    DataType::DtsIV,
];

/// Per-substream block accounting for E-AC3 bursts.
#[derive(Debug, Clone, Default)]
struct Ac3State {
    accept_eac3: bool,
    stream_type: u8,
    substream_id: u8,
    block_counts: [u32; EAC3_MAX_SUBSTREAMS],
}

#[derive(Debug, Clone)]
enum ScannerKind {
    Ac3(Ac3State),
    Dts { type_i_only: bool },
    Iec61937 { family: &'static [DataType] },
}

impl ScannerKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Ac3(_) => "AC3",
            Self::Dts { .. } => "DTS",
            Self::Iec61937 { .. } => "IEC 61937",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameScanner {
    kind: ScannerKind,
    sync: &'static [u8],
    header_len: usize,
    header: [u8; MAX_HEADER_BYTES],
    cursor: usize,
    recognized: bool,
    info: FrameInfo,
    max_samples_per_sync_frame: usize,
    bytes_skipped: u64,
    frames_recognized: u64,
}

impl FrameScanner {
    fn with_kind(
        kind: ScannerKind,
        sync: &'static [u8],
        header_len: usize,
        data_type: DataType,
        max_samples_per_sync_frame: usize,
    ) -> Self {
        Self {
            kind,
            sync,
            header_len,
            header: [0; MAX_HEADER_BYTES],
            cursor: 0,
            recognized: false,
            info: FrameInfo::initial(data_type),
            max_samples_per_sync_frame,
            bytes_skipped: 0,
            frames_recognized: 0,
        }
    }

    /// Scanner for raw compressed frames of `format`.
    pub fn for_encoder(format: AudioFormat, options: EncoderOptions) -> Result<Self, SpdifError> {
        let scanner = match format {
            AudioFormat::Ac3 => Self::with_kind(
                ScannerKind::Ac3(Ac3State::default()),
                &AC3_SYNC_BYTES,
                AC3_HEADER_BYTES,
                DataType::Ac3,
                DataType::Ac3.burst_period(),
            ),
            AudioFormat::EAc3 | AudioFormat::EAc3Joc => Self::with_kind(
                ScannerKind::Ac3(Ac3State {
                    accept_eac3: true,
                    ..Default::default()
                }),
                &AC3_SYNC_BYTES,
                AC3_HEADER_BYTES,
                DataType::EAc3,
                DataType::EAc3.burst_period(),
            ),
            AudioFormat::Dts | AudioFormat::DtsHd => Self::with_kind(
                ScannerKind::Dts {
                    type_i_only: options.dts_type_i,
                },
                &DTS_SYNC_BYTES,
                DTS_HEADER_BYTES,
                DataType::DtsI,
                if options.dts_type_i {
                    DataType::DtsI.burst_period()
                } else {
                    DataType::DtsIV.burst_period()
                },
            ),
            _ => return Err(SpdifError::UnsupportedFormat(format)),
        };

        Ok(scanner)
    }

    /// Scanner for IEC 61937 preambles carrying `format`.
    pub fn for_decoder(format: AudioFormat) -> Result<Self, SpdifError> {
        let (family, max_samples) = match format {
            AudioFormat::Ac3 => (AC3_FAMILY, DataType::Ac3.burst_period()),
            AudioFormat::EAc3 | AudioFormat::EAc3Joc => {
                (EAC3_FAMILY, DataType::EAc3.burst_period())
            }
            AudioFormat::Dts | AudioFormat::DtsHd => (DTS_FAMILY, DataType::DtsIV.burst_period()),
            _ => return Err(SpdifError::UnsupportedFormat(format)),
        };

        Ok(Self::with_kind(
            ScannerKind::Iec61937 { family },
            &PREAMBLE_SYNC_BYTES,
            PREAMBLE_BYTES,
            family[0],
            max_samples,
        ))
    }

    /// Feeds one byte. Returns `true` exactly when `byte` completes a valid header.
    pub fn scan(&mut self, byte: u8) -> bool {
        self.recognized = false;

        if self.cursor < self.sync.len() && byte != self.sync[self.cursor] {
            // A broken sync word may still hide the start of the next one.
            self.bytes_skipped += self.cursor as u64;
            self.cursor = 0;
            if byte != self.sync[0] {
                self.bytes_skipped += 1;
                return false;
            }
        }

        self.header[self.cursor] = byte;
        self.cursor += 1;
        if self.cursor < self.header_len {
            return false;
        }
        self.cursor = 0;

        match self.parse_header() {
            Ok(info) => {
                if self.frames_recognized == 0 {
                    info!(
                        "{} stream: {}, {} Hz, {} bytes per frame, {} samples per burst",
                        self.kind.name(),
                        info.data_type,
                        info.sample_rate,
                        info.frame_size_bytes,
                        info.samples_per_sync_frame
                    );
                }
                self.info = info;
                self.recognized = true;
                self.frames_recognized += 1;
            }
            Err(err) => {
                debug!("Rejected {} header: {err}", self.kind.name());
                self.bytes_skipped += self.header_len as u64;
            }
        }

        self.recognized
    }

    fn parse_header(&mut self) -> Result<FrameInfo, HeaderError> {
        let header = &self.header[..self.header_len];

        match &mut self.kind {
            ScannerKind::Ac3(state) => {
                let sync = Ac3SyncInfo::read(header)?;
                if sync.data_type == DataType::EAc3 && !state.accept_eac3 {
                    return Err(HeaderError::UnexpectedDataType(sync.data_type));
                }

                state.stream_type = sync.stream_type;
                state.substream_id = sync.substream_id;
                if sync.is_independent() {
                    state.block_counts[sync.substream_id as usize] += sync.audio_blocks;
                }

                Ok(FrameInfo {
                    data_type: sync.data_type,
                    data_type_info: sync.bsmod,
                    error: false,
                    sample_rate: sync.sample_rate,
                    frame_size_bytes: sync.frame_size_bytes,
                    pcm_frames: sync.pcm_frames(),
                    samples_per_sync_frame: sync.data_type.burst_period(),
                    rate_multiplier: sync.data_type.rate_multiplier(),
                })
            }
            ScannerKind::Dts { type_i_only } => {
                let dts = DtsCoreHeader::read(header)?;
                if *type_i_only && dts.pcm_frames() > DataType::DtsI.burst_period() {
                    return Err(HeaderError::DtsNotTypeI(dts.pcm_frames()));
                }

                let data_type = dts.data_type()?;
                let info = FrameInfo {
                    data_type,
                    data_type_info: 0,
                    error: false,
                    sample_rate: dts.sample_rate(),
                    frame_size_bytes: dts.frame_size_bytes(),
                    pcm_frames: dts.pcm_frames(),
                    samples_per_sync_frame: data_type.burst_period(),
                    rate_multiplier: data_type.rate_multiplier(),
                };

                if info.frame_size_bytes + PREAMBLE_BYTES > info.burst_size_bytes() {
                    return Err(HeaderError::FrameExceedsBurst {
                        size: info.frame_size_bytes,
                        burst: info.burst_size_bytes(),
                    });
                }

                Ok(info)
            }
            ScannerKind::Iec61937 { family } => {
                let mut bytes = [0u8; PREAMBLE_BYTES];
                bytes.copy_from_slice(header);
                let preamble = Preamble::from_bytes(&bytes)?;
                if !family.contains(&preamble.data_type) {
                    return Err(HeaderError::UnexpectedDataType(preamble.data_type));
                }

                let data_type = preamble.data_type;
                Ok(FrameInfo {
                    data_type,
                    data_type_info: preamble.data_type_info,
                    error: preamble.error,
                    sample_rate: 0,
                    frame_size_bytes: preamble.payload_bytes(),
                    pcm_frames: data_type.burst_period() / data_type.rate_multiplier() as usize,
                    samples_per_sync_frame: data_type.burst_period(),
                    rate_multiplier: data_type.rate_multiplier(),
                })
            }
        }
    }

    /// Drops any partial header. Latched parameters of the last frame stay
    /// readable.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.recognized = false;
        if let ScannerKind::Ac3(state) = &mut self.kind {
            state.block_counts = [0; EAC3_MAX_SUBSTREAMS];
        }
    }

    /// Whether the frame just recognized has to open a new burst.
    ///
    /// E-AC3 packs frames until substream 0 of the independent stream has
    /// delivered six blocks. Only the next frame of that substream proves the
    /// burst is complete, hence the strict comparison.
    pub fn is_first_in_burst(&self) -> bool {
        match &self.kind {
            ScannerKind::Ac3(state) => {
                self.info.data_type == DataType::EAc3
                    && matches!(state.stream_type, EAC3_STREAM_TYPE_0 | EAC3_STREAM_TYPE_2)
                    && state.substream_id == 0
                    && state.block_counts[0] > AC3_MAX_BLOCKS_PER_SYNC_FRAME
            }
            _ => false,
        }
    }

    /// Whether the burst can be sent as soon as the current frame is complete.
    pub fn is_last_in_burst(&self) -> bool {
        self.info.data_type != DataType::EAc3
    }

    /// Accounts for one burst worth of blocks after a burst was sent.
    pub fn reset_burst(&mut self) {
        if let ScannerKind::Ac3(state) = &mut self.kind {
            for (substream, count) in state.block_counts.iter_mut().enumerate() {
                if *count >= AC3_MAX_BLOCKS_PER_SYNC_FRAME {
                    *count -= AC3_MAX_BLOCKS_PER_SYNC_FRAME;
                } else if *count > 0 {
                    warn!(
                        "E-AC3 substream {substream} sent a burst with only {count} of {AC3_MAX_BLOCKS_PER_SYNC_FRAME} blocks"
                    );
                    *count = 0;
                }
            }
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.recognized
    }

    pub fn frame_info(&self) -> &FrameInfo {
        &self.info
    }

    pub fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    pub fn frame_size_bytes(&self) -> usize {
        self.info.frame_size_bytes
    }

    pub fn samples_per_sync_frame(&self) -> usize {
        self.info.samples_per_sync_frame
    }

    pub fn max_samples_per_sync_frame(&self) -> usize {
        self.max_samples_per_sync_frame
    }

    pub fn data_type(&self) -> DataType {
        self.info.data_type
    }

    pub fn data_type_info(&self) -> u8 {
        self.info.data_type_info
    }

    pub fn rate_multiplier(&self) -> u32 {
        self.info.rate_multiplier
    }

    pub fn bytes_per_output_frame(&self) -> usize {
        BYTES_PER_OUTPUT_FRAME
    }

    pub fn header_size_bytes(&self) -> usize {
        self.header_len
    }

    /// Header bytes of the last recognized frame, in stream order.
    pub fn header_bytes(&self) -> &[u8] {
        &self.header[..self.header_len]
    }

    /// Pd for a payload of `payload_bytes` in the current data type.
    pub fn length_code(&self, payload_bytes: usize) -> u16 {
        self.info.data_type.length_code(payload_bytes)
    }

    /// Input bytes dropped while looking for a valid header.
    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }

    /// Counts the header just recognized as skipped, for callers that
    /// refuse the frame it announces.
    pub fn discard_header(&mut self) {
        if self.recognized {
            self.recognized = false;
            self.bytes_skipped += self.header_len as u64;
        }
    }

    pub fn frames_recognized(&self) -> u64 {
        self.frames_recognized
    }
}
