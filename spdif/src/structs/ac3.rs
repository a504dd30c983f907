//! AC3 and E-AC3 sync frame headers.
//!
//! Both formats start with the sync word `0x0B77` and place `bsid` at the
//! same bit offset, which is how the two syntaxes are told apart:
//!
//! - **AC3** (`bsid <= 8`): `crc1`, `fscod`, `frmsizecod`, then `bsid`, `bsmod`.
//!   Frame size comes from the `frmsizecod` table.
//! - **E-AC3** (`11 <= bsid <= 16`): `strmtyp`, `substreamid`, `frmsiz`,
//!   `fscod`, `fscod2`/`numblkscod`, `acmod`, `lfeon`, then `bsid`.
//!   Frame size is explicit.

use log::trace;

use crate::structs::data_type::DataType;
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

pub const AC3_SYNC_BYTES: [u8; 2] = [0x0B, 0x77];

/// Bytes needed to reach `bsid`/`bsmod`.
pub const AC3_HEADER_BYTES: usize = 6;

pub const AC3_PCM_FRAMES_PER_BLOCK: usize = 256;
pub const AC3_MAX_BLOCKS_PER_SYNC_FRAME: u32 = 6;
pub const EAC3_MAX_SUBSTREAMS: usize = 8;

/// Independent stream.
pub const EAC3_STREAM_TYPE_0: u8 = 0;
/// Dependent substream.
pub const EAC3_STREAM_TYPE_1: u8 = 1;
/// AC3 bitstream converted to E-AC3 syntax.
pub const EAC3_STREAM_TYPE_2: u8 = 2;

const AC3_SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];
const EAC3_REDUCED_SAMPLE_RATES: [u32; 3] = [24000, 22050, 16000];
const EAC3_BLOCKS_PER_FRAME: [u32; 4] = [1, 2, 3, 6];

/// Frame size in 16-bit words, indexed by `frmsizecod` then `fscod`.
const AC3_FRAME_SIZE_WORDS: [[u16; 3]; 38] = [
    [64, 69, 96],
    [64, 70, 96],
    [80, 87, 120],
    [80, 88, 120],
    [96, 104, 144],
    [96, 105, 144],
    [112, 121, 168],
    [112, 122, 168],
    [128, 139, 192],
    [128, 140, 192],
    [160, 174, 240],
    [160, 175, 240],
    [192, 208, 288],
    [192, 209, 288],
    [224, 243, 336],
    [224, 244, 336],
    [256, 278, 384],
    [256, 279, 384],
    [320, 348, 480],
    [320, 349, 480],
    [384, 417, 576],
    [384, 418, 576],
    [448, 487, 672],
    [448, 488, 672],
    [512, 557, 768],
    [512, 558, 768],
    [640, 696, 960],
    [640, 697, 960],
    [768, 835, 1152],
    [768, 836, 1152],
    [896, 975, 1344],
    [896, 976, 1344],
    [1024, 1114, 1536],
    [1024, 1115, 1536],
    [1152, 1253, 1728],
    [1152, 1254, 1728],
    [1280, 1393, 1920],
    [1280, 1394, 1920],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ac3SyncInfo {
    pub data_type: DataType,
    pub bsid: u8,
    /// Bitstream mode; only present in AC3 syntax, 0 for E-AC3.
    pub bsmod: u8,
    pub stream_type: u8,
    pub substream_id: u8,
    pub sample_rate: u32,
    pub frame_size_bytes: usize,
    pub audio_blocks: u32,
}

impl Ac3SyncInfo {
    pub fn read(header: &[u8]) -> Result<Self, HeaderError> {
        let bsid = header.get(5).map_or(0xFF, |b| b >> 3);

        let info = match bsid {
            0..=8 => Self::read_ac3(header)?,
            11..=16 => Self::read_eac3(header)?,
            _ => return Err(HeaderError::UnsupportedBsid(bsid)),
        };

        if info.frame_size_bytes < AC3_HEADER_BYTES {
            return Err(HeaderError::FrameTooShort {
                size: info.frame_size_bytes,
                header: AC3_HEADER_BYTES,
            });
        }

        trace!(
            "{} sync info: {} Hz, {} bytes, {} blocks, strmtyp {}, substreamid {}",
            info.data_type,
            info.sample_rate,
            info.frame_size_bytes,
            info.audio_blocks,
            info.stream_type,
            info.substream_id
        );

        Ok(info)
    }

    pub fn pcm_frames(&self) -> usize {
        self.audio_blocks as usize * AC3_PCM_FRAMES_PER_BLOCK
    }

    /// Whether the frame counts towards the blocks of its substream.
    pub fn is_independent(&self) -> bool {
        self.data_type == DataType::Ac3
            || matches!(self.stream_type, EAC3_STREAM_TYPE_0 | EAC3_STREAM_TYPE_2)
    }

    fn read_ac3(header: &[u8]) -> Result<Self, HeaderError> {
        let reader = &mut BsIoSliceReader::from_slice(header);
        reader.skip_n(32)?; // syncword, crc1

        let fscod: u8 = reader.get_n(2)?;
        let frmsizecod: u8 = reader.get_n(6)?;
        let bsid: u8 = reader.get_n(5)?;
        let bsmod: u8 = reader.get_n(3)?;

        let sample_rate = *AC3_SAMPLE_RATES
            .get(fscod as usize)
            .ok_or(HeaderError::InvalidSampleRateCode(fscod))?;

        let frame_size_words = AC3_FRAME_SIZE_WORDS
            .get(frmsizecod as usize)
            .ok_or(HeaderError::InvalidFrameSizeCode(frmsizecod))?[fscod as usize];

        Ok(Self {
            data_type: DataType::Ac3,
            bsid,
            bsmod,
            stream_type: 0,
            substream_id: 0,
            sample_rate,
            frame_size_bytes: frame_size_words as usize * size_of::<u16>(),
            audio_blocks: AC3_MAX_BLOCKS_PER_SYNC_FRAME,
        })
    }

    fn read_eac3(header: &[u8]) -> Result<Self, HeaderError> {
        let reader = &mut BsIoSliceReader::from_slice(header);
        reader.skip_n(16)?; // syncword

        let stream_type: u8 = reader.get_n(2)?;
        let substream_id: u8 = reader.get_n(3)?;
        let frmsiz: u16 = reader.get_n(11)?;
        let fscod: u8 = reader.get_n(2)?;
        let fscod2_or_numblkscod: u8 = reader.get_n(2)?;
        reader.skip_n(4)?; // acmod, lfeon
        let bsid: u8 = reader.get_n(5)?;

        let (sample_rate, audio_blocks) = if fscod == 3 {
            let rate = *EAC3_REDUCED_SAMPLE_RATES
                .get(fscod2_or_numblkscod as usize)
                .ok_or(HeaderError::InvalidReducedSampleRateCode(
                    fscod2_or_numblkscod,
                ))?;
            (rate, AC3_MAX_BLOCKS_PER_SYNC_FRAME)
        } else {
            (
                AC3_SAMPLE_RATES[fscod as usize],
                EAC3_BLOCKS_PER_FRAME[fscod2_or_numblkscod as usize],
            )
        };

        Ok(Self {
            data_type: DataType::EAc3,
            bsid,
            bsmod: 0,
            stream_type,
            substream_id,
            sample_rate,
            frame_size_bytes: (frmsiz as usize + 1) * size_of::<u16>(),
            audio_blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{AC3_EXAMPLE, EAC3_EXAMPLE, EAC3_EXAMPLE_FRAME_BYTES};

    #[test]
    fn ac3_header() -> anyhow::Result<()> {
        let info = Ac3SyncInfo::read(&AC3_EXAMPLE[..AC3_HEADER_BYTES])?;

        assert_eq!(info.data_type, DataType::Ac3);
        assert_eq!(info.bsid, 8);
        assert_eq!(info.bsmod, 0);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.frame_size_bytes, 256);
        assert_eq!(info.pcm_frames(), 1536);
        Ok(())
    }

    #[test]
    fn eac3_header() -> anyhow::Result<()> {
        let info = Ac3SyncInfo::read(&EAC3_EXAMPLE[..AC3_HEADER_BYTES])?;

        assert_eq!(info.data_type, DataType::EAc3);
        assert_eq!(info.bsid, 16);
        assert_eq!(info.stream_type, EAC3_STREAM_TYPE_0);
        assert_eq!(info.substream_id, 0);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.frame_size_bytes, EAC3_EXAMPLE_FRAME_BYTES);
        assert_eq!(info.audio_blocks, 6);
        assert!(info.is_independent());
        Ok(())
    }

    #[test]
    fn eac3_reduced_rate() -> anyhow::Result<()> {
        let mut header = [0u8; AC3_HEADER_BYTES];
        header.copy_from_slice(&EAC3_EXAMPLE[..AC3_HEADER_BYTES]);
        header[4] = 0b1101_1111; // fscod = 3, fscod2 = 1

        let info = Ac3SyncInfo::read(&header)?;
        assert_eq!(info.sample_rate, 22050);
        assert_eq!(info.audio_blocks, 6);

        header[4] = 0b1111_1111; // fscod2 = 3 is reserved
        assert!(matches!(
            Ac3SyncInfo::read(&header),
            Err(HeaderError::InvalidReducedSampleRateCode(3))
        ));
        Ok(())
    }

    #[test]
    fn rejects_malformed_headers() {
        // frmsiz = 0 claims a 2-byte frame.
        let mut header = [0u8; AC3_HEADER_BYTES];
        header.copy_from_slice(&EAC3_EXAMPLE[..AC3_HEADER_BYTES]);
        header[2] &= 0xF8;
        header[3] = 0;
        assert!(matches!(
            Ac3SyncInfo::read(&header),
            Err(HeaderError::FrameTooShort { size: 2, .. })
        ));

        // Reserved fscod.
        let mut header = [0x0B, 0x77, 0x44, 0xCD, 0xC8, 0x40];
        assert!(matches!(
            Ac3SyncInfo::read(&header),
            Err(HeaderError::InvalidSampleRateCode(3))
        ));

        // frmsizecod past the table.
        header[4] = 0x3F;
        assert!(matches!(
            Ac3SyncInfo::read(&header),
            Err(HeaderError::InvalidFrameSizeCode(63))
        ));

        // bsid 10 is neither AC3 nor E-AC3.
        header[4] = 0x08;
        header[5] = 10 << 3;
        assert!(matches!(
            Ac3SyncInfo::read(&header),
            Err(HeaderError::UnsupportedBsid(10))
        ));
    }
}
