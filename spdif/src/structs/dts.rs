//! DTS core frame header (16-bit big-endian sync only).
//!
//! Frame header fields following the `0x7FFE8001` sync word:
//!
//! | Field | Bits |
//! |---|---|
//! | ftype | 1 |
//! | deficit sample count | 5 |
//! | cpf | 1 |
//! | nblks | 7 |
//! | fsize | 14 |
//! | amode | 6 |
//! | sfreq | 4 |

use log::trace;

use crate::structs::data_type::DataType;
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

pub const DTS_SYNC_BYTES: [u8; 4] = [0x7F, 0xFE, 0x80, 0x01];
pub const DTS_HEADER_BYTES: usize = 12;
pub const DTS_PCM_FRAMES_PER_BLOCK: usize = 32;

const DTS_SAMPLE_RATES: [u32; 16] = [
    0, 8000, 16000, 32000, 0, 0, 11025, 22050, 44100, 0, 0, 12000, 24000, 48000, 0, 0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtsCoreHeader {
    pub frame_type: bool,
    pub deficit: u8,
    pub nblks: u8,
    pub fsize: u16,
    pub amode: u8,
    pub sfreq: u8,
}

impl DtsCoreHeader {
    pub fn read(header: &[u8]) -> Result<Self, HeaderError> {
        let reader = &mut BsIoSliceReader::from_slice(header);
        reader.skip_n(32)?;

        let frame_type = reader.get()?;
        let deficit = reader.get_n(5)?;
        let cpf = reader.get()?;
        let nblks = reader.get_n(7)?;
        let fsize = reader.get_n(14)?;
        let amode = reader.get_n(6)?;
        let sfreq = reader.get_n(4)?;

        if cpf {
            return Err(HeaderError::DtsCrcPresent);
        }
        if nblks < 5 {
            return Err(HeaderError::DtsTooFewBlocks(nblks));
        }
        if fsize < 95 {
            return Err(HeaderError::DtsFrameSizeTooSmall(fsize));
        }

        let header = Self {
            frame_type,
            deficit,
            nblks,
            fsize,
            amode,
            sfreq,
        };

        if header.sample_rate() == 0 {
            return Err(HeaderError::DtsInvalidSampleRate(sfreq));
        }
        header.data_type()?;

        trace!(
            "DTS core header: {} Hz, {} bytes, {} samples, amode {}",
            header.sample_rate(),
            header.frame_size_bytes(),
            header.pcm_frames(),
            header.amode
        );

        Ok(header)
    }

    pub fn sample_rate(&self) -> u32 {
        DTS_SAMPLE_RATES[(self.sfreq & 0xF) as usize]
    }

    pub fn frame_size_bytes(&self) -> usize {
        self.fsize as usize + 1
    }

    pub fn pcm_frames(&self) -> usize {
        (self.nblks as usize + 1) * DTS_PCM_FRAMES_PER_BLOCK
    }

    /// Burst type by frame length. Each type repeats at exactly its own
    /// sample count, so other lengths have no burst to travel in.
    pub fn data_type(&self) -> Result<DataType, HeaderError> {
        match self.pcm_frames() {
            512 => Ok(DataType::DtsI),
            1024 => Ok(DataType::DtsII),
            2048 => Ok(DataType::DtsIII),
            4096 => Ok(DataType::DtsIV),
            n => Err(HeaderError::DtsUnsupportedSampleCount(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::DTS_EXAMPLE;

    #[test]
    fn dts_header() -> anyhow::Result<()> {
        let header = DtsCoreHeader::read(&DTS_EXAMPLE[..DTS_HEADER_BYTES])?;

        assert!(header.frame_type);
        assert_eq!(header.deficit, 31);
        assert_eq!(header.nblks, 15);
        assert_eq!(header.pcm_frames(), 512);
        assert_eq!(header.frame_size_bytes(), 1006);
        assert_eq!(header.amode, 9);
        assert_eq!(header.sample_rate(), 48000);
        assert_eq!(header.data_type()?, DataType::DtsI);
        Ok(())
    }

    #[test]
    fn dts_burst_types() -> anyhow::Result<()> {
        let header = |nblks| DtsCoreHeader {
            frame_type: true,
            deficit: 31,
            nblks,
            fsize: 1005,
            amode: 9,
            sfreq: 13,
        };

        assert_eq!(header(15).data_type()?, DataType::DtsI);
        assert_eq!(header(31).data_type()?, DataType::DtsII);
        assert_eq!(header(63).data_type()?, DataType::DtsIII);
        assert_eq!(header(127).data_type()?, DataType::DtsIV);

        for nblks in [7, 16, 30, 64, 100] {
            assert!(matches!(
                header(nblks).data_type(),
                Err(HeaderError::DtsUnsupportedSampleCount(n)) if n == (nblks as usize + 1) * 32
            ));
        }
        Ok(())
    }

    #[test]
    fn dts_rejects_short_frames() {
        let mut header = [0u8; DTS_HEADER_BYTES];
        header.copy_from_slice(&DTS_EXAMPLE[..DTS_HEADER_BYTES]);

        // nblks 7: 256 samples.
        header[5] = (header[5] & 0x03) | (0x07 << 2);
        assert!(matches!(
            DtsCoreHeader::read(&header),
            Err(HeaderError::DtsUnsupportedSampleCount(256))
        ));
    }

    #[test]
    fn dts_rejects_bad_fields() {
        let mut header = [0u8; DTS_HEADER_BYTES];
        header.copy_from_slice(&DTS_EXAMPLE[..DTS_HEADER_BYTES]);

        // cpf set
        header[4] |= 0x02;
        assert!(matches!(
            DtsCoreHeader::read(&header),
            Err(HeaderError::DtsCrcPresent)
        ));
        header[4] &= !0x02;

        // sfreq = 0
        header[8] &= 0xC3;
        assert!(matches!(
            DtsCoreHeader::read(&header),
            Err(HeaderError::DtsInvalidSampleRate(0))
        ));
    }
}
