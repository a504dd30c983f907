//! IEC 61937 burst preamble.
//!
//! | Word | Field | Content |
//! |---|---|---|
//! | Pa | sync 1 | `0xF872` |
//! | Pb | sync 2 | `0x4E1F` |
//! | Pc | burst info | bits 0-4 data type, bit 7 error, bits 8-12 type dependent info |
//! | Pd | length code | payload length in bits or bytes, see [`DataType::length_in_bytes`] |
//!
//! Words travel as 16-bit little-endian PCM samples.

use crate::structs::data_type::DataType;
use crate::utils::errors::HeaderError;

pub const SYNC_PA: u16 = 0xF872;
pub const SYNC_PB: u16 = 0x4E1F;

/// Pa and Pb as they appear on the wire.
pub const PREAMBLE_SYNC_BYTES: [u8; 4] = [0x72, 0xF8, 0x1F, 0x4E];

pub const PREAMBLE_WORDS: usize = 4;
pub const PREAMBLE_BYTES: usize = PREAMBLE_WORDS * size_of::<u16>();

/// IEC 61937 always occupies a stereo pair of 16-bit samples.
pub const SPDIF_CHANNELS: usize = 2;
pub const BYTES_PER_OUTPUT_FRAME: usize = SPDIF_CHANNELS * size_of::<i16>();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preamble {
    pub data_type: DataType,
    pub data_type_info: u8,
    pub error: bool,
    pub length_code: u16,
}

impl Preamble {
    pub fn new(data_type: DataType, data_type_info: u8) -> Self {
        Self {
            data_type,
            data_type_info,
            ..Default::default()
        }
    }

    /// Packs Pc.
    pub fn burst_info(&self) -> u16 {
        (u16::from(self.data_type_info & 0x1F) << 8)
            | (u16::from(self.error) << 7)
            | u16::from(self.data_type.code())
    }

    pub fn to_words(&self) -> [u16; PREAMBLE_WORDS] {
        [SYNC_PA, SYNC_PB, self.burst_info(), self.length_code]
    }

    pub fn from_bytes(bytes: &[u8; PREAMBLE_BYTES]) -> Result<Self, HeaderError> {
        let word = |i: usize| u16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
        let burst_info = word(2);

        let code = (burst_info & 0x1F) as u8;
        let data_type = DataType::from_code(code).ok_or(HeaderError::UnknownDataType(code))?;

        Ok(Self {
            data_type,
            data_type_info: ((burst_info >> 8) & 0x1F) as u8,
            error: burst_info & 0x80 != 0,
            length_code: word(3),
        })
    }

    pub fn payload_bytes(&self) -> usize {
        self.data_type.payload_bytes(self.length_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_eac3_preamble() -> anyhow::Result<()> {
        let bytes = [0x72, 0xF8, 0x1F, 0x4E, 0x15, 0x00, 0x80, 0x03];
        let preamble = Preamble::from_bytes(&bytes)?;

        assert_eq!(preamble.data_type, DataType::EAc3);
        assert_eq!(preamble.data_type_info, 0);
        assert!(!preamble.error);
        assert_eq!(preamble.payload_bytes(), 896);

        Ok(())
    }

    #[test]
    fn burst_info_layout() {
        let mut preamble = Preamble::new(DataType::Ac3, 5);
        preamble.error = true;
        preamble.length_code = 2048;

        assert_eq!(preamble.burst_info(), 0x0581);
        assert_eq!(preamble.to_words(), [0xF872, 0x4E1F, 0x0581, 0x0800]);
    }

    #[test]
    fn unknown_data_type_is_rejected() {
        let bytes = [0x72, 0xF8, 0x1F, 0x4E, 0x07, 0x00, 0x00, 0x01];
        assert!(matches!(
            Preamble::from_bytes(&bytes),
            Err(HeaderError::UnknownDataType(0x07))
        ));
    }
}
