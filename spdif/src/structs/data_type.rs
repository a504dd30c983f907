//! IEC 61937 data types.
//!
//! The data type lives in the low five bits of the burst info word (Pc) and
//! decides three things about a burst: the transport rate multiplier, the
//! unit of the length code (Pd) and the repetition period that the payload
//! is zero-padded to.

use std::fmt::{Display, Formatter};

/// PCM frames produced by one AC3 sync frame.
pub const AC3_PCM_FRAMES_PER_SYNC_FRAME: usize = 1536;

/// Rate multiplier for E-AC3 per IEC 61937-3 5.3.3.
pub const EAC3_RATE_MULTIPLIER: u32 = 4;

/// Rate multiplier for DTS type IV bursts.
pub const DTS_IV_RATE_MULTIPLIER: u32 = 4;

/// Largest DTS core frame in PCM frames (128 blocks of 32).
pub const DTS_MAX_PCM_FRAMES_PER_SYNC_FRAME: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DataType {
    #[default]
    Null = 0x00,
    Ac3 = 0x01,
    Pause = 0x03,
    DtsI = 0x0B,
    DtsII = 0x0C,
    DtsIII = 0x0D,
    DtsIV = 0x0E,
    EAc3 = 0x15,
}

impl DataType {
    /// Maps the low five bits of Pc to a data type.
    ///
    /// Codes that are not listed return `None`: their length unit and
    /// repetition period are not known, so they cannot be framed.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code & 0x1F {
            0x00 => Some(Self::Null),
            0x01 => Some(Self::Ac3),
            0x03 => Some(Self::Pause),
            0x0B => Some(Self::DtsI),
            0x0C => Some(Self::DtsII),
            0x0D => Some(Self::DtsIII),
            0x0E => Some(Self::DtsIV),
            0x15 => Some(Self::EAc3),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn rate_multiplier(self) -> u32 {
        match self {
            Self::EAc3 => EAC3_RATE_MULTIPLIER,
            Self::DtsIV => DTS_IV_RATE_MULTIPLIER,
            _ => 1,
        }
    }

    /// Whether Pd counts bytes rather than bits.
    pub const fn length_in_bytes(self) -> bool {
        matches!(self, Self::EAc3 | Self::DtsIV)
    }

    /// Repetition period of one burst in IEC 61937 sample frames, i.e. the
    /// PCM frames carried by the burst times the rate multiplier.
    pub const fn burst_period(self) -> usize {
        match self {
            Self::Ac3 => AC3_PCM_FRAMES_PER_SYNC_FRAME,
            Self::EAc3 => AC3_PCM_FRAMES_PER_SYNC_FRAME * EAC3_RATE_MULTIPLIER as usize,
            Self::DtsI => 512,
            Self::DtsII => 1024,
            Self::DtsIII => 2048,
            Self::DtsIV => DTS_MAX_PCM_FRAMES_PER_SYNC_FRAME * DTS_IV_RATE_MULTIPLIER as usize,
            Self::Null | Self::Pause => 0,
        }
    }

    /// Encodes a payload length for Pd.
    ///
    /// Callers keep payloads inside the burst period, which keeps both
    /// units within 16 bits.
    pub fn length_code(self, payload_bytes: usize) -> u16 {
        let code = if self.length_in_bytes() {
            payload_bytes
        } else {
            payload_bytes * 8
        };

        u16::try_from(code).unwrap_or(u16::MAX)
    }

    /// Decodes Pd into a payload length in bytes, rounding bits up.
    pub const fn payload_bytes(self, length_code: u16) -> usize {
        if self.length_in_bytes() {
            length_code as usize
        } else {
            (length_code as usize).div_ceil(8)
        }
    }

    pub const fn is_dts(self) -> bool {
        matches!(self, Self::DtsI | Self::DtsII | Self::DtsIII | Self::DtsIV)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Null => "NULL",
            Self::Ac3 => "AC3",
            Self::Pause => "PAUSE",
            Self::DtsI => "DTS type I",
            Self::DtsII => "DTS type II",
            Self::DtsIII => "DTS type III",
            Self::DtsIV => "DTS type IV",
            Self::EAc3 => "E-AC3",
        };

        write!(f, "{name} ({:#04X})", self.code())
    }
}
