use std::io;

use crate::structs::data_type::DataType;
use crate::structs::format::AudioFormat;

/// Reasons a sync word match was not accepted as a frame header.
///
/// These never leave the scanner: a rejected header is logged and the
/// scanner keeps looking for the next sync word.
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("AC3 bsid = {0} is not supported")]
    UnsupportedBsid(u8),

    #[error("Invalid AC3 fscod. Read {0:#X}")]
    InvalidSampleRateCode(u8),

    #[error("Invalid E-AC3 fscod2. Read {0:#X}")]
    InvalidReducedSampleRateCode(u8),

    #[error("Invalid AC3 frmsizecod. Read {0}")]
    InvalidFrameSizeCode(u8),

    #[error("Frame size {size} is smaller than the {header}-byte header")]
    FrameTooShort { size: usize, header: usize },

    #[error("Frame of {size} bytes does not fit a {burst}-byte data burst")]
    FrameExceedsBurst { size: usize, burst: usize },

    #[error("DTS CPF must be zero")]
    DtsCrcPresent,

    #[error("DTS nblks must be >= 5. Read {0}")]
    DtsTooFewBlocks(u8),

    #[error("DTS fsize must be >= 95. Read {0}")]
    DtsFrameSizeTooSmall(u16),

    #[error("Invalid DTS sfreq. Read {0:#X}")]
    DtsInvalidSampleRate(u8),

    #[error("DTS frame of {0} samples matches no burst type")]
    DtsUnsupportedSampleCount(usize),

    #[error("DTS frame of {0} samples cannot be carried as data type I")]
    DtsNotTypeI(usize),

    #[error("Unknown IEC 61937 data type {0:#04X}")]
    UnknownDataType(u8),

    #[error("Data type {0} does not belong to this stream")]
    UnexpectedDataType(DataType),

    #[error("Truncated header: {0}")]
    Truncated(#[from] io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum SpdifError {
    #[error("Format {0} cannot be carried over IEC 61937")]
    UnsupportedFormat(AudioFormat),

    #[error("Frame size {size} exceeds the remaining burst capacity {capacity}")]
    FrameTooLarge { size: usize, capacity: usize },

    #[error("Sink accepted {written} of {expected} burst bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Sink write failed: {0}")]
    Sink(#[from] io::Error),
}
