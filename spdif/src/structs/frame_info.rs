use crate::structs::data_type::DataType;
use crate::structs::preamble::BYTES_PER_OUTPUT_FRAME;

/// Parameters latched from the last recognized header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    pub data_type: DataType,
    /// Type dependent bits 8-12 of Pc (bsmod for AC3).
    pub data_type_info: u8,
    pub error: bool,
    /// Nominal sample rate of the compressed stream, 0 when unknown.
    pub sample_rate: u32,
    pub frame_size_bytes: usize,
    /// PCM frames the compressed frame decodes to.
    pub pcm_frames: usize,
    /// Burst repetition period in IEC 61937 sample frames.
    pub samples_per_sync_frame: usize,
    pub rate_multiplier: u32,
}

impl FrameInfo {
    /// Placeholder before any header has been seen, sized for `data_type`.
    pub fn initial(data_type: DataType) -> Self {
        Self {
            data_type,
            samples_per_sync_frame: data_type.burst_period(),
            rate_multiplier: data_type.rate_multiplier(),
            ..Default::default()
        }
    }

    pub fn burst_size_bytes(&self) -> usize {
        self.samples_per_sync_frame * BYTES_PER_OUTPUT_FRAME
    }
}
