/// Sync frame and preamble recognition.
///
/// Provides the [`FrameScanner`](scan::FrameScanner), fed one byte at a time
/// by both the encoder and the decoder.
pub mod scan;

/// Compressed frames to IEC 61937 data bursts.
///
/// Provides the [`SpdifEncoder`](encode::SpdifEncoder), which hands finished
/// bursts to a [`BurstSink`](hooks::BurstSink).
pub mod encode;

/// IEC 61937 data bursts back to compressed frames.
///
/// Provides the [`SpdifDecoder`](decode::SpdifDecoder), which pulls its input
/// from a [`BurstSource`](hooks::BurstSource).
pub mod decode;

/// Output and input capabilities of the encoder and decoder.
pub mod hooks;

/// First 32 bytes of a 256-byte AC3 frame: 48 kHz, bsid 8, bsmod 0.
pub const AC3_EXAMPLE: &[u8] = &[
    0x0B, 0x77, 0x44, 0xCD, 0x08, 0x40, 0x2F, 0x84, 0x29, 0xCA, 0x6E, 0x44, 0xA4, 0xFD, 0xCE, 0xF7,
    0xC9, 0x9F, 0x3E, 0x74, 0xFA, 0x01, 0x0A, 0xDA, 0xB3, 0x3E, 0xB0, 0x95, 0xF2, 0x5A, 0xEF, 0x9E,
];

pub const AC3_EXAMPLE_FRAME_BYTES: usize = 256;

/// First 32 bytes of an E-AC3 frame: independent substream 0, 6 blocks, 48 kHz.
pub const EAC3_EXAMPLE: &[u8] = &[
    0x0B, 0x77, 0x01, 0xBF, 0x3F, 0x85, 0x7F, 0xE8, 0x1E, 0x40, 0x82, 0x10, 0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x03, 0xFC, 0x60, 0x80, 0x7E, 0x59, 0x00, 0xFC, 0xF3, 0xCF, 0x01, 0xF9, 0xE7,
];

pub const EAC3_EXAMPLE_FRAME_BYTES: usize = 896;

/// [`EAC3_EXAMPLE`] as the start of an IEC 61937 data burst.
pub const IEC61937_EAC3_EXAMPLE: &[u8] = &[
    0x72, 0xF8, 0x1F, 0x4E, 0x15, 0x00, 0x80, 0x03, 0x77, 0x0B, 0xBF, 0x01, 0x85, 0x3F, 0xE8, 0x7F,
    0x40, 0x1E, 0x10, 0x82, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x60, 0xFC, 0x7E, 0x80,
];

/// DTS core header: 512 samples (type I), 1006-byte frame, 48 kHz.
pub const DTS_EXAMPLE: &[u8] = &[
    0x7F, 0xFE, 0x80, 0x01, 0xFC, 0x3C, 0x3E, 0xD2, 0x74, 0x00, 0x00, 0x00,
];

pub const DTS_EXAMPLE_FRAME_BYTES: usize = 1006;

/// Extends an example header into a whole frame of `size` bytes.
///
/// The filler never contains a sync word, so a scanner only locks onto
/// the frame starts.
#[cfg(test)]
pub(crate) fn example_frame(prefix: &[u8], size: usize) -> Vec<u8> {
    let mut frame = prefix.to_vec();
    frame.extend((prefix.len()..size).map(|i| (i % 0x70) as u8 + 0x10));
    frame
}
