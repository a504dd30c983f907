//! IEC 61937 (S/PDIF, HDMI) framing for compressed audio.
//!
//! ## Technical Overview
//!
//! IEC 61937 carries compressed frames inside a stream shaped like 16-bit
//! stereo PCM. Every frame (or group of frames) becomes a data burst:
//!
//! - an 8-byte preamble: sync words Pa/Pb, burst info Pc, length code Pd
//! - the compressed payload with the bytes of every 16-bit word swapped
//! - zero padding up to the repetition period of the data type
//!
//! ### Supported Formats
//!
//! - AC3 (data type 0x01, one frame per 1536-sample burst)
//! - E-AC3 (data type 0x15, six audio blocks per 6144-sample burst, rate x4)
//! - DTS core, types I to IV (data types 0x0B to 0x0E)
//!
//! ## Quick Start
//!
//! 1. Wrap compressed frames with [`process::encode::SpdifEncoder`]
//! 2. Recover them with [`process::decode::SpdifDecoder`]
//!
//! ```rust
//! use spdif::process::decode::SpdifDecoder;
//! use spdif::process::encode::SpdifEncoder;
//! use spdif::structs::format::AudioFormat;
//!
//! let compressed: Vec<u8> = Vec::new(); // AC3 sync frames
//!
//! // Bursts are collected by any `BurstSink`, here a Vec<u8>
//! let mut encoder = SpdifEncoder::new(AudioFormat::Ac3, Vec::new())?;
//! encoder.write(&compressed);
//! encoder.flush();
//! if let Some(err) = encoder.sink_error() {
//!     eprintln!("Sink failed: {err}");
//! }
//! let wire = encoder.into_sink();
//!
//! // Any `BurstSource` feeds the decoder, here a byte slice
//! let mut decoder = SpdifDecoder::new(AudioFormat::Ac3, wire.as_slice())?;
//! let mut frames = vec![0u8; 4096];
//! let n = decoder.read(&mut frames)?;
//! assert_eq!(&frames[..n], compressed.as_slice());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Processing of compressed and IEC 61937 streams.
///
/// 1. **Scanning** ([`process::scan`]): Sync word and header recognition,
///    one byte at a time.
///
/// 2. **Encoding** ([`process::encode`]): Frames to data bursts.
///
/// 3. **Decoding** ([`process::decode`]): Data bursts to frames.
///
/// 4. **Hooks** ([`process::hooks`]): Burst sinks and sources.
pub mod process;

/// Data structures representing wire format components.
///
/// - **Data Types** ([`structs::data_type`]): Pc codes, rate multipliers, Pd units
/// - **Preambles** ([`structs::preamble`]): Pa/Pb/Pc/Pd
/// - **AC3/E-AC3 Headers** ([`structs::ac3`]): Sync info
/// - **DTS Headers** ([`structs::dts`]): Core frame header
/// - **Burst Buffer** ([`structs::burst`]): Burst assembly
/// - **Frame Info** ([`structs::frame_info`]): Latched header parameters
/// - **Formats** ([`structs::format`]): Stream format tags
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level header reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
