//! Utility functions and supporting infrastructure.
//!
//! Provides header bit reading and the error types shared by the scanners,
//! the encoder and the decoder.

pub mod bitstream_io;
pub mod errors;
