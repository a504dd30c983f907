//! Data structures representing IEC 61937 and compressed-audio wire elements.
//!
//! Contains the burst preamble and data type tags, the sync frame headers
//! recognized by the scanners, and the burst buffer the encoder assembles
//! bursts in.

pub mod ac3;
pub mod burst;
pub mod data_type;
pub mod dts;
pub mod format;
pub mod frame_info;
pub mod preamble;
