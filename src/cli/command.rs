use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use spdif::structs::format::AudioFormat;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", spdif ",
    env!("SPDIF_VERSION"),
    ")"
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for wrapping AC3, E-AC3 and DTS bitstreams in IEC 61937 (S/PDIF) and back",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Fail on skipped input bytes and sink errors instead of resynchronizing.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Wrap a compressed bitstream into IEC 61937 data bursts.
    Wrap(WrapArgs),

    /// Extract the compressed bitstream from an IEC 61937 stream.
    Unwrap(UnwrapArgs),

    /// Print stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct WrapArgs {
    /// Input compressed bitstream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Compressed format of the input.
    #[arg(long, value_enum)]
    pub format: FormatArg,

    /// Output path (use "-" for stdout, the default).
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Container for the IEC 61937 stream.
    #[arg(long, value_enum, default_value_t = Container::Raw)]
    pub container: Container,

    /// Only carry DTS frames of up to 512 samples (data type I).
    #[arg(long)]
    pub dts_type_i: bool,
}

#[derive(Debug, Args)]
pub struct UnwrapArgs {
    /// Input IEC 61937 stream, raw or WAV (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Compressed format carried by the input.
    #[arg(long, value_enum)]
    pub format: FormatArg,

    /// Output path (use "-" for stdout, the default).
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input compressed bitstream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Compressed format of the input.
    #[arg(long, value_enum)]
    pub format: FormatArg,

    /// Print the report as YAML.
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum FormatArg {
    /// Dolby Digital.
    Ac3,
    /// Dolby Digital Plus.
    Eac3,
    /// Dolby Digital Plus with joint object coding.
    Eac3Joc,
    /// DTS core.
    Dts,
    /// DTS-HD (core frames are carried).
    DtsHd,
}

impl FormatArg {
    pub fn to_audio_format(self) -> AudioFormat {
        match self {
            FormatArg::Ac3 => AudioFormat::Ac3,
            FormatArg::Eac3 => AudioFormat::EAc3,
            FormatArg::Eac3Joc => AudioFormat::EAc3Joc,
            FormatArg::Dts => AudioFormat::Dts,
            FormatArg::DtsHd => AudioFormat::DtsHd,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum Container {
    /// Bare 16-bit little-endian stereo samples.
    Raw,
    /// RIFF/WAVE, 16-bit stereo PCM.
    Wav,
}
