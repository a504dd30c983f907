use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use spdif::process::hooks::BurstSink;
use spdif::structs::preamble::SPDIF_CHANNELS;
use spdifd_macros::{ToBytes, riff_chunk};

pub const WAVE_FORMAT_PCM: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

const RIFF_SIZE_POSITION: u64 = 4;
const FMT_POSITION: u64 = 12;

pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.chunk_id())?;

        let chunk_data = self.chunk_data();
        writer.write_all(&(chunk_data.len() as u32).to_le_bytes())?;
        writer.write_all(&chunk_data)?;
        if chunk_data.len() % 2 == 1 {
            writer.write_all(&[0])?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, ToBytes)]
#[riff_chunk(b"fmt ")]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WaveFormat {
    /// 16-bit stereo PCM, the shape of an IEC 61937 stream.
    pub fn spdif(sample_rate: u32) -> Self {
        let block_align = SPDIF_CHANNELS as u16 * BITS_PER_SAMPLE / 8;

        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels: SPDIF_CHANNELS as u16,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
        }
    }
}

/// RIFF/WAVE writer for IEC 61937 bursts.
///
/// The header is written up front with a provisional sample rate; the
/// final rate and the chunk sizes are patched in [`WavWriter::finish`].
pub struct WavWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    format: WaveFormat,
    data_size_position: u64,
    data_written: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(writer: W, sample_rate: u32) -> io::Result<Self> {
        let mut writer = BufWriter::new(writer);
        let format = WaveFormat::spdif(sample_rate);

        writer.write_all(b"RIFF")?;
        writer.write_all(&0u32.to_le_bytes())?; // RIFF size (to be updated later)
        writer.write_all(b"WAVE")?;
        format.write_all(&mut writer)?;
        writer.write_all(b"data")?;
        let data_size_position = writer.stream_position()?;
        writer.write_all(&0u32.to_le_bytes())?; // Data size (to be updated later)

        Ok(Self {
            writer,
            format,
            data_size_position,
            data_written: 0,
        })
    }

    /// Rate of the IEC 61937 stream, i.e. the frame rate times the rate multiplier.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.format = WaveFormat::spdif(sample_rate);
    }

    pub fn write_samples(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.data_written += data.len() as u64;
        Ok(())
    }

    /// Writes the final format and chunk sizes.
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;

        let current_pos = self.writer.stream_position()?;
        let data_size = u32::try_from(self.data_written).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "WAV data exceeds 4 GiB")
        })?;

        self.writer.seek(SeekFrom::Start(FMT_POSITION))?;
        self.format.write_all(&mut self.writer)?;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        let riff_size = (current_pos - RIFF_SIZE_POSITION - 4) as u32;
        self.writer.seek(SeekFrom::Start(RIFF_SIZE_POSITION))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(current_pos))?;
        self.writer.flush()?;

        Ok(())
    }

    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }

    #[cfg(test)]
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write + Seek> BurstSink for WavWriter<W> {
    fn write_output(&mut self, burst: &[u8]) -> io::Result<usize> {
        self.write_samples(burst)?;
        Ok(burst.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// RIFF header, 16-byte fmt chunk and data chunk header.
    const WAV_HEADER_BYTES: u64 = 44;

    #[test]
    fn wav_header_write() -> io::Result<()> {
        let writer = WavWriter::new(Cursor::new(Vec::new()), 48000)?;
        let buffer = writer.into_inner()?.into_inner();

        assert_eq!(buffer.len() as u64, WAV_HEADER_BYTES);
        assert_eq!(&buffer[0..4], b"RIFF");
        assert_eq!(&buffer[8..12], b"WAVE");
        assert_eq!(&buffer[12..16], b"fmt ");
        assert_eq!(&buffer[16..20], &16u32.to_le_bytes());
        assert_eq!(&buffer[20..22], &1u16.to_le_bytes());
        assert_eq!(&buffer[22..24], &2u16.to_le_bytes());
        assert_eq!(&buffer[24..28], &48000u32.to_le_bytes());
        assert_eq!(&buffer[28..32], &192000u32.to_le_bytes());
        assert_eq!(&buffer[36..40], b"data");

        Ok(())
    }

    #[test]
    fn wav_finish_patches_sizes() -> io::Result<()> {
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), 48000)?;

        writer.write_output(&[0x72, 0xF8, 0x1F, 0x4E])?;
        writer.write_samples(&[0; 12])?;
        assert_eq!(writer.data_written(), 16);

        writer.set_sample_rate(192000);
        writer.finish()?;

        let buffer = writer.into_inner()?.into_inner();
        assert_eq!(buffer.len(), 60);
        assert_eq!(&buffer[4..8], &52u32.to_le_bytes());
        assert_eq!(&buffer[24..28], &192000u32.to_le_bytes());
        assert_eq!(&buffer[40..44], &16u32.to_le_bytes());
        assert_eq!(&buffer[44..48], &[0x72, 0xF8, 0x1F, 0x4E]);

        Ok(())
    }
}
