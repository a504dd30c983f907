use std::io::{self, Read, Write};

/// Downstream consumer of finished data bursts.
///
/// Called exactly once per burst with the whole burst. Returning fewer bytes
/// than offered, or an error, puts the encoder into its sticky failure state.
pub trait BurstSink {
    fn write_output(&mut self, burst: &[u8]) -> io::Result<usize>;
}

/// Upstream provider of IEC 61937 bytes for the decoder.
///
/// `Ok(0)` means end of stream.
pub trait BurstSource {
    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl BurstSink for Vec<u8> {
    fn write_output(&mut self, burst: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(burst);
        Ok(burst.len())
    }
}

impl<T: BurstSink + ?Sized> BurstSink for &mut T {
    fn write_output(&mut self, burst: &[u8]) -> io::Result<usize> {
        (**self).write_output(burst)
    }
}

impl BurstSource for &[u8] {
    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }
}

impl<T: BurstSource + ?Sized> BurstSource for &mut T {
    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_input(buf)
    }
}

/// Adapts any [`Write`] into a [`BurstSink`]; a burst is either written
/// completely or reported as failed.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> BurstSink for WriterSink<W> {
    fn write_output(&mut self, burst: &[u8]) -> io::Result<usize> {
        self.inner.write_all(burst)?;
        Ok(burst.len())
    }
}

/// Adapts any [`Read`] into a [`BurstSource`].
#[derive(Debug)]
pub struct ReaderSource<R: Read> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> BurstSource for ReaderSource<R> {
    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_drains() -> anyhow::Result<()> {
        let data = [1u8, 2, 3, 4, 5];
        let mut source: &[u8] = &data;
        let mut buf = [0u8; 3];

        assert_eq!(source.read_input(&mut buf)?, 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(source.read_input(&mut buf)?, 2);
        assert_eq!(source.read_input(&mut buf)?, 0);
        Ok(())
    }

    #[test]
    fn writer_sink_writes_everything() -> anyhow::Result<()> {
        let mut sink = WriterSink::new(io::Cursor::new(Vec::new()));
        assert_eq!(sink.write_output(&[0xAA; 10])?, 10);
        assert_eq!(sink.into_inner().into_inner(), vec![0xAA; 10]);
        Ok(())
    }
}
