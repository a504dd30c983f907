use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Destination for raw output: a file, or stdout when the path is `-` or absent.
pub enum OutputWriter {
    Stdout(BufWriter<io::Stdout>),
    File(BufWriter<File>),
}

impl OutputWriter {
    pub fn create(path: Option<&Path>) -> Result<Self> {
        match path.filter(|path| !is_stdout(path)) {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Ok(OutputWriter::File(BufWriter::new(file)))
            }
            None => Ok(OutputWriter::Stdout(BufWriter::new(io::stdout()))),
        }
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputWriter::Stdout(w) => w.write(buf),
            OutputWriter::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputWriter::Stdout(w) => w.flush(),
            OutputWriter::File(w) => w.flush(),
        }
    }
}

pub fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_means_stdout() -> Result<()> {
        assert!(is_stdout(Path::new("-")));
        assert!(!is_stdout(Path::new("out.spdif")));
        assert!(matches!(
            OutputWriter::create(Some(Path::new("-")))?,
            OutputWriter::Stdout(_)
        ));
        assert!(matches!(OutputWriter::create(None)?, OutputWriter::Stdout(_)));
        Ok(())
    }
}
