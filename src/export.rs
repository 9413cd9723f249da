//! Delivery of the staged PGN chunks.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{PuzzleError, Result};
use crate::staging::{ChunkIter, Staging};

/// Output format auto-detected from the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain PGN (default, `.pgn`, or no extension)
    Pgn,
    /// Gzip-compressed PGN (`.gz`)
    PgnGz,
    /// Plain PGN on stdout (`-`)
    Stdout,
}

impl OutputFormat {
    pub fn detect(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            return OutputFormat::Stdout;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => OutputFormat::PgnGz,
            _ => OutputFormat::Pgn,
        }
    }
}

/// Read side of a finished run.
pub struct PgnExport {
    staging: Staging,
}

impl PgnExport {
    pub fn new(staging: Staging) -> Self {
        Self { staging }
    }

    /// Staged output chunks in order.
    pub fn chunks(&self) -> ChunkIter<String> {
        self.staging.iter_chunks::<String>()
    }

    /// The whole document: chunks joined by a blank line, newline terminated.
    /// Empty when nothing matched.
    pub fn to_document(&self) -> Result<String> {
        let mut doc = String::new();
        for chunk in self.chunks() {
            let chunk = chunk?;
            if !doc.is_empty() {
                doc.push_str("\n\n");
            }
            doc.push_str(&chunk);
        }
        if !doc.is_empty() {
            doc.push('\n');
        }
        Ok(doc)
    }

    /// Stream every chunk into `out`, same layout as [`Self::to_document`].
    pub fn write_into<W: Write>(&self, out: &mut W) -> Result<usize> {
        let mut written = 0;
        for chunk in self.chunks() {
            let chunk = chunk?;
            if written > 0 {
                out.write_all(b"\n\n")?;
            }
            out.write_all(chunk.as_bytes())?;
            written += 1;
        }
        if written > 0 {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(written)
    }

    /// Write the document to `path` (`-` for stdout, `.gz` for gzip).
    pub fn write_to(&self, path: &Path) -> Result<usize> {
        let io_err = |op: &'static str| {
            let key = path.display().to_string();
            move |e: io::Error| PuzzleError::storage(key, op, e)
        };
        match OutputFormat::detect(path) {
            OutputFormat::Stdout => {
                let stdout = io::stdout();
                let mut out = BufWriter::new(stdout.lock());
                self.write_into(&mut out)
            }
            OutputFormat::Pgn => {
                let file = File::create(path).map_err(io_err("create output"))?;
                let mut out = BufWriter::new(file);
                self.write_into(&mut out)
            }
            OutputFormat::PgnGz => {
                let file = File::create(path).map_err(io_err("create output"))?;
                let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
                let written = self.write_into(&mut encoder)?;
                encoder
                    .finish()
                    .and_then(|mut inner| inner.flush())
                    .map_err(io_err("finish gzip output"))?;
                Ok(written)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn export_with(chunks: &[&str]) -> PgnExport {
        let staging = Staging::new(Arc::new(MemoryStore::new()));
        for (i, c) in chunks.iter().enumerate() {
            staging.set_chunk(i, &c.to_string()).unwrap();
        }
        PgnExport::new(staging)
    }

    #[test]
    fn test_detect() {
        assert_eq!(OutputFormat::detect(Path::new("-")), OutputFormat::Stdout);
        assert_eq!(OutputFormat::detect(Path::new("out.pgn.gz")), OutputFormat::PgnGz);
        assert_eq!(OutputFormat::detect(Path::new("out.pgn")), OutputFormat::Pgn);
        assert_eq!(OutputFormat::detect(Path::new("out")), OutputFormat::Pgn);
    }

    #[test]
    fn test_document_layout() {
        assert_eq!(export_with(&["a\n\nb", "c"]).to_document().unwrap(), "a\n\nb\n\nc\n");
        assert_eq!(export_with(&[]).to_document().unwrap(), "");
    }

    #[test]
    fn test_write_plain_and_gzip_match_document() {
        let export = export_with(&["first", "second"]);
        let dir = tempdir().unwrap();

        let plain = dir.path().join("out.pgn");
        assert_eq!(export.write_to(&plain).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&plain).unwrap(), "first\n\nsecond\n");

        let gz = dir.path().join("out.pgn.gz");
        export.write_to(&gz).unwrap();
        let mut text = String::new();
        GzDecoder::new(File::open(&gz).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, export.to_document().unwrap());
    }
}
