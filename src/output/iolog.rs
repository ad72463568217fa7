//! fio iolog trace writer
//!
//! Writes the version 2 header followed by every batch verbatim. File output
//! goes to a temporary file next to the destination and is only renamed into
//! place by [`TraceDestination::commit`], so a failed run never leaves a
//! half-written trace behind.

use super::{Batch, TraceSink, IOLOG_HEADER};
use crate::Result;
use anyhow::Context;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writer forwarding batches to any `Write` in arrival order
pub struct TraceWriter<W: Write> {
    out: BufWriter<W>,
    batches: u64,
    bytes: u64,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            out: BufWriter::new(inner),
            batches: 0,
            bytes: 0,
        }
    }

    /// Batches written so far (header excluded)
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Bytes written so far (header included)
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Flush and hand back the inner writer
    pub fn finish(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush trace output")
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.out
            .write_all(s.as_bytes())
            .context("Failed to write trace output")?;
        self.bytes += s.len() as u64;
        Ok(())
    }
}

impl<W: Write> TraceSink for TraceWriter<W> {
    fn write_header(&mut self) -> Result<()> {
        self.write_str(IOLOG_HEADER)
    }

    fn write_batch(&mut self, batch: &Batch<'_>) -> Result<()> {
        self.write_str(batch.commands)?;
        self.batches += 1;
        Ok(())
    }
}

/// Trace destination: standard output or an atomically persisted file
pub enum TraceDestination {
    Stdout(Stdout),
    File { temp: NamedTempFile, path: PathBuf },
}

impl TraceDestination {
    /// Open the destination; `None` means standard output
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(TraceDestination::Stdout(io::stdout()));
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Cannot open '{}' for writing", path.display()))?;

        Ok(TraceDestination::File {
            temp,
            path: path.to_path_buf(),
        })
    }

    /// Make the trace visible at its final location
    ///
    /// Dropping a file destination without committing removes the temporary
    /// file.
    pub fn commit(self) -> Result<()> {
        match self {
            TraceDestination::Stdout(mut out) => out.flush().context("Failed to flush stdout"),
            TraceDestination::File { temp, path } => {
                temp.as_file()
                    .sync_all()
                    .with_context(|| format!("Failed to sync trace file for '{}'", path.display()))?;
                temp.persist(&path)
                    .map_err(|e| e.error)
                    .with_context(|| format!("Failed to write trace to '{}'", path.display()))?;
                Ok(())
            }
        }
    }
}

impl Write for TraceDestination {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TraceDestination::Stdout(out) => out.write(buf),
            TraceDestination::File { temp, .. } => temp.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TraceDestination::Stdout(out) => out.flush(),
            TraceDestination::File { temp, .. } => temp.flush(),
        }
    }
}
