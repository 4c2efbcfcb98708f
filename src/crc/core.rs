use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::common::io::open_noatime;
use crate::common::io_error_msg;

/// Read buffer size per worker. Memory per worker is bounded by this,
/// whatever the file size.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Why a single file could not be checksummed.
///
/// Display renders the platform's own message with no extra context, so an
/// error line reads `Error while reading missing.txt: No such file or directory`.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The path could not be opened (missing, permission denied, ...).
    #[error("{}", io_error_msg(.0))]
    Open(#[source] io::Error),
    /// The file opened but a read failed part way through.
    #[error("{}", io_error_msg(.0))]
    Read(#[source] io::Error),
}

impl ReportError {
    pub fn io_error(&self) -> &io::Error {
        match self {
            ReportError::Open(e) | ReportError::Read(e) => e,
        }
    }
}

/// Result of checksumming one file.
pub type Outcome = Result<u32, ReportError>;

/// One per requested file. Built entirely by the worker, then handed to
/// the collector and never touched again.
#[derive(Debug)]
pub struct Report {
    /// Position of the file on the command line (0-based).
    pub index: usize,
    /// The path exactly as given, which need not be valid UTF-8.
    pub filename: PathBuf,
    pub outcome: Outcome,
}

impl Report {
    pub fn checksum(&self) -> Option<u32> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Write the report line, newline included, with the filename's bytes
    /// copied through untouched (no lossy UTF-8 conversion).
    pub fn write_line<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let name = self.filename.as_os_str().as_encoded_bytes();
        match &self.outcome {
            Ok(crc) => {
                out.write_all(name)?;
                writeln!(out, ": {:08X}", crc)
            }
            Err(e) => {
                out.write_all(b"Error while reading ")?;
                out.write_all(name)?;
                writeln!(out, ": {}", e)
            }
        }
    }
}

impl fmt::Display for Report {
    /// `name: 0001ABCD` on success, `Error while reading name: reason` on failure.
    /// Non-UTF-8 names are shown lossily; `write_line` keeps the raw bytes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(crc) => write!(f, "{}: {:08X}", self.filename.display(), crc),
            Err(e) => write!(f, "Error while reading {}: {}", self.filename.display(), e),
        }
    }
}

/// Where workers get their bytes from.
///
/// The real tool reads files; tests substitute in-memory or deliberately
/// slow readers to control completion order.
pub trait Source: Sync {
    type Reader: Read;

    fn open(&self, path: &Path) -> io::Result<Self::Reader>;
}

/// Reads paths from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl Source for FileSource {
    type Reader = File;

    fn open(&self, path: &Path) -> io::Result<File> {
        open_noatime(path)
    }
}

/// Stream a reader through a CRC-32 (IEEE) accumulator, `CHUNK_SIZE` bytes at a time.
pub fn checksum_reader<R: Read>(mut reader: R) -> io::Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    tracing::trace!(bytes = total, "stream finished");
    Ok(hasher.finalize())
}

/// CRC-32 (IEEE) of an in-memory buffer.
#[inline]
pub fn checksum_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Worker body: open `path` through `source`, checksum it, and describe the result.
///
/// Never fails; open and read errors end up in the report. The reader is
/// dropped (and the handle closed) before this returns, on every path.
pub fn checksum_path<S: Source + ?Sized>(source: &S, index: usize, path: &Path) -> Report {
    let outcome = match source.open(path) {
        Err(e) => Err(ReportError::Open(e)),
        Ok(reader) => checksum_reader(reader).map_err(ReportError::Read),
    };
    match &outcome {
        Ok(crc) => tracing::debug!(
            index,
            path = %path.display(),
            crc = %format!("{:08X}", crc),
            "checksummed"
        ),
        Err(e) => tracing::debug!(
            index,
            path = %path.display(),
            error = %e,
            kind = ?e.io_error().kind(),
            "checksum failed"
        ),
    }
    Report {
        index,
        filename: path.to_path_buf(),
        outcome,
    }
}
