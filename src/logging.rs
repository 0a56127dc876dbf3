//! Logging utilities
//!
//! Provides a size-based rolling file writer so JSON logs can be written
//! to disk without unbounded growth.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Maximum log file size before rotation (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated files to keep
pub const DEFAULT_MAX_FILES: usize = 5;

/// A size-based rolling file writer
///
/// Rotates the log file once it exceeds the configured size. Rotated files
/// get a numeric suffix (app.log.1 is the most recent, app.log.N the oldest).
#[derive(Debug)]
pub struct SizeBasedRollingWriter {
    inner: Arc<Mutex<WriterState>>,
}

#[derive(Debug)]
struct WriterState {
    base_path: PathBuf,
    file: Option<File>,
    written: u64,
    max_size: u64,
    max_files: usize,
}

impl SizeBasedRollingWriter {
    /// Create a rolling writer for `path`, rotating at `max_size` bytes and
    /// keeping at most `max_files` rotated files.
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Resume the current size if the file already exists
        let written = fs::metadata(&base_path).map(|m| m.len()).unwrap_or(0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&base_path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(WriterState {
                base_path,
                file: Some(file),
                written,
                max_size,
                max_files,
            })),
        })
    }

    /// Create a rolling writer with the default limits (10MB, 5 files)
    pub fn with_defaults(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }
}

impl WriterState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        // Shift app.log.N-1 -> app.log.N, dropping the oldest
        for i in (1..self.max_files).rev() {
            let from = self.rotated_path(i);
            let to = self.rotated_path(i + 1);
            if from.exists() {
                if i + 1 >= self.max_files {
                    fs::remove_file(&from).ok();
                } else {
                    fs::rename(&from, &to).ok();
                }
            }
        }

        if self.base_path.exists() {
            fs::rename(&self.base_path, self.rotated_path(1))?;
        }

        self.file = Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.base_path)?,
        );
        self.written = 0;

        Ok(())
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path.file_name().unwrap().to_string_lossy().to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }
}

impl Write for SizeBasedRollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().unwrap();

        if state.written + buf.len() as u64 > state.max_size {
            state.rotate()?;
        }

        if let Some(ref mut file) = state.file {
            let written = file.write(buf)?;
            state.written += written as u64;
            Ok(written)
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "Log file not open"))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(ref mut file) = state.file {
            file.flush()
        } else {
            Ok(())
        }
    }
}

impl Clone for SizeBasedRollingWriter {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SizeBasedRollingWriter {
    type Writer = SizeBasedRollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_writer_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let writer = SizeBasedRollingWriter::with_defaults(&path).unwrap();
        assert!(path.exists());
        drop(writer);
    }

    #[test]
    fn test_writer_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut writer = SizeBasedRollingWriter::with_defaults(&path).unwrap();
        writer.write_all(b"hello log\n").unwrap();
        writer.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("hello log"));
    }

    #[test]
    fn test_writer_rotates_at_max_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut writer = SizeBasedRollingWriter::new(&path, 64, 3).unwrap();

        for i in 0..10 {
            writeln!(writer, "line {}: some log output to fill the file", i).unwrap();
        }
        writer.flush().unwrap();

        assert!(dir.path().join("test.log.1").exists());
    }
}
