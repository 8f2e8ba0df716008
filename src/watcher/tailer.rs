//! Incremental line reader backed by the offset store.
//!
//! Reads only whole lines appended since the last read of a path.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

use crate::config::{DEFAULT_BUFFER_SIZE, DEFAULT_MAX_FILE_SIZE};

use super::error::WatcherError;
use super::offsets::OffsetStore;

/// Incremental reader that tracks positions in an [`OffsetStore`].
///
/// Safe to call concurrently for different paths. Calls for the same path
/// must be serialized by the caller, since the offset update is not atomic
/// with the read.
#[derive(Debug, Clone, Copy)]
pub struct LineTailer {
    /// Files larger than this are never read.
    max_file_size: u64,
    /// Longest line accepted, in bytes.
    buffer_size: usize,
}

impl Default for LineTailer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE, DEFAULT_BUFFER_SIZE)
    }
}

impl LineTailer {
    /// Create a tailer with the given size ceiling and line buffer.
    #[must_use]
    pub fn new(max_file_size: u64, buffer_size: usize) -> Self {
        Self {
            max_file_size,
            buffer_size,
        }
    }

    /// The size ceiling in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Read whole lines appended to `path` since the stored offset.
    ///
    /// Files above the size ceiling yield nothing and keep their offset.
    /// A file smaller than its stored offset was truncated or replaced, and
    /// is read again from the start. A trailing line without a newline is
    /// left for the next call.
    ///
    /// A complete line longer than the line buffer is logged as
    /// [`WatcherError::LineTooLong`] and skipped; the lines around it are
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened (file deleted, permission denied)
    /// - I/O errors occur during reading
    pub async fn read_new_lines(
        &self,
        path: &Path,
        offsets: &OffsetStore,
    ) -> Result<Vec<String>, WatcherError> {
        let file = File::open(path)
            .await
            .map_err(|e| WatcherError::from_io(path, e))?;

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(WatcherError::NotAFile(path.to_path_buf()));
        }
        let size = metadata.len();

        if size > self.max_file_size {
            tracing::debug!(
                path = %path.display(),
                size,
                limit = self.max_file_size,
                "File exceeds size limit, skipping read"
            );
            return Ok(Vec::new());
        }

        let mut offset = offsets.get(path).unwrap_or(0);
        if size < offset {
            tracing::warn!(
                path = %path.display(),
                old_offset = offset,
                new_len = size,
                "File truncated, resetting offset to 0"
            );
            offset = 0;
        }

        if size == offset {
            offsets.set(path, offset);
            return Ok(Vec::new());
        }

        let mut file = file;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut reader = BufReader::with_capacity(self.buffer_size, file.take(size - offset));

        let mut lines = Vec::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut consumed = offset;
        // Bytes of the current line, counted even once it stops being buffered.
        let mut line_len: u64 = 0;
        let mut overflow = false;

        loop {
            let chunk = reader.fill_buf().await?;
            if chunk.is_empty() {
                break;
            }

            let (take, complete) = match chunk.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (chunk.len(), false),
            };
            if !overflow {
                pending.extend_from_slice(&chunk[..take]);
            }
            reader.consume(take);
            line_len += take as u64;

            if !overflow && pending.len() > self.buffer_size + usize::from(complete) {
                overflow = true;
                pending.clear();
            }

            if complete {
                if overflow {
                    let error = WatcherError::LineTooLong {
                        path: path.to_path_buf(),
                        limit: self.buffer_size,
                    };
                    tracing::warn!(error = %error, offset = consumed, "Skipping over-long line");
                } else {
                    lines.push(decode_line(&pending));
                }
                consumed += line_len;
                pending.clear();
                line_len = 0;
                overflow = false;
            }
        }

        offsets.set(path, consumed);
        Ok(lines)
    }
}

/// Strip the line terminator and decode lossily.
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
