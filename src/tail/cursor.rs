//! Offset-tracked incremental reader.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::TailError;

/// Reads the lines appended to a log file since the previous read.
///
/// The cursor only ever moves past complete, newline-terminated lines, so
/// a line that is still being written is picked up whole on a later read.
/// When the file is found to be shorter than the cursor (rotation with
/// `copytruncate`, or a manual truncate) reading restarts from the beginning.
/// Rotation by renaming the file and creating a new one is followed too.
///
/// The offset lives in memory only; a new `LogTail` starts from zero
/// unless built with [`LogTail::at_end`].
///
/// # Example
///
/// ```no_run
/// use logwall::tail::LogTail;
///
/// # fn example() -> Result<(), logwall::tail::TailError> {
/// let mut tail = LogTail::new("/var/log/auth.log");
/// for line in tail.read_new_lines()? {
///     println!("{}", line?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    offset: u64,
    file: Option<File>,
}

impl LogTail {
    /// Creates a reader positioned at the start of the file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            file: None,
        }
    }

    /// Creates a reader positioned at the current end of the file.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::Open`] if the file cannot be opened or its size
    /// cannot be read.
    pub fn at_end(path: impl Into<PathBuf>) -> Result<Self, TailError> {
        let path = path.into();
        let open_error = |source| TailError::Open {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).map_err(open_error)?;
        let offset = file.metadata().map_err(open_error)?.len();

        Ok(Self {
            path,
            offset,
            file: Some(file),
        })
    }

    /// Returns the path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of bytes consumed so far.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns an iterator over the new complete lines.
    ///
    /// Lines are yielded without their terminator. The cursor advances as
    /// each line is yielded, so dropping the iterator early leaves the
    /// remaining lines for the next call.
    ///
    /// The open handle is kept between calls. If another file has since
    /// appeared under the same path, the held file is drained first (an
    /// unterminated last line included) and reading continues from the
    /// start of the new one. While nothing exists at the path the held
    /// file keeps being read.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::Open`] if the file cannot be opened or inspected,
    /// and [`TailError::Read`] if seeking to the cursor fails.
    pub fn read_new_lines(&mut self) -> Result<NewLines<'_>, TailError> {
        let open_error = |source| TailError::Open {
            path: self.path.clone(),
            source,
        };

        let (mut file, replacement) = match self.file.take() {
            None => (File::open(&self.path).map_err(open_error)?, None),
            Some(held) => match File::open(&self.path) {
                Ok(fresh) => match same_file(&held, &fresh) {
                    Ok(true) => (held, None),
                    Ok(false) => (held, Some(fresh)),
                    Err(e) => {
                        self.file = Some(held);
                        return Err(open_error(e));
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => (held, None),
                Err(e) => {
                    self.file = Some(held);
                    return Err(open_error(e));
                }
            },
        };

        let size = file.metadata().map_err(open_error)?.len();
        if size < self.offset {
            tracing::warn!(
                "'{}' shrank from {} to {size} bytes (truncated), reading from the start",
                self.path.display(),
                self.offset
            );
            self.offset = 0;
        }

        file.seek(SeekFrom::Start(self.offset))
            .map_err(|source| TailError::Read {
                path: self.path.clone(),
                offset: self.offset,
                source,
            })?;

        tracing::debug!(
            "Reading '{}' from offset {} ({size} bytes on disk)",
            self.path.display(),
            self.offset
        );

        Ok(NewLines {
            path: &self.path,
            offset: &mut self.offset,
            slot: &mut self.file,
            reader: Some(BufReader::new(file)),
            replacement,
            buf: Vec::new(),
        })
    }

    /// Reads every new complete line into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first [`TailError`] encountered. Lines consumed before the
    /// error still count as read.
    pub fn read_batch(&mut self) -> Result<Vec<String>, TailError> {
        self.read_new_lines()?.collect()
    }
}

#[cfg(unix)]
fn same_file(a: &File, b: &File) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let (a, b) = (a.metadata()?, b.metadata()?);
    Ok(a.dev() == b.dev() && a.ino() == b.ino())
}

#[cfg(not(unix))]
fn same_file(_: &File, _: &File) -> io::Result<bool> {
    Ok(true)
}

/// Iterator over complete lines appended since the last read.
///
/// Returned by [`LogTail::read_new_lines`]. Dropping it hands the open
/// file back to the [`LogTail`].
#[derive(Debug)]
pub struct NewLines<'a> {
    path: &'a Path,
    offset: &'a mut u64,
    slot: &'a mut Option<File>,
    reader: Option<BufReader<File>>,
    replacement: Option<File>,
    buf: Vec<u8>,
}

impl NewLines<'_> {
    /// Stops reading and returns the current file to the cursor.
    fn park(&mut self) {
        if let Some(reader) = self.reader.take() {
            *self.slot = Some(reader.into_inner());
        }
    }

    fn switch_to_replacement(&mut self) -> bool {
        let Some(file) = self.replacement.take() else {
            return false;
        };

        tracing::info!(
            "'{}' was replaced, reading the new file from the start",
            self.path.display()
        );
        self.reader = Some(BufReader::new(file));
        *self.offset = 0;
        true
    }
}

impl Iterator for NewLines<'_> {
    type Item = Result<String, TailError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let reader = self.reader.as_mut()?;

            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    if !self.switch_to_replacement() {
                        self.park();
                        return None;
                    }
                }
                Ok(n) if self.buf.ends_with(b"\n") => {
                    *self.offset += n as u64;
                    return Some(Ok(decode_line(&self.buf)));
                }
                Ok(_) if self.replacement.is_some() => {
                    // Nothing will complete a line in the old file
                    let line = decode_line(&self.buf);
                    self.switch_to_replacement();
                    return Some(Ok(line));
                }
                Ok(_) => {
                    // Unterminated tail: left for the next read
                    self.park();
                    return None;
                }
                Err(source) => {
                    self.park();
                    return Some(Err(TailError::Read {
                        path: self.path.to_path_buf(),
                        offset: *self.offset,
                        source,
                    }));
                }
            }
        }
    }
}

impl Drop for NewLines<'_> {
    fn drop(&mut self) {
        self.park();
    }
}

/// Strips the `\n` (and a preceding `\r`) and decodes lossily.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
