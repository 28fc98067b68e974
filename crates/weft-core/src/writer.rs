#![forbid(unsafe_code)]

//! Buffered terminal output.
//!
//! All escape sequences and character data for one render cycle are
//! staged in memory and pushed to the terminal in a single flush. A
//! frame that reaches the terminal in pieces can tear visibly, so
//! nothing is written to the underlying stream until [`TermWriter::flush`].

use std::fmt;
use std::io::{self, Write};

/// Flush failure, split by whether a retry can succeed.
#[derive(Debug)]
pub enum WriteError {
    /// The stream is momentarily unwritable (`WouldBlock`, `Interrupted`,
    /// `TimedOut`). The staged buffer is kept; call `flush` again.
    Retryable(io::Error),
    /// The stream is unusable. The staged buffer is dropped.
    Fatal(io::Error),
}

impl WriteError {
    fn classify(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut => {
                Self::Retryable(err)
            }
            _ => Self::Fatal(err),
        }
    }

    /// True when a later flush may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    /// The underlying I/O error.
    #[must_use]
    pub fn into_inner(self) -> io::Error {
        match self {
            Self::Retryable(err) | Self::Fatal(err) => err,
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable(err) => write!(f, "terminal momentarily unwritable: {err}"),
            Self::Fatal(err) => write!(f, "terminal stream unusable: {err}"),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Retryable(err) | Self::Fatal(err) => Some(err),
        }
    }
}

impl From<WriteError> for io::Error {
    fn from(err: WriteError) -> Self {
        err.into_inner()
    }
}

/// Staged writer over a terminal output stream.
///
/// `write` never touches the underlying stream; `flush` pushes the whole
/// staged buffer at once. A retryable flush failure keeps the staged
/// bytes so the caller can retry the identical payload; a fatal one
/// drops them.
#[derive(Debug)]
pub struct TermWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    total_written: u64,
}

impl<W: Write> TermWriter<W> {
    /// Wrap an output stream.
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, 4096)
    }

    /// Wrap an output stream with a pre-sized staging buffer.
    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(capacity),
            total_written: 0,
        }
    }

    /// Stage bytes for the next flush.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes currently staged.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes successfully flushed over the writer's lifetime.
    #[must_use]
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Write the staged buffer to the stream in one call and flush it.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`WriteError::Retryable`] keeps the staged buffer; flushing again
    /// repeats the identical payload. Note that `write_all` may have
    /// pushed a prefix of the buffer before failing; repeating those
    /// bytes re-asserts terminal state rather than corrupting it.
    /// [`WriteError::Fatal`] drops the staged buffer.
    pub fn flush(&mut self) -> Result<usize, WriteError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }
        if let Err(err) = self.inner.write_all(&self.buffer).and_then(|()| self.inner.flush()) {
            let err = WriteError::classify(err);
            if !err.is_retryable() {
                self.buffer.clear();
            }
            return Err(err);
        }

        let written = self.buffer.len();
        self.total_written += written as u64;
        self.buffer.clear();

        #[cfg(feature = "tracing")]
        crate::logging::trace!(bytes = written, "flushed frame");
        Ok(written)
    }

    /// Drop any staged bytes without writing them.
    pub fn discard(&mut self) {
        self.buffer.clear();
    }

    /// Access the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the writer, returning the underlying stream.
    ///
    /// Staged bytes that were never flushed are dropped.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A writer that fails the first `failures` write attempts.
    struct FlakyWriter {
        failures: u32,
        written: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "busy"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_stages_without_touching_stream() {
        let mut writer = TermWriter::new(Vec::new());
        writer.write(b"\x1b[2J");
        writer.write(b"hello");
        assert_eq!(writer.buffered_len(), 9);
        assert!(writer.get_ref().is_empty());
    }

    #[test]
    fn flush_is_single_shot_and_counts() {
        let mut writer = TermWriter::new(Vec::new());
        writer.write(b"abc");
        writer.write(b"def");
        assert_eq!(writer.flush().unwrap(), 6);
        assert_eq!(writer.get_ref(), b"abcdef");
        assert_eq!(writer.total_written(), 6);
        // Nothing staged: flush is a no-op.
        assert_eq!(writer.flush().unwrap(), 0);
    }

    #[test]
    fn retryable_flush_keeps_buffer() {
        let mut writer = TermWriter::new(FlakyWriter {
            failures: 1,
            written: Vec::new(),
        });
        writer.write(b"payload");
        let err = writer.flush().unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(writer.buffered_len(), 7);

        // Retry sends the identical payload.
        assert_eq!(writer.flush().unwrap(), 7);
        assert_eq!(writer.get_ref().written, b"payload");
    }

    #[test]
    fn fatal_flush_drops_buffer() {
        struct BrokenWriter;
        impl Write for BrokenWriter {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut writer = TermWriter::new(BrokenWriter);
        writer.write(b"payload");
        let err = writer.flush().unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(writer.buffered_len(), 0);
    }

    #[test]
    fn discard_drops_staged_bytes() {
        let mut writer = TermWriter::new(Vec::new());
        writer.write(b"stale");
        writer.discard();
        assert_eq!(writer.flush().unwrap(), 0);
        assert!(writer.get_ref().is_empty());
    }
}
