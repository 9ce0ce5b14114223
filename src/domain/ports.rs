use std::io;

/// Append-only destination for the downloaded image.
///
/// Bytes are appended in the order they were pulled. Any error is final for
/// the current update session.
pub trait FirmwareSink {
    /// Append a chunk
    fn append(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Push buffered bytes to the underlying storage
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Bytes appended so far
    fn written(&self) -> u64;
}

impl FirmwareSink for Vec<u8> {
    fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }

    fn written(&self) -> u64 {
        self.len() as u64
    }
}
