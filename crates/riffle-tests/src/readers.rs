//! Readers with deliberately awkward behavior.

use std::io::{self, Read};

/// Reader that returns at most `limit` bytes per `read` call, exercising
/// partial-read reassembly in consumers.
pub struct ShortReads<R> {
    inner: R,
    limit: usize,
}

impl<R: Read> ShortReads<R> {
    /// Wraps `inner`, capping each read at `limit` bytes.
    pub fn new(inner: R, limit: usize) -> Self {
        assert!(limit > 0, "a zero limit would fake end of input");
        Self { inner, limit }
    }
}

impl<R: Read> Read for ShortReads<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.limit);
        self.inner.read(&mut buf[..n])
    }
}

/// Reader that yields `limit` bytes and then fails every subsequent read.
pub struct FailAfter<R> {
    inner: R,
    remaining: usize,
}

impl<R: Read> FailAfter<R> {
    /// Wraps `inner`, failing once `limit` bytes have been served.
    pub fn new(inner: R, limit: usize) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }
}

impl<R: Read> Read for FailAfter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "injected failure"));
        }
        let n = buf.len().min(self.remaining);
        let read = self.inner.read(&mut buf[..n])?;
        self.remaining -= read;
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn short_reads_preserve_content() {
        let data: Vec<u8> = (0..=255).collect();
        let mut reader = ShortReads::new(Cursor::new(data.clone()), 7);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn fail_after_serves_then_fails() {
        let mut reader = FailAfter::new(Cursor::new(vec![0u8; 100]), 10);
        let mut buf = [0u8; 100];
        let mut served = 0;
        loop {
            match reader.read(&mut buf) {
                Ok(n) => served += n,
                Err(e) => {
                    assert_eq!(e.kind(), io::ErrorKind::Other);
                    break;
                }
            }
        }
        assert_eq!(served, 10);
    }
}
