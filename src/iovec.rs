//! Owned scatter/gather buffer (C10) with a cursor so multi-stage
//! operations can consume it in slices without copying.

/// An owned I/O buffer plus a read/write cursor.
///
/// Real SCSI transports hand the core a true scatter/gather list; the
/// core only ever needs "total length", "advance past N bytes", and
/// "compare N bytes against another buffer", so a single contiguous
/// buffer with a cursor gives the same semantics without the core having
/// to reconstruct the segment list of the underlying transport.
#[derive(Debug, Clone)]
pub struct IoVector {
    buf: Vec<u8>,
    cursor: usize,
}

impl IoVector {
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, cursor: 0 }
    }

    pub fn with_capacity(len: usize) -> Self {
        Self {
            buf: vec![0u8; len],
            cursor: 0,
        }
    }

    /// Total length of the backing buffer, irrespective of cursor position.
    pub fn total_len(&self) -> usize {
        self.buf.len()
    }

    /// Bytes remaining from the cursor to the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advances the cursor by `n` bytes.
    ///
    /// # Panics
    /// Panics if `n` would move the cursor past the end of the buffer;
    /// every caller in this crate computes `n` from a length it already
    /// validated against `remaining()`.
    pub fn advance(&mut self, n: usize) {
        assert!(n <= self.remaining(), "iovec cursor overrun");
        self.cursor += n;
    }

    /// The unconsumed slice from the cursor onward.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.cursor..]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let cursor = self.cursor;
        &mut self.buf[cursor..]
    }

    /// The first `len` bytes from the cursor. Panics if `len > remaining()`.
    pub fn peek(&self, len: usize) -> &[u8] {
        assert!(len <= self.remaining(), "iovec peek overrun");
        &self.buf[self.cursor..self.cursor + len]
    }

    /// Compares the first `len` bytes of `self` (from the cursor) against
    /// the first `len` bytes of `other` (from its own cursor), returning
    /// the byte offset of the first mismatch, or `None` if they are equal.
    pub fn mismatch(&self, other: &IoVector, len: usize) -> Option<u64> {
        let a = self.peek(len);
        let b = other.peek(len);
        a.iter().zip(b.iter()).position(|(x, y)| x != y).map(|i| i as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_cursor_and_shrinks_remaining() {
        let mut iov = IoVector::new(vec![0u8; 1024]);
        assert_eq!(iov.remaining(), 1024);
        iov.advance(512);
        assert_eq!(iov.remaining(), 512);
        assert_eq!(iov.cursor(), 512);
    }

    #[test]
    fn mismatch_reports_first_differing_offset() {
        let mut a = vec![1u8; 512];
        let b = vec![1u8; 512];
        a[37] = 0xFF;
        let iov_a = IoVector::new(a);
        let iov_b = IoVector::new(b);
        assert_eq!(iov_a.mismatch(&iov_b, 512), Some(37));
    }

    #[test]
    fn matching_buffers_have_no_mismatch() {
        let iov_a = IoVector::new(vec![7u8; 256]);
        let iov_b = IoVector::new(vec![7u8; 256]);
        assert_eq!(iov_a.mismatch(&iov_b, 256), None);
    }

    #[test]
    #[should_panic]
    fn advance_past_end_panics() {
        let mut iov = IoVector::new(vec![0u8; 16]);
        iov.advance(17);
    }
}
