//! Byte accumulator fed by the port's ingress path and consumed in place by [`crate::codec`] and
//! [`crate::session`].

use bytes::{BufMut, BytesMut};

/// Frames larger than this are not legitimate; a partial frame accumulated past this size is a
/// buffer overrun, not a slow arrival.
pub const RX_BUFFER_MAX_LEN: usize = 1024;

#[derive(Debug, Default)]
pub struct RxBuffer {
    buf: BytesMut,
}

impl RxBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(RX_BUFFER_MAX_LEN),
        }
    }

    /// Appends a freshly-received chunk to the tail of the buffer.
    pub fn append(&mut self, chunk: &[u8]) {
        self.buf.put_slice(chunk);
    }

    /// Drops the first `n` bytes, as directed by a [`crate::codec::parse`] outcome's `consumed`.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        let _ = self.buf.split_to(n);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
