use bytes::{Buf, BytesMut};

/// FIFO byte accumulator for headerless elementary streams.
///
/// Bytes are appended at the tail by [`RawBuffer::extend`] and removed from
/// the head by [`RawBuffer::consume`]; nothing in between is ever reordered.
#[derive(Debug, Default)]
pub struct RawBuffer {
    data: BytesMut,
    consumed_total: u64,
}

impl RawBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Unconsumed bytes, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drops `count` bytes from the head. Asking for more than is buffered
    /// drops everything; returns the number actually removed.
    pub fn consume(&mut self, count: usize) -> usize {
        let count = count.min(self.data.len());
        self.data.advance(count);
        self.consumed_total += count as u64;
        count
    }

    /// Drops every buffered byte, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let len = self.data.len();
        self.consume(len)
    }

    /// Stream offset of the current head, i.e. the number of bytes consumed
    /// since the buffer was created.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.consumed_total
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn consumes_oldest_first() {
        let mut buffer = RawBuffer::new();
        buffer.extend(&[1, 2, 3]);
        buffer.extend(&[4, 5]);
        assert_eq!(buffer.consume(2), 2);
        assert_eq!(buffer.as_slice(), &[3, 4, 5]);
        assert_eq!(buffer.position(), 2);
        buffer.extend(&[6]);
        assert_eq!(buffer.as_slice(), &[3, 4, 5, 6]);
    }

    #[test]
    fn over_consumption_is_clamped() {
        let mut buffer = RawBuffer::new();
        buffer.extend(&[0; 4]);
        assert_eq!(buffer.consume(10), 4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.position(), 4);
    }

    #[test]
    fn clear_reports_dropped_bytes() {
        let mut buffer = RawBuffer::new();
        assert_eq!(buffer.clear(), 0);
        buffer.extend(b"abcdef");
        buffer.consume(1);
        assert_eq!(buffer.clear(), 5);
        assert!(buffer.is_empty());
        assert_eq!(buffer.position(), 6);
    }

    #[quickcheck]
    fn fifo_discipline(chunks: Vec<Vec<u8>>, takes: Vec<u8>) -> bool {
        let mut buffer = RawBuffer::new();
        let mut expected: Vec<u8> = Vec::new();
        let mut takes = takes.into_iter().cycle();
        for chunk in &chunks {
            buffer.extend(chunk);
            expected.extend_from_slice(chunk);
            let take = takes.next().map_or(0, usize::from);
            let removed = buffer.consume(take);
            expected.drain(..removed);
            if buffer.as_slice() != expected.as_slice() {
                return false;
            }
        }
        buffer.len() == expected.len()
    }
}
