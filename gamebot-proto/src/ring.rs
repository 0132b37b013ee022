//! Fixed-size byte ring used for both serial directions.
//!
//! One slot is always kept empty so that `head == tail` unambiguously means
//! "empty"; a ring of `N` slots therefore holds at most `N - 1` bytes.
//!
//! Saturation policy: a push into a full ring is dropped, and the byte that
//! would fill the last free slot is replaced by [`OVERFLOW_SENTINEL`]. The
//! reader therefore sees exactly one `'X'` where data went missing.

/// Default ring size in slots.
pub const DEFAULT_RING_SIZE: usize = 32;

/// Byte stored in place of the one that fills the ring.
pub const OVERFLOW_SENTINEL: u8 = b'X';

/// Byte ring with a single producer and a single consumer.
#[derive(Clone, Debug)]
pub struct RingBuffer<const N: usize = DEFAULT_RING_SIZE> {
    buf: [u8; N],
    /// Write index.
    head: usize,
    /// Read index.
    tail: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty ring.
    #[must_use]
    pub const fn new() -> Self {
        assert!(N >= 2, "ring needs at least two slots");
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }

    /// Number of slots, including the reserved one.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes waiting to be read.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    /// Bytes that can still be written.
    #[inline]
    #[must_use]
    pub const fn free(&self) -> usize {
        N - 1 - self.used()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Append a byte, applying the saturation policy.
    ///
    /// Returns `false` if the byte did not make it into the ring as-is
    /// (dropped, or replaced by the sentinel).
    pub fn push(&mut self, byte: u8) -> bool {
        match self.free() {
            0 => false,
            1 => {
                self.store(OVERFLOW_SENTINEL);
                false
            }
            _ => {
                self.store(byte);
                true
            }
        }
    }

    /// Append every byte of `bytes`. Returns how many were stored unchanged.
    pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.push(b)).count()
    }

    /// Remove and return the oldest byte, or 0 when empty.
    pub fn pop(&mut self) -> u8 {
        if self.is_empty() {
            return 0;
        }
        let byte = self.buf[self.tail];
        self.tail = (self.tail + 1) % N;
        byte
    }

    /// Byte at `offset` from the read position, or 0 when out of range.
    #[must_use]
    pub fn peek(&self, offset: usize) -> u8 {
        if offset >= self.used() {
            return 0;
        }
        self.buf[(self.tail + offset) % N]
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.tail = self.head;
    }

    #[inline]
    fn store(&mut self, byte: u8) {
        self.buf[self.head] = byte;
        self.head = (self.head + 1) % N;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
