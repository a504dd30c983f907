//! Burst buffer.
//!
//! A fixed-capacity byte region holding one IEC 61937 data burst while it is
//! assembled. Bytes are stored in wire order: 16-bit words little-endian,
//! payload bytes transposed within each pair so that the first byte of every
//! pair lands in the MSB of the word. The transform is defined on byte pairs,
//! so the output is the same on any host.

/// Rounds a logical length up to the word boundary it occupies.
#[inline(always)]
const fn word_end(len: usize) -> usize {
    (len + 1) & !1
}

#[derive(Debug, Clone)]
pub struct BurstBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl BurstBuffer {
    /// Allocates a zeroed buffer. `capacity` is rounded up to whole words.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; word_end(capacity)],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Logical bytes written so far.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Appends 16-bit words, starting on the next word boundary.
    ///
    /// Returns `false` without writing when the words do not fit.
    pub fn push_words(&mut self, words: &[u16]) -> bool {
        let start = word_end(self.cursor);
        let end = start + words.len() * size_of::<u16>();
        if end > self.capacity() {
            return false;
        }

        for (dst, word) in self.data[start..end].chunks_exact_mut(2).zip(words) {
            dst.copy_from_slice(&word.to_le_bytes());
        }
        self.cursor = end;

        true
    }

    /// Appends payload bytes with each byte pair transposed.
    ///
    /// Returns `false` without writing when the bytes do not fit.
    pub fn push_swapped(&mut self, bytes: &[u8]) -> bool {
        if self.cursor + bytes.len() > self.capacity() {
            return false;
        }

        for &byte in bytes {
            self.data[self.cursor ^ 1] = byte;
            self.cursor += 1;
        }

        true
    }

    /// Overwrites an already written word, e.g. Pd once the payload length is known.
    pub fn set_word(&mut self, index: usize, value: u16) {
        let start = index * size_of::<u16>();
        if start + 2 <= word_end(self.cursor) {
            self.data[start..start + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Zero-fills up to `size` bytes.
    pub fn pad_to(&mut self, size: usize) -> bool {
        if size < word_end(self.cursor) || size > self.capacity() {
            return false;
        }

        self.data[word_end(self.cursor)..size].fill(0);
        self.cursor = size;

        true
    }

    /// Drops everything written after `len` logical bytes.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.cursor {
            return;
        }

        self.data[word_end(len)..word_end(self.cursor)].fill(0);
        if len & 1 == 1 {
            // The byte at `len - 1` lives in the high half of its word; the
            // low half belonged to the dropped tail.
            self.data[len - 1] = 0;
        }
        self.cursor = len;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..word_end(self.cursor)]
    }

    pub fn clear(&mut self) {
        self.data[..word_end(self.cursor)].fill(0);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_then_swapped_bytes() {
        let mut burst = BurstBuffer::new(16);

        assert!(burst.push_words(&[0xF872, 0x4E1F]));
        assert!(burst.push_swapped(&[0x0B, 0x77, 0x44]));
        assert_eq!(burst.len(), 7);
        assert_eq!(burst.as_slice(), &[0x72, 0xF8, 0x1F, 0x4E, 0x77, 0x0B, 0x00, 0x44]);

        // A word after an odd byte count starts on the next boundary.
        assert!(burst.push_words(&[0x1234]));
        assert_eq!(burst.len(), 10);
        assert_eq!(&burst.as_slice()[8..], &[0x34, 0x12]);
    }

    #[test]
    fn overflow_is_refused() {
        let mut burst = BurstBuffer::new(4);

        assert!(burst.push_swapped(&[1, 2, 3]));
        assert!(!burst.push_swapped(&[4, 5]));
        assert!(!burst.push_words(&[0xFFFF]));
        assert_eq!(burst.len(), 3);
        assert!(burst.len() <= burst.capacity());
    }

    #[test]
    fn pad_truncate_and_clear() {
        let mut burst = BurstBuffer::new(12);
        assert!(burst.push_words(&[0xF872, 0x4E1F, 0x0001, 0x0000]));
        assert!(burst.push_swapped(&[0xAA, 0xBB, 0xCC]));

        burst.set_word(3, 24);
        assert_eq!(&burst.as_slice()[6..8], &[24, 0]);

        burst.truncate(9);
        assert_eq!(&burst.as_slice()[8..], &[0x00, 0xAA]);

        assert!(!burst.pad_to(6));
        assert!(burst.pad_to(12));
        assert_eq!(burst.as_slice().len(), 12);
        assert_eq!(&burst.as_slice()[8..], &[0x00, 0xAA, 0x00, 0x00]);

        burst.clear();
        assert!(burst.is_empty());
        assert!(burst.push_swapped(&[0x01]));
        assert_eq!(burst.as_slice(), &[0x00, 0x01]);
    }
}
