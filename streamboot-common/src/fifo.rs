// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Indirect FIFO flow control - pure logic without bus dependencies.
//!
//! The device-side FIFO is a circular buffer. Its occupancy cannot be derived
//! from the pointers alone when it is exactly full or exactly empty (both
//! leave `write_ptr == read_ptr`), so the status flags break the tie. This
//! module turns a reported [`FifoStatus`] into a byte budget and decides how
//! large the next data write may be.

use crate::protocol::{FifoStatus, WORD_SIZE};

/// Free space in the device FIFO, in bytes.
///
/// Pointer arithmetic saturates, so inconsistent pointers from a misbehaving
/// device yield a smaller budget instead of wrapping into a huge one.
pub fn available_space(status: &FifoStatus) -> u32 {
    let words = if status.is_empty() {
        status.fifo_size_words
    } else if !status.is_full() {
        if status.write_ptr > status.read_ptr {
            let used = status.write_ptr - status.read_ptr;
            status.fifo_size_words.saturating_sub(used)
        } else {
            status.read_ptr - status.write_ptr
        }
    } else {
        0
    };
    words.saturating_mul(WORD_SIZE as u32)
}

/// What the uploader should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowDecision {
    /// Write this many bytes.
    Send(usize),
    /// FIFO has no room; poll again after the backoff interval.
    Backoff,
    /// Nothing left to send.
    Done,
}

/// Size the next chunk: `min(remaining, max_transfer, available)`.
pub fn next_chunk(remaining: usize, max_transfer_bytes: u32, available: u32) -> FlowDecision {
    if remaining == 0 {
        return FlowDecision::Done;
    }
    let bound = max_transfer_bytes.min(available) as usize;
    if bound == 0 {
        return FlowDecision::Backoff;
    }
    FlowDecision::Send(remaining.min(bound))
}

/// Upload progress through a boot image.
///
/// `max_transfer_bytes` is sampled once per session and held constant for
/// the whole upload.
#[derive(Clone, Copy, Debug)]
pub struct UploadCursor {
    image_len: usize,
    offset: usize,
    max_transfer_bytes: u32,
}

impl UploadCursor {
    pub fn new(image_len: usize, max_transfer_bytes: u32) -> Self {
        Self {
            image_len,
            offset: 0,
            max_transfer_bytes,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.image_len - self.offset
    }

    pub fn is_done(&self) -> bool {
        self.offset >= self.image_len
    }

    pub fn max_transfer_bytes(&self) -> u32 {
        self.max_transfer_bytes
    }

    /// Decide the next step from a fresh FIFO status.
    pub fn plan(&self, status: &FifoStatus) -> FlowDecision {
        next_chunk(
            self.remaining(),
            self.max_transfer_bytes,
            available_space(status),
        )
    }

    /// Byte range of the image covered by a chunk of `len` at the cursor.
    pub fn span(&self, len: usize) -> core::ops::Range<usize> {
        let end = (self.offset + len).min(self.image_len);
        self.offset..end
    }

    /// Record that `len` bytes were accepted by the transport.
    pub fn advance(&mut self, len: usize) {
        self.offset = (self.offset + len).min(self.image_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FIFO_STATUS_EMPTY, FIFO_STATUS_FULL};

    fn status(flags: u32, write_ptr: u32, read_ptr: u32) -> FifoStatus {
        FifoStatus {
            flags,
            write_ptr,
            read_ptr,
            fifo_size_words: 16,
            max_transfer_words: 4,
        }
    }

    #[test]
    fn test_empty_flag_wins_over_pointers() {
        assert_eq!(available_space(&status(FIFO_STATUS_EMPTY, 5, 9)), 64);
    }

    #[test]
    fn test_full_flag_means_no_space() {
        assert_eq!(available_space(&status(FIFO_STATUS_FULL, 3, 3)), 0);
    }

    #[test]
    fn test_bogus_pointers_saturate() {
        // used (40) > capacity (16)
        assert_eq!(available_space(&status(0, 41, 1)), 0);
    }

    #[test]
    fn test_next_chunk_bounds() {
        assert_eq!(next_chunk(100, 8, 64), FlowDecision::Send(8));
        assert_eq!(next_chunk(3, 8, 64), FlowDecision::Send(3));
        assert_eq!(next_chunk(100, 64, 12), FlowDecision::Send(12));
        assert_eq!(next_chunk(100, 8, 0), FlowDecision::Backoff);
        assert_eq!(next_chunk(0, 8, 64), FlowDecision::Done);
    }

    #[test]
    fn test_cursor_advance_clamps() {
        let mut cursor = UploadCursor::new(10, 8);
        assert_eq!(cursor.span(8), 0..8);
        cursor.advance(8);
        assert_eq!(cursor.remaining(), 2);
        assert_eq!(cursor.span(8), 8..10);
        cursor.advance(8);
        assert!(cursor.is_done());
        assert_eq!(cursor.offset(), 10);
    }
}
