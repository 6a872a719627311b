// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for FIFO space accounting and chunk sizing.

use streamboot_common::protocol::{FIFO_STATUS_EMPTY, FIFO_STATUS_FULL};
use streamboot_common::{available_space, next_chunk, FifoStatus, FlowDecision, UploadCursor};

fn fifo(flags: u32, write_ptr: u32, read_ptr: u32, size: u32, max_transfer: u32) -> FifoStatus {
    FifoStatus {
        flags,
        write_ptr,
        read_ptr,
        fifo_size_words: size,
        max_transfer_words: max_transfer,
    }
}

// =============================================================================
// available_space
// =============================================================================

#[test]
fn test_empty_fifo_is_fully_available() {
    assert_eq!(available_space(&fifo(FIFO_STATUS_EMPTY, 0, 0, 64, 16)), 256);
}

#[test]
fn test_full_fifo_has_no_space() {
    assert_eq!(available_space(&fifo(FIFO_STATUS_FULL, 10, 10, 64, 16)), 0);
}

#[test]
fn test_write_ahead_of_read() {
    // 10 words used out of 64
    assert_eq!(available_space(&fifo(0, 12, 2, 64, 16)), 54 * 4);
}

#[test]
fn test_write_wrapped_behind_read() {
    assert_eq!(available_space(&fifo(0, 2, 12, 64, 16)), 10 * 4);
}

#[test]
fn test_equal_pointers_without_flags() {
    assert_eq!(available_space(&fifo(0, 5, 5, 64, 16)), 0);
}

#[test]
fn test_space_never_exceeds_capacity() {
    for write_ptr in 0..64 {
        for read_ptr in 0..64 {
            for flags in [0, FIFO_STATUS_EMPTY, FIFO_STATUS_FULL] {
                let status = fifo(flags, write_ptr, read_ptr, 64, 16);
                assert!(available_space(&status) <= status.capacity_bytes());
            }
        }
    }
}

#[test]
fn test_space_is_whole_words() {
    for write_ptr in 0..32 {
        let status = fifo(0, write_ptr, 7, 32, 8);
        assert_eq!(available_space(&status) % 4, 0);
    }
}

#[test]
fn test_huge_fifo_saturates() {
    let status = fifo(FIFO_STATUS_EMPTY, 0, 0, u32::MAX, 16);
    assert_eq!(available_space(&status), u32::MAX);
}

// =============================================================================
// next_chunk
// =============================================================================

#[test]
fn test_chunk_is_minimum_of_bounds() {
    assert_eq!(next_chunk(1000, 64, 256), FlowDecision::Send(64));
    assert_eq!(next_chunk(1000, 64, 20), FlowDecision::Send(20));
    assert_eq!(next_chunk(6, 64, 256), FlowDecision::Send(6));
}

#[test]
fn test_no_space_backs_off() {
    assert_eq!(next_chunk(1000, 64, 0), FlowDecision::Backoff);
}

#[test]
fn test_nothing_left_is_done() {
    assert_eq!(next_chunk(0, 64, 0), FlowDecision::Done);
}

// =============================================================================
// UploadCursor
// =============================================================================

/// Drive a cursor against a FIFO that drains `drain` words between polls.
fn simulate_upload(image_len: usize, size: u32, max_transfer: u32, drain: u32) -> Vec<usize> {
    let mut cursor = UploadCursor::new(image_len, max_transfer * 4);
    let mut written = 0u32;
    let mut read = 0u32;
    let mut chunks = Vec::new();
    while !cursor.is_done() {
        read = (read + drain).min(written);
        let used = written - read;
        let flags = if used == 0 {
            FIFO_STATUS_EMPTY
        } else if used == size {
            FIFO_STATUS_FULL
        } else {
            0
        };
        let status = fifo(flags, written % size, read % size, size, max_transfer);
        match cursor.plan(&status) {
            FlowDecision::Send(len) => {
                assert!(len as u32 <= available_space(&status));
                assert!(len as u32 <= max_transfer * 4);
                let span = cursor.span(len);
                assert_eq!(span.start, cursor.offset());
                cursor.advance(len);
                written += (len as u32).div_ceil(4);
                chunks.push(len);
            }
            FlowDecision::Backoff => {}
            FlowDecision::Done => break,
        }
    }
    chunks
}

#[test]
fn test_chunks_cover_image_exactly() {
    for image_len in [1, 3, 4, 63, 64, 65, 1000, 4096, 4099] {
        let chunks = simulate_upload(image_len, 64, 16, 8);
        assert_eq!(chunks.iter().sum::<usize>(), image_len, "len {}", image_len);
    }
}

#[test]
fn test_small_fifo_large_image() {
    // 4-word FIFO, 2-word transfers, drained 1 word per poll
    let chunks = simulate_upload(4096, 4, 2, 1);
    assert_eq!(chunks.iter().sum::<usize>(), 4096);
    assert!(chunks.iter().all(|&len| len <= 8));
}

#[test]
fn test_only_last_chunk_is_partial_word() {
    let chunks = simulate_upload(1001, 64, 16, 16);
    let (last, rest) = chunks.split_last().unwrap();
    assert!(rest.iter().all(|&len| len % 4 == 0));
    assert_eq!(*last % 4, 1001 % 4);
}

#[test]
fn test_cursor_reports_progress() {
    let mut cursor = UploadCursor::new(100, 64);
    assert_eq!(cursor.remaining(), 100);
    assert_eq!(cursor.max_transfer_bytes(), 64);
    cursor.advance(64);
    assert_eq!(cursor.offset(), 64);
    assert_eq!(cursor.remaining(), 36);
    assert!(!cursor.is_done());
}
