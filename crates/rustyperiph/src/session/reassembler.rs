//! Prepared write reassembly
//!
//! Fragments of a long write are collected into a buffer of fixed capacity and
//! handed out as one value when the central executes the queue. The buffer is
//! allocated on the first fragment and released on every exit path.

use crate::att::GattStatus;
use log::{debug, error, trace, warn};

/// Default capacity of the prepare buffer
pub const PREPARE_BUF_MAX_SIZE: usize = 1024;

/// Result of executing or cancelling the queued fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Fragments concatenated in offset order
    Committed(Vec<u8>),
    /// The central cancelled the queue
    Cancelled,
    /// Execute with nothing queued
    Empty,
}

/// Buffer for one pending prepared write
#[derive(Debug)]
pub struct PreparedWriteBuffer {
    capacity: usize,
    buffer: Option<Vec<u8>>,
    /// Accepted fragments as (offset, length)
    extents: Vec<(usize, usize)>,
}

impl PreparedWriteBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: None,
            extents: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a buffer is currently allocated
    pub fn is_pending(&self) -> bool {
        self.buffer.is_some()
    }

    /// Bytes accepted so far
    pub fn accumulated_length(&self) -> usize {
        self.extents.iter().map(|&(_, len)| len).sum()
    }

    /// Validate and store one fragment.
    ///
    /// Any status other than `Ok` drops the whole pending write.
    pub fn accept_fragment(&mut self, offset: u16, bytes: &[u8], need_response: bool) -> GattStatus {
        let offset = usize::from(offset);
        trace!(
            "Prepare write fragment offset {} len {} (response {})",
            offset,
            bytes.len(),
            need_response
        );

        let status = self.store(offset, bytes);
        if !status.is_ok() {
            warn!(
                "Prepared write aborted at offset {} len {}: {:?}",
                offset,
                bytes.len(),
                status
            );
            self.reset();
        }
        status
    }

    fn store(&mut self, offset: usize, bytes: &[u8]) -> GattStatus {
        if offset > self.capacity {
            return GattStatus::InvalidOffset;
        }

        let end = match offset.checked_add(bytes.len()) {
            Some(end) if end <= self.capacity => end,
            _ => return GattStatus::InvalidAttributeValueLength,
        };

        if self
            .extents
            .iter()
            .any(|&(start, len)| offset < start + len && start < end)
        {
            return GattStatus::InvalidOffset;
        }

        if self.buffer.is_none() {
            let mut buffer = Vec::new();
            if let Err(e) = buffer.try_reserve_exact(self.capacity) {
                error!("Prepare buffer allocation of {} bytes failed: {}", self.capacity, e);
                return GattStatus::InsufficientResources;
            }
            buffer.resize(self.capacity, 0);
            debug!("Prepare buffer allocated ({} bytes)", self.capacity);
            self.buffer = Some(buffer);
        }

        if let Some(buffer) = self.buffer.as_mut() {
            buffer[offset..end].copy_from_slice(bytes);
        }
        if !bytes.is_empty() {
            self.extents.push((offset, bytes.len()));
        }

        GattStatus::Ok
    }

    /// Execute (`true`) or cancel (`false`) the queue. The buffer is always freed.
    pub fn commit(&mut self, execute: bool) -> CommitOutcome {
        let outcome = match (execute, self.buffer.take()) {
            (false, _) => CommitOutcome::Cancelled,
            (true, None) => CommitOutcome::Empty,
            (true, Some(_)) if self.extents.is_empty() => CommitOutcome::Empty,
            (true, Some(buffer)) => {
                self.extents.sort_unstable_by_key(|&(start, _)| start);
                let mut value = Vec::with_capacity(self.accumulated_length());
                for &(start, len) in &self.extents {
                    value.extend_from_slice(&buffer[start..start + len]);
                }
                CommitOutcome::Committed(value)
            }
        };

        self.reset();
        outcome
    }

    /// Drop any partial write
    pub fn reset(&mut self) {
        self.buffer = None;
        self.extents.clear();
    }
}

impl Default for PreparedWriteBuffer {
    fn default() -> Self {
        Self::new(PREPARE_BUF_MAX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sequential_fragments() {
        let mut buf = PreparedWriteBuffer::default();
        assert!(!buf.is_pending());
        assert_eq!(buf.accept_fragment(0, b"hello ", true), GattStatus::Ok);
        assert!(buf.is_pending());
        assert_eq!(buf.accept_fragment(6, b"world", true), GattStatus::Ok);
        assert_eq!(buf.accumulated_length(), 11);
        assert_eq!(buf.commit(true), CommitOutcome::Committed(b"hello world".to_vec()));
        assert!(!buf.is_pending());
    }

    #[test]
    fn test_out_of_order_fragments() {
        let mut buf = PreparedWriteBuffer::new(16);
        assert_eq!(buf.accept_fragment(4, &[5, 6, 7, 8], false), GattStatus::Ok);
        assert_eq!(buf.accept_fragment(0, &[1, 2, 3, 4], false), GattStatus::Ok);
        assert_eq!(
            buf.commit(true),
            CommitOutcome::Committed(vec![1, 2, 3, 4, 5, 6, 7, 8])
        );
    }

    #[test]
    fn test_offset_past_capacity() {
        let mut buf = PreparedWriteBuffer::new(16);
        assert_eq!(buf.accept_fragment(0, &[1, 2], true), GattStatus::Ok);
        assert_eq!(buf.accept_fragment(17, &[], true), GattStatus::InvalidOffset);
        assert!(!buf.is_pending());
        assert_eq!(buf.commit(true), CommitOutcome::Empty);
    }

    #[test]
    fn test_fragment_overflowing_capacity() {
        let mut buf = PreparedWriteBuffer::new(16);
        assert_eq!(buf.accept_fragment(0, &[0; 8], true), GattStatus::Ok);
        assert_eq!(
            buf.accept_fragment(10, &[0; 7], true),
            GattStatus::InvalidAttributeValueLength
        );
        assert!(!buf.is_pending());
        assert_eq!(buf.accumulated_length(), 0);
        assert_eq!(buf.commit(true), CommitOutcome::Empty);
    }

    #[test]
    fn test_fragment_exactly_at_capacity() {
        let mut buf = PreparedWriteBuffer::new(16);
        assert_eq!(buf.accept_fragment(8, &[9; 8], true), GattStatus::Ok);
        assert_eq!(buf.accept_fragment(16, &[], true), GattStatus::Ok);
        assert_eq!(buf.commit(true), CommitOutcome::Committed(vec![9; 8]));
    }

    #[test]
    fn test_overlapping_fragment_aborts() {
        let mut buf = PreparedWriteBuffer::new(16);
        assert_eq!(buf.accept_fragment(0, &[1; 8], true), GattStatus::Ok);
        assert_eq!(buf.accept_fragment(4, &[2; 8], true), GattStatus::InvalidOffset);
        assert!(!buf.is_pending());
    }

    #[test]
    fn test_allocation_failure() {
        let mut buf = PreparedWriteBuffer::new(usize::MAX);
        assert_eq!(
            buf.accept_fragment(0, &[1, 2, 3], true),
            GattStatus::InsufficientResources
        );
        assert!(!buf.is_pending());
    }

    #[test]
    fn test_cancel_frees_buffer() {
        let mut buf = PreparedWriteBuffer::default();
        buf.accept_fragment(0, &[1, 2, 3], true);
        assert_eq!(buf.commit(false), CommitOutcome::Cancelled);
        assert!(!buf.is_pending());
        assert_eq!(buf.commit(true), CommitOutcome::Empty);
    }

    #[test]
    fn test_execute_without_fragments() {
        let mut buf = PreparedWriteBuffer::default();
        assert_eq!(buf.commit(true), CommitOutcome::Empty);
        assert_eq!(buf.commit(false), CommitOutcome::Cancelled);
    }

    /// Split `data` into consecutive fragments at the given cut points
    fn fragments(data: &[u8], cuts: &[usize]) -> Vec<(usize, Vec<u8>)> {
        let mut points: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
        points.push(0);
        points.push(data.len());
        points.sort_unstable();
        points.dedup();

        points
            .windows(2)
            .map(|w| (w[0], data[w[0]..w[1]].to_vec()))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_commit_concatenates_in_offset_order(
            data in proptest::collection::vec(any::<u8>(), 1..=PREPARE_BUF_MAX_SIZE),
            cuts in proptest::collection::vec(any::<usize>(), 0..16),
            order in any::<u64>(),
        ) {
            let mut frags = fragments(&data, &cuts);
            // deterministic shuffle from the seed
            let len = frags.len();
            for i in 0..len {
                let j = (order.rotate_left(i as u32) as usize) % len;
                frags.swap(i, j);
            }

            let mut buf = PreparedWriteBuffer::default();
            for (offset, bytes) in &frags {
                prop_assert_eq!(buf.accept_fragment(*offset as u16, bytes, true), GattStatus::Ok);
            }
            prop_assert_eq!(buf.commit(true), CommitOutcome::Committed(data));
            prop_assert!(!buf.is_pending());
        }

        #[test]
        fn prop_overflow_leaves_no_buffer(
            offset in 0u16..=PREPARE_BUF_MAX_SIZE as u16,
            extra in 1usize..64,
        ) {
            let mut buf = PreparedWriteBuffer::default();
            let len = PREPARE_BUF_MAX_SIZE - offset as usize + extra;
            prop_assert_eq!(
                buf.accept_fragment(offset, &vec![0xAA; len], true),
                GattStatus::InvalidAttributeValueLength
            );
            prop_assert!(!buf.is_pending());
            prop_assert_eq!(buf.commit(true), CommitOutcome::Empty);
        }
    }
}
