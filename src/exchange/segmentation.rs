//! Segment acknowledgment bookkeeping for one outbound transaction.

use bytes::Bytes;
use tracing::{debug, trace};

use super::transport::{BlockAck, OutboundMessage};

/// Tracks which segments of a sent message the peer has acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedTransfer {
    seq_zero: u16,
    segments: Vec<Bytes>,
    acknowledged: u32,
    resends: u32,
}

impl SegmentedTransfer {
    /// Start tracking a freshly created message.
    #[must_use]
    pub fn new(message: OutboundMessage) -> Self {
        let (seq_zero, segments) = message.into_parts();
        Self {
            seq_zero,
            segments,
            acknowledged: 0,
            resends: 0,
        }
    }

    /// Whether the message needed more than one segment.
    #[must_use]
    pub fn is_segmented(&self) -> bool {
        self.segments.len() > 1
    }

    /// SeqZero identifying this transaction in block acks.
    #[must_use]
    pub const fn seq_zero(&self) -> u16 {
        self.seq_zero
    }

    /// All PDUs in send order.
    #[must_use]
    pub fn segments(&self) -> &[Bytes] {
        &self.segments
    }

    /// Number of resend rounds performed so far.
    #[must_use]
    pub const fn resends(&self) -> u32 {
        self.resends
    }

    fn full_mask(&self) -> u32 {
        match self.segments.len() {
            n if n >= 32 => u32::MAX,
            n => (1u32 << n) - 1,
        }
    }

    /// Fold a block ack in; returns true when segments are still missing.
    ///
    /// An ack for another SeqZero leaves the bitmap untouched and returns
    /// false. That does not mean the transfer is done; check
    /// [`SegmentedTransfer::is_complete`] for that.
    pub fn apply_block_ack(&mut self, ack: &BlockAck) -> bool {
        if ack.seq_zero != self.seq_zero {
            trace!(
                expected = self.seq_zero,
                found = ack.seq_zero,
                "block ack for another transaction"
            );
            return false;
        }
        self.acknowledged |= ack.block_ack & self.full_mask();
        let missing = self.missing_count();
        debug!(
            seq_zero = self.seq_zero,
            block_ack = ack.block_ack,
            missing,
            "segment acknowledgment processed"
        );
        missing > 0
    }

    /// Whether every segment has been acknowledged.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.acknowledged == self.full_mask()
    }

    fn missing_count(&self) -> u32 {
        (self.full_mask() & !self.acknowledged).count_ones()
    }

    /// Segments not yet acknowledged, with their SegO.
    pub fn missing(&self) -> impl Iterator<Item = (usize, &Bytes)> {
        let acknowledged = self.acknowledged;
        self.segments
            .iter()
            .enumerate()
            .filter(move |(seg_o, _)| acknowledged & (1u32 << *seg_o) == 0)
    }

    /// Record that a resend round went out.
    pub fn mark_resent(&mut self) {
        self.resends = self.resends.saturating_add(1);
    }
}
