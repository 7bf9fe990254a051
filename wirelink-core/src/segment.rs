//! Read segments generated from a logical transfer
//!
//! A logical read longer than the bus staging buffer is split into
//! segments. Segments are computed on the fly by [`SegmentPlan`] and
//! never stored.

use core::ops::Range;

/// A single bus-sized piece of a logical transfer
///
/// Every segment except the last keeps the bus open (`send_stop ==
/// false`) so the peer sees one continuous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    /// Byte offset into the caller's buffer
    pub offset: usize,
    /// Number of bytes in this segment
    pub len: usize,
    /// Whether the bus is released after this segment
    pub send_stop: bool,
}

impl Segment {
    /// Buffer range covered by this segment
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    /// Check whether this segment reaches the end of the transfer
    pub fn is_last(&self, total_len: usize) -> bool {
        self.offset + self.len >= total_len
    }
}

/// Iterator over the segments of a logical transfer
#[derive(Debug, Clone)]
pub struct SegmentPlan {
    total_len: usize,
    cap: usize,
    send_stop: bool,
    pos: usize,
}

impl SegmentPlan {
    /// Plan a transfer of `total_len` bytes with at most `cap` bytes per segment
    ///
    /// A `cap` of zero is treated as one so the plan always makes progress.
    pub fn new(total_len: usize, cap: usize, send_stop: bool) -> Self {
        Self {
            total_len,
            cap: cap.max(1),
            send_stop,
            pos: 0,
        }
    }

    /// Number of segments the plan produces in total
    pub fn segment_count(&self) -> usize {
        self.total_len.div_ceil(self.cap)
    }
}

impl Iterator for SegmentPlan {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.pos >= self.total_len {
            return None;
        }

        let len = (self.total_len - self.pos).min(self.cap);
        let offset = self.pos;
        self.pos += len;

        // Only the segment that completes the transfer may release the bus
        let send_stop = if self.pos < self.total_len {
            false
        } else {
            self.send_stop
        };

        Some(Segment {
            offset,
            len,
            send_stop,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total_len - self.pos.min(self.total_len)).div_ceil(self.cap);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SegmentPlan {}
