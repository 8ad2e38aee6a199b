//! Offset tracking across applied corrections.
//!
//! Matches keep the offsets they were reported with. Each accepted correction
//! is remembered by its original position and length delta, and a match's
//! current offset is derived on demand by summing the deltas of every
//! correction that happened strictly before it in the original text.

use crate::types::{AppliedCorrection, TextRange};

/// Append-only record of applied corrections.
#[derive(Clone, Debug, Default)]
pub struct OffsetTracker {
    corrections: Vec<AppliedCorrection>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a correction at `original_offset` that changed the text length by `length_diff`.
    ///
    /// Overlap with earlier corrections is not checked.
    pub fn record_correction(
        &mut self,
        original_offset: usize,
        length_diff: isize,
    ) -> AppliedCorrection {
        let correction = AppliedCorrection {
            original_offset,
            length_diff,
        };
        tracing::trace!(
            target: "proofline::offsets",
            original_offset,
            length_diff,
            total = self.corrections.len() + 1,
            "recorded correction"
        );
        self.corrections.push(correction);
        correction
    }

    /// Map an offset in the original snapshot onto the current text.
    ///
    /// Only corrections with `original_offset < offset` shift the result, so
    /// the answer is the same whatever order unrelated corrections were
    /// applied in.
    pub fn adjusted_offset(&self, original_offset: usize) -> usize {
        let shift: isize = self
            .corrections
            .iter()
            .filter(|c| c.original_offset < original_offset)
            .map(|c| c.length_diff)
            .sum();
        original_offset.saturating_add_signed(shift)
    }

    /// Shift a whole range; its length is unchanged.
    pub fn adjusted_range(&self, range: TextRange) -> TextRange {
        TextRange::new(self.adjusted_offset(range.start), range.len)
    }

    /// Corrections in application order.
    pub fn corrections(&self) -> &[AppliedCorrection] {
        &self.corrections
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    /// Forget every correction. Called when a session ends.
    pub fn reset(&mut self) {
        self.corrections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_corrections_is_identity() {
        let tracker = OffsetTracker::new();
        assert_eq!(tracker.adjusted_offset(0), 0);
        assert_eq!(tracker.adjusted_offset(42), 42);
    }

    #[test]
    fn test_single_growth() {
        // "Helo world" -> "Hello world"
        let mut tracker = OffsetTracker::new();
        tracker.record_correction(0, 1);
        assert_eq!(
            tracker.corrections(),
            &[AppliedCorrection {
                original_offset: 0,
                length_diff: 1
            }]
        );
        // A correction at the same offset doesn't shift it.
        assert_eq!(tracker.adjusted_offset(0), 0);
        assert_eq!(tracker.adjusted_offset(5), 6);
    }

    #[test]
    fn test_later_correction_does_not_shift_earlier_match() {
        // "Helo wrold": fix "wrold" (offset 5) first.
        let mut tracker = OffsetTracker::new();
        tracker.record_correction(5, 0);
        assert_eq!(tracker.adjusted_offset(0), 0);

        tracker.record_correction(5, 3);
        assert_eq!(tracker.adjusted_offset(0), 0);
        assert_eq!(tracker.adjusted_offset(5), 5);
        assert_eq!(tracker.adjusted_offset(11), 14);
    }

    #[test]
    fn test_shrinking_corrections() {
        let mut tracker = OffsetTracker::new();
        tracker.record_correction(2, -2);
        tracker.record_correction(10, -1);
        assert_eq!(tracker.adjusted_offset(8), 6);
        assert_eq!(tracker.adjusted_offset(20), 17);
        assert_eq!(
            tracker.adjusted_range(TextRange::new(20, 3)),
            TextRange::new(17, 3)
        );
    }

    #[test]
    fn test_corrections_keep_application_order() {
        let mut tracker = OffsetTracker::new();
        tracker.record_correction(12, 0);
        tracker.record_correction(0, 1);
        tracker.record_correction(5, -2);
        insta::assert_debug_snapshot!(tracker.corrections(), @r"
        [
            AppliedCorrection {
                original_offset: 12,
                length_diff: 0,
            },
            AppliedCorrection {
                original_offset: 0,
                length_diff: 1,
            },
            AppliedCorrection {
                original_offset: 5,
                length_diff: -2,
            },
        ]
        ");
    }

    #[test]
    fn test_reset() {
        let mut tracker = OffsetTracker::new();
        tracker.record_correction(0, 4);
        assert_eq!(tracker.len(), 1);
        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.adjusted_offset(10), 10);
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            a in (0usize..100, -5isize..5),
            b in (0usize..100, -5isize..5),
            target in 0usize..120,
        ) {
            let mut ab = OffsetTracker::new();
            ab.record_correction(a.0, a.1);
            ab.record_correction(b.0, b.1);

            let mut ba = OffsetTracker::new();
            ba.record_correction(b.0, b.1);
            ba.record_correction(a.0, a.1);

            prop_assert_eq!(ab.adjusted_offset(target), ba.adjusted_offset(target));
        }

        #[test]
        fn prop_only_prior_corrections_count(
            offsets in proptest::collection::vec((0usize..200, -3isize..6), 0..12),
            target in 0usize..200,
        ) {
            let mut tracker = OffsetTracker::new();
            for (offset, diff) in &offsets {
                tracker.record_correction(*offset, *diff);
            }
            let expected: isize = offsets
                .iter()
                .filter(|(o, _)| *o < target)
                .map(|(_, d)| *d)
                .sum();
            prop_assert_eq!(
                tracker.adjusted_offset(target),
                target.saturating_add_signed(expected)
            );
        }
    }
}
