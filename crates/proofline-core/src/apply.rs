//! Writing accepted corrections back into the host element.

use crate::offsets::OffsetTracker;
use crate::platform::{HostElement, PlatformError};
use crate::text::utf16_len;
use crate::types::{AppliedCorrection, HostKind, Match, TextRange};

/// Why a correction could not be applied.
///
/// The element is left untouched in every case.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("element is no longer in the document")]
    Detached,

    #[error("cannot apply a correction to an empty range")]
    EmptyRange,

    #[error("cannot auto-fix rich content")]
    RichContent,

    #[error("range {start}..{end} is outside the current text ({len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("no displayed match with index {0}")]
    UnknownMatch(usize),

    #[error("element text could not be read")]
    Unreadable,

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Replace `adjusted` in `host` with `replacement` and record the length change.
///
/// `adjusted` is the match range shifted onto the current text (see
/// `OffsetTracker::adjusted_range`). On success the correction is recorded in
/// `tracker` against `m.offset`, so later adjustments stay keyed to the
/// original snapshot.
pub fn apply_correction<H: HostElement + ?Sized>(
    host: &mut H,
    tracker: &mut OffsetTracker,
    m: &Match,
    adjusted: TextRange,
    replacement: &str,
) -> Result<AppliedCorrection, ApplyError> {
    if !host.is_attached() {
        return Err(ApplyError::Detached);
    }
    if adjusted.is_empty() {
        return Err(ApplyError::EmptyRange);
    }
    if host.kind() == HostKind::RichText && !host.is_flat_text() {
        return Err(ApplyError::RichContent);
    }

    let current = host.text().ok_or(ApplyError::Unreadable)?;
    let len = utf16_len(&current);
    if adjusted.end() > len {
        return Err(ApplyError::OutOfBounds {
            start: adjusted.start,
            end: adjusted.end(),
            len,
        });
    }

    host.replace_range(adjusted, replacement)?;
    if let Err(e) = host.notify_input() {
        // The text already changed; listeners missing the event isn't worth failing over.
        tracing::warn!(target: "proofline::apply", error = %e, "input notification failed");
    }

    let length_diff = utf16_len(replacement) as isize - m.length as isize;
    let correction = tracker.record_correction(m.offset, length_diff);

    tracing::debug!(
        target: "proofline::apply",
        original_offset = m.offset,
        adjusted_start = adjusted.start,
        length_diff,
        "applied correction"
    );

    Ok(correction)
}
