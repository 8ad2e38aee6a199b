//! Check sessions.
//!
//! A session is the lifetime of one set of displayed matches for one element:
//! the matches, the corrections applied so far, and the element itself. It is
//! an explicit value owned by the page's checker, never a global.

use std::time::Duration;

use web_time::Instant;

use crate::apply::{ApplyError, apply_correction};
use crate::mirror::{MapError, Measurement, MirrorBackend, RangeRects, measure_ranges};
use crate::offsets::OffsetTracker;
use crate::overlay::{MarkerView, PanelEntry, layout_markers};
use crate::platform::HostElement;
use crate::text::{slice_utf16, utf16_len};
use crate::types::{AppliedCorrection, Match, Rect, TextRange};

/// Identifies one check request and the session it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Hands out session tokens; only the latest one is current.
///
/// A response that arrives for a token that is no longer current belongs to a
/// superseded check and must be dropped.
#[derive(Debug, Default)]
pub struct CheckCoordinator {
    issued: u64,
    current: Option<SessionToken>,
}

impl CheckCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new check, invalidating any previous token.
    pub fn begin(&mut self) -> SessionToken {
        self.issued += 1;
        let token = SessionToken(self.issued);
        if let Some(prev) = self.current.replace(token) {
            tracing::trace!(target: "proofline::session", superseded = prev.get(), "token superseded");
        }
        token
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current == Some(token)
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.current
    }

    /// Invalidate the current token without issuing a new one.
    pub fn cancel(&mut self) {
        self.current = None;
    }
}

/// Sort matches by offset and drop the ones that can't be displayed.
///
/// Matches past the end of the snapshot, splitting a surrogate pair, or
/// overlapping an earlier kept match are dropped.
fn normalize_matches(snapshot: &str, mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by_key(|m| (m.offset, m.length));
    let total = utf16_len(snapshot);
    let mut kept: Vec<Match> = Vec::with_capacity(matches.len());
    for m in matches {
        let range = m.range();
        let in_bounds = range.checked_end().is_some_and(|end| end <= total);
        if !in_bounds || slice_utf16(snapshot, range).is_none() {
            tracing::debug!(
                target: "proofline::session",
                offset = m.offset,
                length = m.length,
                "dropping match outside the checked text"
            );
            continue;
        }
        if kept.last().is_some_and(|prev| prev.range().overlaps(&range)) {
            tracing::debug!(
                target: "proofline::session",
                offset = m.offset,
                length = m.length,
                "dropping overlapping match"
            );
            continue;
        }
        kept.push(m);
    }
    kept
}

/// One set of displayed matches over one element.
pub struct Session<H> {
    token: SessionToken,
    host: H,
    snapshot: String,
    matches: Vec<Match>,
    displayed: Vec<bool>,
    tracker: OffsetTracker,
    started: Instant,
}

impl<H: HostElement> Session<H> {
    /// Create a session for `matches` found in `snapshot`.
    ///
    /// Returns None when no displayable match remains.
    pub fn new(token: SessionToken, host: H, snapshot: String, matches: Vec<Match>) -> Option<Self> {
        let matches = normalize_matches(&snapshot, matches);
        if matches.is_empty() {
            return None;
        }
        let displayed = vec![true; matches.len()];
        Some(Self {
            token,
            host,
            snapshot,
            matches,
            displayed,
            tracker: OffsetTracker::new(),
            started: Instant::now(),
        })
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Text the matches were reported against.
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// All matches of the session, sorted by offset.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn tracker(&self) -> &OffsetTracker {
        &self.tracker
    }

    pub fn is_displayed(&self, index: usize) -> bool {
        self.displayed.get(index).copied().unwrap_or(false)
    }

    /// Number of matches still displayed.
    pub fn remaining(&self) -> usize {
        self.displayed.iter().filter(|d| **d).count()
    }

    /// Matches still displayed, with their index.
    pub fn displayed(&self) -> impl Iterator<Item = (usize, &Match)> {
        self.matches
            .iter()
            .enumerate()
            .filter(|(i, _)| self.displayed[*i])
    }

    /// Where a displayed match sits in the current text.
    pub fn adjusted_range(&self, index: usize) -> Option<TextRange> {
        if !self.is_displayed(index) {
            return None;
        }
        Some(self.tracker.adjusted_range(self.matches[index].range()))
    }

    /// Map every displayed match onto the viewport.
    ///
    /// Range `i` of the result belongs to the `i`-th item of `displayed()`.
    pub fn measure<B>(&self, backend: &B) -> Result<Measurement, MapError>
    where
        B: MirrorBackend<H> + ?Sized,
    {
        if !self.host.is_attached() {
            return Ok(Measurement::Detached);
        }
        let Some(text) = self.host.text() else {
            return Ok(Measurement::Detached);
        };
        let ranges: Vec<TextRange> = self
            .displayed()
            .map(|(_, m)| self.tracker.adjusted_range(m.range()))
            .collect();
        measure_ranges(backend, &self.host, &text, &ranges)
    }

    /// Marker views for the displayed matches from a measurement of this session.
    pub fn markers(&self, frame: Rect, rects: &RangeRects, max_replacements: usize) -> Vec<MarkerView> {
        let annotations: Vec<(usize, &Match)> = self.displayed().collect();
        layout_markers(frame, rects, &annotations, max_replacements)
    }

    /// Side panel rows for the displayed matches.
    pub fn panel_entries(&self, max_replacements: usize) -> Vec<PanelEntry> {
        let current = self.host.text();
        self.displayed()
            .map(|(index, m)| {
                let adjusted = self.tracker.adjusted_range(m.range());
                let excerpt = current
                    .as_deref()
                    .and_then(|t| slice_utf16(t, adjusted))
                    .or_else(|| slice_utf16(&self.snapshot, m.range()))
                    .unwrap_or_default()
                    .to_string();
                PanelEntry {
                    match_index: index,
                    category: m.category,
                    excerpt,
                    message: m.message.clone(),
                    replacements: m.replacements.iter().take(max_replacements).cloned().collect(),
                }
            })
            .collect()
    }

    /// Apply `replacement` to a displayed match and stop displaying it.
    pub fn apply(&mut self, index: usize, replacement: &str) -> Result<AppliedCorrection, ApplyError> {
        if !self.is_displayed(index) {
            return Err(ApplyError::UnknownMatch(index));
        }
        let m = &self.matches[index];
        let adjusted = self.tracker.adjusted_range(m.range());
        let correction =
            apply_correction(&mut self.host, &mut self.tracker, m, adjusted, replacement)?;
        self.displayed[index] = false;
        Ok(correction)
    }

    /// Time since the session was created.
    pub fn age(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GridMirror, MemoryHost};
    use crate::types::Category;

    fn token() -> SessionToken {
        CheckCoordinator::new().begin()
    }

    fn helo_wrold() -> Session<MemoryHost> {
        let host = MemoryHost::input("Helo wrold");
        let matches = vec![
            Match::new(5, 5, "typo").with_replacements(["world"]),
            Match::new(0, 4, "typo")
                .with_replacements(["Hello"])
                .with_category(Category::Spelling),
        ];
        Session::new(token(), host, "Helo wrold".into(), matches).unwrap()
    }

    #[test]
    fn test_coordinator_tokens() {
        let mut coordinator = CheckCoordinator::new();
        let first = coordinator.begin();
        assert!(coordinator.is_current(first));
        let second = coordinator.begin();
        assert!(!coordinator.is_current(first));
        assert!(coordinator.is_current(second));
        assert!(second > first);
        coordinator.cancel();
        assert!(!coordinator.is_current(second));
        assert_eq!(coordinator.current(), None);
    }

    #[test]
    fn test_matches_sorted() {
        let session = helo_wrold();
        let offsets: Vec<usize> = session.matches().iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 5]);
        assert_eq!(session.remaining(), 2);
    }

    #[test]
    fn test_overlapping_and_out_of_range_matches_dropped() {
        let matches = vec![
            Match::new(0, 6, "a"),
            Match::new(4, 3, "overlaps a"),
            Match::new(8, 10, "past the end"),
        ];
        let session =
            Session::new(token(), MemoryHost::input("abcdefghij"), "abcdefghij".into(), matches)
                .unwrap();
        assert_eq!(session.matches().len(), 1);
        assert_eq!(session.matches()[0].message, "a");
    }

    #[test]
    fn test_no_displayable_matches() {
        let matches = vec![Match::new(20, 2, "nowhere")];
        assert!(Session::new(token(), MemoryHost::input("short"), "short".into(), matches).is_none());
    }

    #[test]
    fn test_overflowing_match_dropped() {
        let matches = vec![
            Match::new(usize::MAX, 2, "bogus"),
            Match::new(2, usize::MAX, "bogus length"),
            Match::new(0, 4, "typo"),
        ];
        let session =
            Session::new(token(), MemoryHost::input("Helo"), "Helo".into(), matches).unwrap();
        assert_eq!(session.matches().len(), 1);
        assert_eq!(session.matches()[0].message, "typo");
    }

    #[test]
    fn test_apply_later_match_first() {
        let mut session = helo_wrold();
        session.apply(1, "world").unwrap();
        assert_eq!(session.host().value(), "Helo world");
        // The earlier match doesn't move.
        assert_eq!(session.adjusted_range(0), Some(TextRange::new(0, 4)));
        assert_eq!(session.adjusted_range(1), None);

        session.apply(0, "Hello").unwrap();
        assert_eq!(session.host().value(), "Hello world");
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn test_apply_earlier_match_first() {
        let mut session = helo_wrold();
        session.apply(0, "Hello").unwrap();
        assert_eq!(session.adjusted_range(1), Some(TextRange::new(6, 5)));
        session.apply(1, "world").unwrap();
        assert_eq!(session.host().value(), "Hello world");
        assert_eq!(session.tracker().len(), 2);
    }

    #[test]
    fn test_apply_twice_fails() {
        let mut session = helo_wrold();
        session.apply(0, "Hello").unwrap();
        let err = session.apply(0, "Hello").unwrap_err();
        assert!(matches!(err, ApplyError::UnknownMatch(0)));
        assert_eq!(session.host().value(), "Hello wrold");
    }

    #[test]
    fn test_panel_entries_follow_current_text() {
        let mut session = helo_wrold();
        session.apply(0, "Hello").unwrap();
        let entries = session.panel_entries(5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].match_index, 1);
        assert_eq!(entries[0].excerpt, "wrold");
        assert_eq!(entries[0].replacements, vec!["world"]);
    }

    #[test]
    fn test_measure_detached() {
        let mut session = helo_wrold();
        session.host.detach();
        let measurement = session.measure(&GridMirror::default()).unwrap();
        assert!(measurement.is_detached());
        assert!(measurement.rects().is_empty());
    }
}
