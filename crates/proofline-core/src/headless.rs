//! In-memory host, mirror and surface.
//!
//! These stand in for the DOM when running the checker natively: in unit
//! tests, and in tools that want to reason about marker placement without a
//! browser. `GridMirror` lays text out on a fixed character grid, which is
//! exactly what a monospace element with no kerning would do.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::mirror::{MirrorBackend, MirrorSegment, MirrorSpec, RangeRects};
use crate::overlay::{MarkerView, OverlaySurface, PanelEntry};
use crate::platform::{HostElement, PlatformError};
use crate::text::HostText;
use crate::types::{HostKind, Rect, ScrollOffset, TextRange};

/// An editable element backed by a rope.
#[derive(Debug)]
pub struct MemoryHost {
    kind: HostKind,
    text: HostText,
    attached: bool,
    flat: bool,
    rect: Rect,
    scroll: ScrollOffset,
    styles: BTreeMap<String, String>,
    input_events: Cell<usize>,
}

impl MemoryHost {
    fn new(kind: HostKind, text: &str, rect: Rect) -> Self {
        Self {
            kind,
            text: HostText::from_str(text),
            attached: true,
            flat: true,
            rect,
            scroll: ScrollOffset::default(),
            styles: BTreeMap::new(),
            input_events: Cell::new(0),
        }
    }

    /// A single-line `<input>`.
    pub fn input(text: &str) -> Self {
        Self::new(HostKind::SingleLine, text, Rect::new(10.0, 20.0, 400.0, 24.0))
    }

    /// A `<textarea>`.
    pub fn textarea(text: &str) -> Self {
        Self::new(HostKind::MultiLine, text, Rect::new(10.0, 20.0, 400.0, 160.0))
    }

    /// A contenteditable element. `flat` says whether its content is one text run.
    pub fn rich_text(text: &str, flat: bool) -> Self {
        let mut host = Self::new(HostKind::RichText, text, Rect::new(10.0, 20.0, 400.0, 160.0));
        host.flat = flat;
        host
    }

    pub fn value(&self) -> String {
        self.text.to_string()
    }

    /// Number of input notifications sent so far.
    pub fn input_events(&self) -> usize {
        self.input_events.get()
    }

    /// Remove the element from its (imaginary) document.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn set_scroll(&mut self, scroll: ScrollOffset) {
        self.scroll = scroll;
    }

    pub fn set_style(&mut self, name: &str, value: &str) {
        self.styles.insert(name.to_string(), value.to_string());
    }

    /// Overwrite the text the way a user typing would, without notifications.
    pub fn set_value(&mut self, text: &str) {
        self.text = HostText::from_str(text);
    }
}

impl HostElement for MemoryHost {
    fn kind(&self) -> HostKind {
        self.kind
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn text(&self) -> Option<String> {
        self.attached.then(|| self.text.to_string())
    }

    fn bounding_rect(&self) -> Rect {
        if self.attached {
            self.rect
        } else {
            Rect::default()
        }
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn style_property(&self, name: &str) -> Option<String> {
        self.styles.get(name).cloned()
    }

    fn is_flat_text(&self) -> bool {
        self.kind.is_plain_text() || self.flat
    }

    fn replace_range(&mut self, range: TextRange, replacement: &str) -> Result<(), PlatformError> {
        if self.text.replace(range, replacement) {
            Ok(())
        } else {
            Err(format!("invalid range {}..{}", range.start, range.end()).into())
        }
    }

    fn notify_input(&self) -> Result<(), PlatformError> {
        self.input_events.set(self.input_events.get() + 1);
        Ok(())
    }
}

/// Lays mirrors out on a fixed grid of `char_width` x `line_height` cells.
///
/// Honors padding and border width from the mirror style, wraps at the
/// content edge when the white-space mode wraps, breaks lines at `\n` and
/// replays the element's scroll.
#[derive(Clone, Copy, Debug)]
pub struct GridMirror {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for GridMirror {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 16.0,
        }
    }
}

struct GridCursor {
    line: usize,
    column: usize,
    columns: Option<usize>,
}

impl GridCursor {
    fn advance(&mut self) {
        self.column += 1;
        if self.columns.is_some_and(|max| self.column >= max) {
            self.newline();
        }
    }

    fn newline(&mut self) {
        self.line += 1;
        self.column = 0;
    }
}

impl<H: HostElement + ?Sized> MirrorBackend<H> for GridMirror {
    fn layout(&self, _host: &H, spec: &MirrorSpec<'_>) -> Result<RangeRects, PlatformError> {
        let style = spec.style;
        let border = style.px("border-width");
        let left = spec.frame.x + border + style.px("padding-left") - spec.scroll.left;
        let top = spec.frame.y + border + style.px("padding-top") - spec.scroll.top;
        let content_width = spec.frame.width
            - 2.0 * border
            - style.px("padding-left")
            - style.px("padding-right");
        let columns = style
            .wraps()
            .then(|| ((content_width / self.char_width).floor() as usize).max(1));

        let mut cursor = GridCursor {
            line: 0,
            column: 0,
            columns,
        };
        let mut rects = RangeRects::new();

        for segment in spec.plan.segments() {
            match segment {
                MirrorSegment::Text(text) => {
                    for c in text.chars() {
                        if c == '\n' {
                            cursor.newline();
                        } else {
                            cursor.advance();
                        }
                    }
                }
                MirrorSegment::Marker { index, text } => {
                    let mut fragments: Vec<Rect> = Vec::new();
                    let mut run: Option<(usize, usize, usize)> = None; // (line, start col, cells)
                    let flush = |run: &mut Option<(usize, usize, usize)>, fragments: &mut Vec<Rect>| {
                        if let Some((line, start, cells)) = run.take() {
                            if cells > 0 {
                                fragments.push(Rect::new(
                                    left + start as f64 * self.char_width,
                                    top + line as f64 * self.line_height,
                                    cells as f64 * self.char_width,
                                    self.line_height,
                                ));
                            }
                        }
                    };
                    for c in text.chars() {
                        if c == '\n' {
                            flush(&mut run, &mut fragments);
                            cursor.newline();
                            continue;
                        }
                        match &mut run {
                            Some((line, _, cells)) if *line == cursor.line => *cells += 1,
                            _ => {
                                flush(&mut run, &mut fragments);
                                run = Some((cursor.line, cursor.column, 1));
                            }
                        }
                        cursor.advance();
                    }
                    flush(&mut run, &mut fragments);
                    rects.insert(*index, fragments);
                }
            }
        }
        Ok(rects)
    }
}

#[derive(Debug, Default)]
struct Recorded {
    marker_nodes: usize,
    panel_entries: usize,
    listeners: usize,
    draws: usize,
    last_markers: Vec<MarkerView>,
    last_entries: Vec<PanelEntry>,
}

/// Listeners a drawn overlay keeps on the page (scroll, resize, input).
const PAGE_LISTENERS: usize = 3;

/// Surface that records what would have been drawn.
///
/// Clones share state, so a clone kept aside (`probe()`) still observes the
/// surface after it moved into an overlay.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    state: Rc<RefCell<Recorded>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle observing the same recording.
    pub fn probe(&self) -> RecordingSurface {
        self.clone()
    }

    /// Marker elements currently on the page.
    pub fn marker_nodes(&self) -> usize {
        self.state.borrow().marker_nodes
    }

    /// Side panel rows currently on the page.
    pub fn panel_entries(&self) -> usize {
        self.state.borrow().panel_entries
    }

    /// Event listeners currently registered.
    pub fn listeners(&self) -> usize {
        self.state.borrow().listeners
    }

    /// Total draw calls, including redraws.
    pub fn draws(&self) -> usize {
        self.state.borrow().draws
    }

    pub fn last_markers(&self) -> Vec<MarkerView> {
        self.state.borrow().last_markers.clone()
    }

    pub fn last_entries(&self) -> Vec<PanelEntry> {
        self.state.borrow().last_entries.clone()
    }
}

impl OverlaySurface for RecordingSurface {
    fn draw_markers(&mut self, _frame: Rect, markers: &[MarkerView]) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        state.marker_nodes = markers.len();
        state.panel_entries = 0;
        // Hover in and out per marker.
        state.listeners = PAGE_LISTENERS + 2 * markers.len();
        state.draws += 1;
        state.last_markers = markers.to_vec();
        Ok(())
    }

    fn draw_panel(&mut self, _anchor: Rect, entries: &[PanelEntry]) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        state.marker_nodes = 0;
        state.panel_entries = entries.len();
        let buttons: usize = entries.iter().map(|e| e.replacements.len()).sum();
        // Close button plus one click handler per replacement.
        state.listeners = PAGE_LISTENERS + 1 + buttons;
        state.draws += 1;
        state.last_entries = entries.to_vec();
        Ok(())
    }

    fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.marker_nodes = 0;
        state.panel_entries = 0;
        state.listeners = 0;
        state.last_markers.clear();
        state.last_entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::measure_ranges;
    use proptest::prelude::*;

    fn measure(host: &MemoryHost, ranges: &[TextRange]) -> RangeRects {
        let text = host.value();
        measure_ranges(&GridMirror::default(), host, &text, ranges)
            .unwrap()
            .rects()
    }

    #[test]
    fn test_input_single_line() {
        let host = MemoryHost::input("Helo wrold");
        let rects = measure(&host, &[TextRange::new(0, 4), TextRange::new(5, 5)]);
        assert_eq!(rects.get(0), Some(&[Rect::new(10.0, 20.0, 32.0, 16.0)][..]));
        assert_eq!(rects.get(1), Some(&[Rect::new(50.0, 20.0, 40.0, 16.0)][..]));
    }

    #[test]
    fn test_padding_and_scroll() {
        let mut host = MemoryHost::input("Helo wrold");
        host.set_style("padding-left", "4px");
        host.set_style("padding-top", "2px");
        host.set_scroll(ScrollOffset::new(0.0, 16.0));
        let rects = measure(&host, &[TextRange::new(5, 5)]);
        assert_eq!(rects.get(0), Some(&[Rect::new(38.0, 22.0, 40.0, 16.0)][..]));
    }

    #[test]
    fn test_textarea_wraps_across_lines() {
        let mut host = MemoryHost::textarea("abcdefghij");
        // Four columns wide.
        host.set_rect(Rect::new(0.0, 0.0, 32.0, 64.0));
        let rects = measure(&host, &[TextRange::new(2, 4)]);
        assert_eq!(
            rects.get(0),
            Some(
                &[
                    Rect::new(16.0, 0.0, 16.0, 16.0),
                    Rect::new(0.0, 16.0, 16.0, 16.0),
                ][..]
            )
        );
    }

    #[test]
    fn test_input_does_not_wrap() {
        let mut host = MemoryHost::input("abcdefghij");
        host.set_rect(Rect::new(0.0, 0.0, 32.0, 24.0));
        let rects = measure(&host, &[TextRange::new(2, 4)]);
        assert_eq!(rects.get(0), Some(&[Rect::new(16.0, 0.0, 32.0, 16.0)][..]));
    }

    #[test]
    fn test_newlines_start_lines() {
        let host = MemoryHost::textarea("one\ntwo");
        let rects = measure(&host, &[TextRange::new(4, 3)]);
        assert_eq!(rects.get(0), Some(&[Rect::new(10.0, 36.0, 24.0, 16.0)][..]));
    }

    #[test]
    fn test_memory_host_replace() {
        let mut host = MemoryHost::input("a😀b");
        host.replace_range(TextRange::new(1, 2), "x").unwrap();
        assert_eq!(host.value(), "axb");
        assert!(host.replace_range(TextRange::new(5, 1), "y").is_err());
    }

    #[test]
    fn test_surface_clear_removes_everything() {
        let mut surface = RecordingSurface::new();
        let probe = surface.probe();
        surface.draw_markers(Rect::default(), &[]).unwrap();
        assert_eq!(probe.listeners(), PAGE_LISTENERS);
        surface.clear();
        surface.clear();
        assert_eq!(probe.listeners(), 0);
        assert_eq!(probe.draws(), 1);
    }

    proptest! {
        /// Disjoint single-line ranges give disjoint markers whose widths
        /// add up to the covered characters.
        #[test]
        fn marker_widths_match_ranges(
            text in "[a-z ]{1,60}",
            cuts in proptest::collection::btree_set(0usize..60, 0..12),
        ) {
            let len = text.chars().count();
            let points: Vec<usize> = cuts.into_iter().filter(|c| *c <= len).collect();
            let ranges: Vec<TextRange> = points
                .chunks(2)
                .filter(|pair| pair.len() == 2)
                .map(|pair| TextRange::from(pair[0]..pair[1]))
                .collect();

            let mut host = MemoryHost::input(&text);
            host.set_rect(Rect::new(0.0, 0.0, 1000.0, 24.0));
            let rects = measure(&host, &ranges);
            let grid = GridMirror::default();

            let mut previous_right = f64::NEG_INFINITY;
            let mut total_width = 0.0;
            for (i, range) in ranges.iter().enumerate() {
                let fragments = rects.get(i).unwrap();
                let width: f64 = fragments.iter().map(|r| r.width).sum();
                prop_assert_eq!(width, range.len as f64 * grid.char_width);
                if let Some(first) = fragments.first() {
                    prop_assert!(first.x >= previous_right);
                }
                if let Some(last) = fragments.last() {
                    previous_right = last.right();
                }
                total_width += width;
            }
            let covered: usize = ranges.iter().map(|r| r.len).sum();
            prop_assert_eq!(total_width, covered as f64 * grid.char_width);
        }
    }
}
