//! Overlay model: marker layout and overlay lifecycle.
//!
//! The overlay draws one affordance per displayed match, either as inline
//! markers laid over the element or as entries of a side panel. Drawing is
//! delegated to an `OverlaySurface`; this module decides what to draw, when to
//! redraw, and when the overlay has to go away.

use smol_str::SmolStr;

use crate::mirror::{Measurement, RangeRects};
use crate::platform::PlatformError;
use crate::types::{Category, Match, Rect};

/// Vertical gap between a marker and its tooltip, in pixels.
pub const TOOLTIP_GAP: f64 = 5.0;

/// How matches are presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Presentation {
    /// Markers positioned over the element, with a hover tooltip.
    #[default]
    InlineMarkers,
    /// A list of all matches next to the element. Needs no geometry.
    SidePanel,
}

/// A marker ready to be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerView {
    pub match_index: usize,
    pub category: Category,
    /// Fragments relative to the overlay frame's top-left corner.
    pub rects: Vec<Rect>,
    pub message: String,
    pub replacements: Vec<SmolStr>,
}

/// A side panel row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelEntry {
    pub match_index: usize,
    pub category: Category,
    /// The flagged text as it currently reads.
    pub excerpt: String,
    pub message: String,
    pub replacements: Vec<SmolStr>,
}

/// Why an overlay went away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisposeReason {
    /// The element left the document.
    Detached,
    /// The element collapsed to zero width or height.
    Hidden,
    /// The user edited the text directly.
    TextEdited,
    /// The user closed the overlay.
    Closed,
    /// A new check started.
    Superseded,
    /// Every match was corrected.
    Resolved,
}

/// Interaction reported by a surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayEvent {
    /// A replacement button was clicked.
    Apply {
        match_index: usize,
        replacement: SmolStr,
    },
    /// The viewport or the element's layout changed.
    Reposition,
    /// The element's text changed under the overlay.
    TextEdited,
    /// The overlay's close control was used.
    Close,
}

/// Something that can display markers or a panel.
pub trait OverlaySurface {
    /// Replace any drawn markers with `markers` inside `frame` (viewport coordinates).
    fn draw_markers(&mut self, frame: Rect, markers: &[MarkerView]) -> Result<(), PlatformError>;

    /// Replace the panel contents with `entries`, anchored next to `anchor`.
    fn draw_panel(&mut self, anchor: Rect, entries: &[PanelEntry]) -> Result<(), PlatformError>;

    /// Remove every node and listener this surface created.
    ///
    /// Must be safe to call more than once.
    fn clear(&mut self);
}

/// Turn measured viewport rects into frame-relative marker views.
///
/// `annotations[i]` is the `(match_index, match)` measured as range `i`.
/// Fragments outside the frame (scrolled out of an element) are dropped, and
/// markers with no visible fragment are skipped.
pub fn layout_markers(
    frame: Rect,
    rects: &RangeRects,
    annotations: &[(usize, &Match)],
    max_replacements: usize,
) -> Vec<MarkerView> {
    let mut markers = Vec::with_capacity(annotations.len());
    for (range_index, (match_index, m)) in annotations.iter().enumerate() {
        let Some(fragments) = rects.get(range_index) else {
            continue;
        };
        let visible: Vec<Rect> = fragments
            .iter()
            .filter(|r| r.intersects(&frame))
            .map(|r| r.relative_to(&frame))
            .collect();
        if visible.is_empty() {
            continue;
        }
        markers.push(MarkerView {
            match_index: *match_index,
            category: m.category,
            rects: visible,
            message: m.message.clone(),
            replacements: m.replacements.iter().take(max_replacements).cloned().collect(),
        });
    }
    markers
}

/// Viewport position of the tooltip for a marker at `marker` (viewport rect).
pub fn tooltip_origin(marker: Rect) -> (f64, f64) {
    (marker.x, marker.bottom() + TOOLTIP_GAP)
}

/// What a reposition pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepositionOutcome {
    Updated,
    /// Nothing to redraw (already disposed, or a panel that doesn't track geometry).
    Unchanged,
    Disposed(DisposeReason),
}

/// A rendered overlay over one element.
///
/// Owns its surface; dropping an undisposed overlay clears the surface.
pub struct Overlay<S: OverlaySurface> {
    surface: S,
    presentation: Presentation,
    frame: Rect,
    disposed: Option<DisposeReason>,
}

impl<S: OverlaySurface> Overlay<S> {
    /// Draw the first frame of an overlay.
    pub fn render(
        mut surface: S,
        presentation: Presentation,
        frame: Rect,
        markers: &[MarkerView],
        entries: &[PanelEntry],
    ) -> Result<Self, PlatformError> {
        let drawn = match presentation {
            Presentation::InlineMarkers => surface.draw_markers(frame, markers),
            Presentation::SidePanel => surface.draw_panel(frame, entries),
        };
        if let Err(e) = drawn {
            surface.clear();
            return Err(e);
        }
        tracing::debug!(
            target: "proofline::overlay",
            ?presentation,
            markers = markers.len(),
            entries = entries.len(),
            "overlay rendered"
        );
        Ok(Self {
            surface,
            presentation,
            frame,
            disposed: None,
        })
    }

    /// Follow the element after a scroll, resize or layout change.
    ///
    /// `build` turns the fresh rects into marker views; it's only called when
    /// markers actually need redrawing.
    pub fn reposition(
        &mut self,
        frame: Rect,
        measurement: &Measurement,
        build: impl FnOnce(Rect, &RangeRects) -> Vec<MarkerView>,
    ) -> RepositionOutcome {
        if self.is_disposed() {
            return RepositionOutcome::Unchanged;
        }
        let rects = match measurement {
            Measurement::Detached => {
                self.dispose(DisposeReason::Detached);
                return RepositionOutcome::Disposed(DisposeReason::Detached);
            }
            Measurement::Mapped(rects) => rects,
        };
        if frame.is_collapsed() {
            self.dispose(DisposeReason::Hidden);
            return RepositionOutcome::Disposed(DisposeReason::Hidden);
        }
        self.frame = frame;
        if self.presentation == Presentation::SidePanel {
            return RepositionOutcome::Unchanged;
        }

        let markers = build(frame, rects);
        if let Err(e) = self.surface.draw_markers(frame, &markers) {
            tracing::warn!(target: "proofline::overlay", error = %e, "redraw failed");
        }
        RepositionOutcome::Updated
    }

    /// Redraw after the set of displayed matches changed.
    pub fn refresh(
        &mut self,
        frame: Rect,
        markers: &[MarkerView],
        entries: &[PanelEntry],
    ) -> Result<(), PlatformError> {
        if self.is_disposed() {
            return Ok(());
        }
        self.frame = frame;
        match self.presentation {
            Presentation::InlineMarkers => self.surface.draw_markers(frame, markers),
            Presentation::SidePanel => self.surface.draw_panel(frame, entries),
        }
    }

    /// Tear the overlay down. Returns false if it was already disposed.
    pub fn dispose(&mut self, reason: DisposeReason) -> bool {
        if self.disposed.is_some() {
            return false;
        }
        self.surface.clear();
        self.disposed = Some(reason);
        tracing::debug!(target: "proofline::overlay", ?reason, "overlay disposed");
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_some()
    }

    pub fn dispose_reason(&self) -> Option<DisposeReason> {
        self.disposed
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Last frame the overlay was drawn in.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: OverlaySurface> Drop for Overlay<S> {
    fn drop(&mut self) {
        if self.disposed.is_none() {
            self.surface.clear();
        }
    }
}
