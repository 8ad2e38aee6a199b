//! Page-level checker: one session at a time.
//!
//! `Checker` owns the session coordinator, the active session and its
//! overlay, and drives them through the check lifecycle:
//!
//! ```text
//! Idle --begin_check--> Checking --complete_check--> Displayed
//!   ^                      |                            |
//!   +---- no matches ------+      correction applied ---+ (fewer matches)
//!   +---- text edited / closed / detached / resolved ---+
//! ```
//!
//! Network access and DOM drawing stay outside: the caller performs the
//! request and hands in the host and a fresh surface.

use crate::apply::ApplyError;
use crate::mirror::{MapError, Measurement, MirrorBackend, RangeRects};
use crate::overlay::{DisposeReason, Overlay, OverlayEvent, OverlaySurface, Presentation, RepositionOutcome};
use crate::platform::{HostElement, PlatformError};
use crate::session::{CheckCoordinator, Session, SessionToken};
use crate::types::{AppliedCorrection, Match};

/// Where the checker is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Checking(SessionToken),
    Displayed(SessionToken),
}

/// Result of handing a check response to the checker.
#[derive(Debug)]
pub enum CheckOutcome {
    /// The response belongs to a superseded check and was dropped.
    Stale,
    /// Nothing to display.
    NoMatches,
    /// The element disappeared while the request was in flight.
    Detached,
    Displayed { matches: usize },
}

/// Result of an overlay interaction.
#[derive(Debug)]
pub enum EventOutcome {
    Applied {
        correction: AppliedCorrection,
        remaining: usize,
    },
    ApplyFailed(ApplyError),
    Repositioned,
    Disposed(DisposeReason),
    Ignored,
}

/// Errors that prevent an overlay from being shown.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

struct Active<H, S: OverlaySurface> {
    session: Session<H>,
    overlay: Overlay<S>,
}

/// The per-page checker.
pub struct Checker<H, B, S: OverlaySurface> {
    backend: B,
    presentation: Presentation,
    max_replacements: usize,
    coordinator: CheckCoordinator,
    active: Option<Active<H, S>>,
}

impl<H, B, S> Checker<H, B, S>
where
    H: HostElement,
    B: MirrorBackend<H>,
    S: OverlaySurface,
{
    pub fn new(backend: B, presentation: Presentation, max_replacements: usize) -> Self {
        Self {
            backend,
            presentation,
            max_replacements,
            coordinator: CheckCoordinator::new(),
            active: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.active, self.coordinator.current()) {
            (Some(active), _) => Phase::Displayed(active.session.token()),
            (None, Some(token)) => Phase::Checking(token),
            (None, None) => Phase::Idle,
        }
    }

    pub fn has_session(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&Session<H>> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn overlay(&self) -> Option<&Overlay<S>> {
        self.active.as_ref().map(|a| &a.overlay)
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn set_presentation(&mut self, presentation: Presentation) {
        self.presentation = presentation;
    }

    /// Start a check: tear down whatever is displayed and issue a new token.
    pub fn begin_check(&mut self) -> SessionToken {
        self.dispose(DisposeReason::Superseded);
        let token = self.coordinator.begin();
        tracing::debug!(target: "proofline::checker", token = token.get(), "check started");
        token
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.coordinator.is_current(token)
    }

    /// The request for `token` failed. Returns whether it was still current.
    pub fn fail_check(&mut self, token: SessionToken) -> bool {
        if !self.coordinator.is_current(token) || self.active.is_some() {
            return false;
        }
        self.coordinator.cancel();
        true
    }

    /// Display the response for `token`.
    ///
    /// `surface` is only used (and then owned by the overlay) when matches
    /// are actually displayed.
    pub fn complete_check(
        &mut self,
        token: SessionToken,
        host: H,
        snapshot: String,
        matches: Vec<Match>,
        surface: S,
    ) -> Result<CheckOutcome, RenderError> {
        if !self.coordinator.is_current(token) || self.active.is_some() {
            tracing::debug!(target: "proofline::checker", token = token.get(), "dropping stale response");
            return Ok(CheckOutcome::Stale);
        }

        // Offsets are only meaningful against the text that was sent.
        if host.is_attached() && host.text().as_deref() != Some(snapshot.as_str()) {
            tracing::debug!(
                target: "proofline::checker",
                token = token.get(),
                "text edited while the check was in flight"
            );
            self.coordinator.cancel();
            return Ok(CheckOutcome::Stale);
        }

        let reported = matches.len();
        let Some(session) = Session::new(token, host, snapshot, matches) else {
            self.coordinator.cancel();
            return Ok(CheckOutcome::NoMatches);
        };

        let frame = session.host().bounding_rect();
        let markers = match self.presentation {
            Presentation::InlineMarkers => {
                let measurement = match session.measure(&self.backend) {
                    Ok(m) => m,
                    Err(e) => {
                        self.coordinator.cancel();
                        return Err(e.into());
                    }
                };
                match measurement {
                    Measurement::Detached => {
                        self.coordinator.cancel();
                        return Ok(CheckOutcome::Detached);
                    }
                    Measurement::Mapped(rects) => {
                        session.markers(frame, &rects, self.max_replacements)
                    }
                }
            }
            Presentation::SidePanel => Vec::new(),
        };
        let entries = match self.presentation {
            Presentation::SidePanel => session.panel_entries(self.max_replacements),
            Presentation::InlineMarkers => Vec::new(),
        };

        let overlay = match Overlay::render(surface, self.presentation, frame, &markers, &entries) {
            Ok(overlay) => overlay,
            Err(e) => {
                self.coordinator.cancel();
                return Err(e.into());
            }
        };

        let displayed = session.remaining();
        tracing::info!(
            target: "proofline::checker",
            token = token.get(),
            reported,
            displayed,
            "displaying matches"
        );
        self.active = Some(Active { session, overlay });
        Ok(CheckOutcome::Displayed { matches: displayed })
    }

    /// React to an overlay interaction.
    pub fn handle_event(&mut self, event: OverlayEvent) -> EventOutcome {
        match event {
            OverlayEvent::Apply {
                match_index,
                replacement,
            } => self.apply(match_index, &replacement),
            OverlayEvent::Reposition => self.reposition(),
            OverlayEvent::TextEdited => self.dispose_outcome(DisposeReason::TextEdited),
            OverlayEvent::Close => self.dispose_outcome(DisposeReason::Closed),
        }
    }

    /// Apply a replacement to a displayed match, then redraw what's left.
    pub fn apply(&mut self, match_index: usize, replacement: &str) -> EventOutcome {
        let Some(active) = self.active.as_mut() else {
            return EventOutcome::Ignored;
        };

        let correction = match active.session.apply(match_index, replacement) {
            Ok(c) => c,
            Err(ApplyError::Detached) => {
                return self.dispose_outcome(DisposeReason::Detached);
            }
            Err(e) => {
                tracing::warn!(target: "proofline::checker", match_index, error = %e, "correction failed");
                return EventOutcome::ApplyFailed(e);
            }
        };

        let remaining = active.session.remaining();
        if remaining == 0 {
            self.dispose(DisposeReason::Resolved);
            return EventOutcome::Applied {
                correction,
                remaining,
            };
        }

        if let Some(reason) = self.redraw() {
            return EventOutcome::Disposed(reason);
        }
        EventOutcome::Applied {
            correction,
            remaining,
        }
    }

    /// Re-measure and redraw after the viewport or element layout changed.
    pub fn reposition(&mut self) -> EventOutcome {
        let Some(Active { session, overlay }) = self.active.as_mut() else {
            return EventOutcome::Ignored;
        };

        let measurement = match self.presentation {
            Presentation::InlineMarkers => match session.measure(&self.backend) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(target: "proofline::checker", error = %e, "reposition measurement failed");
                    return EventOutcome::Ignored;
                }
            },
            Presentation::SidePanel if session.host().is_attached() => {
                Measurement::Mapped(RangeRects::new())
            }
            Presentation::SidePanel => Measurement::Detached,
        };

        let frame = session.host().bounding_rect();
        let max = self.max_replacements;
        let outcome = overlay.reposition(frame, &measurement, |frame, rects| {
            session.markers(frame, rects, max)
        });

        match outcome {
            RepositionOutcome::Disposed(reason) => {
                self.dispose(reason);
                EventOutcome::Disposed(reason)
            }
            RepositionOutcome::Updated => EventOutcome::Repositioned,
            RepositionOutcome::Unchanged => EventOutcome::Ignored,
        }
    }

    /// Redraw the overlay for the current set of displayed matches.
    ///
    /// Returns the dispose reason if the session had to end instead.
    fn redraw(&mut self) -> Option<DisposeReason> {
        let Active { session, overlay } = self.active.as_mut()?;
        let frame = session.host().bounding_rect();

        let drawn = match self.presentation {
            Presentation::InlineMarkers => match session.measure(&self.backend) {
                Ok(Measurement::Mapped(rects)) => {
                    let markers = session.markers(frame, &rects, self.max_replacements);
                    overlay.refresh(frame, &markers, &[])
                }
                Ok(Measurement::Detached) => {
                    self.dispose(DisposeReason::Detached);
                    return Some(DisposeReason::Detached);
                }
                Err(e) => Err(PlatformError(e.to_string())),
            },
            Presentation::SidePanel => {
                let entries = session.panel_entries(self.max_replacements);
                overlay.refresh(frame, &[], &entries)
            }
        };
        if let Err(e) = drawn {
            tracing::warn!(target: "proofline::checker", error = %e, "redraw after correction failed");
        }
        None
    }

    /// Dispose the active session and overlay. Returns false if there was none.
    pub fn dispose(&mut self, reason: DisposeReason) -> bool {
        let Some(mut active) = self.active.take() else {
            if reason != DisposeReason::Superseded {
                self.coordinator.cancel();
            }
            return false;
        };
        active.overlay.dispose(reason);
        self.coordinator.cancel();
        tracing::debug!(
            target: "proofline::checker",
            token = active.session.token().get(),
            ?reason,
            corrections = active.session.tracker().len(),
            age_ms = active.session.age().as_millis() as u64,
            "session ended"
        );
        true
    }

    fn dispose_outcome(&mut self, reason: DisposeReason) -> EventOutcome {
        if self.dispose(reason) {
            EventOutcome::Disposed(reason)
        } else {
            EventOutcome::Ignored
        }
    }
}
