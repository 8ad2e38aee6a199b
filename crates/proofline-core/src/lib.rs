//! proofline-core: grammar overlay logic without browser dependencies.
//!
//! This crate provides:
//! - `OffsetTracker` - maps original match offsets onto the edited text
//! - `MirrorPlan` / `measure_ranges` - the mirror-based position mapper, generic over a `MirrorBackend`
//! - `Overlay<S>` - marker layout and lifecycle over an `OverlaySurface`
//! - `apply_correction` - writes a replacement back into a `HostElement`
//! - `Session<H>` / `Checker<H, B, S>` - the per-page session owning all of the above
//!
//! All offsets are UTF-16 code units, matching what grammar services and the
//! DOM text APIs report.

pub mod apply;
pub mod checker;
pub mod headless;
pub mod mirror;
pub mod offsets;
pub mod overlay;
pub mod platform;
pub mod session;
pub mod text;
pub mod types;

pub use apply::{ApplyError, apply_correction};
pub use checker::{CheckOutcome, Checker, EventOutcome, Phase, RenderError};
pub use mirror::{
    MIRRORED_PROPERTIES, MapError, Measurement, MirrorBackend, MirrorPlan, MirrorSegment,
    MirrorSpec, MirrorStyle, RangeRects, measure_ranges,
};
pub use headless::{GridMirror, MemoryHost, RecordingSurface};
pub use offsets::OffsetTracker;
pub use overlay::{
    DisposeReason, MarkerView, Overlay, OverlayEvent, OverlaySurface, PanelEntry, Presentation,
    RepositionOutcome, TOOLTIP_GAP, layout_markers, tooltip_origin,
};
pub use platform::{HostElement, PlatformError};
pub use session::{CheckCoordinator, Session, SessionToken};
pub use smol_str::SmolStr;
pub use text::{HostText, slice_utf16, utf16_len, utf16_to_byte};
pub use types::{AppliedCorrection, Category, HostKind, Match, Rect, ScrollOffset, TextRange};
