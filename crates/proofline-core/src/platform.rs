//! Platform abstraction for the element being checked.
//!
//! The checker never talks to the DOM directly. Anything it needs from the
//! focused element (text, geometry, style, mutation) goes through
//! `HostElement`, so the same logic runs against browser elements and the
//! in-memory hosts used in tests.

use crate::mirror::MirrorStyle;
use crate::types::{HostKind, Rect, ScrollOffset, TextRange};

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// An editable element that can be checked and corrected.
///
/// Implementations cover `value`-style elements (inputs, textareas) and
/// contenteditable elements.
pub trait HostElement {
    /// Shape of the element; decides mirror white-space and mutation strategy.
    fn kind(&self) -> HostKind;

    /// Whether the element is still part of the document.
    fn is_attached(&self) -> bool;

    /// Current text content, or None if it can't be read.
    fn text(&self) -> Option<String>;

    /// Border-box rectangle in viewport coordinates.
    fn bounding_rect(&self) -> Rect;

    /// Internal scroll position of the element's content.
    fn scroll_offset(&self) -> ScrollOffset {
        ScrollOffset::default()
    }

    /// Read one computed style property, e.g. `font-size`.
    fn style_property(&self, name: &str) -> Option<String>;

    /// Style the measurement mirror must carry to lay out like this element.
    fn mirror_style(&self) -> MirrorStyle {
        MirrorStyle::from_computed(self.kind(), |name| self.style_property(name))
    }

    /// For rich text: whether the content is a single flat text run.
    ///
    /// Plain-text hosts are always flat.
    fn is_flat_text(&self) -> bool;

    /// Replace `range` (UTF-16, current text) with `replacement`.
    fn replace_range(&mut self, range: TextRange, replacement: &str) -> Result<(), PlatformError>;

    /// Tell listeners on the element that its value changed.
    fn notify_input(&self) -> Result<(), PlatformError>;
}
