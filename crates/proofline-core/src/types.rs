//! Core checker types: matches, text ranges, geometry, and applied corrections.
//!
//! These types are platform-agnostic and shared by the mapper, the overlay
//! and the applicator.

use std::ops::Range;

use smol_str::SmolStr;

/// Issue category reported for a match.
///
/// Spelling and grammar issues get different marker styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Spelling,
    #[default]
    Grammar,
}

impl Category {
    /// CSS class applied to markers and panel entries of this category.
    pub fn css_class(self) -> &'static str {
        match self {
            Category::Spelling => "proofline-spelling",
            Category::Grammar => "proofline-grammar",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Spelling => "spelling",
            Category::Grammar => "grammar",
        }
    }
}

/// A span of text measured in UTF-16 code units.
///
/// `start..start + len`, end exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: usize,
    pub len: usize,
}

impl TextRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Exclusive end offset, saturating at `usize::MAX`.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.len)
    }

    /// Exclusive end offset, or None if it doesn't fit in a `usize`.
    pub fn checked_end(&self) -> Option<usize> {
        self.start.checked_add(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check whether two ranges share at least one code unit.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Convert to a `Range<usize>`.
    pub fn to_range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

impl From<Range<usize>> for TextRange {
    fn from(r: Range<usize>) -> Self {
        Self {
            start: r.start,
            len: r.end.saturating_sub(r.start),
        }
    }
}

/// A single flagged span of text with a diagnostic and candidate replacements.
///
/// `offset` and `length` are measured against the text snapshot taken when the
/// check was requested, never against the live text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub length: usize,
    pub message: String,
    /// Replacement candidates, best first.
    pub replacements: Vec<SmolStr>,
    pub category: Category,
}

impl Match {
    pub fn new(offset: usize, length: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            message: message.into(),
            replacements: Vec::new(),
            category: Category::default(),
        }
    }

    pub fn with_replacements<I, S>(mut self, replacements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.replacements = replacements.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// The match span in the original snapshot.
    pub fn range(&self) -> TextRange {
        TextRange::new(self.offset, self.length)
    }
}

/// A correction the user accepted.
///
/// Corrections are keyed by where they happened in the *original* text, so
/// that later offset adjustment does not depend on application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedCorrection {
    pub original_offset: usize,
    /// `replacement.len - match.length`, in UTF-16 code units.
    pub length_diff: isize,
}

/// Axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when either dimension collapsed to zero (element hidden or not laid out).
    pub fn is_collapsed(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check for a non-empty intersection.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Express this rect relative to `origin`'s top-left corner.
    pub fn relative_to(&self, origin: &Rect) -> Rect {
        Rect::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Internal scroll position of a scrollable element.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

impl ScrollOffset {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Shape of an editable host element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostKind {
    /// `<input>`: one line, never wraps.
    SingleLine,
    /// `<textarea>`: wraps according to its own white-space.
    MultiLine,
    /// contenteditable element.
    RichText,
}

impl HostKind {
    /// Whether the host exposes a `value`-style text property.
    pub fn is_plain_text(self) -> bool {
        !matches!(self, HostKind::RichText)
    }
}
