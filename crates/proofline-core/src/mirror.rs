//! Mirror-based position mapping.
//!
//! Text inputs don't expose the geometry of individual characters. To find
//! where a match renders, the checker builds an invisible replica ("mirror")
//! of the element that carries the same typography and box styles, splits the
//! text into plain runs and marker runs, lets the platform lay it out, and
//! reads back the rectangles of the marker runs.
//!
//! # How it works
//!
//! 1. `HostElement::mirror_style()` copies `MIRRORED_PROPERTIES` from the element
//! 2. `MirrorPlan::build()` splits the text at the (sorted, disjoint) ranges
//! 3. A `MirrorBackend` lays the mirror out at the element's viewport rect and
//!    returns the client rects of each marker, then discards the mirror
//!
//! `measure_ranges()` drives the three steps and short-circuits with
//! `Measurement::Detached` when the element left the document.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::platform::{HostElement, PlatformError};
use crate::text::{slice_utf16, utf16_len};
use crate::types::{HostKind, Rect, ScrollOffset, TextRange};

/// Computed-style properties copied onto the mirror.
///
/// Dropping any of these makes the mirror's line breaks or glyph advances
/// drift from the real element.
pub const MIRRORED_PROPERTIES: &[&str] = &[
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "letter-spacing",
    "line-height",
    "text-align",
    "text-transform",
    "text-indent",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "border-width",
    "box-sizing",
    "white-space",
    "word-wrap",
    "word-break",
    "overflow-wrap",
];

/// Errors from building or measuring a mirror.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("range {index} starts before the previous range")]
    Unsorted { index: usize },

    #[error("range {index} overlaps the previous range")]
    Overlapping { index: usize },

    #[error("range {index} ends at {end}, past the end of the text ({len})")]
    OutOfBounds { index: usize, end: usize, len: usize },

    #[error("range {index} splits a surrogate pair")]
    SplitCodePoint { index: usize },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// White-space mode for the mirror of a given host.
///
/// Inputs never wrap, so their mirror uses `pre`. Textareas and editable
/// elements keep their own value so wrapping matches.
pub fn white_space_for(kind: HostKind, element_value: Option<&str>) -> SmolStr {
    let element_value = element_value.filter(|v| !v.is_empty());
    match kind {
        HostKind::SingleLine => SmolStr::new_static("pre"),
        HostKind::MultiLine => SmolStr::new(element_value.unwrap_or("pre-wrap")),
        HostKind::RichText => SmolStr::new(element_value.unwrap_or("normal")),
    }
}

/// Style properties applied to the mirror element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MirrorStyle {
    properties: Vec<(&'static str, SmolStr)>,
}

impl MirrorStyle {
    /// Collect `MIRRORED_PROPERTIES` through `lookup`, applying the white-space rule.
    ///
    /// Properties the lookup can't provide are left out, so the mirror
    /// falls back to its inherited value for them.
    pub fn from_computed(kind: HostKind, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut properties = Vec::with_capacity(MIRRORED_PROPERTIES.len());
        for &name in MIRRORED_PROPERTIES {
            let value = lookup(name);
            if name == "white-space" {
                properties.push((name, white_space_for(kind, value.as_deref())));
                continue;
            }
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                properties.push((name, SmolStr::new(value)));
            }
        }
        Self { properties }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.properties.iter().map(|(n, v)| (*n, v.as_str()))
    }

    pub fn white_space(&self) -> &str {
        self.get("white-space").unwrap_or("pre")
    }

    /// Whether text in the mirror wraps at the content edge.
    pub fn wraps(&self) -> bool {
        !matches!(self.white_space(), "pre" | "nowrap")
    }

    /// Numeric value of a pixel property (`"12px"` → 12.0). Missing or non-pixel values are 0.
    pub fn px(&self, name: &str) -> f64 {
        self.get(name)
            .and_then(|v| v.trim().strip_suffix("px"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0.0)
    }
}

/// One run of mirror content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MirrorSegment {
    /// Plain text between markers.
    Text(String),
    /// The text of `ranges[index]`.
    Marker { index: usize, text: String },
}

/// Text split into plain and marker runs, ready to be laid out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorPlan {
    segments: Vec<MirrorSegment>,
    marker_count: usize,
}

impl MirrorPlan {
    /// Split `text` at `ranges`.
    ///
    /// Ranges must be sorted ascending by start and must not overlap;
    /// anything else is rejected rather than guessed at.
    pub fn build(text: &str, ranges: &[TextRange]) -> Result<Self, MapError> {
        let total = utf16_len(text);
        let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
        let mut cursor = 0;

        for (index, range) in ranges.iter().enumerate() {
            if range.start < cursor {
                let prev_start = index.checked_sub(1).map(|i| ranges[i].start);
                return Err(match prev_start {
                    Some(prev) if range.start < prev => MapError::Unsorted { index },
                    _ => MapError::Overlapping { index },
                });
            }
            if range.end() > total {
                return Err(MapError::OutOfBounds {
                    index,
                    end: range.end(),
                    len: total,
                });
            }

            let prefix = slice_utf16(text, TextRange::from(cursor..range.start))
                .ok_or(MapError::SplitCodePoint { index })?;
            if !prefix.is_empty() {
                segments.push(MirrorSegment::Text(prefix.to_string()));
            }
            let body = slice_utf16(text, *range).ok_or(MapError::SplitCodePoint { index })?;
            segments.push(MirrorSegment::Marker {
                index,
                text: body.to_string(),
            });
            cursor = range.end();
        }

        let tail = slice_utf16(text, TextRange::from(cursor..total)).unwrap_or_default();
        if !tail.is_empty() {
            segments.push(MirrorSegment::Text(tail.to_string()));
        }

        Ok(Self {
            segments,
            marker_count: ranges.len(),
        })
    }

    pub fn segments(&self) -> &[MirrorSegment] {
        &self.segments
    }

    pub fn marker_count(&self) -> usize {
        self.marker_count
    }
}

/// Everything a backend needs to lay out one mirror.
#[derive(Clone, Copy, Debug)]
pub struct MirrorSpec<'a> {
    pub style: &'a MirrorStyle,
    /// Where the live element sits in the viewport.
    pub frame: Rect,
    /// The live element's internal scroll, replayed on the mirror.
    pub scroll: ScrollOffset,
    pub plan: &'a MirrorPlan,
}

/// Measured rectangles per range index.
///
/// A range that wraps across lines has one rect per line fragment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeRects {
    rects: BTreeMap<usize, Vec<Rect>>,
}

impl RangeRects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, rects: Vec<Rect>) {
        self.rects.insert(index, rects);
    }

    pub fn get(&self, index: usize) -> Option<&[Rect]> {
        self.rects.get(&index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Rect])> {
        self.rects.iter().map(|(i, r)| (*i, r.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Smallest rect enclosing every fragment of a range.
    pub fn bounds(&self, index: usize) -> Option<Rect> {
        let rects = self.get(index)?;
        let first = rects.first()?;
        let (mut left, mut top, mut right, mut bottom) =
            (first.x, first.y, first.right(), first.bottom());
        for r in &rects[1..] {
            left = left.min(r.x);
            top = top.min(r.y);
            right = right.max(r.right());
            bottom = bottom.max(r.bottom());
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Result of a mapping pass.
#[derive(Clone, Debug, PartialEq)]
pub enum Measurement {
    Mapped(RangeRects),
    /// The element left the document; the caller should tear the session down.
    Detached,
}

impl Measurement {
    /// Rects of a successful pass; an empty mapping when detached.
    pub fn rects(&self) -> RangeRects {
        match self {
            Measurement::Mapped(rects) => rects.clone(),
            Measurement::Detached => RangeRects::default(),
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Measurement::Detached)
    }
}

/// Lays out a mirror and reads marker geometry.
///
/// The browser implementation builds a hidden DOM element; the headless one
/// uses a fixed character grid.
pub trait MirrorBackend<H: HostElement + ?Sized> {
    /// Lay out `spec` and return the viewport rects of every marker.
    ///
    /// Implementations must not retain anything after returning.
    fn layout(&self, host: &H, spec: &MirrorSpec<'_>) -> Result<RangeRects, PlatformError>;
}

/// Map `ranges` of `text` onto viewport rectangles over `host`.
pub fn measure_ranges<H, B>(
    backend: &B,
    host: &H,
    text: &str,
    ranges: &[TextRange],
) -> Result<Measurement, MapError>
where
    H: HostElement + ?Sized,
    B: MirrorBackend<H> + ?Sized,
{
    if !host.is_attached() {
        tracing::debug!(target: "proofline::mirror", "host detached, skipping measurement");
        return Ok(Measurement::Detached);
    }

    let plan = MirrorPlan::build(text, ranges)?;
    let style = host.mirror_style();
    let spec = MirrorSpec {
        style: &style,
        frame: host.bounding_rect(),
        scroll: host.scroll_offset(),
        plan: &plan,
    };
    let rects = backend.layout(host, &spec)?;

    tracing::trace!(
        target: "proofline::mirror",
        ranges = ranges.len(),
        measured = rects.len(),
        white_space = style.white_space(),
        "measured mirror"
    );

    Ok(Measurement::Mapped(rects))
}
