//! DOM measurement mirror.
//!
//! Builds a hidden replica of the host element at the host's viewport
//! position, fills it with plain text nodes and one `<span>` per range, reads
//! back each span's client rects, and removes the replica again.

use proofline_core::{
    HostElement, MirrorBackend, MirrorSegment, MirrorSpec, PlatformError, RangeRects, Rect,
};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

pub const MIRROR_CLASS: &str = "proofline-mirror";

/// Removes the mirror from the document when dropped, on every exit path.
struct MirrorGuard(HtmlElement);

impl Drop for MirrorGuard {
    fn drop(&mut self) {
        self.0.remove();
    }
}

/// `MirrorBackend` over the live DOM.
#[derive(Clone, Debug, Default)]
pub struct BrowserMirror;

impl BrowserMirror {
    pub fn new() -> Self {
        Self
    }

    fn create(document: &Document, tag: &str) -> Result<HtmlElement, PlatformError> {
        document
            .create_element(tag)
            .map_err(|e| PlatformError(format!("create_element({tag}) failed: {e:?}")))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| PlatformError::from("created element is not an HtmlElement"))
    }

    fn set(style: &web_sys::CssStyleDeclaration, name: &str, value: &str) -> Result<(), PlatformError> {
        style
            .set_property(name, value)
            .map_err(|e| PlatformError(format!("set_property({name}) failed: {e:?}")))
    }
}

impl<H: HostElement + ?Sized> MirrorBackend<H> for BrowserMirror {
    fn layout(&self, _host: &H, spec: &MirrorSpec<'_>) -> Result<RangeRects, PlatformError> {
        let document = gloo_utils::document();
        let body = document.body().ok_or("no body")?;

        let mirror = Self::create(&document, "div")?;
        mirror.set_class_name(MIRROR_CLASS);
        mirror.set_attribute("aria-hidden", "true").ok();

        let style = mirror.style();
        for (name, value) in spec.style.iter() {
            Self::set(&style, name, value)?;
        }
        let frame = spec.frame;
        for (name, value) in [
            ("position", "fixed".to_string()),
            ("top", format!("{}px", frame.y)),
            ("left", format!("{}px", frame.x)),
            ("width", format!("{}px", frame.width)),
            ("height", format!("{}px", frame.height)),
            ("margin", "0".to_string()),
            ("overflow", "hidden".to_string()),
            ("visibility", "hidden".to_string()),
            ("pointer-events", "none".to_string()),
            // border-width only takes effect with a border style.
            ("border-style", "solid".to_string()),
            ("border-color", "transparent".to_string()),
        ] {
            Self::set(&style, name, &value)?;
        }
        if spec.style.get("box-sizing").is_none() {
            Self::set(&style, "box-sizing", "border-box")?;
        }

        let mut spans = Vec::with_capacity(spec.plan.marker_count());
        for segment in spec.plan.segments() {
            match segment {
                MirrorSegment::Text(text) => {
                    mirror
                        .append_child(&document.create_text_node(text))
                        .map_err(|e| PlatformError(format!("append failed: {e:?}")))?;
                }
                MirrorSegment::Marker { index, text } => {
                    let span = Self::create(&document, "span")?;
                    span.set_text_content(Some(text));
                    mirror
                        .append_child(&span)
                        .map_err(|e| PlatformError(format!("append failed: {e:?}")))?;
                    spans.push((*index, span));
                }
            }
        }

        body.append_child(&mirror)
            .map_err(|e| PlatformError(format!("append failed: {e:?}")))?;
        let mirror = MirrorGuard(mirror);

        // Replay the host's internal scroll so the spans land where the live text is.
        mirror.0.set_scroll_top(spec.scroll.top.round() as i32);
        mirror.0.set_scroll_left(spec.scroll.left.round() as i32);

        let mut rects = RangeRects::new();
        for (index, span) in spans {
            let list = span.get_client_rects();
            let fragments: Vec<Rect> = (0..list.length())
                .filter_map(|i| list.item(i))
                .map(|r| Rect::new(r.x(), r.y(), r.width(), r.height()))
                .filter(|r| r.width > 0.0)
                .collect();
            rects.insert(index, fragments);
        }

        tracing::trace!(
            target: "proofline::mirror",
            markers = rects.len(),
            white_space = spec.style.white_space(),
            "browser mirror measured"
        );
        Ok(rects)
    }
}
