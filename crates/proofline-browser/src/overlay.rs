//! DOM overlay surface.
//!
//! Markers are absolutely positioned spans inside a fixed container laid
//! over the host element; the container clips them to the element's box.
//! Hovering a marker shows a tooltip with the message and replacement
//! buttons. The side panel lists every match next to the element instead.
//!
//! Interaction is reported through an `EventSink`; the surface itself never
//! touches the session.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_timers::callback::Timeout;
use proofline_core::{
    MarkerView, OverlayEvent, OverlaySurface, PanelEntry, PlatformError, Rect, SmolStr,
    tooltip_origin,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, HtmlElement, MutationObserver, MutationObserverInit, ResizeObserver};

pub const OVERLAY_CLASS: &str = "proofline-overlay";
pub const MARKER_CLASS: &str = "proofline-marker";
pub const TOOLTIP_CLASS: &str = "proofline-tooltip";
pub const PANEL_CLASS: &str = "proofline-panel";

const PANEL_WIDTH: f64 = 300.0;
const PANEL_MARGIN: f64 = 8.0;

/// Receives overlay interactions.
pub type EventSink = Rc<dyn Fn(OverlayEvent)>;

#[derive(Clone, Copy, Debug)]
pub struct OverlayOptions {
    pub z_index: i32,
    pub tooltip_hide_delay_ms: u32,
}

/// An open tooltip. Dropping it removes the node and its listeners.
struct Tooltip {
    element: HtmlElement,
    listeners: Vec<EventListener>,
}

impl Drop for Tooltip {
    fn drop(&mut self) {
        self.element.remove();
    }
}

enum Observer {
    Resize(ResizeObserver),
    Mutation(MutationObserver),
}

/// A DOM observer with its callback. Dropping it disconnects the observer.
struct ObserverGuard {
    observer: Observer,
    _callback: Closure<dyn FnMut()>,
}

impl ObserverGuard {
    /// Report `Reposition` whenever the target's box changes size.
    fn resize(target: &HtmlElement, sink: EventSink) -> Result<Self, PlatformError> {
        let callback = Closure::<dyn FnMut()>::new(move || sink(OverlayEvent::Reposition));
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| PlatformError(format!("ResizeObserver failed: {e:?}")))?;
        observer.observe(target);
        Ok(Self {
            observer: Observer::Resize(observer),
            _callback: callback,
        })
    }

    /// Report `Reposition` once the target has been taken out of the document.
    ///
    /// Overlay and mirror nodes come and go under the same root, so only
    /// mutations that leave the target disconnected are reported.
    fn detachment(target: &HtmlElement, sink: EventSink) -> Result<Self, PlatformError> {
        let root = gloo_utils::document()
            .document_element()
            .ok_or("document has no root element")?;
        let watched = target.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            if !watched.is_connected() {
                sink(OverlayEvent::Reposition);
            }
        });
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| PlatformError(format!("MutationObserver failed: {e:?}")))?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(&root, &init)
            .map_err(|e| PlatformError(format!("observe failed: {e:?}")))?;
        Ok(Self {
            observer: Observer::Mutation(observer),
            _callback: callback,
        })
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        match &self.observer {
            Observer::Resize(observer) => observer.disconnect(),
            Observer::Mutation(observer) => observer.disconnect(),
        }
    }
}

type TooltipSlot = Rc<RefCell<Option<Tooltip>>>;
type TimerSlot = Rc<RefCell<Option<Timeout>>>;

/// What a marker's hover handlers need.
#[derive(Clone)]
struct TooltipContext {
    sink: EventSink,
    slot: TooltipSlot,
    timer: TimerSlot,
    hide_delay_ms: u32,
}

fn create(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, PlatformError> {
    let element = document
        .create_element(tag)
        .map_err(|e| PlatformError(format!("create_element({tag}) failed: {e:?}")))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| PlatformError::from("created element is not an HtmlElement"))?;
    element.set_class_name(class);
    Ok(element)
}

fn append(parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), PlatformError> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|e| PlatformError(format!("append failed: {e:?}")))
}

fn place(element: &HtmlElement, rect: Rect) {
    let style = element.style();
    for (name, value) in [
        ("left", rect.x),
        ("top", rect.y),
        ("width", rect.width),
        ("height", rect.height),
    ] {
        style.set_property(name, &format!("{value}px")).ok();
    }
}

fn is_hovered(element: &HtmlElement) -> bool {
    element.matches(":hover").unwrap_or(false)
}

/// A row of replacement buttons, each reporting `Apply` for `match_index`.
fn suggestion_buttons(
    document: &Document,
    sink: &EventSink,
    match_index: usize,
    replacements: &[SmolStr],
    listeners: &mut Vec<EventListener>,
) -> Result<HtmlElement, PlatformError> {
    let row = create(document, "div", "proofline-suggestions")?;
    for replacement in replacements {
        let button = create(document, "button", "")?;
        button.set_attribute("type", "button").ok();
        button.set_text_content(Some(replacement));
        let sink = sink.clone();
        let replacement = replacement.clone();
        listeners.push(EventListener::new(&button, "click", move |event| {
            event.prevent_default();
            sink(OverlayEvent::Apply {
                match_index,
                replacement: replacement.clone(),
            });
        }));
        append(&row, &button)?;
    }
    Ok(row)
}

fn show_tooltip(
    ctx: &TooltipContext,
    anchor: &HtmlElement,
    marker: &MarkerView,
    z_index: i32,
) -> Result<(), PlatformError> {
    ctx.timer.borrow_mut().take();
    ctx.slot.borrow_mut().take();

    let document = gloo_utils::document();
    let body = document.body().ok_or("no body")?;
    let tooltip = create(&document, "div", TOOLTIP_CLASS)?;

    let message = create(&document, "div", "proofline-message")?;
    message.set_text_content(Some(&marker.message));
    append(&tooltip, &message)?;

    let mut listeners = Vec::new();
    if !marker.replacements.is_empty() {
        let buttons = suggestion_buttons(
            &document,
            &ctx.sink,
            marker.match_index,
            &marker.replacements,
            &mut listeners,
        )?;
        append(&tooltip, &buttons)?;
    }

    let bounds = anchor.get_bounding_client_rect();
    let (x, y) = tooltip_origin(Rect::new(
        bounds.x(),
        bounds.y(),
        bounds.width(),
        bounds.height(),
    ));
    let style = tooltip.style();
    style.set_property("position", "fixed").ok();
    style.set_property("left", &format!("{x}px")).ok();
    style.set_property("top", &format!("{y}px")).ok();
    style.set_property("z-index", &z_index.saturating_add(1).to_string()).ok();

    let slot = ctx.slot.clone();
    listeners.push(EventListener::new(&tooltip, "mouseleave", move |_| {
        slot.borrow_mut().take();
    }));

    append(&body, &tooltip)?;
    *ctx.slot.borrow_mut() = Some(Tooltip {
        element: tooltip,
        listeners,
    });
    Ok(())
}

fn schedule_hide(ctx: &TooltipContext, anchor: &HtmlElement) {
    let slot = ctx.slot.clone();
    let anchor = anchor.clone();
    let timeout = Timeout::new(ctx.hide_delay_ms, move || {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            return;
        };
        let keep = slot
            .as_ref()
            .is_some_and(|t| is_hovered(&t.element) || is_hovered(&anchor));
        if !keep {
            slot.take();
        }
    });
    *ctx.timer.borrow_mut() = Some(timeout);
}

/// `OverlaySurface` drawing into the live document.
pub struct DomOverlay {
    target: HtmlElement,
    options: OverlayOptions,
    sink: EventSink,
    container: Option<HtmlElement>,
    panel: Option<HtmlElement>,
    page_listeners: Vec<EventListener>,
    observers: Vec<ObserverGuard>,
    /// Marker hover handlers, or panel buttons.
    content_listeners: Vec<EventListener>,
    tooltip: TooltipSlot,
    hide_timer: TimerSlot,
}

impl DomOverlay {
    /// A surface over `target` reporting interactions to `sink`.
    ///
    /// Nothing is added to the page until the first draw.
    pub fn new(target: HtmlElement, options: OverlayOptions, sink: EventSink) -> Self {
        Self {
            target,
            options,
            sink,
            container: None,
            panel: None,
            page_listeners: Vec::new(),
            observers: Vec::new(),
            content_listeners: Vec::new(),
            tooltip: Rc::new(RefCell::new(None)),
            hide_timer: Rc::new(RefCell::new(None)),
        }
    }

    /// Nodes this surface currently has in the document.
    pub fn node_count(&self) -> usize {
        let container = self
            .container
            .as_ref()
            .map_or(0, |c| 1 + c.child_element_count() as usize);
        let panel = usize::from(self.panel.is_some());
        let tooltip = usize::from(self.tooltip.borrow().is_some());
        container + panel + tooltip
    }

    pub fn listener_count(&self) -> usize {
        let tooltip = self
            .tooltip
            .borrow()
            .as_ref()
            .map_or(0, |t| t.listeners.len());
        self.page_listeners.len() + self.observers.len() + self.content_listeners.len() + tooltip
    }

    fn tooltip_context(&self) -> TooltipContext {
        TooltipContext {
            sink: self.sink.clone(),
            slot: self.tooltip.clone(),
            timer: self.hide_timer.clone(),
            hide_delay_ms: self.options.tooltip_hide_delay_ms,
        }
    }

    /// Page listeners and observers, registered once per overlay.
    ///
    /// Window scroll and resize, the target's own size, and the target
    /// leaving the document all ask for a reposition; edits to the target
    /// report `TextEdited`.
    fn ensure_page_listeners(&mut self) {
        if !self.page_listeners.is_empty() {
            return;
        }
        let window = gloo_utils::window();

        // Capture phase so scrolls of any ancestor (which don't bubble) are seen.
        let sink = self.sink.clone();
        let scroll = EventListener::new_with_options(
            &window,
            "scroll",
            EventListenerOptions {
                phase: EventListenerPhase::Capture,
                passive: true,
            },
            move |_| sink(OverlayEvent::Reposition),
        );
        let sink = self.sink.clone();
        let resize = EventListener::new(&window, "resize", move |_| sink(OverlayEvent::Reposition));
        let mut listeners = vec![scroll, resize];
        for event in ["input", "change"] {
            let sink = self.sink.clone();
            listeners.push(EventListener::new(&self.target, event, move |_| {
                sink(OverlayEvent::TextEdited)
            }));
        }
        self.page_listeners = listeners;

        for observer in [
            ObserverGuard::resize(&self.target, self.sink.clone()),
            ObserverGuard::detachment(&self.target, self.sink.clone()),
        ] {
            match observer {
                Ok(observer) => self.observers.push(observer),
                Err(e) => {
                    tracing::warn!(target: "proofline::overlay", error = %e, "layout observer unavailable")
                }
            }
        }
    }

    fn remove_content(&mut self) {
        self.hide_timer.borrow_mut().take();
        self.tooltip.borrow_mut().take();
        self.content_listeners.clear();
    }
}

impl OverlaySurface for DomOverlay {
    fn draw_markers(&mut self, frame: Rect, markers: &[MarkerView]) -> Result<(), PlatformError> {
        self.ensure_page_listeners();
        self.remove_content();
        if let Some(panel) = self.panel.take() {
            panel.remove();
        }

        let document = gloo_utils::document();
        let container = match &self.container {
            Some(container) => {
                container.set_inner_html("");
                container.clone()
            }
            None => {
                let container = create(&document, "div", OVERLAY_CLASS)?;
                let body = document.body().ok_or("no body")?;
                append(&body, &container)?;
                self.container = Some(container.clone());
                container
            }
        };
        place(&container, frame);
        let style = container.style();
        for (name, value) in [
            ("position", "fixed".to_string()),
            ("overflow", "hidden".to_string()),
            ("pointer-events", "none".to_string()),
            ("z-index", self.options.z_index.to_string()),
        ] {
            style.set_property(name, &value).ok();
        }

        let ctx = self.tooltip_context();
        let z_index = self.options.z_index;
        for marker in markers {
            let marker = Rc::new(marker.clone());
            for rect in &marker.rects {
                let span = create(
                    &document,
                    "span",
                    &format!("{MARKER_CLASS} {}", marker.category.css_class()),
                )?;
                span.set_attribute("data-match-index", &marker.match_index.to_string())
                    .ok();
                place(&span, *rect);
                span.style().set_property("position", "absolute").ok();
                span.style().set_property("pointer-events", "auto").ok();

                let (enter_ctx, enter_span, enter_marker) =
                    (ctx.clone(), span.clone(), marker.clone());
                self.content_listeners
                    .push(EventListener::new(&span, "mouseenter", move |_| {
                        if let Err(e) = show_tooltip(&enter_ctx, &enter_span, &enter_marker, z_index) {
                            tracing::warn!(target: "proofline::overlay", error = %e, "tooltip failed");
                        }
                    }));
                let (leave_ctx, leave_span) = (ctx.clone(), span.clone());
                self.content_listeners
                    .push(EventListener::new(&span, "mouseleave", move |_| {
                        schedule_hide(&leave_ctx, &leave_span);
                    }));
                append(&container, &span)?;
            }
        }

        tracing::trace!(
            target: "proofline::overlay",
            markers = markers.len(),
            nodes = container.child_element_count(),
            "markers drawn"
        );
        Ok(())
    }

    fn draw_panel(&mut self, anchor: Rect, entries: &[PanelEntry]) -> Result<(), PlatformError> {
        self.ensure_page_listeners();
        self.remove_content();
        if let Some(container) = self.container.take() {
            container.remove();
        }

        let document = gloo_utils::document();
        let panel = match &self.panel {
            Some(panel) => {
                panel.set_inner_html("");
                panel.clone()
            }
            None => {
                let panel = create(&document, "div", PANEL_CLASS)?;
                let body = document.body().ok_or("no body")?;
                append(&body, &panel)?;
                self.panel = Some(panel.clone());
                panel
            }
        };

        let header = create(&document, "div", "proofline-panel-header")?;
        let title = create(&document, "span", "proofline-panel-title")?;
        title.set_text_content(Some(&format!("Grammar ({})", entries.len())));
        append(&header, &title)?;
        let close = create(&document, "button", "proofline-panel-close")?;
        close.set_attribute("type", "button").ok();
        close.set_attribute("aria-label", "Close").ok();
        close.set_text_content(Some("\u{00d7}"));
        let sink = self.sink.clone();
        self.content_listeners
            .push(EventListener::new(&close, "click", move |_| sink(OverlayEvent::Close)));
        append(&header, &close)?;
        append(&panel, &header)?;

        for entry in entries {
            let row = create(&document, "div", "proofline-panel-entry")?;
            let excerpt = create(
                &document,
                "span",
                &format!("proofline-panel-excerpt {}", entry.category.css_class()),
            )?;
            excerpt.set_text_content(Some(&entry.excerpt));
            append(&row, &excerpt)?;
            let message = create(&document, "div", "proofline-message")?;
            message.set_text_content(Some(&entry.message));
            append(&row, &message)?;
            if !entry.replacements.is_empty() {
                let buttons = suggestion_buttons(
                    &document,
                    &self.sink,
                    entry.match_index,
                    &entry.replacements,
                    &mut self.content_listeners,
                )?;
                append(&row, &buttons)?;
            }
            append(&panel, &row)?;
        }

        let viewport_width = gloo_utils::window()
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(f64::INFINITY);
        let right_side = anchor.right() + PANEL_MARGIN;
        let left = if right_side + PANEL_WIDTH <= viewport_width {
            right_side
        } else {
            (anchor.x - PANEL_WIDTH - PANEL_MARGIN).max(PANEL_MARGIN)
        };
        let style = panel.style();
        style.set_property("position", "fixed").ok();
        style.set_property("left", &format!("{left}px")).ok();
        style.set_property("top", &format!("{}px", anchor.y.max(PANEL_MARGIN))).ok();
        style
            .set_property("z-index", &self.options.z_index.saturating_add(1).to_string())
            .ok();

        tracing::trace!(target: "proofline::overlay", entries = entries.len(), "panel drawn");
        Ok(())
    }

    fn clear(&mut self) {
        self.page_listeners.clear();
        self.observers.clear();
        self.remove_content();
        if let Some(container) = self.container.take() {
            container.remove();
        }
        if let Some(panel) = self.panel.take() {
            panel.remove();
        }
    }
}
