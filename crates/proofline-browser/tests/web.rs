//! WASM browser tests for proofline-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use gloo_events::EventListener;
use gloo_timers::future::TimeoutFuture;
use proofline_browser::{
    BrowserHost, BrowserMirror, CheckReport, DomOverlay, GrammarChecker, HostElement, HostKind,
    Measurement, OverlayEvent, OverlayOptions, OverlaySurface, TextRange, frame, measure_ranges,
    notify, style,
};
use proofline_common::{CheckError, CheckerConfig, GrammarService};
use proofline_core::{Category, MarkerView, Match, PanelEntry, Rect};
use web_sys::{HtmlElement, HtmlInputElement, HtmlTextAreaElement};

fn document() -> web_sys::Document {
    gloo_utils::document()
}

fn mount(tag: &str) -> HtmlElement {
    let element = document()
        .create_element(tag)
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    let style = element.style();
    style.set_property("font-family", "monospace").unwrap();
    style.set_property("font-size", "16px").unwrap();
    style.set_property("width", "400px").unwrap();
    document().body().unwrap().append_child(&element).unwrap();
    element
}

fn input(value: &str) -> (HtmlInputElement, BrowserHost) {
    let element = mount("input").dyn_into::<HtmlInputElement>().unwrap();
    element.set_value(value);
    let host = BrowserHost::from_element(&element).unwrap();
    (element, host)
}

fn options() -> OverlayOptions {
    OverlayOptions {
        z_index: 99999,
        tooltip_hide_delay_ms: 100,
    }
}

fn recorded_sink() -> (proofline_browser::EventSink, Rc<RefCell<Vec<OverlayEvent>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let seen = events.clone();
    let sink: proofline_browser::EventSink = Rc::new(move |e: OverlayEvent| seen.borrow_mut().push(e));
    (sink, events)
}

fn count(selector: &str) -> u32 {
    document().query_selector_all(selector).unwrap().length()
}

// === Host tests ===

#[wasm_bindgen_test]
fn test_host_kinds() {
    let (_, host) = input("Helo");
    assert_eq!(host.kind(), HostKind::SingleLine);

    let textarea = mount("textarea");
    let host = BrowserHost::from_element(&textarea).unwrap();
    assert_eq!(host.kind(), HostKind::MultiLine);

    let div = mount("div");
    assert!(BrowserHost::from_element(&div).is_none());
    div.set_content_editable("true");
    let host = BrowserHost::from_element(&div).unwrap();
    assert_eq!(host.kind(), HostKind::RichText);

    let checkbox = mount("input").dyn_into::<HtmlInputElement>().unwrap();
    checkbox.set_type("checkbox");
    assert!(BrowserHost::from_element(&checkbox).is_none());
}

#[wasm_bindgen_test]
fn test_input_replace_fires_input_event() {
    let (element, mut host) = input("Helo world");
    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    let _listener = EventListener::new(&element, "input", move |_| *counter.borrow_mut() += 1);

    host.replace_range(TextRange::new(0, 4), "Hello").unwrap();
    host.notify_input().unwrap();

    assert_eq!(element.value(), "Hello world");
    assert_eq!(*fired.borrow(), 1);
    element.remove();
}

#[wasm_bindgen_test]
fn test_textarea_replace() {
    let textarea = mount("textarea").dyn_into::<HtmlTextAreaElement>().unwrap();
    textarea.set_value("Helo wrold");
    let mut host = BrowserHost::from_element(&textarea).unwrap();
    host.replace_range(TextRange::new(5, 5), "world").unwrap();
    assert_eq!(textarea.value(), "Helo world");
    textarea.remove();
}

#[wasm_bindgen_test]
fn test_editable_flat_and_nested() {
    let div = mount("div");
    div.set_content_editable("true");
    div.set_text_content(Some("Helo world"));
    let mut host = BrowserHost::from_element(&div).unwrap();
    assert!(host.is_flat_text());
    host.replace_range(TextRange::new(0, 4), "Hello").unwrap();
    assert_eq!(div.text_content().unwrap(), "Hello world");

    div.set_inner_html("Helo <b>world</b>");
    assert!(!host.is_flat_text());
    assert!(host.replace_range(TextRange::new(0, 4), "Hello").is_err());
    div.remove();
}

#[wasm_bindgen_test]
fn test_detached_host() {
    let (element, host) = input("Helo");
    element.remove();
    assert!(!host.is_attached());
    let measurement =
        measure_ranges(&BrowserMirror::new(), &host, "Helo", &[TextRange::new(0, 4)]).unwrap();
    assert_eq!(measurement, Measurement::Detached);
}

// === Mirror tests ===

#[wasm_bindgen_test]
fn test_mirror_measures_disjoint_ranges() {
    let (element, host) = input("Helo wrold again");
    let text = host.text().unwrap();
    let rects = measure_ranges(
        &BrowserMirror::new(),
        &host,
        &text,
        &[TextRange::new(0, 4), TextRange::new(5, 5)],
    )
    .unwrap()
    .rects();

    let first = rects.bounds(0).unwrap();
    let second = rects.bounds(1).unwrap();
    assert!(first.width > 0.0);
    assert!(second.width > first.width);
    assert!(first.right() <= second.x);
    // Same line in a single-line input.
    assert!((first.y - second.y).abs() < 1.0);

    // The mirror doesn't outlive the measurement.
    assert_eq!(count(".proofline-mirror"), 0);
    element.remove();
}

// === Overlay tests ===

fn marker() -> MarkerView {
    MarkerView {
        match_index: 0,
        category: Category::Spelling,
        rects: vec![Rect::new(2.0, 2.0, 32.0, 16.0)],
        message: "Possible spelling mistake found.".into(),
        replacements: vec!["Hello".into()],
    }
}

#[wasm_bindgen_test]
fn test_overlay_draw_and_clear() {
    let (element, _) = input("Helo world");
    let (sink, _) = recorded_sink();
    let mut overlay = DomOverlay::new(element.clone().into(), options(), sink);

    overlay
        .draw_markers(Rect::new(10.0, 10.0, 400.0, 24.0), &[marker()])
        .unwrap();
    assert_eq!(count(".proofline-overlay"), 1);
    assert_eq!(count(".proofline-marker.proofline-spelling"), 1);
    assert!(overlay.listener_count() > 0);

    overlay.clear();
    overlay.clear();
    assert_eq!(count(".proofline-overlay"), 0);
    assert_eq!(count(".proofline-marker"), 0);
    assert_eq!(overlay.node_count(), 0);
    assert_eq!(overlay.listener_count(), 0);
    element.remove();
}

#[wasm_bindgen_test]
fn test_overlay_reports_text_edits() {
    let (element, host) = input("Helo world");
    let (sink, events) = recorded_sink();
    let mut overlay = DomOverlay::new(element.clone().into(), options(), sink);
    overlay
        .draw_markers(Rect::new(10.0, 10.0, 400.0, 24.0), &[marker()])
        .unwrap();

    host.notify_input().unwrap();
    assert_eq!(events.borrow().as_slice(), &[OverlayEvent::TextEdited]);

    overlay.clear();
    host.notify_input().unwrap();
    assert_eq!(events.borrow().len(), 1);
    element.remove();
}

#[wasm_bindgen_test]
fn test_overlay_reports_committed_changes() {
    let (element, _) = input("Helo world");
    let (sink, events) = recorded_sink();
    let mut overlay = DomOverlay::new(element.clone().into(), options(), sink);
    overlay
        .draw_markers(Rect::new(10.0, 10.0, 400.0, 24.0), &[marker()])
        .unwrap();

    element
        .dispatch_event(&web_sys::Event::new("change").unwrap())
        .unwrap();
    assert_eq!(events.borrow().as_slice(), &[OverlayEvent::TextEdited]);

    overlay.clear();
    element.remove();
}

#[wasm_bindgen_test]
fn test_panel_buttons_report_apply_and_close() {
    let (element, _) = input("Helo world");
    let (sink, events) = recorded_sink();
    let mut overlay = DomOverlay::new(element.clone().into(), options(), sink);
    let entries = [PanelEntry {
        match_index: 3,
        category: Category::Grammar,
        excerpt: "Helo".into(),
        message: "typo".into(),
        replacements: vec!["Hello".into(), "Help".into()],
    }];
    overlay
        .draw_panel(Rect::new(10.0, 10.0, 400.0, 24.0), &entries)
        .unwrap();
    assert_eq!(count(".proofline-panel-entry"), 1);

    let button = document()
        .query_selector(".proofline-suggestions button")
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    button.click();
    let close = document()
        .query_selector(".proofline-panel-close")
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    close.click();

    assert_eq!(
        events.borrow().as_slice(),
        &[
            OverlayEvent::Apply {
                match_index: 3,
                replacement: "Hello".into()
            },
            OverlayEvent::Close,
        ]
    );
    overlay.clear();
    assert_eq!(count(".proofline-panel"), 0);
    element.remove();
}

#[wasm_bindgen_test]
fn test_stylesheet_injected_once() {
    let document = document();
    let first = style::ensure_stylesheet(&document, 99999).unwrap();
    let second = style::ensure_stylesheet(&document, 99999).unwrap();
    assert!(first || document.get_element_by_id(style::STYLE_ELEMENT_ID).is_some());
    assert!(!second);
    assert_eq!(count(&format!("#{}", style::STYLE_ELEMENT_ID)), 1);
}

// === Checker tests ===

/// Grammar service answering from a fixed list, after a per-call delay.
struct ScriptedService {
    matches: Vec<Match>,
    delays_ms: RefCell<VecDeque<u32>>,
    fail: bool,
    calls: Rc<Cell<usize>>,
}

impl ScriptedService {
    fn new(matches: Vec<Match>) -> Self {
        Self {
            matches,
            delays_ms: RefCell::new(VecDeque::new()),
            fail: false,
            calls: Rc::new(Cell::new(0)),
        }
    }

    fn with_delays(self, delays: &[u32]) -> Self {
        *self.delays_ms.borrow_mut() = delays.iter().copied().collect();
        self
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }
}

impl GrammarService for ScriptedService {
    async fn check(&self, _text: &str) -> Result<Vec<Match>, CheckError> {
        self.calls.set(self.calls.get() + 1);
        let delay = self.delays_ms.borrow_mut().pop_front().unwrap_or(0);
        TimeoutFuture::new(delay).await;
        if self.fail {
            return Err(CheckError::InvalidConfig("service offline".into()));
        }
        Ok(self.matches.clone())
    }
}

fn helo_wrold_matches() -> Vec<Match> {
    vec![
        Match::new(0, 4, "Possible spelling mistake found.").with_replacements(["Hello"]),
        Match::new(5, 5, "Possible spelling mistake found.").with_replacements(["world"]),
    ]
}

fn test_config() -> CheckerConfig {
    CheckerConfig {
        unsupported_hosts: Vec::new(),
        toast_duration_ms: 50,
        ..CheckerConfig::default()
    }
}

fn host_of(element: &HtmlElement) -> BrowserHost {
    BrowserHost::from_element(element).unwrap()
}

fn toast_text() -> String {
    document()
        .query_selector(&format!(".{}", notify::TOAST_CLASS))
        .unwrap()
        .and_then(|toast| toast.text_content())
        .unwrap_or_default()
}

#[wasm_bindgen_test]
async fn test_checker_displays_matches() {
    let (element, host) = input("Helo wrold");
    let checker = GrammarChecker::new(test_config(), ScriptedService::new(helo_wrold_matches()));

    let report = checker.check_host(host).await;
    assert_eq!(report, CheckReport::Displayed { matches: 2 });
    assert!(checker.has_session());
    assert_eq!(count(".proofline-marker"), 2);
    assert!(!element.class_list().contains(notify::LOADING_CLASS));

    assert!(checker.dispose());
    assert!(!checker.dispose());
    assert_eq!(count(".proofline-overlay"), 0);
    element.remove();
}

#[wasm_bindgen_test]
async fn test_tooltip_replacement_keeps_other_markers() {
    let (element, host) = input("Helo wrold");
    let checker = GrammarChecker::new(test_config(), ScriptedService::new(helo_wrold_matches()));
    assert_eq!(
        checker.check_host(host).await,
        CheckReport::Displayed { matches: 2 }
    );

    let marker = document()
        .query_selector(".proofline-marker[data-match-index=\"0\"]")
        .unwrap()
        .unwrap();
    marker
        .dispatch_event(&web_sys::Event::new("mouseenter").unwrap())
        .unwrap();
    let button = document()
        .query_selector(".proofline-tooltip button")
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    // Applying dispatches an input event; it must not end the session.
    button.click();

    assert_eq!(element.value(), "Hello wrold");
    assert!(checker.has_session());
    assert_eq!(count(".proofline-marker"), 1);
    assert_eq!(count(".proofline-tooltip"), 0);

    checker.dispose();
    element.remove();
}

#[wasm_bindgen_test]
async fn test_user_edit_ends_session() {
    let (element, host) = input("Helo wrold");
    let checker = GrammarChecker::new(test_config(), ScriptedService::new(helo_wrold_matches()));
    checker.check_host(host.clone()).await;
    assert!(checker.has_session());

    element.set_value("Helo wrold!");
    host.notify_input().unwrap();
    assert!(!checker.has_session());
    assert_eq!(count(".proofline-overlay"), 0);
    element.remove();
}

#[wasm_bindgen_test]
async fn test_late_response_is_dropped() {
    let (element, host) = input("Helo wrold");
    let service = ScriptedService::new(helo_wrold_matches()).with_delays(&[80, 0]);
    let checker = GrammarChecker::new(test_config(), service);

    let first_report = Rc::new(Cell::new(None));
    let (first, slot, first_host) = (checker.clone(), first_report.clone(), host.clone());
    wasm_bindgen_futures::spawn_local(async move {
        slot.set(Some(first.check_host(first_host).await));
    });
    // Let the first request go out before starting the second.
    TimeoutFuture::new(0).await;

    assert_eq!(
        checker.check_host(host).await,
        CheckReport::Displayed { matches: 2 }
    );
    TimeoutFuture::new(150).await;

    assert_eq!(first_report.get(), Some(CheckReport::Stale));
    assert!(checker.has_session());
    assert_eq!(count(".proofline-overlay"), 1);

    checker.dispose();
    element.remove();
}

#[wasm_bindgen_test]
async fn test_whitespace_only_text_is_not_sent() {
    let (first, host) = input("Helo wrold");
    let service = ScriptedService::new(helo_wrold_matches());
    let calls = service.calls.clone();
    let checker = GrammarChecker::new(test_config(), service);
    checker.check_host(host).await;
    assert!(checker.has_session());

    let (blank, blank_host) = input("   ");
    assert_eq!(checker.check_host(blank_host).await, CheckReport::Empty);
    assert_eq!(calls.get(), 1);
    // The earlier overlay doesn't linger.
    assert!(!checker.has_session());
    assert_eq!(count(".proofline-overlay"), 0);

    first.remove();
    blank.remove();
}

#[wasm_bindgen_test]
async fn test_failed_check_shows_toast() {
    let (element, host) = input("Helo wrold");
    let checker = GrammarChecker::new(test_config(), ScriptedService::failing());

    assert_eq!(checker.check_host(host).await, CheckReport::Failed);
    assert!(!checker.has_session());
    assert_eq!(count(".proofline-overlay"), 0);
    assert_eq!(toast_text(), notify::CHECK_FAILED);
    assert!(!element.class_list().contains(notify::LOADING_CLASS));

    TimeoutFuture::new(100).await;
    assert_eq!(count(".proofline-toast"), 0);
    element.remove();
}

#[wasm_bindgen_test]
async fn test_unsupported_host_shows_toast() {
    let config = CheckerConfig {
        unsupported_hosts: vec![frame::hostname()],
        ..test_config()
    };
    let service = ScriptedService::new(helo_wrold_matches());
    let calls = service.calls.clone();
    let checker = GrammarChecker::new(config, service);

    assert_eq!(checker.check_focused().await, CheckReport::Unsupported);
    assert_eq!(calls.get(), 0);
    assert_eq!(toast_text(), notify::UNSUPPORTED_HOST);

    TimeoutFuture::new(100).await;
    assert_eq!(count(".proofline-toast"), 0);
}

// === Layout tracking tests ===

#[wasm_bindgen_test]
async fn test_overlay_follows_element_resize() {
    let textarea = mount("textarea");
    textarea
        .dyn_ref::<HtmlTextAreaElement>()
        .unwrap()
        .set_value("Helo wrold");
    let checker = GrammarChecker::new(test_config(), ScriptedService::new(helo_wrold_matches()));
    checker.check_host(host_of(&textarea)).await;
    assert!(checker.has_session());

    textarea.style().set_property("width", "250px").unwrap();
    TimeoutFuture::new(100).await;

    let overlay = document()
        .query_selector(".proofline-overlay")
        .unwrap()
        .unwrap()
        .get_bounding_client_rect();
    let target = textarea.get_bounding_client_rect();
    assert!(target.width() < 300.0);
    assert!((overlay.width() - target.width()).abs() < 1.0);
    assert!((overlay.x() - target.x()).abs() < 1.0);

    checker.dispose();
    textarea.remove();
}

#[wasm_bindgen_test]
async fn test_overlay_disposed_when_element_removed() {
    let (element, host) = input("Helo wrold");
    let checker = GrammarChecker::new(test_config(), ScriptedService::new(helo_wrold_matches()));
    checker.check_host(host).await;
    assert_eq!(count(".proofline-overlay"), 1);

    element.remove();
    TimeoutFuture::new(50).await;

    assert!(!checker.has_session());
    assert_eq!(count(".proofline-overlay"), 0);
    assert_eq!(count(".proofline-marker"), 0);
}
