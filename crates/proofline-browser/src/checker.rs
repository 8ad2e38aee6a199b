//! The page checker: ties the focused element, the grammar service and the
//! DOM overlay to one core `Checker`.

use std::cell::RefCell;
use std::rc::Rc;

use proofline_common::{CheckerConfig, GrammarService};
use proofline_core::{
    CheckOutcome, Checker, DisposeReason, EventOutcome, HostElement, OverlayEvent,
};
use web_sys::Element;

use crate::frame;
use crate::host::BrowserHost;
use crate::mirror::BrowserMirror;
use crate::notify;
use crate::overlay::{DomOverlay, EventSink, OverlayOptions};
use crate::style;

pub type PageChecker = Checker<BrowserHost, BrowserMirror, DomOverlay>;

/// How a check request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckReport {
    /// The page is on the unsupported list.
    Unsupported,
    /// No supported element has focus.
    NoTarget,
    /// The element is empty or whitespace.
    Empty,
    /// A newer check started while this one was in flight.
    Stale,
    NoMatches,
    /// The element left the document while the request was in flight.
    Detached,
    Displayed { matches: usize },
    Failed,
}

struct Inner<G> {
    config: CheckerConfig,
    service: G,
    checker: RefCell<PageChecker>,
}

impl<G> Inner<G> {
    fn toast(&self, message: &str, anchor: Option<&Element>) {
        if let Err(e) = notify::show_toast(
            message,
            anchor,
            self.config.toast_duration_ms,
            self.config.z_index,
        ) {
            tracing::warn!(target: "proofline::checker", error = %e, "toast failed");
        }
    }

    fn handle_event(&self, event: OverlayEvent) {
        // Events raised while the checker is busy (the synthetic input event
        // sent while applying a correction) belong to that operation.
        let Ok(mut checker) = self.checker.try_borrow_mut() else {
            tracing::trace!(target: "proofline::checker", ?event, "ignoring re-entrant overlay event");
            return;
        };
        let element: Option<Element> = checker
            .session()
            .map(|s| s.host().element().clone().into());
        let outcome = checker.handle_event(event);
        drop(checker);

        match outcome {
            EventOutcome::ApplyFailed(e) => self.toast(&e.to_string(), element.as_ref()),
            EventOutcome::Applied { remaining, .. } => {
                tracing::debug!(target: "proofline::checker", remaining, "correction applied")
            }
            EventOutcome::Disposed(reason) => {
                tracing::debug!(target: "proofline::checker", ?reason, "overlay closed")
            }
            EventOutcome::Repositioned | EventOutcome::Ignored => {}
        }
    }
}

/// Checker for one document. Cheap to clone; clones share state.
pub struct GrammarChecker<G> {
    inner: Rc<Inner<G>>,
}

impl<G> Clone for GrammarChecker<G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<G: GrammarService + 'static> GrammarChecker<G> {
    pub fn new(config: CheckerConfig, service: G) -> Self {
        let checker = Checker::new(
            BrowserMirror::new(),
            config.presentation.into(),
            config.max_replacements,
        );
        Self {
            inner: Rc::new(Inner {
                config,
                service,
                checker: RefCell::new(checker),
            }),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.inner.config
    }

    pub fn has_session(&self) -> bool {
        self.inner
            .checker
            .try_borrow()
            .map(|c| c.has_session())
            .unwrap_or(true)
    }

    /// Tear down the displayed overlay, if any.
    pub fn dispose(&self) -> bool {
        match self.inner.checker.try_borrow_mut() {
            Ok(mut checker) => checker.dispose(DisposeReason::Closed),
            Err(_) => {
                tracing::warn!(target: "proofline::checker", "dispose during a checker operation");
                false
            }
        }
    }

    /// Run `check_focused` in the background.
    pub fn spawn_check(&self) {
        let this = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let report = this.check_focused().await;
            tracing::debug!(target: "proofline::checker", ?report, "check finished");
        });
    }

    /// Check the focused element of this document.
    pub async fn check_focused(&self) -> CheckReport {
        let hostname = frame::hostname();
        if self.inner.config.is_unsupported_host(&hostname) {
            tracing::info!(target: "proofline::checker", %hostname, "unsupported host");
            self.inner.toast(notify::UNSUPPORTED_HOST, None);
            return CheckReport::Unsupported;
        }
        let Some(host) = frame::focused_host() else {
            notify::alert(notify::NO_FOCUS);
            return CheckReport::NoTarget;
        };
        self.check_host(host).await
    }

    /// Check `host` and display the result over it.
    pub async fn check_host(&self, host: BrowserHost) -> CheckReport {
        // Whatever was displayed belongs to an earlier request.
        self.inner
            .checker
            .borrow_mut()
            .dispose(DisposeReason::Superseded);
        let Some(text) = host.text().filter(|t| !t.trim().is_empty()) else {
            return CheckReport::Empty;
        };

        let token = self.inner.checker.borrow_mut().begin_check();
        let document = gloo_utils::document();
        if let Err(e) = style::ensure_stylesheet(&document, self.inner.config.z_index) {
            tracing::warn!(target: "proofline::checker", error = %e, "stylesheet injection failed");
        }

        let element: Element = host.element().clone().into();
        notify::set_loading(&element, true);
        let result = self.inner.service.check(&text).await;
        notify::set_loading(&element, false);

        let matches = match result {
            Ok(matches) => matches,
            Err(e) => {
                if !self.inner.checker.borrow_mut().fail_check(token) {
                    return CheckReport::Stale;
                }
                tracing::error!(
                    target: "proofline::checker",
                    error = %e,
                    transient = e.is_transient(),
                    "grammar check failed"
                );
                self.inner.toast(notify::CHECK_FAILED, Some(&element));
                return CheckReport::Failed;
            }
        };

        let surface = DomOverlay::new(
            host.element().clone(),
            OverlayOptions {
                z_index: self.inner.config.z_index,
                tooltip_hide_delay_ms: self.inner.config.tooltip_hide_delay_ms,
            },
            self.sink(),
        );
        let outcome = self
            .inner
            .checker
            .borrow_mut()
            .complete_check(token, host, text, matches, surface);

        match outcome {
            Ok(CheckOutcome::Stale) => CheckReport::Stale,
            Ok(CheckOutcome::NoMatches) => {
                self.inner.toast(notify::NO_ERRORS, Some(&element));
                CheckReport::NoMatches
            }
            Ok(CheckOutcome::Detached) => CheckReport::Detached,
            Ok(CheckOutcome::Displayed { matches }) => CheckReport::Displayed { matches },
            Err(e) => {
                tracing::error!(target: "proofline::checker", error = %e, "could not display matches");
                self.inner.toast(notify::CHECK_FAILED, Some(&element));
                CheckReport::Failed
            }
        }
    }

    /// Forward overlay interactions to this checker without keeping it alive.
    fn sink(&self) -> EventSink {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move |event: OverlayEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_event(event);
            }
        })
    }

    /// Feed an overlay interaction in directly, as a click or scroll would.
    pub fn handle_event(&self, event: OverlayEvent) {
        self.inner.handle_event(event);
    }
}
