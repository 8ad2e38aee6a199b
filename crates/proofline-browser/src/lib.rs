//! Browser DOM layer for the proofline grammar overlay.
//!
//! Implements the core's platform seams over `web-sys`. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `host`: `BrowserHost`, the `HostElement` for inputs, textareas and contenteditable elements
//! - `mirror`: `BrowserMirror`, the hidden DOM replica used to measure match positions
//! - `overlay`: `DomOverlay`, markers, tooltip and side panel
//! - `checker`: `GrammarChecker`, the per-document checker wiring it all together
//! - `notify`, `frame`, `style`: toasts and alerts, focus and host checks, the stylesheet
//!
//! # Re-exports
//!
//! This crate re-exports `proofline-core` for convenience, so consumers
//! only need to depend on `proofline-browser`.

// Re-export core crate
pub use proofline_core;
pub use proofline_core::*;

pub mod checker;
pub mod color;
pub mod frame;
pub mod host;
pub mod mirror;
pub mod notify;
pub mod overlay;
pub mod style;

pub use checker::{CheckReport, GrammarChecker, PageChecker};
pub use host::BrowserHost;
pub use mirror::BrowserMirror;
pub use overlay::{DomOverlay, EventSink, OverlayOptions};
