//! User-facing notifications: toasts, the loading indicator and alerts.

use gloo_timers::callback::Timeout;
use proofline_core::PlatformError;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

pub const LOADING_CLASS: &str = "proofline-loading";
pub const TOAST_CLASS: &str = "proofline-toast";

pub const NO_FOCUS: &str = "Please focus on a text input field first.";
pub const NO_ERRORS: &str = "No errors found";
pub const CHECK_FAILED: &str = "Failed to check grammar. Please try again.";
pub const UNSUPPORTED_HOST: &str =
    "Grammar Checker: Google Docs is not supported (use native tools).";

/// Show `message` for `duration_ms`.
///
/// Placed just below `anchor`, or at the bottom centre of the viewport when
/// there is none.
pub fn show_toast(
    message: &str,
    anchor: Option<&Element>,
    duration_ms: u32,
    z_index: i32,
) -> Result<(), PlatformError> {
    let document = gloo_utils::document();
    let body = document.body().ok_or("no body")?;
    let toast = document
        .create_element("div")
        .map_err(|e| PlatformError(format!("create_element failed: {e:?}")))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| PlatformError::from("toast is not an HtmlElement"))?;
    toast.set_class_name(TOAST_CLASS);
    toast.set_text_content(Some(message));

    let style = toast.style();
    let placement: Vec<(&str, String)> = match anchor {
        Some(anchor) => {
            let rect = anchor.get_bounding_client_rect();
            vec![
                ("top", format!("{}px", rect.y() + rect.height() + 5.0)),
                ("left", format!("{}px", rect.x())),
            ]
        }
        None => vec![
            ("bottom", "20px".to_string()),
            ("left", "50%".to_string()),
            ("transform", "translateX(-50%)".to_string()),
        ],
    };
    style.set_property("position", "fixed").ok();
    style.set_property("z-index", &z_index.saturating_add(1).to_string()).ok();
    for (name, value) in placement {
        style.set_property(name, &value).ok();
    }

    body.append_child(&toast)
        .map_err(|e| PlatformError(format!("append failed: {e:?}")))?;
    tracing::debug!(target: "proofline::notify", text = message, "toast shown");

    // One-shot; the timer owns the node until it fires.
    Timeout::new(duration_ms, move || toast.remove()).forget();
    Ok(())
}

/// Toggle the loading indicator on the element being checked.
pub fn set_loading(element: &Element, loading: bool) {
    let classes = element.class_list();
    let result = if loading {
        classes.add_1(LOADING_CLASS)
    } else {
        classes.remove_1(LOADING_CLASS)
    };
    if let Err(e) = result {
        tracing::warn!(target: "proofline::notify", error = ?e, "could not toggle loading class");
    }
}

/// Blocking browser alert.
pub fn alert(message: &str) {
    if let Err(e) = gloo_utils::window().alert_with_message(message) {
        tracing::warn!(target: "proofline::notify", error = ?e, "alert failed");
    }
}
