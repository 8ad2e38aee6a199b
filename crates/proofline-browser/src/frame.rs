//! Questions about the current frame and document.

use crate::host::BrowserHost;

/// Whether this frame's document has focus.
///
/// Check commands are broadcast to every frame of a tab; only the focused
/// one acts on them.
pub fn has_focus() -> bool {
    gloo_utils::document().has_focus().unwrap_or(false)
}

/// Hostname of the page, lowercased. Empty for documents without one.
pub fn hostname() -> String {
    gloo_utils::window()
        .location()
        .hostname()
        .map(|h| h.to_ascii_lowercase())
        .unwrap_or_default()
}

/// The focused element, if it's something the checker supports.
pub fn focused_host() -> Option<BrowserHost> {
    let active = gloo_utils::document().active_element()?;
    BrowserHost::from_element(&active)
}
