//! The content-script object the extension instantiates in every frame.

use js_sys::Promise;
use proofline_browser::{GrammarChecker, frame};
use proofline_common::{CheckerConfig, LanguageToolClient};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::types::{CHECK_GRAMMAR, CheckerOptions, ContentMessage};

/// Grammar checker bound to one document.
#[wasm_bindgen]
pub struct ContentScript {
    checker: GrammarChecker<LanguageToolClient>,
}

#[wasm_bindgen]
impl ContentScript {
    /// Create a content script. `options` may be omitted for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<ContentScript, JsError> {
        let config = if options.is_undefined() || options.is_null() {
            CheckerConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<CheckerOptions>(options)
                .map_err(|e| JsError::new(&format!("Invalid options: {}", e)))?
                .into_config()
        };
        config
            .validate()
            .map_err(|e| JsError::new(&e.to_string()))?;

        tracing::debug!(
            target: "proofline::script",
            endpoint = %config.endpoint,
            presentation = ?config.presentation,
            "content script ready"
        );
        let client = LanguageToolClient::new(&config);
        Ok(Self {
            checker: GrammarChecker::new(config, client),
        })
    }

    /// Handle a runtime message. Returns true if a check was started.
    ///
    /// Only `{ action: "checkGrammar" }` is acted on, and only in the frame
    /// that has focus.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> bool {
        let Ok(message) = serde_wasm_bindgen::from_value::<ContentMessage>(message) else {
            return false;
        };
        if message.action != CHECK_GRAMMAR {
            return false;
        }
        if !frame::has_focus() {
            tracing::trace!(target: "proofline::script", "frame not focused, ignoring check");
            return false;
        }
        self.checker.spawn_check();
        true
    }

    /// Check the focused element. Resolves once the result is displayed.
    #[wasm_bindgen(js_name = checkFocused)]
    pub fn check_focused(&self) -> Promise {
        let checker = self.checker.clone();
        future_to_promise(async move {
            let report = checker.check_focused().await;
            tracing::debug!(target: "proofline::script", ?report, "check finished");
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Remove any displayed overlay.
    pub fn dispose(&self) -> bool {
        self.checker.dispose()
    }

    #[wasm_bindgen(js_name = hasSession)]
    pub fn has_session(&self) -> bool {
        self.checker.has_session()
    }
}
