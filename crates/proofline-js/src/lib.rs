//! WASM bindings for the proofline grammar overlay.
//!
//! The extension's content script creates one `ContentScript` per frame and
//! forwards runtime messages to `handleMessage`:
//!
//! ```js
//! const script = new ContentScript({ presentation: "inline" });
//! chrome.runtime.onMessage.addListener((message) => script.handleMessage(message));
//! ```

mod script;
mod types;

pub use script::*;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    init_tracing();
}

fn init_tracing() {
    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    // A page may load the module twice (frames re-injecting); keep the first.
    let _ = set_global_default(Registry::default().with(wasm_layer));
}
