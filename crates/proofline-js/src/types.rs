//! Types exposed to JavaScript via wasm-bindgen.

use proofline_common::{CheckerConfig, PresentationMode};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// Action sent by the extension's background script when the shortcut fires.
pub const CHECK_GRAMMAR: &str = "checkGrammar";

/// Message delivered through `chrome.runtime.onMessage`.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ContentMessage {
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum JsPresentation {
    Inline,
    SidePanel,
}

impl From<JsPresentation> for PresentationMode {
    fn from(p: JsPresentation) -> Self {
        match p {
            JsPresentation::Inline => PresentationMode::Inline,
            JsPresentation::SidePanel => PresentationMode::SidePanel,
        }
    }
}

/// Checker options. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct CheckerOptions {
    #[tsify(optional)]
    pub endpoint: Option<String>,
    #[tsify(optional)]
    pub language: Option<String>,
    #[tsify(optional)]
    pub enabled_only: Option<bool>,
    #[tsify(optional)]
    pub max_replacements: Option<u32>,
    #[tsify(optional)]
    pub presentation: Option<JsPresentation>,
    #[tsify(optional)]
    pub tooltip_hide_delay_ms: Option<u32>,
    #[tsify(optional)]
    pub toast_duration_ms: Option<u32>,
    #[tsify(optional)]
    pub unsupported_hosts: Option<Vec<String>>,
    #[tsify(optional)]
    pub z_index: Option<i32>,
}

impl CheckerOptions {
    /// Fill unset options from the defaults.
    pub fn into_config(self) -> CheckerConfig {
        let defaults = CheckerConfig::default();
        CheckerConfig {
            endpoint: self.endpoint.unwrap_or(defaults.endpoint),
            language: self.language.unwrap_or(defaults.language),
            enabled_only: self.enabled_only.unwrap_or(defaults.enabled_only),
            max_replacements: self
                .max_replacements
                .map_or(defaults.max_replacements, |n| n as usize),
            presentation: self
                .presentation
                .map_or(defaults.presentation, Into::into),
            tooltip_hide_delay_ms: self
                .tooltip_hide_delay_ms
                .unwrap_or(defaults.tooltip_hide_delay_ms),
            toast_duration_ms: self.toast_duration_ms.unwrap_or(defaults.toast_duration_ms),
            unsupported_hosts: self.unsupported_hosts.unwrap_or(defaults.unsupported_hosts),
            z_index: self.z_index.unwrap_or(defaults.z_index),
        }
    }
}
