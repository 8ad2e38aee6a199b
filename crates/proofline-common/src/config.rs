use proofline_core::Presentation;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

pub const DEFAULT_ENDPOINT: &str = "https://api.languagetool.org/v2/check";

/// How matches are shown on the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationMode {
    #[default]
    Inline,
    SidePanel,
}

impl From<PresentationMode> for Presentation {
    fn from(mode: PresentationMode) -> Self {
        match mode {
            PresentationMode::Inline => Presentation::InlineMarkers,
            PresentationMode::SidePanel => Presentation::SidePanel,
        }
    }
}

/// Checker configuration.
///
/// Every field is optional when deserializing; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckerConfig {
    /// Grammar service URL (LanguageTool `/v2/check` compatible).
    pub endpoint: String,
    /// Language code, or `auto` to let the service detect it.
    pub language: String,
    /// Only run rules that are enabled by default on the service.
    pub enabled_only: bool,
    /// Replacement candidates offered per match.
    pub max_replacements: usize,
    pub presentation: PresentationMode,
    /// Delay before the tooltip hides after the pointer leaves a marker.
    pub tooltip_hide_delay_ms: u32,
    pub toast_duration_ms: u32,
    /// Hosts whose editors can't be checked (canvas-rendered documents).
    pub unsupported_hosts: Vec<String>,
    pub z_index: i32,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            language: "auto".to_owned(),
            enabled_only: false,
            max_replacements: 5,
            presentation: PresentationMode::Inline,
            tooltip_hide_delay_ms: 100,
            toast_duration_ms: 3000,
            unsupported_hosts: vec!["docs.google.com".to_owned()],
            z_index: 99999,
        }
    }
}

impl CheckerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, CheckError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CheckError> {
        if self.endpoint.trim().is_empty() {
            return Err(CheckError::InvalidConfig("endpoint is empty".into()));
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(CheckError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        if self.language.trim().is_empty() {
            return Err(CheckError::InvalidConfig("language is empty".into()));
        }
        if self.max_replacements == 0 {
            return Err(CheckError::InvalidConfig(
                "maxReplacements must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Whether `host` (a page hostname) is on the unsupported list.
    ///
    /// Subdomains of a listed host match too.
    pub fn is_unsupported_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.unsupported_hosts.iter().any(|listed| {
            let listed = listed.to_ascii_lowercase();
            host == listed
                || host
                    .strip_suffix(listed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
