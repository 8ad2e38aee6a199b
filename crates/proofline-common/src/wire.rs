//! LanguageTool `/v2/check` response format.
//!
//! Only the fields the checker uses are modelled; everything else in the
//! response is ignored.

use proofline_core::{Category, Match};
use serde::Deserialize;

/// Rule ids that are spelling checks even when the service doesn't say so.
const SPELLING_RULES: &[&str] = &["MORFOLOGIK_RULE_EN_US"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    #[serde(default)]
    pub language: Option<ResponseLanguage>,
    #[serde(default)]
    pub matches: Vec<WireMatch>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseLanguage {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub detected_language: Option<DetectedLanguage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLanguage {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMatch {
    pub offset: usize,
    pub length: usize,
    pub message: String,
    #[serde(default)]
    pub short_message: Option<String>,
    #[serde(default)]
    pub replacements: Vec<WireReplacement>,
    #[serde(default)]
    pub rule: Option<WireRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReplacement {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRule {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub issue_type: Option<String>,
}

impl WireRule {
    pub fn category(&self) -> Category {
        if self.issue_type.as_deref() == Some("misspelling")
            || SPELLING_RULES.contains(&self.id.as_str())
        {
            Category::Spelling
        } else {
            Category::Grammar
        }
    }
}

impl WireMatch {
    /// Convert into a core match, keeping at most `max_replacements` candidates.
    pub fn into_match(self, max_replacements: usize) -> Match {
        let category = self
            .rule
            .as_ref()
            .map(WireRule::category)
            .unwrap_or_default();
        Match::new(self.offset, self.length, self.message)
            .with_replacements(
                self.replacements
                    .into_iter()
                    .map(|r| r.value)
                    .filter(|v| !v.is_empty())
                    .take(max_replacements),
            )
            .with_category(category)
    }
}

impl CheckResponse {
    pub fn into_matches(self, max_replacements: usize) -> Vec<Match> {
        self.matches
            .into_iter()
            .map(|m| m.into_match(max_replacements))
            .collect()
    }

    /// Code of the language the service ended up checking with.
    pub fn language_code(&self) -> Option<&str> {
        self.language.as_ref().map(|l| l.code.as_str())
    }
}
