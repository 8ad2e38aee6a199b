//! Grammar service seam and the LanguageTool HTTP client.

use std::future::Future;

use proofline_core::Match;
use reqwest::header::{ACCEPT, HeaderValue};

use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::wire::CheckResponse;

/// Something that finds problems in a piece of text.
///
/// Futures aren't required to be `Send`: in the browser they run on the
/// page's single thread.
pub trait GrammarService {
    fn check(&self, text: &str) -> impl Future<Output = Result<Vec<Match>, CheckError>>;
}

/// Client for a LanguageTool-compatible `/v2/check` endpoint.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    enabled_only: bool,
    max_replacements: usize,
}

impl LanguageToolClient {
    pub fn new(config: &CheckerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &CheckerConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            enabled_only: config.enabled_only,
            max_replacements: config.max_replacements,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the form POST for `text`.
    pub fn build_request(&self, text: &str) -> Result<reqwest::Request, CheckError> {
        let enabled_only = if self.enabled_only { "true" } else { "false" };
        let request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .form(&[
                ("text", text),
                ("language", self.language.as_str()),
                ("enabledOnly", enabled_only),
            ])
            .build()?;
        Ok(request)
    }

    /// Decode a response body into matches.
    pub fn decode(&self, body: &str) -> Result<Vec<Match>, CheckError> {
        let response: CheckResponse = serde_json::from_str(body)?;
        if let Some(language) = response.language_code() {
            tracing::debug!(
                target: "proofline::client",
                language,
                matches = response.matches.len(),
                "grammar response"
            );
        }
        Ok(response.into_matches(self.max_replacements))
    }
}

impl GrammarService for LanguageToolClient {
    async fn check(&self, text: &str) -> Result<Vec<Match>, CheckError> {
        let request = self.build_request(text)?;
        tracing::debug!(
            target: "proofline::client",
            endpoint = %self.endpoint,
            chars = text.chars().count(),
            "sending grammar request"
        );

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(target: "proofline::client", status = status.as_u16(), "grammar service error");
            return Err(CheckError::Status {
                status: status.as_u16(),
                body,
            });
        }
        self.decode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LanguageToolClient {
        LanguageToolClient::new(&CheckerConfig::default())
    }

    #[test]
    fn test_request_is_form_post() {
        let request = client().build_request("Helo wrold & more").unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "https://api.languagetool.org/v2/check");
        assert_eq!(
            request.headers().get(ACCEPT).unwrap(),
            "application/json"
        );
        assert_eq!(
            request.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            std::str::from_utf8(body).unwrap(),
            "text=Helo+wrold+%26+more&language=auto&enabledOnly=false"
        );
    }

    #[test]
    fn test_request_uses_config() {
        let config = CheckerConfig {
            endpoint: "http://localhost:8081/v2/check".into(),
            language: "de-DE".into(),
            enabled_only: true,
            ..CheckerConfig::default()
        };
        let request = LanguageToolClient::new(&config).build_request("Hallo").unwrap();
        assert_eq!(request.url().port(), Some(8081));
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            std::str::from_utf8(body).unwrap(),
            "text=Hallo&language=de-DE&enabledOnly=true"
        );
    }

    #[test]
    fn test_decode_caps_replacements() {
        let config = CheckerConfig {
            max_replacements: 1,
            ..CheckerConfig::default()
        };
        let matches = LanguageToolClient::new(&config)
            .decode(
                r#"{ "matches": [ { "offset": 0, "length": 4, "message": "typo",
                     "replacements": [ { "value": "Hello" }, { "value": "Help" } ] } ] }"#,
            )
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].replacements, vec!["Hello"]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            client().decode("<html>rate limited</html>"),
            Err(CheckError::Decode(_))
        ));
    }
}
