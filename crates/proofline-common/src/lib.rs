//! Shared pieces of proofline that don't touch the DOM: configuration, the
//! LanguageTool wire format, and the grammar client.

pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use client::{GrammarService, LanguageToolClient};
pub use config::{CheckerConfig, DEFAULT_ENDPOINT, PresentationMode};
pub use error::CheckError;
pub use wire::CheckResponse;
