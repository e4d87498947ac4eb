//! Suggestion fetcher contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Context sent to a fetcher
///
/// Only committed text is included; ghost nodes never leak into a request.
/// Every optional field is `None` both when the paragraph does not exist and
/// when it exists but is empty, so fetchers never receive `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// Title of the note being edited
    pub title: String,
    /// Text of the paragraph before the current one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_paragraph: Option<String>,
    /// Text of the current paragraph up to the caret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_paragraph_prefix: Option<String>,
    /// Text of the paragraph after the current one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_paragraph: Option<String>,
}

/// Produces a single completion string for a context
///
/// Implementations are pure functions of the request; they do not track
/// staleness. The caller discards results that arrive after a newer edit.
#[async_trait]
pub trait SuggestionFetcher: Send + Sync {
    /// Fetch a completion; an empty string means "nothing to suggest"
    async fn fetch(&self, request: SuggestionRequest) -> Result<String, FetchError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "fetcher"
    }
}

/// Reduce a raw completion to what can be shown inline.
///
/// Keeps the first line only and trims trailing whitespace. Leading
/// whitespace is significant (it separates the suggestion from the word
/// before the caret). Returns `None` when nothing visible remains.
pub fn normalize_suggestion(raw: &str) -> Option<String> {
    let first_line = raw.lines().next().unwrap_or_default().trim_end();
    if first_line.trim().is_empty() {
        None
    } else {
        Some(first_line.to_string())
    }
}
