//! Controller phases and the tracked suggestion

use quill_document::{NodeKey, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a ghost controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionPhase {
    /// Nothing scheduled, nothing shown
    #[default]
    Idle,
    /// Waiting for the user to stop typing
    Debouncing,
    /// A fetch is in flight
    Fetching,
    /// A ghost is visible in the document
    Showing,
}

impl fmt::Display for SuggestionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionPhase::Idle => write!(f, "idle"),
            SuggestionPhase::Debouncing => write!(f, "debouncing"),
            SuggestionPhase::Fetching => write!(f, "fetching"),
            SuggestionPhase::Showing => write!(f, "showing"),
        }
    }
}

/// The suggestion a controller currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostSuggestion {
    /// Suggested text, fixed once created
    pub text: String,
    /// Key of the ghost node holding the suggestion
    pub anchor_key: NodeKey,
    /// Session that owns the ghost node
    pub session_id: SessionId,
}
