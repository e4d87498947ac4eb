//! Quill Autocomplete
//!
//! Inline AI-assisted autocomplete for the Quill editor. While the user types,
//! a [`GhostController`] waits for a pause, asks a [`SuggestionFetcher`] for a
//! continuation of the current paragraph and shows it as a ghost node after
//! the caret. The ghost is never part of the document text: any real edit
//! removes it, and only the commit command turns it into committed content.
//!
//! # Core Components
//!
//! ## GhostController
//! The suggestion lifecycle: debounce, fetch, show, commit or cancel. One
//! controller serves one editing session and tracks at most one ghost.
//!
//! ## SuggestionFetcher
//! Async contract producing one completion string for a [`SuggestionRequest`].
//! [`ChatCompletionFetcher`] implements it against OpenAI-compatible servers.
//!
//! ## ActiveSession
//! Names the session whose ghosts may render; [`GhostRenderer`] hides all
//! others.
//!
//! ## CommandRegistry and Keymap
//! Route Tab / Right / Ctrl+Space / Escape to the controller's commit,
//! advance, trigger and dismiss commands.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quill_autocomplete::{
//!     ActiveSession, AutocompleteConfig, ChatCompletionFetcher, CommandPriority,
//!     CommandRegistry, ControllerOptions, GhostController, KeyCombo, Keymap,
//! };
//! use quill_document::Document;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AutocompleteConfig::default();
//! let document = Document::with_paragraphs(&["The quick brown"]);
//! let fetcher = Arc::new(ChatCompletionFetcher::from_config(&config.provider)?);
//! let controller = GhostController::new(
//!     document.clone(),
//!     fetcher,
//!     ActiveSession::new(),
//!     ControllerOptions::from_config(&config).with_title("Animals"),
//! )?;
//!
//! let registry = CommandRegistry::new();
//! controller.register_commands(&registry, CommandPriority::High);
//! let keymap = Keymap::from_config(&config.keymap)?;
//! let tab = "Tab".parse::<KeyCombo>()?;
//! keymap.handle_key(&tab, &registry);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod keymap;
pub mod logging;
pub mod provider;
pub mod session;
pub mod state;

pub use commands::{CommandHandler, CommandId, CommandName, CommandPriority, CommandRegistry};
pub use config::{
    AutocompleteConfig, ConfigLoader, KeymapConfig, LoggingConfig, ProviderConfig,
    DEFAULT_DEBOUNCE_MS, ENV_PREFIX,
};
pub use context::{capture_context, CapturedContext, ContextRejection};
pub use controller::{ControllerOptions, GhostController};
pub use error::{AutocompleteError, AutocompleteResult, ConfigError, FetchError};
pub use fetcher::{normalize_suggestion, SuggestionFetcher, SuggestionRequest};
pub use keymap::{Key, KeyCombo, Keymap, Modifier};
pub use logging::init_tracing;
pub use provider::{ChatCompletionFetcher, ChatMessage};
pub use session::{ActiveSession, GhostRenderer, GhostStyle, SessionId};
pub use state::{GhostSuggestion, SuggestionPhase};
