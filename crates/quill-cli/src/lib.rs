//! Quill command-line driver
//!
//! `quill suggest` fetches a single completion; `quill session` runs a
//! line-driven editor with live ghost suggestions; `quill config` manages
//! the configuration file.

#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod output;
pub mod session;

pub use cli::{Cli, Commands, ConfigAction};
pub use session::{parse_line, EditorSession, Outcome, SessionInput};
