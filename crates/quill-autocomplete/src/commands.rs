//! Editor commands and a priority-ordered handler registry
//!
//! Handlers return `true` when they consume a command; dispatch stops at the
//! first handler that does. The autocomplete controller registers its
//! handlers at [`CommandPriority::High`] so that it sees Tab/Right before the
//! editor's default key handling.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::ConfigError;

/// Commands the autocomplete core responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    /// Accept the visible suggestion (Tab)
    Commit,
    /// Accept if showing, otherwise request a suggestion (Right)
    Advance,
    /// Request a suggestion now (Ctrl+Space)
    Trigger,
    /// Hide the visible suggestion (Escape)
    Dismiss,
}

impl CommandName {
    /// Every command, in binding order
    pub const ALL: [CommandName; 4] = [
        CommandName::Commit,
        CommandName::Advance,
        CommandName::Trigger,
        CommandName::Dismiss,
    ];

    /// Lowercase command name as used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Commit => "commit",
            CommandName::Advance => "advance",
            CommandName::Trigger => "trigger",
            CommandName::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "commit" => Ok(CommandName::Commit),
            "advance" => Ok(CommandName::Advance),
            "trigger" => Ok(CommandName::Trigger),
            "dismiss" => Ok(CommandName::Dismiss),
            other => Err(ConfigError::validation(format!("Unknown command: {}", other))),
        }
    }
}

/// Handler priority; higher runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CommandPriority {
    /// Fallback handlers
    Low,
    /// Default priority
    #[default]
    Normal,
    /// Editor integrations that should win over defaults
    High,
    /// Handlers that must run before anything else
    Critical,
}

/// Identifier returned by [`CommandRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(u64);

/// Command handler; returns whether the command was consumed
pub type CommandHandler = Arc<dyn Fn() -> bool + Send + Sync>;

struct RegisteredHandler {
    id: CommandId,
    priority: CommandPriority,
    handler: CommandHandler,
}

#[derive(Default)]
struct RegistryState {
    handlers: HashMap<CommandName, Vec<RegisteredHandler>>,
    next_id: u64,
}

/// Shared registry of command handlers
#[derive(Clone, Default)]
pub struct CommandRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl CommandRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    ///
    /// Handlers of equal priority run in registration order.
    pub fn register<F>(&self, name: CommandName, priority: CommandPriority, handler: F) -> CommandId
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        state.next_id += 1;
        let id = CommandId(state.next_id);
        let handlers = state.handlers.entry(name).or_default();
        let position = handlers
            .iter()
            .position(|existing| existing.priority < priority)
            .unwrap_or(handlers.len());
        handlers.insert(
            position,
            RegisteredHandler {
                id,
                priority,
                handler: Arc::new(handler),
            },
        );
        debug!(command = %name, ?priority, id = id.0, "Command handler registered");
        id
    }

    /// Remove a handler; returns whether it was registered
    pub fn unregister(&self, id: CommandId) -> bool {
        let mut state = self.state.write();
        let mut removed = false;
        for handlers in state.handlers.values_mut() {
            let before = handlers.len();
            handlers.retain(|registered| registered.id != id);
            removed |= handlers.len() != before;
        }
        removed
    }

    /// Run handlers from highest priority down until one consumes the command
    pub fn dispatch(&self, name: CommandName) -> bool {
        // Handlers may register or dispatch commands themselves
        let handlers: Vec<CommandHandler> = self
            .state
            .read()
            .handlers
            .get(&name)
            .map(|handlers| handlers.iter().map(|h| Arc::clone(&h.handler)).collect())
            .unwrap_or_default();

        for handler in handlers {
            if handler() {
                debug!(command = %name, "Command consumed");
                return true;
            }
        }
        false
    }

    /// Number of handlers registered for `name`
    pub fn handler_count(&self, name: CommandName) -> usize {
        self.state
            .read()
            .handlers
            .get(&name)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        let counts: HashMap<CommandName, usize> = state
            .handlers
            .iter()
            .map(|(name, handlers)| (*name, handlers.len()))
            .collect();
        f.debug_struct("CommandRegistry")
            .field("handlers", &counts)
            .finish()
    }
}
