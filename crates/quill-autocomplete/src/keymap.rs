//! Key combinations and the key-to-command map

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::commands::{CommandName, CommandRegistry};
use crate::config::KeymapConfig;
use crate::error::ConfigError;

/// A keyboard modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// Control
    Ctrl,
    /// Shift
    Shift,
    /// Alt / Option
    Alt,
    /// Meta / Cmd / Super
    Meta,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Ctrl => write!(f, "Ctrl"),
            Modifier::Shift => write!(f, "Shift"),
            Modifier::Alt => write!(f, "Alt"),
            Modifier::Meta => write!(f, "Meta"),
        }
    }
}

impl FromStr for Modifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ctrl" | "control" => Ok(Modifier::Ctrl),
            "shift" => Ok(Modifier::Shift),
            "alt" | "option" => Ok(Modifier::Alt),
            "meta" | "cmd" | "command" | "super" => Ok(Modifier::Meta),
            _ => Err(ConfigError::invalid_binding(s, "unknown modifier")),
        }
    }
}

/// A key on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A printable character
    Char(char),
    /// Space bar
    Space,
    /// Enter / Return
    Enter,
    /// Escape
    Escape,
    /// Tab
    Tab,
    /// Backspace
    Backspace,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Space => write!(f, "Space"),
            Key::Enter => write!(f, "Enter"),
            Key::Escape => write!(f, "Escape"),
            Key::Tab => write!(f, "Tab"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
        }
    }
}

impl FromStr for Key {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Err(ConfigError::invalid_binding(s, "missing key")),
            "space" => Ok(Key::Space),
            "enter" | "return" => Ok(Key::Enter),
            "escape" | "esc" => Ok(Key::Escape),
            "tab" => Ok(Key::Tab),
            "backspace" => Ok(Key::Backspace),
            "up" | "arrowup" => Ok(Key::Up),
            "down" | "arrowdown" => Ok(Key::Down),
            "left" | "arrowleft" => Ok(Key::Left),
            "right" | "arrowright" => Ok(Key::Right),
            _ => {
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Key::Char(c.to_ascii_lowercase())),
                    _ => Err(ConfigError::invalid_binding(s, "unknown key")),
                }
            }
        }
    }
}

/// Modifiers plus a key
///
/// Modifiers are kept sorted and deduplicated, so `Shift+Ctrl+K` and
/// `Ctrl+Shift+K` are the same combo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCombo {
    /// Sorted, deduplicated modifiers
    pub modifiers: Vec<Modifier>,
    /// The key pressed with them
    pub key: Key,
}

impl KeyCombo {
    /// A combo with no modifiers
    pub fn new(key: Key) -> Self {
        Self {
            modifiers: Vec::new(),
            key,
        }
    }

    /// Add a modifier
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self.modifiers.sort();
        self.modifiers.dedup();
        self
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(ConfigError::invalid_binding(s, "empty key combination"));
        };

        let key = Key::from_str(key).map_err(|_| {
            ConfigError::invalid_binding(s, format!("unknown or missing key '{}'", key.trim()))
        })?;
        let mut combo = KeyCombo::new(key);
        for modifier in modifiers {
            combo = combo.with_modifier(Modifier::from_str(modifier).map_err(|_| {
                ConfigError::invalid_binding(s, format!("unknown modifier '{}'", modifier.trim()))
            })?);
        }
        Ok(combo)
    }
}

/// Maps key combos to autocomplete commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<KeyCombo, CommandName>,
}

impl Keymap {
    /// A keymap with no bindings
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Build a keymap from configured binding strings
    pub fn from_config(config: &KeymapConfig) -> Result<Self, ConfigError> {
        let mut keymap = Self::empty();
        keymap.bind(config.commit.parse()?, CommandName::Commit);
        keymap.bind(config.advance.parse()?, CommandName::Advance);
        keymap.bind(config.trigger.parse()?, CommandName::Trigger);
        keymap.bind(config.dismiss.parse()?, CommandName::Dismiss);
        Ok(keymap)
    }

    /// Bind a combo, returning the command it was previously bound to
    pub fn bind(&mut self, combo: KeyCombo, command: CommandName) -> Option<CommandName> {
        self.bindings.insert(combo, command)
    }

    /// Remove a binding, returning the command it was bound to
    pub fn unbind(&mut self, combo: &KeyCombo) -> Option<CommandName> {
        self.bindings.remove(combo)
    }

    /// Command bound to `combo`
    pub fn command_for(&self, combo: &KeyCombo) -> Option<CommandName> {
        self.bindings.get(combo).copied()
    }

    /// Every combo bound to `command`
    pub fn combos_for(&self, command: CommandName) -> Vec<&KeyCombo> {
        self.bindings
            .iter()
            .filter(|(_, bound)| **bound == command)
            .map(|(combo, _)| combo)
            .collect()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no combo is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Dispatch the command bound to `combo`.
    ///
    /// Returns whether the key was consumed; unbound keys never are.
    pub fn handle_key(&self, combo: &KeyCombo, registry: &CommandRegistry) -> bool {
        match self.command_for(combo) {
            Some(command) => {
                let consumed = registry.dispatch(command);
                trace!(key = %combo, %command, consumed, "Key handled");
                consumed
            }
            None => false,
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        keymap.bind(KeyCombo::new(Key::Tab), CommandName::Commit);
        keymap.bind(KeyCombo::new(Key::Right), CommandName::Advance);
        keymap.bind(
            KeyCombo::new(Key::Space).with_modifier(Modifier::Ctrl),
            CommandName::Trigger,
        );
        keymap.bind(KeyCombo::new(Key::Escape), CommandName::Dismiss);
        keymap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_keys() {
        assert_eq!("Tab".parse::<KeyCombo>().unwrap(), KeyCombo::new(Key::Tab));
        assert_eq!("ArrowRight".parse::<KeyCombo>().unwrap(), KeyCombo::new(Key::Right));
        assert_eq!("esc".parse::<KeyCombo>().unwrap(), KeyCombo::new(Key::Escape));
    }

    #[test]
    fn test_modifier_order_is_irrelevant() {
        let a: KeyCombo = "Ctrl+Shift+K".parse().unwrap();
        let b: KeyCombo = "shift+ctrl+k".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Ctrl+Shift+k");
    }

    #[test]
    fn test_invalid_combos() {
        assert!("Ctrl+".parse::<KeyCombo>().is_err());
        assert!("Hyper+K".parse::<KeyCombo>().is_err());
        assert!("PageSideways".parse::<KeyCombo>().is_err());
    }

    #[test]
    fn test_default_matches_default_config() {
        let from_config = Keymap::from_config(&KeymapConfig::default()).unwrap();
        assert_eq!(from_config, Keymap::default());
        assert_eq!(from_config.len(), 4);
    }
}
