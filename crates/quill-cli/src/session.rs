//! Line-driven editing session
//!
//! Each input line is either text typed at the caret or a `:command`. The
//! session prints the note after every input and again whenever a suggestion
//! appears, with the ghost text dimmed.

use anyhow::Result;
use quill_autocomplete::{
    ActiveSession, CommandPriority, CommandRegistry, GhostController, GhostRenderer, GhostStyle,
    Key, KeyCombo, Keymap, Modifier,
};
use quill_document::{Document, DocumentError, Subscription, UpdateTag};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::output::OutputStyle;

/// Help text for the `:help` command
pub const HELP: &str = "\
Type text and press Enter to insert it at the caret.
Commands:
  :enter        split the paragraph
  :back         delete one character
  :tab          Tab (accept suggestion)
  :right        Right arrow (accept, or request a suggestion)
  :trigger      Ctrl+Space (request a suggestion now)
  :esc          Escape (dismiss suggestion)
  :key COMBO    any key combo, e.g. :key Ctrl+Space
  :undo :redo   history
  :show         print the note
  :help         this text
  :quit         leave the session
Start a line with '::' to type a literal ':'.";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Text typed at the caret
    Type(String),
    /// `:enter`
    Enter,
    /// `:back`
    Backspace,
    /// A key combo routed through the keymap
    Key(KeyCombo),
    /// `:undo`
    Undo,
    /// `:redo`
    Redo,
    /// `:show`
    Show,
    /// `:help`
    Help,
    /// `:quit`
    Quit,
}

/// Parse one input line
pub fn parse_line(line: &str) -> Result<SessionInput, String> {
    if let Some(rest) = line.strip_prefix("::") {
        return Ok(SessionInput::Type(format!(":{}", rest)));
    }
    let Some(command) = line.strip_prefix(':') else {
        return Ok(SessionInput::Type(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let input = match name.as_str() {
        "enter" => SessionInput::Enter,
        "back" | "backspace" => SessionInput::Backspace,
        "tab" => SessionInput::Key(KeyCombo::new(Key::Tab)),
        "right" => SessionInput::Key(KeyCombo::new(Key::Right)),
        "trigger" => SessionInput::Key(KeyCombo::new(Key::Space).with_modifier(Modifier::Ctrl)),
        "esc" | "escape" => SessionInput::Key(KeyCombo::new(Key::Escape)),
        "key" => {
            let combo = parts
                .next()
                .ok_or_else(|| "usage: :key COMBO".to_string())?;
            SessionInput::Key(combo.parse().map_err(|e| format!("{}", e))?)
        }
        "undo" => SessionInput::Undo,
        "redo" => SessionInput::Redo,
        "show" => SessionInput::Show,
        "help" | "?" => SessionInput::Help,
        "quit" | "q" | "exit" => SessionInput::Quit,
        other => return Err(format!("unknown command ':{}' (try :help)", other)),
    };
    Ok(input)
}

/// What the caller should do after an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the note
    Render,
    /// Print a message
    Message(String),
    /// End the session
    Quit,
}

/// A document, its ghost controller and the key routing around them
pub struct EditorSession {
    document: Document,
    controller: GhostController,
    registry: CommandRegistry,
    keymap: Keymap,
    renderer: GhostRenderer,
}

impl EditorSession {
    /// Wire `controller` to a fresh command registry and `keymap`
    pub fn new(controller: GhostController, keymap: Keymap, active: ActiveSession) -> Self {
        let registry = CommandRegistry::new();
        controller.register_commands(&registry, CommandPriority::High);
        Self {
            document: controller.document().clone(),
            controller,
            registry,
            keymap,
            renderer: GhostRenderer::new(active),
        }
    }

    /// Use a different ghost style when rendering
    pub fn with_ghost_style(mut self, style: GhostStyle) -> Self {
        self.renderer = self.renderer.with_style(style);
        self
    }

    /// The document being edited
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The ghost controller attached to the document
    pub fn controller(&self) -> &GhostController {
        &self.controller
    }

    /// The note with the active session's ghost styled
    pub fn render(&self) -> String {
        self.renderer.render(&self.document.snapshot())
    }

    /// Receive a rendering of the note each time a suggestion is inserted
    pub fn subscribe_suggestions(&self) -> (Subscription, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let document = self.document.clone();
        let renderer = self.renderer.clone();
        let subscription = self.document.on_update(move |update| {
            if update.has_tag(&UpdateTag::SUGGEST) && update.ghosts_changed {
                let _ = sender.send(renderer.render(&document.snapshot()));
            }
        });
        (subscription, receiver)
    }

    /// Apply one input to the document or controller
    pub fn apply(&self, input: SessionInput) -> Result<Outcome> {
        match input {
            SessionInput::Type(text) => {
                self.document.edit(|txn| txn.insert_text(&text))?;
            }
            SessionInput::Enter => {
                self.document.edit(|txn| txn.split_paragraph())?;
            }
            SessionInput::Backspace => {
                self.document.edit(|txn| txn.delete_backward())?;
            }
            SessionInput::Key(combo) => {
                if !self.keymap.handle_key(&combo, &self.registry) {
                    debug!(key = %combo, "Key not consumed, default behaviour");
                    if combo == KeyCombo::new(Key::Tab) {
                        self.document.edit(|txn| txn.insert_text("\t"))?;
                    }
                }
            }
            SessionInput::Undo => return self.history(self.document.undo()),
            SessionInput::Redo => return self.history(self.document.redo()),
            SessionInput::Show => {}
            SessionInput::Help => return Ok(Outcome::Message(HELP.to_string())),
            SessionInput::Quit => return Ok(Outcome::Quit),
        }
        Ok(Outcome::Render)
    }

    fn history(&self, result: Result<(), DocumentError>) -> Result<Outcome> {
        match result {
            Ok(()) => Ok(Outcome::Render),
            Err(DocumentError::HistoryEmpty(action)) => {
                Ok(Outcome::Message(format!("Nothing to {}", action)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read lines from `input` until EOF or `:quit`, echoing to `out`
    pub async fn run<R, W>(&self, input: R, out: &mut W, style: OutputStyle) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let (_subscription, mut suggestions) = self.subscribe_suggestions();
        let mut lines = input.lines();
        writeln!(out, "{}", style.info("Type :help for commands"))?;
        writeln!(out, "{} {}", style.status(&self.controller.phase().to_string()), self.render())?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_line(&line) {
                        Ok(input) => match self.apply(input)? {
                            Outcome::Quit => break,
                            Outcome::Message(message) => writeln!(out, "{}", style.info(&message))?,
                            Outcome::Render => writeln!(
                                out,
                                "{} {}",
                                style.status(&self.controller.phase().to_string()),
                                self.render()
                            )?,
                        },
                        Err(message) => writeln!(out, "{}", style.error(&message))?,
                    }
                }
                Some(rendered) = suggestions.recv() => {
                    writeln!(out, "{} {}", style.status("suggestion"), rendered)?;
                }
            }
            out.flush()?;
        }
        Ok(())
    }
}
