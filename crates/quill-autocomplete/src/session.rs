//! Session identity guard
//!
//! Every controller owns a [`SessionId`] and stamps it into the ghost nodes it
//! creates. The editor host owns one [`ActiveSession`] handle naming the
//! session whose ghosts may be shown; a ghost from any other session renders
//! as an empty string. This keeps a suggestion from one editor instance (or
//! a collaborator's replicated tree) from appearing in another.

use parking_lot::RwLock;
use quill_document::{DocumentSnapshot, GhostNode, InlineNode};
use std::sync::Arc;
use tracing::debug;

pub use quill_document::SessionId;

/// Shared handle naming the session whose ghosts are visible
#[derive(Debug, Clone, Default)]
pub struct ActiveSession {
    current: Arc<RwLock<Option<SessionId>>>,
}

impl ActiveSession {
    /// A handle with no active session
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `session` the visible one
    pub fn activate(&self, session: SessionId) {
        *self.current.write() = Some(session);
        debug!(%session, "Session activated");
    }

    /// Clear the active session if it is `session`
    pub fn deactivate(&self, session: SessionId) -> bool {
        let mut current = self.current.write();
        if *current == Some(session) {
            *current = None;
            debug!(%session, "Session deactivated");
            true
        } else {
            false
        }
    }

    /// The active session, if any
    pub fn current(&self) -> Option<SessionId> {
        *self.current.read()
    }

    /// Whether `session` is the active one
    pub fn is_active(&self, session: SessionId) -> bool {
        self.current() == Some(session)
    }
}

/// How visible ghost text is decorated when a snapshot is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GhostStyle {
    /// ANSI dim escape codes
    #[default]
    Dimmed,
    /// Wrapped in square brackets
    Bracketed,
    /// No decoration
    Plain,
}

/// Renders snapshots with only the active session's ghosts visible
#[derive(Debug, Clone)]
pub struct GhostRenderer {
    active: ActiveSession,
    style: GhostStyle,
}

impl GhostRenderer {
    /// Renderer using the default dimmed style
    pub fn new(active: ActiveSession) -> Self {
        Self {
            active,
            style: GhostStyle::default(),
        }
    }

    /// Use a different ghost style
    pub fn with_style(mut self, style: GhostStyle) -> Self {
        self.style = style;
        self
    }

    /// Text shown for one ghost node; empty unless its session is active
    pub fn render_ghost<'a>(&self, ghost: &'a GhostNode) -> &'a str {
        if self.active.is_active(ghost.session_id) {
            &ghost.text
        } else {
            ""
        }
    }

    /// The whole document, paragraphs joined by newlines, with visible ghosts styled
    pub fn render(&self, snapshot: &DocumentSnapshot) -> String {
        snapshot
            .paragraphs()
            .iter()
            .map(|paragraph| {
                let mut line = String::new();
                for child in &paragraph.children {
                    match child {
                        InlineNode::Text(text) => line.push_str(&text.text),
                        InlineNode::Ghost(ghost) => {
                            let visible = self.render_ghost(ghost);
                            if !visible.is_empty() {
                                line.push_str(&self.decorate(visible));
                            }
                        }
                    }
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn decorate(&self, text: &str) -> String {
        match self.style {
            GhostStyle::Dimmed => format!("\x1b[2m{}\x1b[0m", text),
            GhostStyle::Bracketed => format!("[{}]", text),
            GhostStyle::Plain => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_document::{Document, InlineContent, TransactionOptions, UpdateTag};

    fn document_with_ghost(session: SessionId) -> Document {
        let document = Document::with_paragraphs(&["Hello"]);
        let anchor = document.snapshot().selection().unwrap().anchor.key;
        document
            .apply_transaction(TransactionOptions::tagged(UpdateTag::SUGGEST), |txn| {
                txn.insert_inline_after(
                    anchor,
                    InlineContent::Ghost {
                        text: " world".to_string(),
                        session_id: session,
                    },
                )
            })
            .unwrap();
        document
    }

    #[test]
    fn test_active_ghost_renders() {
        let active = ActiveSession::new();
        let session = SessionId::generate();
        active.activate(session);

        let renderer = GhostRenderer::new(active).with_style(GhostStyle::Bracketed);
        let document = document_with_ghost(session);
        assert_eq!(renderer.render(&document.snapshot()), "Hello[ world]");
    }

    #[test]
    fn test_foreign_ghost_renders_empty() {
        let active = ActiveSession::new();
        active.activate(SessionId::generate());

        let renderer = GhostRenderer::new(active).with_style(GhostStyle::Bracketed);
        let document = document_with_ghost(SessionId::generate());
        let snapshot = document.snapshot();
        assert_eq!(renderer.render_ghost(snapshot.ghosts()[0]), "");
        assert_eq!(renderer.render(&snapshot), "Hello");
    }

    #[test]
    fn test_deactivate_only_clears_own_session() {
        let active = ActiveSession::new();
        let mine = SessionId::generate();
        let other = SessionId::generate();
        active.activate(mine);

        assert!(!active.deactivate(other));
        assert!(active.is_active(mine));
        assert!(active.deactivate(mine));
        assert_eq!(active.current(), None);
    }
}
