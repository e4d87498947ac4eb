//! Immutable document snapshots

use serde::{Deserialize, Serialize};

use crate::node::{GhostNode, InlineNode, NodeKey, NodeLocation, Paragraph, SessionId, TextNode};
use crate::selection::Selection;

/// One immutable version of the document tree
///
/// Snapshots are shared as `Arc<DocumentSnapshot>`; a transaction clones the
/// current snapshot, mutates its private copy and publishes it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub(crate) paragraphs: Vec<Paragraph>,
    pub(crate) selection: Option<Selection>,
    pub(crate) next_key: u64,
}

impl DocumentSnapshot {
    /// A document with one empty paragraph and the caret inside it
    pub fn empty() -> Self {
        Self::from_paragraphs::<&str>(&[])
    }

    /// Build a snapshot with one text run per paragraph and the caret at the
    /// end of the last paragraph
    pub fn from_paragraphs<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut snapshot = Self {
            paragraphs: Vec::new(),
            selection: None,
            next_key: 1,
        };

        let texts: Vec<&str> = if texts.is_empty() {
            vec![""]
        } else {
            texts.iter().map(AsRef::as_ref).collect()
        };

        for text in texts {
            let paragraph_key = snapshot.allocate_key();
            let text_key = snapshot.allocate_key();
            snapshot.paragraphs.push(Paragraph {
                key: paragraph_key,
                children: vec![InlineNode::Text(TextNode {
                    key: text_key,
                    text: text.to_string(),
                })],
            });
            snapshot.selection = Some(Selection::caret(text_key, text.len()));
        }

        snapshot
    }

    pub(crate) fn allocate_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    /// Paragraphs in document order
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Current selection, if any
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Committed text, paragraphs joined by newlines, ghosts excluded
    pub fn text_content(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Committed text of one paragraph
    pub fn paragraph_text(&self, index: usize) -> Option<String> {
        self.paragraphs.get(index).map(Paragraph::text_content)
    }

    /// Where the node with `key` lives
    pub fn locate(&self, key: NodeKey) -> Option<NodeLocation> {
        for (p, paragraph) in self.paragraphs.iter().enumerate() {
            if paragraph.key == key {
                return Some(NodeLocation::Paragraph { index: p });
            }
            if let Some(index) = paragraph.position_of(key) {
                return Some(NodeLocation::Inline {
                    paragraph: p,
                    index,
                });
            }
        }
        None
    }

    /// Whether any node has `key`
    pub fn contains(&self, key: NodeKey) -> bool {
        self.locate(key).is_some()
    }

    /// Look up an inline node by key
    pub fn inline(&self, key: NodeKey) -> Option<&InlineNode> {
        match self.locate(key)? {
            NodeLocation::Inline { paragraph, index } => {
                Some(&self.paragraphs[paragraph].children[index])
            }
            NodeLocation::Paragraph { .. } => None,
        }
    }

    /// Look up a text node by key
    pub fn text_node(&self, key: NodeKey) -> Option<&TextNode> {
        self.inline(key).and_then(InlineNode::as_text)
    }

    /// Look up a ghost node by key
    pub fn ghost_node(&self, key: NodeKey) -> Option<&GhostNode> {
        self.inline(key).and_then(InlineNode::as_ghost)
    }

    /// Every ghost node in document order
    pub fn ghosts(&self) -> Vec<&GhostNode> {
        self.paragraphs
            .iter()
            .flat_map(|paragraph| paragraph.children.iter())
            .filter_map(InlineNode::as_ghost)
            .collect()
    }

    /// Ghost nodes created by one session
    pub fn ghosts_of(&self, session_id: SessionId) -> Vec<&GhostNode> {
        self.ghosts()
            .into_iter()
            .filter(|ghost| ghost.session_id == session_id)
            .collect()
    }

    /// Copy of this snapshot with every ghost node removed
    pub fn without_ghosts(&self) -> Self {
        let mut copy = self.clone();
        for paragraph in &mut copy.paragraphs {
            paragraph.children.retain(|child| !child.is_ghost());
        }
        copy
    }

    /// Copy `other`'s ghost nodes into this snapshot, each placed after the
    /// node that precedes it in `other`. Ghosts whose preceding node is not
    /// in this snapshot are dropped. Returns how many were kept.
    pub(crate) fn adopt_ghosts(&mut self, other: &DocumentSnapshot) -> usize {
        let mut adopted = 0;
        for paragraph in &other.paragraphs {
            for (index, child) in paragraph.children.iter().enumerate() {
                if !child.is_ghost() || self.contains(child.key()) {
                    continue;
                }
                let Some(previous) = index.checked_sub(1).map(|i| paragraph.children[i].key())
                else {
                    continue;
                };
                if let Some(NodeLocation::Inline { paragraph, index }) = self.locate(previous) {
                    self.paragraphs[paragraph].children.insert(index + 1, child.clone());
                    adopted += 1;
                }
            }
        }
        adopted
    }

    /// Serialize the tree for diagnostics
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for DocumentSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
