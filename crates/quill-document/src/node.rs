//! Node types stored in a document snapshot

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a node within one document
///
/// Keys are allocated monotonically by the document and never reused, so a
/// key held across transactions either still names the same node or names
/// nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(pub u64);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity token of the editing session that created a ghost node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random session id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A run of committed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    /// Unique key
    pub key: NodeKey,
    /// Committed text
    pub text: String,
}

/// A speculative, non-committed suggestion displayed inline
///
/// Ghost nodes are never part of the document's text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostNode {
    /// Unique key
    pub key: NodeKey,
    /// Suggested text, not part of the document content
    pub text: String,
    /// Session that inserted this node
    pub session_id: SessionId,
}

/// An inline child of a paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineNode {
    /// Committed text run
    Text(TextNode),
    /// Speculative suggestion
    Ghost(GhostNode),
}

impl InlineNode {
    /// Key of the node regardless of its kind
    pub fn key(&self) -> NodeKey {
        match self {
            InlineNode::Text(node) => node.key,
            InlineNode::Ghost(node) => node.key,
        }
    }

    /// Committed text contributed by this node (empty for ghosts)
    pub fn text_content(&self) -> &str {
        match self {
            InlineNode::Text(node) => &node.text,
            InlineNode::Ghost(_) => "",
        }
    }

    /// The text node, if this is one
    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            InlineNode::Text(node) => Some(node),
            InlineNode::Ghost(_) => None,
        }
    }

    /// The ghost node, if this is one
    pub fn as_ghost(&self) -> Option<&GhostNode> {
        match self {
            InlineNode::Ghost(node) => Some(node),
            InlineNode::Text(_) => None,
        }
    }

    /// Whether this is a ghost node
    pub fn is_ghost(&self) -> bool {
        matches!(self, InlineNode::Ghost(_))
    }
}

/// Content of an inline node before it has been assigned a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineContent {
    /// A committed text run
    Text(String),
    /// A ghost suggestion owned by `session_id`
    Ghost {
        /// Suggested text
        text: String,
        /// Session that will own the ghost node
        session_id: SessionId,
    },
}

impl InlineContent {
    pub(crate) fn into_node(self, key: NodeKey) -> InlineNode {
        match self {
            InlineContent::Text(text) => InlineNode::Text(TextNode { key, text }),
            InlineContent::Ghost { text, session_id } => InlineNode::Ghost(GhostNode {
                key,
                text,
                session_id,
            }),
        }
    }
}

/// A block of inline nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Unique key
    pub key: NodeKey,
    /// Inline children in document order
    pub children: Vec<InlineNode>,
}

impl Paragraph {
    /// Concatenated committed text of the paragraph
    pub fn text_content(&self) -> String {
        self.children.iter().map(InlineNode::text_content).collect()
    }

    /// Committed text of all children before `index`
    pub fn text_before(&self, index: usize) -> String {
        self.children[..index.min(self.children.len())]
            .iter()
            .map(InlineNode::text_content)
            .collect()
    }

    /// Index of the child with `key`
    pub fn position_of(&self, key: NodeKey) -> Option<usize> {
        self.children.iter().position(|child| child.key() == key)
    }
}

/// Where a node lives inside a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLocation {
    /// A paragraph at `index`
    Paragraph {
        /// Index among the document's paragraphs
        index: usize,
    },
    /// Child `index` of paragraph `paragraph`
    Inline {
        /// Index of the containing paragraph
        paragraph: usize,
        /// Index among the paragraph's children
        index: usize,
    },
}
