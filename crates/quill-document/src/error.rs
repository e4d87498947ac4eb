//! Error types for document transactions

use thiserror::Error;

use crate::node::NodeKey;

/// Result alias used throughout the document crate
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors that can occur while mutating a document inside a transaction
///
/// Returning any of these from a mutator rolls the transaction back: the
/// current snapshot is left untouched and no listener is notified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The referenced node does not exist in the snapshot
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    /// The referenced node exists but is not a text run
    #[error("Node is not a text node: {0}")]
    NotATextNode(NodeKey),

    /// The referenced node is not an inline node (e.g. a paragraph key was given)
    #[error("Node is not an inline node: {0}")]
    NotAnInlineNode(NodeKey),

    /// The referenced node is not a paragraph
    #[error("Node is not a paragraph: {0}")]
    NotAParagraph(NodeKey),

    /// The document has no selection
    #[error("No selection")]
    NoSelection,

    /// The selection is not where the caller expected it to be
    #[error("Selection does not match the expected position")]
    SelectionMismatch,

    /// A selection spanning several nodes was used where a single node is required
    #[error("Selection spans multiple nodes")]
    UnsupportedRange,

    /// Offset past the end of a text node or not on a char boundary
    #[error("Invalid offset {offset} for node {key} (length {len})")]
    InvalidOffset {
        /// Node the offset refers to
        key: NodeKey,
        /// Requested byte offset
        offset: usize,
        /// Length of the node's text in bytes
        len: usize,
    },

    /// Undo/redo requested with an empty stack
    #[error("Nothing to {0}")]
    HistoryEmpty(&'static str),
}

impl DocumentError {
    /// Create an InvalidOffset error
    pub fn invalid_offset(key: NodeKey, offset: usize, len: usize) -> Self {
        Self::InvalidOffset { key, offset, len }
    }
}
