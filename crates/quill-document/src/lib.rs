//! Quill document model
//!
//! A small rich-text document engine built around one rule: the tree is
//! never mutated in place. Every change runs inside a scoped, tagged
//! transaction against a private copy of the current snapshot, which is then
//! published atomically and announced to update listeners in order.
//!
//! # Building blocks
//!
//! - [`DocumentSnapshot`]: immutable tree of paragraphs, text runs and ghost
//!   nodes, plus the selection
//! - [`Transaction`]: the mutation API available inside a transaction
//! - [`Document`]: shared handle that applies transactions, delivers
//!   [`UpdateInfo`] to listeners and keeps undo/redo [`History`]
//! - [`UpdateTag`]: labels that let listeners tell mutation sources apart
//!
//! # Example
//!
//! ```
//! use quill_document::{Document, TransactionOptions, UpdateTag};
//!
//! let document = Document::with_paragraphs(&["Hello"]);
//! let _subscription = document.on_update(|info| {
//!     if info.has_tag(&UpdateTag::SUGGEST) {
//!         return;
//!     }
//!     println!("user edit, tags: {:?}", info.tags);
//! });
//!
//! document.edit(|txn| txn.insert_text(" world")).unwrap();
//! assert_eq!(document.snapshot().text_content(), "Hello world");
//! ```

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod history;
pub mod node;
pub mod selection;
pub mod snapshot;
pub mod tags;
pub mod transaction;

pub use document::{Document, ListenerId, Subscription, UpdateListener};
pub use error::{DocumentError, DocumentResult};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use node::{
    GhostNode, InlineContent, InlineNode, NodeKey, NodeLocation, Paragraph, SessionId, TextNode,
};
pub use selection::{Point, Selection};
pub use snapshot::DocumentSnapshot;
pub use tags::{TransactionOptions, UpdateInfo, UpdateTag};
pub use transaction::{RemovedNode, Transaction};
