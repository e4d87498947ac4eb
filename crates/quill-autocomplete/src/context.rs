//! Reading request context from a snapshot and editing ghost nodes
//!
//! The controller talks to the document only through these helpers, so the
//! rules for where a ghost may appear live in one place.

use quill_document::{
    DocumentError, DocumentResult, DocumentSnapshot, InlineContent, NodeKey, NodeLocation, Point,
    RemovedNode, SessionId, Transaction,
};
use thiserror::Error;

use crate::fetcher::SuggestionRequest;

/// Request context plus the caret it was captured at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedContext {
    /// Caret at the end of the text node the ghost will follow
    pub anchor: Point,
    /// Context sent to the fetcher
    pub request: SuggestionRequest,
}

/// Why no context could be captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextRejection {
    /// The document has no selection
    #[error("document has no selection")]
    NoSelection,
    /// The selection spans a range
    #[error("selection is a range")]
    RangeSelection,
    /// The caret is outside any text node
    #[error("caret is not inside a text node")]
    NotInText,
    /// The caret is not at the end of its text node
    #[error("caret is not at the end of its text node")]
    CaretNotAtEnd,
}

/// Capture the request context at the caret.
///
/// Only a collapsed caret at the very end of a text node qualifies; a
/// suggestion is never offered in the middle of a word or line.
pub fn capture_context(
    snapshot: &DocumentSnapshot,
    title: &str,
) -> Result<CapturedContext, ContextRejection> {
    let selection = snapshot.selection().ok_or(ContextRejection::NoSelection)?;
    if !selection.is_collapsed() {
        return Err(ContextRejection::RangeSelection);
    }
    let anchor = selection.anchor;
    let node = snapshot
        .text_node(anchor.key)
        .ok_or(ContextRejection::NotInText)?;
    if anchor.offset != node.text.len() {
        return Err(ContextRejection::CaretNotAtEnd);
    }
    let Some(NodeLocation::Inline { paragraph, index }) = snapshot.locate(anchor.key) else {
        return Err(ContextRejection::NotInText);
    };

    let paragraphs = snapshot.paragraphs();
    let mut prefix = paragraphs[paragraph].text_before(index);
    prefix.push_str(&node.text);

    let neighbour = |index: Option<usize>| {
        index
            .and_then(|i| snapshot.paragraph_text(i))
            .filter(|text| !text.is_empty())
    };

    Ok(CapturedContext {
        anchor,
        request: SuggestionRequest {
            title: title.to_string(),
            previous_paragraph: neighbour(paragraph.checked_sub(1)),
            current_paragraph_prefix: Some(prefix).filter(|text| !text.is_empty()),
            next_paragraph: neighbour(Some(paragraph + 1)),
        },
    })
}

/// Insert a ghost after `anchor`, first removing any ghost `session` already owns.
///
/// Fails if the caret moved away from `anchor` or the anchor text changed
/// length since the context was captured.
pub fn insert_ghost(
    txn: &mut Transaction<'_>,
    anchor: Point,
    text: &str,
    session: SessionId,
) -> DocumentResult<NodeKey> {
    let selection = txn.selection().ok_or(DocumentError::NoSelection)?;
    if !selection.is_collapsed() || selection.anchor != anchor {
        return Err(DocumentError::SelectionMismatch);
    }
    let len = txn
        .snapshot()
        .text_node(anchor.key)
        .ok_or(DocumentError::NodeNotFound(anchor.key))?
        .text
        .len();
    if len != anchor.offset {
        return Err(DocumentError::invalid_offset(anchor.key, anchor.offset, len));
    }

    remove_session_ghosts(txn, session)?;
    txn.insert_inline_after(
        anchor.key,
        InlineContent::Ghost {
            text: text.to_string(),
            session_id: session,
        },
    )
}

/// Remove every ghost node owned by `session`; returns how many were removed
pub fn remove_session_ghosts(txn: &mut Transaction<'_>, session: SessionId) -> DocumentResult<usize> {
    let keys: Vec<NodeKey> = txn
        .snapshot()
        .ghosts_of(session)
        .into_iter()
        .map(|ghost| ghost.key)
        .collect();
    for key in &keys {
        txn.remove_node(*key)?;
    }
    Ok(keys.len())
}

/// Remove the ghost `key` if `session` owns it
pub fn take_ghost(
    txn: &mut Transaction<'_>,
    key: NodeKey,
    session: SessionId,
) -> DocumentResult<RemovedNode> {
    match txn.snapshot().ghost_node(key) {
        Some(ghost) if ghost.session_id == session => txn.remove_node(key),
        _ => Err(DocumentError::NodeNotFound(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_document::{Document, Selection, TransactionOptions, UpdateTag};

    fn caret(document: &Document) -> Point {
        document.snapshot().selection().unwrap().anchor
    }

    #[test]
    fn test_capture_includes_neighbours() {
        let document = Document::with_paragraphs(&["Intro", "", "The quick brown"]);
        let context = capture_context(&document.snapshot(), "Fox").unwrap();
        assert_eq!(context.request.title, "Fox");
        assert_eq!(context.request.previous_paragraph, None);
        assert_eq!(
            context.request.current_paragraph_prefix.as_deref(),
            Some("The quick brown")
        );
        assert_eq!(context.request.next_paragraph, None);

        let document = Document::with_paragraphs(&["Intro", "Body", "Outro"]);
        let middle = document.snapshot().paragraphs()[1].children[0].key();
        document.edit(|txn| txn.move_caret(middle, 4)).unwrap();
        let context = capture_context(&document.snapshot(), "").unwrap();
        assert_eq!(context.request.previous_paragraph.as_deref(), Some("Intro"));
        assert_eq!(context.request.next_paragraph.as_deref(), Some("Outro"));
        assert_eq!(context.anchor, Point::new(middle, 4));
    }

    #[test]
    fn test_capture_rejects_mid_word_caret() {
        let document = Document::with_paragraphs(&["Hello"]);
        let key = caret(&document).key;
        document.edit(|txn| txn.move_caret(key, 2)).unwrap();
        assert_eq!(
            capture_context(&document.snapshot(), ""),
            Err(ContextRejection::CaretNotAtEnd)
        );
    }

    #[test]
    fn test_capture_rejects_range() {
        let document = Document::with_paragraphs(&["Hello"]);
        let key = caret(&document).key;
        document
            .edit(|txn| txn.set_selection(Selection::range(Point::new(key, 0), Point::new(key, 5))))
            .unwrap();
        assert_eq!(
            capture_context(&document.snapshot(), ""),
            Err(ContextRejection::RangeSelection)
        );
    }

    #[test]
    fn test_empty_paragraph_has_no_prefix() {
        let document = Document::new();
        let context = capture_context(&document.snapshot(), "").unwrap();
        assert_eq!(context.request.current_paragraph_prefix, None);
    }

    #[test]
    fn test_insert_ghost_replaces_own_strays() {
        let document = Document::with_paragraphs(&["Hello"]);
        let anchor = caret(&document);
        let session = SessionId::generate();
        let options = || TransactionOptions::tagged(UpdateTag::SUGGEST);

        document
            .apply_transaction(options(), |txn| insert_ghost(txn, anchor, " one", session))
            .unwrap();
        let second = document
            .apply_transaction(options(), |txn| insert_ghost(txn, anchor, " two", session))
            .unwrap();

        let snapshot = document.snapshot();
        let ghosts = snapshot.ghosts_of(session);
        assert_eq!(ghosts.len(), 1);
        assert_eq!(ghosts[0].key, second);
        assert_eq!(ghosts[0].text, " two");
    }

    #[test]
    fn test_insert_ghost_rejects_moved_caret() {
        let document = Document::with_paragraphs(&["Hello"]);
        let anchor = caret(&document);
        document.edit(|txn| txn.insert_text("!")).unwrap();

        let result = document.apply_transaction(
            TransactionOptions::tagged(UpdateTag::SUGGEST),
            |txn| insert_ghost(txn, anchor, " world", SessionId::generate()),
        );
        assert_eq!(result, Err(DocumentError::SelectionMismatch));
        assert!(document.snapshot().ghosts().is_empty());
    }

    #[test]
    fn test_take_ghost_checks_owner() {
        let document = Document::with_paragraphs(&["Hello"]);
        let anchor = caret(&document);
        let owner = SessionId::generate();
        let key = document
            .apply_transaction(TransactionOptions::tagged(UpdateTag::SUGGEST), |txn| {
                insert_ghost(txn, anchor, " world", owner)
            })
            .unwrap();

        let foreign = document.apply_transaction(TransactionOptions::tagged(UpdateTag::COMMIT), |txn| {
            take_ghost(txn, key, SessionId::generate())
        });
        assert_eq!(foreign, Err(DocumentError::NodeNotFound(key)));

        let removed = document
            .apply_transaction(TransactionOptions::tagged(UpdateTag::COMMIT), |txn| {
                take_ghost(txn, key, owner)
            })
            .unwrap();
        assert_eq!(removed.index, 1);
    }
}
