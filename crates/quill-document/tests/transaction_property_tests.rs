/// Property-based tests for transactions
///
/// Property: for any sequence of edits, every successful transaction is
/// announced exactly once, failed transactions are never announced, and the
/// selection always points at a valid position inside a text node.

use proptest::prelude::*;
use quill_document::{Document, InlineContent, SessionId, TransactionOptions, UpdateTag};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Type(String),
    Backspace,
    Enter,
    InsertGhost(String),
    RemoveFirstGhost,
    Undo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => "[a-zé ]{1,4}".prop_map(Op::Type),
        2 => Just(Op::Backspace),
        1 => Just(Op::Enter),
        1 => "[a-z ]{1,6}".prop_map(Op::InsertGhost),
        1 => Just(Op::RemoveFirstGhost),
        1 => Just(Op::Undo),
    ]
}

proptest! {
    #[test]
    fn prop_each_applied_transaction_notifies_once(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let document = Document::new();
        let session = SessionId::generate();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _subscription = document.on_update(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut applied = 0usize;
        for op in ops {
            let outcome = match op {
                Op::Type(text) => document.edit(|txn| txn.insert_text(&text)).is_ok(),
                Op::Backspace => document.edit(|txn| txn.delete_backward()).is_ok(),
                Op::Enter => document.edit(|txn| txn.split_paragraph().map(|_| ())).is_ok(),
                Op::InsertGhost(text) => {
                    let anchor = document.snapshot().selection().map(|s| s.anchor.key);
                    match anchor {
                        Some(anchor) => document
                            .apply_transaction(TransactionOptions::tagged(UpdateTag::SUGGEST), |txn| {
                                txn.insert_inline_after(
                                    anchor,
                                    InlineContent::Ghost { text: text.clone(), session_id: session },
                                )
                            })
                            .is_ok(),
                        None => false,
                    }
                }
                Op::RemoveFirstGhost => {
                    let ghost = document.snapshot().ghosts().first().map(|g| g.key);
                    match ghost {
                        Some(key) => document
                            .apply_transaction(TransactionOptions::tagged(UpdateTag::CANCEL), |txn| {
                                txn.remove_node(key).map(|_| ())
                            })
                            .is_ok(),
                        None => false,
                    }
                }
                Op::Undo => document.undo().is_ok(),
            };
            if outcome {
                applied += 1;
            }

            let snapshot = document.snapshot();
            let selection = snapshot.selection().copied();
            prop_assert!(selection.is_some());
            let caret = selection.unwrap().anchor;
            let node = snapshot.text_node(caret.key);
            prop_assert!(node.is_some());
            let node = node.unwrap();
            prop_assert!(caret.offset <= node.text.len());
            prop_assert!(node.text.is_char_boundary(caret.offset));
        }

        prop_assert_eq!(notified.load(Ordering::SeqCst), applied);
    }
}
