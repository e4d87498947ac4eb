/// Property-based tests for the ghost controller
///
/// Property: for any interleaving of typing, caret movement, waiting, undo
/// and commands, the document holds at most one ghost node, and it holds
/// exactly one precisely when the controller reports `Showing`.
mod common;

use common::*;
use proptest::prelude::*;
use quill_autocomplete::{ActiveSession, ControllerOptions, SuggestionPhase};
use quill_document::Document;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Type(String),
    Backspace,
    Enter,
    CaretToStart,
    Wait(u64),
    Trigger,
    Commit,
    Dismiss,
    Undo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => "[a-z ]{1,3}".prop_map(Op::Type),
        1 => Just(Op::Backspace),
        1 => Just(Op::Enter),
        1 => Just(Op::CaretToStart),
        4 => (0u64..800).prop_map(Op::Wait),
        2 => Just(Op::Trigger),
        2 => Just(Op::Commit),
        1 => Just(Op::Dismiss),
        1 => Just(Op::Undo),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_at_most_one_ghost(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();

        runtime.block_on(async move {
            let document = Document::with_paragraphs(&["Start"]);
            let fetcher = ScriptedFetcher::scripted(
                vec![Scripted::reply_after(" slow", 400)],
                Scripted::reply_after(" next", 150),
            );
            let controller = attach_with(
                &document,
                fetcher,
                ActiveSession::new(),
                ControllerOptions::default().with_debounce(Duration::from_millis(300)),
            );

            for op in ops {
                match op {
                    Op::Type(text) => type_text(&document, &text),
                    Op::Backspace => {
                        let _ = document.edit(|txn| txn.delete_backward());
                    }
                    Op::Enter => {
                        let _ = document.edit(|txn| txn.split_paragraph());
                    }
                    Op::CaretToStart => {
                        let key = caret(&document).key;
                        document.edit(|txn| txn.move_caret(key, 0)).unwrap();
                    }
                    Op::Wait(millis) => wait(millis).await,
                    Op::Trigger => {
                        controller.trigger();
                    }
                    Op::Commit => {
                        controller.commit();
                    }
                    Op::Dismiss => {
                        controller.dismiss();
                    }
                    Op::Undo => {
                        let _ = document.undo();
                    }
                }
                settle().await;

                let snapshot = document.snapshot();
                let ghosts = snapshot.ghosts();
                assert!(ghosts.len() <= 1, "more than one ghost: {:?}", ghosts);
                let showing = controller.phase() == SuggestionPhase::Showing;
                assert_eq!(ghosts.len() == 1, showing);
                if let Some(ghost) = controller.ghost() {
                    assert_eq!(snapshot.ghost_node(ghost.anchor_key).map(|g| &g.text), Some(&ghost.text));
                }
            }
        });
    }
}
