//! The document handle: atomic tagged transactions and ordered listeners

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

use crate::error::{DocumentError, DocumentResult};
use crate::history::History;
use crate::snapshot::DocumentSnapshot;
use crate::tags::{TransactionOptions, UpdateInfo, UpdateTag};
use crate::transaction::Transaction;

/// Callback fired once per applied transaction
pub type UpdateListener = Arc<dyn Fn(&UpdateInfo) + Send + Sync>;

/// Identifier of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Shared handle to a mutable document
///
/// Cloning the handle shares the same document. Every change goes through
/// [`Document::apply_transaction`], which publishes a new immutable snapshot
/// and then notifies listeners.
///
/// Notifications are delivered strictly in transaction order. A transaction
/// applied from inside a listener is published immediately, but its
/// notification is queued until the current one has reached every listener.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

struct DocumentInner {
    state: Mutex<DocumentState>,
    next_listener_id: AtomicU64,
}

struct DocumentState {
    current: Arc<DocumentSnapshot>,
    listeners: Vec<(ListenerId, UpdateListener)>,
    pending: VecDeque<UpdateInfo>,
    dispatching: bool,
    history: History,
}

impl Document {
    /// An empty document with one paragraph
    pub fn new() -> Self {
        Self::from_snapshot(DocumentSnapshot::empty())
    }

    /// A document with one paragraph per entry and the caret at the end
    pub fn with_paragraphs<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::from_snapshot(DocumentSnapshot::from_paragraphs(texts))
    }

    /// A document starting from `snapshot` with empty history
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        Self::with_history(snapshot, History::new())
    }

    /// A document starting from `snapshot` with the given history
    pub fn with_history(snapshot: DocumentSnapshot, history: History) -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                state: Mutex::new(DocumentState {
                    current: Arc::new(snapshot),
                    listeners: Vec::new(),
                    pending: VecDeque::new(),
                    dispatching: false,
                    history,
                }),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    /// Run `mutator` against a copy of the current snapshot and publish it.
    ///
    /// If the mutator returns an error nothing is published and no listener
    /// fires. The mutator must not call back into this document; it reads
    /// the in-progress state through [`Transaction::snapshot`].
    pub fn apply_transaction<R, F>(&self, options: TransactionOptions, mutator: F) -> DocumentResult<R>
    where
        F: FnOnce(&mut Transaction<'_>) -> DocumentResult<R>,
    {
        let result = {
            let mut state = self.inner.state.lock();
            let mut draft = (*state.current).clone();
            let mut txn = Transaction::new(&mut draft);
            let result = mutator(&mut txn)?;
            let (content_changed, ghosts_changed) = txn.changes();

            if content_changed && History::records(&options.tags) {
                let previous = Arc::clone(&state.current);
                state.history.record(&previous);
            }

            state.current = Arc::new(draft);
            trace!(
                tags = ?options.tags,
                content_changed,
                ghosts_changed,
                "Transaction applied"
            );
            state.pending.push_back(UpdateInfo {
                tags: options.tags,
                content_changed,
                ghosts_changed,
            });
            result
        };

        self.dispatch_pending();
        Ok(result)
    }

    /// Shorthand for an untagged transaction
    pub fn edit<R, F>(&self, mutator: F) -> DocumentResult<R>
    where
        F: FnOnce(&mut Transaction<'_>) -> DocumentResult<R>,
    {
        self.apply_transaction(TransactionOptions::user_edit(), mutator)
    }

    /// Read the current snapshot without producing a transaction
    pub fn read<R>(&self, reader: impl FnOnce(&DocumentSnapshot) -> R) -> R {
        let snapshot = self.snapshot();
        reader(&snapshot)
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<DocumentSnapshot> {
        Arc::clone(&self.inner.state.lock().current)
    }

    /// Register a listener; it stays registered while the returned
    /// subscription is alive
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn on_update<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&UpdateInfo) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .state
            .lock()
            .listeners
            .push((id, Arc::new(listener)));
        debug!(listener = id.0, "Update listener registered");
        Subscription {
            document: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }

    /// Restore the state preceding the last recorded content change
    pub fn undo(&self) -> DocumentResult<()> {
        self.replay_history(true)
    }

    /// Re-apply the last undone change
    pub fn redo(&self) -> DocumentResult<()> {
        self.replay_history(false)
    }

    /// Whether an undo step is available
    pub fn can_undo(&self) -> bool {
        self.inner.state.lock().history.can_undo()
    }

    /// Whether a redo step is available
    pub fn can_redo(&self) -> bool {
        self.inner.state.lock().history.can_redo()
    }

    fn replay_history(&self, undo: bool) -> DocumentResult<()> {
        {
            let mut state = self.inner.state.lock();
            let current = Arc::clone(&state.current);
            let restored = if undo {
                state.history.undo(&current)
            } else {
                state.history.redo(&current)
            }
            .ok_or(DocumentError::HistoryEmpty(if undo { "undo" } else { "redo" }))?;

            // Keys are never reused, even across history jumps
            let mut restored = (*restored).clone();
            restored.next_key = restored.next_key.max(current.next_key);
            // History is ghost-free; ghosts visible now stay where their
            // preceding node survives and their owners decide their fate
            let adopted = restored.adopt_ghosts(&current);
            state.current = Arc::new(restored);
            state.pending.push_back(UpdateInfo {
                tags: TransactionOptions::tagged(UpdateTag::HISTORIC).tags,
                content_changed: true,
                ghosts_changed: adopted != current.ghosts().len(),
            });
        }
        self.dispatch_pending();
        Ok(())
    }

    fn dispatch_pending(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        let mut guard = DispatchGuard {
            inner: &self.inner,
            armed: true,
        };

        loop {
            let (info, listeners) = {
                let mut state = self.inner.state.lock();
                match state.pending.pop_front() {
                    Some(info) => {
                        let listeners: Vec<UpdateListener> = state
                            .listeners
                            .iter()
                            .map(|(_, listener)| Arc::clone(listener))
                            .collect();
                        (info, listeners)
                    }
                    None => {
                        // Cleared under the same lock that saw the queue empty
                        state.dispatching = false;
                        guard.armed = false;
                        break;
                    }
                }
            };
            for listener in listeners {
                listener(&info);
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Document")
            .field("text", &state.current.text_content())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// Resets the dispatching flag if a listener panics
struct DispatchGuard<'a> {
    inner: &'a DocumentInner,
    armed: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.state.lock().dispatching = false;
        }
    }
}

/// Registration of an update listener
///
/// Dropping the subscription unregisters the listener.
pub struct Subscription {
    document: Weak<DocumentInner>,
    id: Option<ListenerId>,
}

impl Subscription {
    /// Listener id, `None` once unsubscribed
    pub fn id(&self) -> Option<ListenerId> {
        self.id
    }

    /// Unregister the listener now
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(document) = self.document.upgrade() {
            document
                .state
                .lock()
                .listeners
                .retain(|(listener_id, _)| *listener_id != id);
            debug!(listener = id.0, "Update listener removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
