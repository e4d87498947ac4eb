//! Ghost node controller
//!
//! Owns the lifecycle of at most one speculative suggestion per editing
//! session:
//!
//! ```text
//! Idle --edit--> Debouncing --timer--> Fetching --result--> Showing
//!  ^                 ^  |                  |                   |
//!  |                 +--+ edit restarts    | stale/failed      | edit: remove, Debouncing
//!  +-----------------------------------------+-----------------+ commit/dismiss
//! ```
//!
//! Overlapping async work is resolved with a generation counter. Every real
//! edit, trigger, commit or dismiss bumps the generation and aborts the
//! pending timer; a fetch result is applied only if the generation it was
//! started under is still current.
//!
//! The controller listens to its document and ignores every update carrying
//! one of its own tags (`suggest`, `cancel`, `commit`). Its state lock is never
//! held while a transaction is applied, so its listener may run re-entrantly.

use parking_lot::Mutex;
use quill_document::{
    Document, NodeKey, SessionId, Subscription, TransactionOptions, UpdateInfo, UpdateTag,
};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::commands::{CommandId, CommandName, CommandPriority, CommandRegistry};
use crate::config::{AutocompleteConfig, DEFAULT_DEBOUNCE_MS};
use crate::context::{self, CapturedContext};
use crate::error::{AutocompleteError, AutocompleteResult, FetchError};
use crate::fetcher::{normalize_suggestion, SuggestionFetcher};
use crate::session::ActiveSession;
use crate::state::{GhostSuggestion, SuggestionPhase};

/// Tags the controller applies itself; updates carrying them are not edits
const OWN_TAGS: [UpdateTag; 3] = [UpdateTag::SUGGEST, UpdateTag::CANCEL, UpdateTag::COMMIT];

/// Construction options for [`GhostController`]
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Quiet period after the last edit before fetching
    pub debounce: Duration,
    /// Abort superseded fetch tasks instead of letting them finish
    pub abort_superseded_fetches: bool,
    /// Whether suggestions start enabled
    pub enabled: bool,
    /// Identity stamped on every ghost node this controller inserts
    pub session_id: SessionId,
    /// Note title sent with every request
    pub title: String,
}

impl ControllerOptions {
    /// Options taken from the loaded configuration, with a fresh session id
    pub fn from_config(config: &AutocompleteConfig) -> Self {
        Self {
            debounce: config.debounce(),
            abort_superseded_fetches: config.abort_superseded_fetches,
            enabled: config.enabled,
            ..Self::default()
        }
    }

    /// Use a specific session id
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Override the debounce delay
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the note title sent with requests
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            abort_superseded_fetches: true,
            enabled: true,
            session_id: SessionId::generate(),
            title: String::new(),
        }
    }
}

/// Handle to a ghost controller attached to one document
///
/// Cloning shares the controller. When the last handle is dropped the
/// controller unsubscribes from the document and aborts its tasks; call
/// [`GhostController::detach`] first to also remove a visible ghost.
#[derive(Clone)]
pub struct GhostController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    session_id: SessionId,
    document: Document,
    fetcher: Arc<dyn SuggestionFetcher>,
    active: ActiveSession,
    runtime: Handle,
    debounce: Duration,
    abort_superseded_fetches: bool,
    state: Mutex<ControllerState>,
    subscription: Mutex<Option<Subscription>>,
}

struct ControllerState {
    phase: SuggestionPhase,
    generation: u64,
    ghost: Option<GhostSuggestion>,
    timer: Option<JoinHandle<()>>,
    fetch: Option<JoinHandle<()>>,
    enabled: bool,
    title: String,
}

impl ControllerState {
    /// Invalidate all outstanding async work and return the new generation
    fn supersede(&mut self, abort_fetch: bool) -> u64 {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(fetch) = self.fetch.take() {
            if abort_fetch {
                fetch.abort();
            }
        }
        self.generation
    }
}

impl GhostController {
    /// Attach a controller to `document`, running its tasks on the current
    /// tokio runtime.
    ///
    /// The controller's session becomes the active one.
    pub fn new(
        document: Document,
        fetcher: Arc<dyn SuggestionFetcher>,
        active: ActiveSession,
        options: ControllerOptions,
    ) -> AutocompleteResult<Self> {
        let runtime =
            Handle::try_current().map_err(|e| AutocompleteError::NoRuntime(e.to_string()))?;
        Ok(Self::with_runtime(document, fetcher, active, options, runtime))
    }

    /// Attach a controller whose timers and fetches run on `runtime`
    pub fn with_runtime(
        document: Document,
        fetcher: Arc<dyn SuggestionFetcher>,
        active: ActiveSession,
        options: ControllerOptions,
        runtime: Handle,
    ) -> Self {
        let session_id = options.session_id;
        let inner = Arc::new(ControllerInner {
            session_id,
            document: document.clone(),
            fetcher,
            active: active.clone(),
            runtime,
            debounce: options.debounce,
            abort_superseded_fetches: options.abort_superseded_fetches,
            state: Mutex::new(ControllerState {
                phase: SuggestionPhase::Idle,
                generation: 0,
                ghost: None,
                timer: None,
                fetch: None,
                enabled: options.enabled,
                title: options.title,
            }),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let subscription = document.on_update(move |update: &UpdateInfo| {
            if !update.is_untagged_by(&OWN_TAGS) {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.handle_edit();
            }
        });
        *inner.subscription.lock() = Some(subscription);
        active.activate(session_id);

        info!(
            session = %session_id,
            fetcher = inner.fetcher.name(),
            debounce_ms = options.debounce.as_millis() as u64,
            "Ghost controller attached"
        );
        Self { inner }
    }

    /// Accept the visible suggestion; returns whether one was committed
    pub fn commit(&self) -> bool {
        self.inner.commit()
    }

    /// Commit when showing, otherwise fetch immediately.
    ///
    /// Returns whether the command was consumed: a commit happened or a fetch
    /// was started. A trigger while a fetch is already in flight does nothing.
    pub fn trigger(&self) -> bool {
        self.inner.trigger()
    }

    /// Commit when showing (consumed); otherwise trigger and let the key
    /// through
    pub fn advance(&self) -> bool {
        self.inner.advance()
    }

    /// Hide the visible suggestion without scheduling a new one.
    ///
    /// Consumed only when a ghost was actually removed.
    pub fn dismiss(&self) -> bool {
        self.inner.dismiss()
    }

    /// Run one autocomplete command; returns whether it was consumed
    pub fn execute(&self, command: CommandName) -> bool {
        self.inner.execute(command)
    }

    /// Register a handler for every autocomplete command
    pub fn register_commands(
        &self,
        registry: &CommandRegistry,
        priority: CommandPriority,
    ) -> Vec<CommandId> {
        CommandName::ALL
            .iter()
            .map(|&command| {
                let weak: Weak<ControllerInner> = Arc::downgrade(&self.inner);
                registry.register(command, priority, move || {
                    weak.upgrade()
                        .map_or(false, |inner| inner.execute(command))
                })
            })
            .collect()
    }

    /// Turn suggestions on or off; disabling removes the visible ghost
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.set_enabled(enabled);
    }

    /// Whether suggestions are enabled
    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Change the note title sent with future requests
    pub fn set_title(&self, title: impl Into<String>) {
        self.inner.state.lock().title = title.into();
    }

    /// Stop listening to the document, cancel pending work and remove the ghost
    pub fn detach(&self) {
        let subscription = self.inner.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        self.inner.reset();
        self.inner.sweep_ghosts();
        self.inner.active.deactivate(self.inner.session_id);
        info!(session = %self.inner.session_id, "Ghost controller detached");
    }

    /// Whether the controller still listens to its document
    pub fn is_attached(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SuggestionPhase {
        self.inner.state.lock().phase
    }

    /// The suggestion being shown, if any
    pub fn ghost(&self) -> Option<GhostSuggestion> {
        self.inner.state.lock().ghost.clone()
    }

    /// Generation counter, bumped on every edit and command
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Identity stamped on this controller's ghost nodes
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id
    }

    /// The document this controller is attached to
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Handle deciding which session's ghosts are visible
    pub fn active_session(&self) -> &ActiveSession {
        &self.inner.active
    }
}

impl fmt::Debug for GhostController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("GhostController")
            .field("session_id", &self.inner.session_id)
            .field("phase", &state.phase)
            .field("generation", &state.generation)
            .field("ghost", &state.ghost)
            .finish()
    }
}

impl ControllerInner {
    /// A real edit happened: drop the ghost and restart the debounce.
    ///
    /// Runs after the edit is published, so the ghost is removed by a
    /// follow-up `cancel` transaction queued behind it. Listeners see the
    /// edited snapshot with the stale ghost still present exactly once,
    /// then the `cancel` update without it.
    fn handle_edit(self: &Arc<Self>) {
        let generation = {
            let mut state = self.state.lock();
            if !state.enabled {
                return;
            }
            state.ghost = None;
            let generation = state.supersede(self.abort_superseded_fetches);
            state.phase = SuggestionPhase::Debouncing;
            state.timer = Some(self.spawn_timer(generation));
            generation
        };
        trace!(session = %self.session_id, generation, "Edit observed, debounce restarted");
        self.sweep_ghosts();
    }

    fn spawn_timer(self: &Arc<Self>, generation: u64) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let delay = self.debounce;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.on_debounce_elapsed(generation);
            }
        })
    }

    fn on_debounce_elapsed(self: &Arc<Self>, generation: u64) {
        let snapshot = self.document.snapshot();
        let mut state = self.state.lock();
        if state.generation != generation || state.phase != SuggestionPhase::Debouncing {
            trace!(generation, current = state.generation, "Stale debounce timer ignored");
            return;
        }
        state.timer = None;

        if !self.active.is_active(self.session_id) {
            state.phase = SuggestionPhase::Idle;
            debug!(session = %self.session_id, "Session inactive, skipping fetch");
            return;
        }

        match context::capture_context(&snapshot, &state.title) {
            Ok(captured) => self.start_fetch(&mut state, captured),
            Err(reason) => {
                state.phase = SuggestionPhase::Idle;
                debug!(session = %self.session_id, generation, %reason, "No suggestion context");
            }
        }
    }

    /// Spawn the fetch for the current generation; caller holds the state lock
    fn start_fetch(self: &Arc<Self>, state: &mut ControllerState, captured: CapturedContext) {
        let generation = state.generation;
        state.phase = SuggestionPhase::Fetching;
        debug!(
            session = %self.session_id,
            generation,
            fetcher = self.fetcher.name(),
            "Fetching suggestion"
        );

        let fetcher = Arc::clone(&self.fetcher);
        let weak = Arc::downgrade(self);
        state.fetch = Some(self.runtime.spawn(async move {
            let result = fetcher.fetch(captured.request.clone()).await;
            if let Some(inner) = weak.upgrade() {
                inner.on_fetch_resolved(generation, captured, result);
            }
        }));
    }

    fn on_fetch_resolved(
        &self,
        generation: u64,
        captured: CapturedContext,
        result: Result<String, FetchError>,
    ) {
        let text = {
            let mut state = self.state.lock();
            if state.generation != generation || state.phase != SuggestionPhase::Fetching {
                debug!(
                    session = %self.session_id,
                    generation,
                    current = state.generation,
                    "Discarding stale suggestion"
                );
                return;
            }
            state.fetch = None;

            let text = match result {
                Ok(raw) => normalize_suggestion(&raw),
                Err(error) => {
                    warn!(session = %self.session_id, generation, %error, "Suggestion fetch failed");
                    None
                }
            };
            match text {
                Some(_) if state.ghost.is_some() => {
                    warn!(session = %self.session_id, "Ghost already tracked, dropping suggestion");
                    state.phase = SuggestionPhase::Showing;
                    return;
                }
                Some(text) => text,
                None => {
                    state.phase = SuggestionPhase::Idle;
                    return;
                }
            }
        };

        let session = self.session_id;
        let inserted = self.document.apply_transaction(
            TransactionOptions::tagged(UpdateTag::SUGGEST),
            |txn| context::insert_ghost(txn, captured.anchor, &text, session),
        );
        let key = match inserted {
            Ok(key) => key,
            Err(error) => {
                debug!(session = %session, generation, %error, "Anchor moved, dropping suggestion");
                let mut state = self.state.lock();
                if state.generation == generation {
                    state.phase = SuggestionPhase::Idle;
                }
                return;
            }
        };

        let mut state = self.state.lock();
        if state.generation == generation && state.phase == SuggestionPhase::Fetching {
            info!(session = %session, generation, chars = text.chars().count(), "Showing suggestion");
            state.ghost = Some(GhostSuggestion {
                text,
                anchor_key: key,
                session_id: session,
            });
            state.phase = SuggestionPhase::Showing;
        } else {
            // An edit landed while the ghost was being inserted
            drop(state);
            self.remove_ghost(key);
        }
    }

    fn commit(&self) -> bool {
        if !self.active.is_active(self.session_id) {
            return false;
        }
        let ghost = {
            let mut state = self.state.lock();
            if state.phase != SuggestionPhase::Showing {
                return false;
            }
            let Some(ghost) = state.ghost.take() else {
                state.phase = SuggestionPhase::Idle;
                return false;
            };
            state.supersede(self.abort_superseded_fetches);
            state.phase = SuggestionPhase::Idle;
            ghost
        };

        let session = self.session_id;
        let removed = match self.document.apply_transaction(
            TransactionOptions::tagged(UpdateTag::COMMIT),
            |txn| context::take_ghost(txn, ghost.anchor_key, session),
        ) {
            Ok(removed) => removed,
            Err(error) => {
                debug!(session = %session, %error, "Ghost node gone, nothing to commit");
                return false;
            }
        };

        match self.document.apply_transaction(
            TransactionOptions::tagged(UpdateTag::COMMIT),
            |txn| txn.insert_text_in_paragraph(removed.paragraph, removed.index, &ghost.text),
        ) {
            Ok(_) => {
                info!(session = %session, chars = ghost.text.chars().count(), "Suggestion committed");
                true
            }
            Err(error) => {
                warn!(session = %session, %error, "Failed to insert committed suggestion");
                false
            }
        }
    }

    fn trigger(self: &Arc<Self>) -> bool {
        let phase = self.state.lock().phase;
        match phase {
            SuggestionPhase::Showing => self.commit(),
            SuggestionPhase::Fetching => false,
            SuggestionPhase::Idle | SuggestionPhase::Debouncing => self.fetch_now(),
        }
    }

    fn fetch_now(self: &Arc<Self>) -> bool {
        if !self.active.is_active(self.session_id) {
            return false;
        }
        let snapshot = self.document.snapshot();
        let mut state = self.state.lock();
        if !state.enabled
            || state.ghost.is_some()
            || !matches!(state.phase, SuggestionPhase::Idle | SuggestionPhase::Debouncing)
        {
            return false;
        }

        let generation = state.supersede(self.abort_superseded_fetches);
        match context::capture_context(&snapshot, &state.title) {
            Ok(captured) => {
                self.start_fetch(&mut state, captured);
                true
            }
            Err(reason) => {
                state.phase = SuggestionPhase::Idle;
                debug!(session = %self.session_id, generation, %reason, "Trigger ignored");
                false
            }
        }
    }

    fn advance(self: &Arc<Self>) -> bool {
        if self.state.lock().phase == SuggestionPhase::Showing {
            return self.commit();
        }
        self.trigger();
        false
    }

    fn dismiss(&self) -> bool {
        let had_ghost = self.reset();
        self.sweep_ghosts();
        if had_ghost {
            debug!(session = %self.session_id, "Suggestion dismissed");
        }
        had_ghost
    }

    fn execute(self: &Arc<Self>, command: CommandName) -> bool {
        match command {
            CommandName::Commit => self.commit(),
            CommandName::Advance => self.advance(),
            CommandName::Trigger => self.trigger(),
            CommandName::Dismiss => self.dismiss(),
        }
    }

    fn set_enabled(&self, enabled: bool) {
        {
            let mut state = self.state.lock();
            if state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
        }
        if !enabled {
            self.reset();
            self.sweep_ghosts();
        }
        info!(session = %self.session_id, enabled, "Autocomplete toggled");
    }

    /// Cancel pending work and forget the ghost; returns whether one was tracked
    fn reset(&self) -> bool {
        let mut state = self.state.lock();
        let had_ghost = state.ghost.take().is_some();
        state.supersede(self.abort_superseded_fetches);
        state.phase = SuggestionPhase::Idle;
        had_ghost
    }

    /// Remove every ghost this session owns, tracked or not
    fn sweep_ghosts(&self) {
        let session = self.session_id;
        if self.document.snapshot().ghosts_of(session).is_empty() {
            return;
        }
        match self.document.apply_transaction(
            TransactionOptions::tagged(UpdateTag::CANCEL),
            |txn| context::remove_session_ghosts(txn, session),
        ) {
            Ok(removed) => debug!(session = %session, removed, "Ghost nodes removed"),
            Err(error) => warn!(session = %session, %error, "Failed to remove ghost nodes"),
        }
    }

    fn remove_ghost(&self, key: NodeKey) {
        let session = self.session_id;
        if let Err(error) = self.document.apply_transaction(
            TransactionOptions::tagged(UpdateTag::CANCEL),
            |txn| context::take_ghost(txn, key, session),
        ) {
            trace!(session = %session, %error, "Ghost already removed");
        }
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if let Some(fetch) = state.fetch.take() {
            fetch.abort();
        }
        self.active.deactivate(self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedFetcher(&'static str);

    #[async_trait]
    impl SuggestionFetcher for FixedFetcher {
        async fn fetch(
            &self,
            _request: crate::fetcher::SuggestionRequest,
        ) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    fn controller(document: &Document, text: &'static str) -> GhostController {
        GhostController::new(
            document.clone(),
            Arc::new(FixedFetcher(text)),
            ActiveSession::new(),
            ControllerOptions::default().with_debounce(Duration::from_millis(100)),
        )
        .unwrap()
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = GhostController::new(
            Document::new(),
            Arc::new(FixedFetcher("")),
            ActiveSession::new(),
            ControllerOptions::default(),
        );
        assert!(matches!(result, Err(AutocompleteError::NoRuntime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_moves_to_debouncing() {
        let document = Document::with_paragraphs(&["Hi"]);
        let controller = controller(&document, " there");
        assert_eq!(controller.phase(), SuggestionPhase::Idle);

        document.edit(|txn| txn.insert_text("!")).unwrap();
        assert_eq!(controller.phase(), SuggestionPhase::Debouncing);
        assert_eq!(controller.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_tags_are_not_edits() {
        let document = Document::with_paragraphs(&["Hi"]);
        let controller = controller(&document, " there");

        for tag in OWN_TAGS {
            document
                .apply_transaction(TransactionOptions::tagged(tag), |_| Ok(()))
                .unwrap();
        }
        assert_eq!(controller.phase(), SuggestionPhase::Idle);
        assert_eq!(controller.generation(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_controller_ignores_edits() {
        let document = Document::with_paragraphs(&["Hi"]);
        let controller = controller(&document, " there");
        controller.set_enabled(false);

        document.edit(|txn| txn.insert_text("!")).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.phase(), SuggestionPhase::Idle);
        assert!(document.snapshot().ghosts().is_empty());
        assert!(!controller.trigger());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_unsubscribes_and_deactivates() {
        let document = Document::with_paragraphs(&["Hi"]);
        let controller = controller(&document, " there");
        let active = controller.active_session().clone();
        assert_eq!(document.listener_count(), 1);
        assert!(active.is_active(controller.session_id()));

        drop(controller);
        assert_eq!(document.listener_count(), 0);
        assert_eq!(active.current(), None);
    }
}
