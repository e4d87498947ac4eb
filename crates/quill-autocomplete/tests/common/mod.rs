//! Shared helpers for controller integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use quill_autocomplete::{
    ActiveSession, ControllerOptions, FetchError, GhostController, SuggestionFetcher,
    SuggestionRequest,
};
use quill_document::{Document, Point};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One scripted fetch outcome
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(String),
    ReplyAfter(String, Duration),
    Fail(FetchError),
}

impl Scripted {
    pub fn reply(text: &str) -> Self {
        Scripted::Reply(text.to_string())
    }

    pub fn reply_after(text: &str, millis: u64) -> Self {
        Scripted::ReplyAfter(text.to_string(), Duration::from_millis(millis))
    }
}

/// A recorded fetch call
#[derive(Debug, Clone)]
pub struct Call {
    pub request: SuggestionRequest,
    pub at: Instant,
}

/// Fetcher that replays a script and records every call
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    calls: Mutex<Vec<Call>>,
    completed: AtomicUsize,
}

impl ScriptedFetcher {
    /// Always replies with `text`
    pub fn replying(text: &str) -> Arc<Self> {
        Self::scripted(Vec::new(), Scripted::reply(text))
    }

    /// Plays `script` in order, then `fallback` forever
    pub fn scripted(script: Vec<Scripted>, fallback: Scripted) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Fetches that ran to completion (aborted ones never do)
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SuggestionFetcher for ScriptedFetcher {
    async fn fetch(&self, request: SuggestionRequest) -> Result<String, FetchError> {
        self.calls.lock().push(Call {
            request,
            at: Instant::now(),
        });
        let next = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let result = match next {
            Scripted::Reply(text) => Ok(text),
            Scripted::ReplyAfter(text, delay) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Scripted::Fail(error) => Err(error),
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub const DEBOUNCE: Duration = Duration::from_millis(3000);

/// Controller with the default 3 s debounce and its own active session
pub fn attach(document: &Document, fetcher: Arc<ScriptedFetcher>) -> GhostController {
    attach_with(document, fetcher, ActiveSession::new(), ControllerOptions::default())
}

pub fn attach_with(
    document: &Document,
    fetcher: Arc<ScriptedFetcher>,
    active: ActiveSession,
    options: ControllerOptions,
) -> GhostController {
    GhostController::new(document.clone(), fetcher, active, options)
        .expect("tests run inside a tokio runtime")
}

/// Let spawned tasks run without moving time forward meaningfully
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn wait(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

pub fn type_text(document: &Document, text: &str) {
    document
        .edit(|txn| txn.insert_text(text))
        .expect("typing at the caret succeeds");
}

pub fn caret(document: &Document) -> Point {
    document
        .snapshot()
        .selection()
        .expect("document has a selection")
        .anchor
}
