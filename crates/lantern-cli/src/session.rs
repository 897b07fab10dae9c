//! Chat session: transcript plus the single in-flight query

use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use lantern_core::{CompletionProvider, Error, Result, Retriever};

use crate::answerer::{Answer, QueryAnswerer};

pub const WELCOME_MESSAGE: &str =
    "Hello! I'm your story explainer assistant. Ask me anything about the story!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One transcript entry. Display state only.
#[derive(Debug, Clone)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    fn now(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// What to do when a query is submitted while another is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    #[default]
    Reject,
    CancelPrevious,
}

/// Handle to an answer being computed on a spawned task
pub struct PendingAnswer {
    handle: JoinHandle<Answer>,
}

impl Future for PendingAnswer {
    type Output = Result<Answer>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined.map_err(|e| {
                if e.is_cancelled() {
                    Error::Cancelled
                } else {
                    Error::Other(format!("answer task failed: {}", e))
                }
            })
        })
    }
}

pub struct ChatSession<C, R> {
    answerer: Arc<QueryAnswerer<C, R>>,
    transcript: Vec<Turn>,
    policy: OverlapPolicy,
    in_flight: Option<AbortHandle>,
}

impl<C, R> ChatSession<C, R>
where
    C: CompletionProvider + 'static,
    R: Retriever + 'static,
{
    pub fn new(answerer: Arc<QueryAnswerer<C, R>>) -> Self {
        Self {
            answerer,
            transcript: vec![Turn::now(Speaker::Assistant, WELCOME_MESSAGE)],
            policy: OverlapPolicy::default(),
            in_flight: None,
        }
    }

    pub fn with_policy(mut self, policy: OverlapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn answerer(&self) -> &QueryAnswerer<C, R> {
        &self.answerer
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start answering `query` on a background task
    ///
    /// Returns `Ok(None)` for an empty query and `Error::Busy` if a previous
    /// query is still running under [`OverlapPolicy::Reject`].
    pub fn submit(&mut self, query: &str) -> Result<Option<PendingAnswer>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        if self.is_busy() {
            match self.policy {
                OverlapPolicy::Reject => return Err(Error::Busy),
                OverlapPolicy::CancelPrevious => {
                    self.cancel();
                }
            }
        }

        self.transcript.push(Turn::now(Speaker::User, query));

        let answerer = Arc::clone(&self.answerer);
        let owned = query.to_string();
        let handle = tokio::spawn(async move { answerer.answer_query(&owned).await });
        self.in_flight = Some(handle.abort_handle());

        Ok(Some(PendingAnswer { handle }))
    }

    /// Record a finished answer in the transcript
    pub fn complete(&mut self, answer: &Answer) {
        self.in_flight = None;
        self.transcript.push(Turn::now(Speaker::Assistant, answer.text.clone()));
    }

    /// Abort the in-flight query, returning whether one was running
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                debug!("in-flight query cancelled");
                true
            }
            _ => false,
        }
    }

    /// Clear the transcript back to the welcome message
    pub fn reset(&mut self) {
        self.cancel();
        self.transcript.clear();
        self.transcript.push(Turn::now(Speaker::Assistant, WELCOME_MESSAGE));
    }
}

impl<C, R> Drop for ChatSession<C, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
