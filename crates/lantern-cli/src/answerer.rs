//! Question answering: retrieval, prompting and completion

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lantern_core::{CompletionProvider, Error, GenerationConfig, RetrievalQuery, Retriever};
use lantern_rag::PromptComposer;

use crate::fallback::{FallbackReason, FallbackResponder};

/// Where an answer's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Generated,
    Fallback,
    Error,
}

/// Text shown to the user for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

impl Answer {
    /// Render a pipeline error as an answer
    pub fn from_error(err: &Error) -> Self {
        let text = match err {
            Error::Api { status, body } => format!("Error {}: {}", status, body),
            other => format!("Error: {}", other),
        };
        Self {
            text,
            source: AnswerSource::Error,
        }
    }
}

/// Answers questions about the indexed stories
///
/// Every failure is turned into an [`Answer`], so callers never see an error.
pub struct QueryAnswerer<C, R> {
    provider: C,
    retriever: Option<R>,
    composer: PromptComposer,
    generation: GenerationConfig,
    top_k: usize,
    fallback: FallbackResponder,
}

impl<C, R> QueryAnswerer<C, R>
where
    C: CompletionProvider,
    R: Retriever,
{
    pub fn new(provider: C, composer: PromptComposer) -> Self {
        Self {
            provider,
            retriever: None,
            composer,
            generation: GenerationConfig::default(),
            top_k: RetrievalQuery::default().top_k,
            fallback: FallbackResponder::default(),
        }
    }

    pub fn with_retriever(self, retriever: R) -> Self {
        self.with_optional_retriever(Some(retriever))
    }

    pub fn with_optional_retriever(mut self, retriever: Option<R>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackResponder) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn retriever(&self) -> Option<&R> {
        self.retriever.as_ref()
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Answer a question; `None` for an empty or whitespace-only query
    pub async fn answer(&self, query: &str) -> Option<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        Some(self.answer_query(query).await)
    }

    pub(crate) async fn answer_query(&self, query: &str) -> Answer {
        let Some(retriever) = &self.retriever else {
            return self.fallback.respond(FallbackReason::Unavailable);
        };
        if !retriever.is_ready() {
            return self.fallback.respond(FallbackReason::NoContext);
        }

        let retrieved = match retriever.retrieve(&RetrievalQuery::new(query, self.top_k)).await {
            Ok(retrieved) => retrieved,
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                return self.fallback.respond(FallbackReason::NoContext);
            }
        };
        if retrieved.is_empty() {
            return self.fallback.respond(FallbackReason::NoContext);
        }
        debug!(
            hits = retrieved.documents.len(),
            positions = ?retrieved.documents.iter().map(|d| d.position).collect::<Vec<_>>(),
            "context retrieved"
        );

        let messages = match self.composer.messages(&retrieved.context, query) {
            Ok(messages) => messages,
            Err(e) => return Answer::from_error(&e),
        };

        match self.provider.complete(&messages, &self.generation).await {
            Ok(result) => Answer {
                text: result.text.trim().to_string(),
                source: AnswerSource::Generated,
            },
            Err(e) => {
                warn!(error = %e, "completion failed");
                Answer::from_error(&e)
            }
        }
    }
}
