//! Canned answers used when retrieval cannot ground a question

use crate::answerer::{Answer, AnswerSource};

/// Why the pipeline fell back instead of asking the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No index is loaded
    Unavailable,
    /// The index is loaded but retrieval found nothing
    NoContext,
}

/// Produces fallback answers
///
/// Both messages can be replaced, e.g. to answer in the corpus language.
#[derive(Debug, Clone)]
pub struct FallbackResponder {
    unavailable: String,
    no_context: String,
}

impl FallbackResponder {
    pub const UNAVAILABLE: &'static str = "I'm a story explainer, but I don't have the story data. \
Please run `lantern index` so the story index files are in place.";
    pub const NO_CONTEXT: &'static str =
        "I couldn't find anything in the story about that. Try asking in a different way.";

    pub fn new(unavailable: impl Into<String>, no_context: impl Into<String>) -> Self {
        Self {
            unavailable: unavailable.into(),
            no_context: no_context.into(),
        }
    }

    pub fn respond(&self, reason: FallbackReason) -> Answer {
        let text = match reason {
            FallbackReason::Unavailable => &self.unavailable,
            FallbackReason::NoContext => &self.no_context,
        };
        Answer {
            text: text.clone(),
            source: AnswerSource::Fallback,
        }
    }
}

impl Default for FallbackResponder {
    fn default() -> Self {
        Self::new(Self::UNAVAILABLE, Self::NO_CONTEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        let responder = FallbackResponder::default();
        let answer = responder.respond(FallbackReason::Unavailable);
        assert_eq!(answer.source, AnswerSource::Fallback);
        assert!(answer.text.contains("don't have the story data"));
        assert_eq!(
            responder.respond(FallbackReason::NoContext).text,
            FallbackResponder::NO_CONTEXT
        );
    }

    #[test]
    fn test_replaced_messages() {
        let responder = FallbackResponder::new("कहानी उपलब्ध नहीं है।", "कुछ नहीं मिला।");
        assert_eq!(responder.respond(FallbackReason::NoContext).text, "कुछ नहीं मिला।");
    }
}
