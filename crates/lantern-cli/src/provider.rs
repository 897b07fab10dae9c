//! Stand-in completion provider for a shell started without credentials

use async_trait::async_trait;

use lantern_core::{
    ChatMessage, CompletionProvider, Error, GenerationConfig, GenerationResult, Result,
};

/// Provider that fails every request with the reason it could not be built
///
/// Lets the shell start and serve fallback answers when the completion
/// client is missing its API key.
#[derive(Debug, Clone)]
pub struct UnconfiguredProvider {
    reason: String,
}

impl UnconfiguredProvider {
    pub const MODEL_ID: &'static str = "unconfigured";

    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for UnconfiguredProvider {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        Err(Error::Configuration(self.reason.clone()))
    }

    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }
}
