//! Groq integration for Lantern
//!
//! This crate provides the OpenAI-compatible chat-completion implementation of
//! the CompletionProvider trait. Groq is the default endpoint; any server speaking
//! the same `/chat/completions` dialect works by changing `GROQ_API_URL`.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::GroqClient;
pub use config::GroqConfig;

// Re-export core types for convenience
pub use lantern_core::{
    ChatMessage, CompletionProvider, Error, GenerationConfig, GenerationResult, Result,
    RetryConfig,
};
