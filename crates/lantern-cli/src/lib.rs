//! Answering pipeline and terminal interface for Lantern

mod answerer;
mod fallback;
mod interrupt;
mod provider;
mod session;
mod ui;


pub use answerer::{Answer, AnswerSource, QueryAnswerer};
pub use fallback::{FallbackReason, FallbackResponder};
pub use interrupt::{CancelSignal, Interrupt, InterruptGate, interrupt_channel};
pub use provider::UnconfiguredProvider;
pub use session::{ChatSession, OverlapPolicy, PendingAnswer, Speaker, Turn, WELCOME_MESSAGE};
pub use ui::{
    InputHistory, clear_thinking, display_banner, print_answer, print_help, print_notice,
    print_thinking, read_input,
};

// Re-export core types
pub use lantern_core::{Error, Result};
