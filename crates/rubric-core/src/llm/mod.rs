//! Chat-completion client and message types

mod client;
mod messages;

pub use client::{ChatClient, OpenAiClient};
pub use messages::{ChatMessage, ChatResponse, MessageRole, TokenUsage};
