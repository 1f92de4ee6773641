//! AI Integration Layer
//!
//! Completion provider abstraction plus the dashboard chat service built on
//! top of it. Everything here is optional at runtime: with no provider
//! configured the chat service still answers, using its fallback reply.

pub mod chat;
pub mod provider;

pub use chat::{ChatReply, ChatService};
pub use provider::{CompletionProvider, OpenAiProvider, ProviderConfig, create_provider};
