//! Chat pipeline: per-identity conversation history, the completion gateway,
//! and cleanup of model reasoning markup.

pub mod conversation;
pub mod gateway;
pub mod markup;

pub use conversation::{Conversation, ConversationStore, Message, Role};
pub use gateway::{ChatError, CompletionGateway, CompletionParams};
pub use markup::strip_reasoning;
