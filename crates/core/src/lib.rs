//! Core business logic for chatroom-rs.
//!
//! Routes messages to their conversation partition, authorizes group reads,
//! and runs the transactional mark-read-then-fetch for direct conversations.

pub mod conversation_key;
pub mod services;

pub use conversation_key::ConversationKey;
pub use services::*;
