//! Business logic services.

#![allow(missing_docs)]

pub mod conversation;
pub mod messaging;
pub mod routing;

pub use conversation::{ConversationService, GetMessagesInput, MessageView, SaveMessageInput};
pub use messaging::{AppendMessage, MessagingService};
pub use routing::RoutingService;
