//! Conversation facade.
//!
//! The two caller-facing operations: read a conversation and append to one.
//! Reads surface every error; writes log and swallow theirs.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use chatroom_common::AppResult;
use chatroom_db::{
    entities::message::{self, ContentKind, ConversationKind},
    repositories::{GroupRepository, MessagingRepository, UserRepository},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::messaging::{AppendMessage, MessagingService};
use crate::services::routing::RoutingService;

/// Input for reading a conversation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetMessagesInput {
    pub message_type: i16,
    /// The reading account.
    #[validate(length(min = 1, max = 64))]
    pub account: String,
    /// Counterpart account, or group UUID.
    #[validate(length(min = 1, max = 64))]
    pub to_account: String,
}

/// Input for appending a message.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveMessageInput {
    #[validate(length(min = 1, max = 64))]
    pub from: String,
    #[validate(length(min = 1, max = 64))]
    pub to: String,
    pub message_type: i16,
    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: i16,
    #[validate(length(max = 1024))]
    pub url: Option<String>,
}

const fn default_content_type() -> i16 {
    ContentKind::Text.code()
}

/// A stored message as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: i64,
    pub from_account: String,
    pub to_account: String,
    pub content: String,
    pub content_type: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<message::Model> for MessageView {
    fn from(m: message::Model) -> Self {
        Self {
            id: m.id,
            from_account: m.from_account,
            to_account: m.to_account,
            content: m.content,
            content_type: m.content_type.code(),
            url: m.url,
            created_at: m.created_at,
        }
    }
}

/// Conversation service.
#[derive(Clone)]
pub struct ConversationService {
    routing: RoutingService,
    messaging: MessagingService,
}

impl ConversationService {
    /// Create a new conversation service.
    #[must_use]
    pub const fn new(routing: RoutingService, messaging: MessagingService) -> Self {
        Self { routing, messaging }
    }

    /// Wire every repository to one shared connection.
    #[must_use]
    pub fn from_connection(db: Arc<DatabaseConnection>) -> Self {
        let routing = RoutingService::new(
            UserRepository::new(db.clone()),
            GroupRepository::new(db.clone()),
        );
        let messaging = MessagingService::new(MessagingRepository::new(db), routing.clone());
        Self::new(routing, messaging)
    }

    /// Messaging service this facade dispatches to.
    #[must_use]
    pub const fn messaging(&self) -> &MessagingService {
        &self.messaging
    }

    /// Read the conversation `input` names, oldest first.
    ///
    /// Direct reads mark the counterpart's messages as read. Group reads
    /// require membership and never write.
    pub async fn get_messages(&self, input: GetMessagesInput) -> AppResult<Vec<MessageView>> {
        let kind = self.routing.classify(input.message_type)?;
        input.validate()?;

        let messages = match kind {
            ConversationKind::Direct => {
                self.messaging
                    .fetch_direct_history(&input.account, &input.to_account)
                    .await?
            }
            ConversationKind::Group => {
                self.messaging
                    .fetch_group_history(&input.to_account, &input.account)
                    .await?
            }
        };

        Ok(messages.into_iter().map(MessageView::from).collect())
    }

    /// Append a message. Never fails; anything that prevents the write is
    /// logged.
    pub async fn save_message(&self, input: SaveMessageInput) {
        let kind = match self.routing.classify(input.message_type) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(from = %input.from, to = %input.to, error = %e, "Dropping message");
                return;
            }
        };

        if let Err(e) = input.validate() {
            tracing::warn!(from = %input.from, to = %input.to, error = %e, "Dropping invalid message");
            return;
        }

        let Some(content_kind) = ContentKind::from_code(input.content_type) else {
            tracing::warn!(
                from = %input.from,
                to = %input.to,
                content_type = input.content_type,
                "Dropping message with unknown content type"
            );
            return;
        };

        let result = self
            .messaging
            .append(AppendMessage {
                sender: &input.from,
                recipient: &input.to,
                kind,
                content: &input.content,
                content_kind,
                url: input.url.as_deref(),
            })
            .await;

        match result {
            Err(e) if e.is_server_error() => {
                tracing::error!(from = %input.from, to = %input.to, error = %e, "Failed to save message");
            }
            Err(e) => {
                tracing::warn!(from = %input.from, to = %input.to, error = %e, "Dropping message");
            }
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chatroom_common::AppError;
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_message() -> message::Model {
        message::Model {
            id: 7,
            from_account: "alice".to_string(),
            to_account: "bob".to_string(),
            content: "see attached".to_string(),
            content_type: ContentKind::Image,
            message_type: ConversationKind::Direct,
            url: Some("https://files.example/cat.png".to_string()),
            is_read: true,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap().into(),
        }
    }

    fn service() -> ConversationService {
        ConversationService::from_connection(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        ))
    }

    #[test]
    fn test_message_view_from_model() {
        let view = MessageView::from(create_test_message());

        assert_eq!(view.id, 7);
        assert_eq!(view.content_type, 3);
        assert_eq!(view.url.as_deref(), Some("https://files.example/cat.png"));
    }

    #[test]
    fn test_message_view_serializes_camel_case() {
        let json = serde_json::to_value(MessageView::from(create_test_message())).unwrap();

        assert_eq!(json["fromAccount"], "alice");
        assert_eq!(json["toAccount"], "bob");
        assert_eq!(json["contentType"], 3);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("from_account").is_none());
    }

    #[test]
    fn test_save_message_input_defaults_to_text() {
        let input: SaveMessageInput = serde_json::from_value(serde_json::json!({
            "from": "alice",
            "to": "bob",
            "messageType": 1,
            "content": "hi"
        }))
        .unwrap();

        assert_eq!(input.content_type, ContentKind::Text.code());
        assert!(input.url.is_none());
        assert!(input.validate().is_ok());
    }

    #[tokio::test]
    async fn test_get_messages_rejects_unsupported_kind() {
        let result = service()
            .get_messages(GetMessagesInput {
                message_type: 9,
                account: "alice".to_string(),
                to_account: "bob".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::UnsupportedKind(9))));
    }

    #[tokio::test]
    async fn test_get_messages_rejects_empty_account() {
        let result = service()
            .get_messages(GetMessagesInput {
                message_type: 1,
                account: String::new(),
                to_account: "bob".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_save_message_with_unsupported_kind_touches_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ConversationService::from_connection(db.clone());

        service
            .save_message(SaveMessageInput {
                from: "alice".to_string(),
                to: "bob".to_string(),
                message_type: 0,
                content: "hi".to_string(),
                content_type: 1,
                url: None,
            })
            .await;

        drop(service);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_save_message_with_unknown_content_type_touches_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ConversationService::from_connection(db.clone());

        service
            .save_message(SaveMessageInput {
                from: "alice".to_string(),
                to: "bob".to_string(),
                message_type: 1,
                content: "hi".to_string(),
                content_type: 42,
                url: None,
            })
            .await;

        drop(service);
        assert!(Arc::try_unwrap(db).unwrap().into_transaction_log().is_empty());
    }
}
