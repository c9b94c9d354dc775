//! Messaging service for direct and group conversations.

use chrono::Utc;
use chatroom_common::AppResult;
use chatroom_db::{
    entities::message::{self, ContentKind, ConversationKind},
    repositories::{MessagingRepository, transaction},
};
use sea_orm::{DatabaseTransaction, Set};

use crate::conversation_key::ConversationKey;
use crate::services::routing::{Recipient, RoutingService};

/// A message to append, before recipient resolution.
pub struct AppendMessage<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
    pub kind: ConversationKind,
    pub content: &'a str,
    pub content_kind: ContentKind,
    pub url: Option<&'a str>,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    messaging_repo: MessagingRepository,
    routing: RoutingService,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(messaging_repo: MessagingRepository, routing: RoutingService) -> Self {
        Self {
            messaging_repo,
            routing,
        }
    }

    /// Direct history between `owner` and `counterpart`, oldest first.
    ///
    /// Everything `counterpart` sent to `owner` is marked read in the same
    /// transaction, so the returned rows already show it as read.
    pub async fn fetch_direct_history(
        &self,
        owner: &str,
        counterpart: &str,
    ) -> AppResult<Vec<message::Model>> {
        let (owner, counterpart) = self
            .routing
            .resolve_direct_participants(owner, counterpart)?;

        let messages = self
            .messaging_repo
            .mark_read_and_fetch_direct(owner, counterpart)
            .await?;

        let key = ConversationKey::direct(owner, counterpart);
        debug_assert!(messages.iter().all(|m| ConversationKey::of(m) == key));
        tracing::debug!(conversation = %key, count = messages.len(), "Loaded conversation");

        Ok(messages)
    }

    /// Group history, oldest first. `reader` must be a member.
    pub async fn fetch_group_history(
        &self,
        group_uuid: &str,
        reader: &str,
    ) -> AppResult<Vec<message::Model>> {
        let group = self.routing.authorize_group_read(group_uuid, reader).await?;

        let messages = self.messaging_repo.find_group_history(&group.uuid).await?;

        let key = ConversationKey::group(&group.uuid);
        tracing::debug!(conversation = %key, count = messages.len(), "Loaded conversation");

        Ok(messages)
    }

    /// Append a message to its conversation.
    ///
    /// Returns `Ok(None)` without writing when the sender or recipient does
    /// not exist, or when a group message comes from a non-member. The
    /// lookups and the insert share one transaction; the rows they checked
    /// stay locked until it commits.
    pub async fn append(&self, input: AppendMessage<'_>) -> AppResult<Option<message::Model>> {
        let txn = self.messaging_repo.begin().await?;

        match self.append_in(&txn, &input).await {
            Ok(Some(message)) => {
                transaction::commit(txn).await?;
                tracing::info!(
                    id = message.id,
                    conversation = %ConversationKey::of(&message),
                    "Message stored"
                );
                Ok(Some(message))
            }
            Ok(None) => {
                transaction::rollback(txn).await;
                Ok(None)
            }
            Err(e) => {
                transaction::rollback(txn).await;
                Err(e)
            }
        }
    }

    async fn append_in(
        &self,
        txn: &DatabaseTransaction,
        input: &AppendMessage<'_>,
    ) -> AppResult<Option<message::Model>> {
        let Some(sender) = self.routing.resolve_sender(txn, input.sender).await? else {
            tracing::warn!(sender = input.sender, "Dropping message from unknown sender");
            return Ok(None);
        };

        let Some(recipient) = self
            .routing
            .resolve_recipient(txn, input.kind, input.recipient)
            .await?
        else {
            tracing::warn!(
                sender = %sender,
                recipient = input.recipient,
                kind = input.kind.code(),
                "Dropping message to unknown recipient"
            );
            return Ok(None);
        };

        if let Recipient::Group(group) = &recipient {
            if !self.routing.can_post_to_group(txn, group, &sender).await? {
                tracing::warn!(sender = %sender, group = %group.uuid, "Dropping group message from non-member");
                return Ok(None);
            }
        }

        let model = message::ActiveModel {
            from_account: Set(sender),
            to_account: Set(recipient.id().to_string()),
            content: Set(input.content.to_string()),
            content_type: Set(input.content_kind),
            message_type: Set(input.kind),
            url: Set(input.url.map(str::to_string)),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.messaging_repo.create_in(txn, model).await.map(Some)
    }

    /// Unread direct messages addressed to `owner`, optionally only those
    /// from `counterpart`.
    pub async fn unread_count(&self, owner: &str, counterpart: Option<&str>) -> AppResult<u64> {
        match counterpart {
            Some(counterpart) => {
                self.messaging_repo
                    .count_unread_from(owner.trim(), counterpart.trim())
                    .await
            }
            None => self.messaging_repo.count_unread(owner.trim()).await,
        }
    }
}
