//! Routing service.
//!
//! Resolves logical sender/recipient identifiers to the canonical ones the
//! message store keys on, and decides who may read a group conversation.

use chatroom_common::{AppError, AppResult};
use chatroom_db::{
    entities::{group, message::ConversationKind},
    repositories::{GroupRepository, UserRepository},
};
use sea_orm::ConnectionTrait;

/// Routing service.
#[derive(Clone)]
pub struct RoutingService {
    user_repo: UserRepository,
    group_repo: GroupRepository,
}

impl RoutingService {
    /// Create a new routing service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, group_repo: GroupRepository) -> Self {
        Self {
            user_repo,
            group_repo,
        }
    }

    /// Map a wire conversation kind to the fetch path it selects.
    pub fn classify(&self, kind: i16) -> AppResult<ConversationKind> {
        ConversationKind::from_code(kind).ok_or(AppError::UnsupportedKind(kind))
    }

    /// Validate the two sides of a direct conversation.
    ///
    /// Only checks that both identifiers are present; an unknown counterpart
    /// simply has an empty history.
    pub fn resolve_direct_participants<'a>(
        &self,
        sender: &'a str,
        recipient: &'a str,
    ) -> AppResult<(&'a str, &'a str)> {
        let sender = sender.trim();
        let recipient = recipient.trim();

        if sender.is_empty() || recipient.is_empty() {
            return Err(AppError::Validation(
                "Sender and recipient accounts must not be empty".to_string(),
            ));
        }

        Ok((sender, recipient))
    }

    /// Confirm `account` holds a membership row in the group `group_uuid`.
    ///
    /// Must succeed before any group history is read.
    pub async fn authorize_group_read(
        &self,
        group_uuid: &str,
        account: &str,
    ) -> AppResult<group::Model> {
        let group_uuid = group_uuid.trim();
        let account = account.trim();
        if group_uuid.is_empty() || account.is_empty() {
            return Err(AppError::Validation(
                "Group and account must not be empty".to_string(),
            ));
        }

        let group = self.group_repo.get_by_uuid(group_uuid).await?;

        if !self.group_repo.is_member(group.id, account).await? {
            return Err(AppError::Forbidden(format!(
                "Account {account} is not a member of group {group_uuid}"
            )));
        }

        Ok(group)
    }

    /// Canonical sender account on `conn`, `None` if no such account exists.
    ///
    /// Inside a transaction the account row stays share-locked until it ends.
    pub async fn resolve_sender<C: ConnectionTrait>(
        &self,
        conn: &C,
        account: &str,
    ) -> AppResult<Option<String>> {
        Ok(self
            .user_repo
            .lock_by_account(conn, account.trim())
            .await?
            .map(|user| user.account))
    }

    /// Resolve the recipient of an append on `conn`, `None` if it does not
    /// exist. Locks the row like [`Self::resolve_sender`].
    pub async fn resolve_recipient<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ConversationKind,
        recipient: &str,
    ) -> AppResult<Option<Recipient>> {
        let recipient = recipient.trim();
        match kind {
            ConversationKind::Direct => Ok(self
                .user_repo
                .lock_by_account(conn, recipient)
                .await?
                .map(|user| Recipient::Account(user.account))),
            ConversationKind::Group => Ok(self
                .group_repo
                .lock_by_uuid(conn, recipient)
                .await?
                .map(Recipient::Group)),
        }
    }

    /// Whether `account` may post into `group`.
    pub async fn can_post_to_group<C: ConnectionTrait>(
        &self,
        conn: &C,
        group: &group::Model,
        account: &str,
    ) -> AppResult<bool> {
        self.group_repo
            .lock_member(conn, group.id, account.trim())
            .await
    }
}

/// A resolved append recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Direct recipient account.
    Account(String),
    /// Recipient group.
    Group(group::Model),
}

impl Recipient {
    /// Canonical identifier stored in `to_account`: the account, or the
    /// group UUID.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Account(account) => account,
            Self::Group(group) => &group.uuid,
        }
    }
}
