//! Message entity for direct and group conversations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Conversation partition a message belongs to.
///
/// Stored as a small integer (`message_type` column).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
pub enum ConversationKind {
    /// One-to-one conversation between two accounts.
    #[sea_orm(num_value = 1)]
    Direct,
    /// Conversation addressed to a group UUID.
    #[sea_orm(num_value = 2)]
    Group,
}

impl ConversationKind {
    /// Wire/database code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Direct => 1,
            Self::Group => 2,
        }
    }

    /// Parse a wire code, `None` if it is not a known kind.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Direct),
            2 => Some(Self::Group),
            _ => None,
        }
    }
}

/// Payload kind of a message (`content_type` column).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
pub enum ContentKind {
    #[sea_orm(num_value = 1)]
    Text,
    #[sea_orm(num_value = 2)]
    File,
    #[sea_orm(num_value = 3)]
    Image,
    #[sea_orm(num_value = 4)]
    Audio,
    #[sea_orm(num_value = 5)]
    Video,
    /// Live audio call signalling.
    #[sea_orm(num_value = 6)]
    AudioOnline,
    /// Live video call signalling.
    #[sea_orm(num_value = 7)]
    VideoOnline,
}

impl Default for ContentKind {
    fn default() -> Self {
        Self::Text
    }
}

impl ContentKind {
    /// Wire/database code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Text => 1,
            Self::File => 2,
            Self::Image => 3,
            Self::Audio => 4,
            Self::Video => 5,
            Self::AudioOnline => 6,
            Self::VideoOnline => 7,
        }
    }

    /// Parse a wire code, `None` if it is not a known kind.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Text),
            2 => Some(Self::File),
            3 => Some(Self::Image),
            4 => Some(Self::Audio),
            5 => Some(Self::Video),
            6 => Some(Self::AudioOnline),
            7 => Some(Self::VideoOnline),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    /// Store-assigned, monotonic.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Sender account
    #[sea_orm(indexed)]
    pub from_account: String,

    /// Recipient account (direct) or group UUID (group)
    #[sea_orm(indexed)]
    pub to_account: String,

    /// Message text, or a descriptor for binary payloads
    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub content_type: ContentKind,

    pub message_type: ConversationKind,

    /// Attachment URL for file/media messages
    #[sea_orm(nullable)]
    pub url: Option<String>,

    /// Has the recipient fetched this message? Direct conversations only.
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FromAccount",
        to = "super::user::Column::Account"
    )]
    Sender,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sender.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_conversation_kind_codes() {
        assert_eq!(ConversationKind::from_code(1), Some(ConversationKind::Direct));
        assert_eq!(ConversationKind::from_code(2), Some(ConversationKind::Group));
        assert_eq!(ConversationKind::from_code(0), None);
        assert_eq!(ConversationKind::from_code(3), None);
        assert_eq!(ConversationKind::Group.code(), 2);
    }

    #[test]
    fn test_content_kind_codes_match_active_enum() {
        for kind in ContentKind::iter() {
            assert_eq!(kind.to_value(), kind.code());
            assert_eq!(ContentKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ContentKind::from_code(8), None);
        assert_eq!(ContentKind::default(), ContentKind::Text);
    }
}
