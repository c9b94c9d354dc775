//! Derived conversation identity.

use std::fmt;

use chatroom_db::entities::message::{self, ConversationKind};

/// Identity of a conversation thread. Never persisted.
///
/// A direct conversation is the unordered pair of its two accounts, stored
/// lexicographically ordered so `direct(a, b) == direct(b, a)`. A group
/// conversation is the group UUID alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversationKey {
    /// One-to-one thread; `low <= high`.
    Direct { low: String, high: String },
    /// Group thread keyed by group UUID.
    Group(String),
}

impl ConversationKey {
    /// Key of the direct conversation between two accounts.
    #[must_use]
    pub fn direct(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self::Direct {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    /// Key of a group conversation.
    #[must_use]
    pub fn group(uuid: &str) -> Self {
        Self::Group(uuid.to_string())
    }

    /// Key of the conversation a stored message belongs to.
    #[must_use]
    pub fn of(message: &message::Model) -> Self {
        match message.message_type {
            ConversationKind::Direct => Self::direct(&message.from_account, &message.to_account),
            ConversationKind::Group => Self::group(&message.to_account),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { low, high } => write!(f, "direct:{low}:{high}"),
            Self::Group(uuid) => write!(f, "group:{uuid}"),
        }
    }
}
