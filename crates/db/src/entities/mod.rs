//! Database entities.

pub mod group;
pub mod group_member;
pub mod message;
pub mod user;

pub use group::Entity as Group;
pub use group_member::Entity as GroupMember;
pub use message::Entity as Message;
pub use user::Entity as User;
