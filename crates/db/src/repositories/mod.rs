//! Database repositories.

mod group;
mod messaging;
pub mod transaction;
mod user;

pub use group::GroupRepository;
pub use messaging::MessagingRepository;
pub use user::UserRepository;
