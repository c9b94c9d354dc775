//! Group member entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group member - the membership row authorizing an account to read and
/// post into a group conversation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The group they belong to.
    #[sea_orm(indexed)]
    pub group_id: i64,

    /// The member's account.
    #[sea_orm(indexed)]
    pub account: String,

    /// Custom nickname in this group (optional).
    #[sea_orm(nullable)]
    pub nickname: Option<String>,

    /// Whether the member muted notifications for this group.
    #[sea_orm(default_value = false)]
    pub mute: bool,

    /// When the account joined the group.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
