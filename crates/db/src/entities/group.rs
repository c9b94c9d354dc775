//! Group entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group - a shared conversation partition keyed by its UUID.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Public identifier; group messages use it as their recipient.
    #[sea_orm(unique)]
    pub uuid: String,

    /// Group name.
    pub name: String,

    /// Account that created the group.
    #[sea_orm(indexed)]
    pub owner_account: String,

    /// Group notice (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub notice: Option<String>,

    /// When the group was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
