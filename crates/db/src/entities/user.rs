//! User account entity.
//!
//! Accounts are owned by the account-management collaborator; the message
//! core only looks them up by their `account` string.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Stable login identifier, never reused.
    #[sea_orm(unique)]
    pub account: String,

    /// Display name
    #[sea_orm(nullable)]
    pub nickname: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::message::Entity")]
    SentMessages,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SentMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
