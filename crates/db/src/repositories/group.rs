//! Group repository.
//!
//! Read-side lookups for groups and their membership rows.

use std::sync::Arc;

use chatroom_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

use crate::entities::{Group, GroupMember, group, group_member};

/// Repository for group operations.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Group Operations ====================

    /// Find group by its public UUID.
    pub async fn find_by_uuid(&self, uuid: &str) -> AppResult<Option<group::Model>> {
        Group::find()
            .filter(group::Column::Uuid.eq(uuid))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get group by UUID, returning error if not found.
    pub async fn get_by_uuid(&self, uuid: &str) -> AppResult<group::Model> {
        self.find_by_uuid(uuid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {uuid}")))
    }

    // ==================== Member Operations ====================

    /// Get member record.
    pub async fn get_member(
        &self,
        group_id: i64,
        account: &str,
    ) -> AppResult<Option<group_member::Model>> {
        GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::Account.eq(account))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if an account has a membership row in a group.
    pub async fn is_member(&self, group_id: i64, account: &str) -> AppResult<bool> {
        Ok(self.get_member(group_id, account).await?.is_some())
    }

    // ==================== Locking Reads ====================

    /// Find group by UUID on `conn`, share-locking the row until the
    /// surrounding transaction ends.
    pub async fn lock_by_uuid<C: ConnectionTrait>(
        &self,
        conn: &C,
        uuid: &str,
    ) -> AppResult<Option<group::Model>> {
        Group::find()
            .filter(group::Column::Uuid.eq(uuid))
            .lock_shared()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Membership check on `conn`, share-locking the membership row.
    pub async fn lock_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        group_id: i64,
        account: &str,
    ) -> AppResult<bool> {
        let member = GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::Account.eq(account))
            .lock_shared()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(member.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_group(id: i64, uuid: &str, name: &str) -> group::Model {
        group::Model {
            id,
            uuid: uuid.to_string(),
            name: name.to_string(),
            owner_account: "alice".to_string(),
            notice: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_member(id: i64, group_id: i64, account: &str) -> group_member::Model {
        group_member::Model {
            id,
            group_id,
            account: account.to_string(),
            nickname: None,
            mute: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_uuid() {
        let group = create_test_group(1, "g-123", "G1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group.clone()]])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.find_by_uuid("g-123").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().name, "G1");
    }

    #[tokio::test]
    async fn test_get_by_uuid_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group::Model>::new()])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.get_by_uuid("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_is_member() {
        let member = create_test_member(1, 1, "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![member]])
                .append_query_results([Vec::<group_member::Model>::new()])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);

        assert!(repo.is_member(1, "alice").await.unwrap());
        assert!(!repo.is_member(1, "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_lock_member_on_connection() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group(2, "g-123", "G1")]])
                .append_query_results([Vec::<group_member::Model>::new()])
                .into_connection(),
        );

        let repo = GroupRepository::new(db.clone());
        let group = repo.lock_by_uuid(db.as_ref(), "g-123").await.unwrap().unwrap();
        assert!(!repo.lock_member(db.as_ref(), group.id, "bob").await.unwrap());

        drop(repo);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert_eq!(log.matches("FOR SHARE").count(), 2);
    }
}
