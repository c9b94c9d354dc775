//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use chatroom_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

/// User repository for account lookups.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by account string.
    pub async fn find_by_account(&self, account: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Account.eq(account))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by account on `conn`, holding a share lock on the row
    /// until the surrounding transaction ends.
    pub async fn lock_by_account<C: ConnectionTrait>(
        &self,
        conn: &C,
        account: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Account.eq(account))
            .lock_shared()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: i64, account: &str) -> user::Model {
        user::Model {
            id,
            account: account.to_string(),
            nickname: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_account_found() {
        let user = create_test_user(1, "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_account("alice").await.unwrap();

        assert_eq!(result, Some(user));
    }

    #[tokio::test]
    async fn test_find_by_account_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_account("nobody").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_lock_by_account_takes_share_lock() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        let result = repo.lock_by_account(db.as_ref(), "alice").await.unwrap();
        assert!(result.is_some());

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(format!("{log:?}").contains("FOR SHARE"));
    }
}
