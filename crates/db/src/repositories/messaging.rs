//! Message repository.

use std::sync::Arc;

use super::transaction::{commit, rollback, step_error};
use crate::entities::message::{self, ActiveModel, Column, ConversationKind, Entity as Message};
use chatroom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, IsolationLevel, PaginatorTrait,
    QueryFilter, QueryOrder, Select, TransactionTrait, sea_query::Expr,
};

/// Repository for message operations.
#[derive(Clone)]
pub struct MessagingRepository {
    db: Arc<DatabaseConnection>,
}

impl MessagingRepository {
    /// Create a new messaging repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Begin a transaction at the backend's default isolation level.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| step_error("begin transaction", e))
    }

    /// Insert a new message.
    pub async fn create(&self, model: ActiveModel) -> AppResult<message::Model> {
        self.create_in(self.db.as_ref(), model).await
    }

    /// Insert a new message on `conn`.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ActiveModel,
    ) -> AppResult<message::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark everything `counterpart` sent to `owner` as read, then return the
    /// whole direct conversation between the two, oldest first.
    ///
    /// Both steps run in one transaction. The returned rows already carry the
    /// read flags set by the first step; if either step fails the transaction
    /// is rolled back and no flag change survives.
    ///
    /// On `PostgreSQL` the transaction is `REPEATABLE READ`. Two concurrent
    /// calls that update the same unread rows conflict: the later one fails
    /// with a `could not serialize access` [`AppError::Database`] and is not
    /// retried here. Its caller may simply fetch again.
    pub async fn mark_read_and_fetch_direct(
        &self,
        owner: &str,
        counterpart: &str,
    ) -> AppResult<Vec<message::Model>> {
        let txn = self
            .db
            .begin_with_config(self.isolation_level(), None)
            .await
            .map_err(|e| step_error("begin transaction", e))?;

        let marked = match mark_as_read(&txn, owner, counterpart).await {
            Ok(marked) => marked,
            Err(e) => {
                rollback(txn).await;
                return Err(step_error("mark messages as read", e));
            }
        };

        let messages = match direct_conversation(owner, counterpart).all(&txn).await {
            Ok(messages) => messages,
            Err(e) => {
                rollback(txn).await;
                return Err(step_error("fetch direct history", e));
            }
        };

        commit(txn).await?;

        tracing::debug!(
            owner,
            counterpart,
            marked,
            count = messages.len(),
            "Fetched direct history"
        );

        Ok(messages)
    }

    /// Every message addressed to a group, oldest first. Never writes.
    pub async fn find_group_history(&self, group_uuid: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(Column::MessageType.eq(ConversationKind::Group))
            .filter(Column::ToAccount.eq(group_uuid))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get unread direct message count for an account.
    pub async fn count_unread(&self, owner: &str) -> AppResult<u64> {
        Message::find()
            .filter(Column::MessageType.eq(ConversationKind::Direct))
            .filter(Column::ToAccount.eq(owner))
            .filter(Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get unread direct message count from a specific account.
    pub async fn count_unread_from(&self, owner: &str, counterpart: &str) -> AppResult<u64> {
        Message::find()
            .filter(Column::MessageType.eq(ConversationKind::Direct))
            .filter(Column::FromAccount.eq(counterpart))
            .filter(Column::ToAccount.eq(owner))
            .filter(Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// SQLite transactions are serializable; elsewhere the select must read
    /// the same snapshot the update ran against.
    fn isolation_level(&self) -> Option<IsolationLevel> {
        match self.db.get_database_backend() {
            DatabaseBackend::Sqlite => None,
            _ => Some(IsolationLevel::RepeatableRead),
        }
    }
}

async fn mark_as_read<C: ConnectionTrait>(
    conn: &C,
    owner: &str,
    counterpart: &str,
) -> Result<u64, DbErr> {
    let result = Message::update_many()
        .col_expr(Column::IsRead, Expr::value(true))
        .filter(Column::MessageType.eq(ConversationKind::Direct))
        .filter(Column::FromAccount.eq(counterpart))
        .filter(Column::ToAccount.eq(owner))
        .filter(Column::IsRead.eq(false))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

fn direct_conversation(owner: &str, counterpart: &str) -> Select<Message> {
    Message::find()
        .filter(Column::MessageType.eq(ConversationKind::Direct))
        .filter(
            // Messages sent by owner to counterpart OR by counterpart to owner
            Condition::any()
                .add(
                    Condition::all()
                        .add(Column::FromAccount.eq(owner))
                        .add(Column::ToAccount.eq(counterpart)),
                )
                .add(
                    Condition::all()
                        .add(Column::FromAccount.eq(counterpart))
                        .add(Column::ToAccount.eq(owner)),
                ),
        )
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::message::ContentKind;
    use chrono::{TimeZone, Utc};
    use sea_orm::{MockDatabase, MockExecResult, Set};

    fn create_test_message(
        id: i64,
        from: &str,
        to: &str,
        kind: ConversationKind,
        is_read: bool,
    ) -> message::Model {
        message::Model {
            id,
            from_account: from.to_string(),
            to_account: to.to_string(),
            content: format!("message {id}"),
            content_type: ContentKind::Text,
            message_type: kind,
            url: None,
            is_read,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, id as u32).unwrap().into(),
        }
    }

    /// Statements the mock saw, rendered for substring checks.
    fn statement_log(db: Arc<DatabaseConnection>) -> String {
        format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log())
    }

    #[tokio::test]
    async fn test_mark_read_and_fetch_direct() {
        let m1 = create_test_message(1, "alice", "bob", ConversationKind::Direct, true);
        let m2 = create_test_message(2, "bob", "alice", ConversationKind::Direct, false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[m1.clone(), m2.clone()]])
                .into_connection(),
        );

        let repo = MessagingRepository::new(db.clone());
        let result = repo.mark_read_and_fetch_direct("bob", "alice").await.unwrap();

        assert_eq!(result, vec![m1, m2]);

        drop(repo);
        let log = statement_log(db);
        assert!(log.contains("BEGIN"));
        assert!(log.contains("UPDATE"));
        assert!(log.contains("COMMIT"));
        assert!(!log.contains("ROLLBACK"));
    }

    #[tokio::test]
    async fn test_mark_read_failure_rolls_back_without_fetching() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_errors([DbErr::Custom("deadlock detected".to_string())])
                .into_connection(),
        );

        let repo = MessagingRepository::new(db.clone());
        let result = repo.mark_read_and_fetch_direct("bob", "alice").await;

        match result {
            Err(AppError::Database(msg)) => {
                assert!(msg.starts_with("mark messages as read"));
                assert!(msg.contains("deadlock detected"));
            }
            other => panic!("Expected Database error, got {other:?}"),
        }

        drop(repo);
        let log = statement_log(db);
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
        assert!(!log.contains("SELECT"));
    }

    #[tokio::test]
    async fn test_fetch_failure_after_update_rolls_back() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );

        let repo = MessagingRepository::new(db.clone());
        let result = repo.mark_read_and_fetch_direct("bob", "alice").await;

        match result {
            Err(AppError::Database(msg)) => assert!(msg.starts_with("fetch direct history")),
            other => panic!("Expected Database error, got {other:?}"),
        }

        drop(repo);
        let log = statement_log(db);
        assert!(log.contains("UPDATE"));
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_find_group_history() {
        let m1 = create_test_message(4, "alice", "g-123", ConversationKind::Group, false);
        let m2 = create_test_message(5, "carol", "g-123", ConversationKind::Group, false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = MessagingRepository::new(db);
        let result = repo.find_group_history("g-123").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.to_account == "g-123"));
    }

    #[tokio::test]
    async fn test_count_unread_from() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = MessagingRepository::new(db);
        let count = repo.count_unread_from("bob", "alice").await.unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_create_message() {
        let stored = create_test_message(9, "alice", "bob", ConversationKind::Direct, false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored.clone()]])
                .into_connection(),
        );

        let repo = MessagingRepository::new(db);
        let active = ActiveModel {
            from_account: Set("alice".to_string()),
            to_account: Set("bob".to_string()),
            content: Set("message 9".to_string()),
            content_type: Set(ContentKind::Text),
            message_type: Set(ConversationKind::Direct),
            url: Set(None),
            is_read: Set(false),
            created_at: Set(stored.created_at),
            ..Default::default()
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.id, 9);
        assert!(!result.is_read);
    }
}
