//! Test utilities for database operations.
//!
//! Provides an in-memory SQLite database with the schema applied, fixture
//! helpers for the collaborator-owned tables (accounts, groups, membership),
//! and connection settings for the optional `PostgreSQL` integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseBackend,
    DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set, Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::message::{ContentKind, ConversationKind};
use crate::entities::{Group, GroupMember, Message, User, group, group_member, message, user};
use crate::migrations::Migrator;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "chatroom_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "chatroom_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "chatroom_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Get URL for connecting to postgres database (for creating test DB).
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database plus fixture helpers.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory SQLite database with all migrations applied.
    ///
    /// The pool is pinned to a single connection; every connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn sqlite() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(3600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Connect to the `PostgreSQL` test database and apply migrations.
    pub async fn postgres(config: &TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Create a uniquely named `PostgreSQL` database (for parallel tests).
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let unique_suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("chatroom_test_{}", &unique_suffix[..8]);

        let postgres_conn = Database::connect(&config.postgres_url()).await?;
        let create_db = format!("CREATE DATABASE \"{}\"", config.database);
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, create_db))
            .await?;
        postgres_conn.close().await?;

        info!(database = %config.database, "Created unique test database");
        Self::postgres(&config).await
    }

    /// Shared handle to the connection, as the repositories expect it.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Delete every row, children first.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let db = self.conn.as_ref();
        Message::delete_many().exec(db).await?;
        GroupMember::delete_many().exec(db).await?;
        Group::delete_many().exec(db).await?;
        User::delete_many().exec(db).await?;
        Ok(())
    }

    // ==================== Fixtures ====================

    /// Insert an account.
    pub async fn insert_account(&self, account: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            account: Set(account.to_string()),
            nickname: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a group owned by `owner`.
    pub async fn insert_group(
        &self,
        uuid: &str,
        name: &str,
        owner: &str,
    ) -> Result<group::Model, DbErr> {
        group::ActiveModel {
            uuid: Set(uuid.to_string()),
            name: Set(name.to_string()),
            owner_account: Set(owner.to_string()),
            notice: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a membership row.
    pub async fn add_member(
        &self,
        group_id: i64,
        account: &str,
    ) -> Result<group_member::Model, DbErr> {
        group_member::ActiveModel {
            group_id: Set(group_id),
            account: Set(account.to_string()),
            nickname: Set(None),
            mute: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert an unread text message with an explicit timestamp.
    pub async fn insert_message_at(
        &self,
        from: &str,
        to: &str,
        kind: ConversationKind,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<message::Model, DbErr> {
        message::ActiveModel {
            from_account: Set(from.to_string()),
            to_account: Set(to.to_string()),
            content: Set(content.to_string()),
            content_type: Set(ContentKind::Text),
            message_type: Set(kind),
            url: Set(None),
            is_read: Set(false),
            created_at: Set(created_at.into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Every message row, in insertion order.
    pub async fn all_messages(&self) -> Result<Vec<message::Model>, DbErr> {
        Message::find()
            .order_by_asc(message::Column::Id)
            .all(self.conn.as_ref())
            .await
    }
}
