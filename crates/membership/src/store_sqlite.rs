//! SQLite-backed membership store using sqlx.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    spamguard_common::{ChatId, UserId},
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
};

use crate::{
    Error, Result,
    store::{MembershipRecord, MembershipStore},
};

/// SQLite-backed persistence for first-seen records.
pub struct SqliteMembershipStore {
    pool: SqlitePool,
}

impl SqliteMembershipStore {
    /// Create a new store with its own connection pool and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store using an existing pool (migrations must already be run).
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for SqliteMembershipStore {
    async fn insert_if_absent(&self, record: MembershipRecord) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO user_joins (user_id, chat_id, join_time_ms) VALUES (?, ?, ?)
             ON CONFLICT(user_id, chat_id) DO NOTHING",
        )
        .bind(record.user_id.0)
        .bind(record.chat_id.0)
        .bind(record.joined_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, user_id: UserId, chat_id: ChatId) -> Result<Option<MembershipRecord>> {
        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT join_time_ms FROM user_joins WHERE user_id = ? AND chat_id = ?",
        )
        .bind(user_id.0)
        .bind(chat_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(ms,)| {
            let joined_at = DateTime::<Utc>::from_timestamp_millis(ms)
                .ok_or_else(|| Error::message(format!("join time out of range: {ms}")))?;
            Ok(MembershipRecord {
                user_id,
                chat_id,
                joined_at,
            })
        })
        .transpose()
    }
}
