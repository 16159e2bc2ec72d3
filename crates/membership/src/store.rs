//! Persistence trait for first-seen records.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    spamguard_common::{ChatId, UserId},
};

use crate::Result;

/// First observed message of a user in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipRecord {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub joined_at: DateTime<Utc>,
}

/// Storage backend for the membership ledger.
///
/// Implementations must make `insert_if_absent` atomic per key: two
/// concurrent inserts for the same pair leave exactly one row.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert the record unless one already exists for its key.
    /// Returns `true` when a row was written.
    async fn insert_if_absent(&self, record: MembershipRecord) -> Result<bool>;

    /// Point lookup by key.
    async fn get(&self, user_id: UserId, chat_id: ChatId) -> Result<Option<MembershipRecord>>;
}
