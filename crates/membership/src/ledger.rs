use std::sync::Arc;

use {
    chrono::{DateTime, Duration, Utc},
    spamguard_common::{ChatId, UserId},
    tracing::debug,
};

use crate::{
    Error, Result,
    store::{MembershipRecord, MembershipStore},
};

/// Answers "is this user still on probation in this chat?".
///
/// The ledger owns all first-seen records; nothing else writes to its store.
#[derive(Clone)]
pub struct MembershipLedger {
    store: Arc<dyn MembershipStore>,
}

impl MembershipLedger {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Stamp `now` as the user's join time unless a stamp already exists.
    ///
    /// Returns `true` if this call created the record.
    pub async fn record_first_seen(
        &self,
        user_id: UserId,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let inserted = self
            .store
            .insert_if_absent(MembershipRecord {
                user_id,
                chat_id,
                joined_at: now,
            })
            .await?;
        if inserted {
            debug!(user_id = user_id.0, chat_id = chat_id.0, "recorded first-seen time");
        }
        Ok(inserted)
    }

    pub async fn is_known(&self, user_id: UserId, chat_id: ChatId) -> Result<bool> {
        Ok(self.store.get(user_id, chat_id).await?.is_some())
    }

    /// `true` iff less than `probation_hours` have passed since the user's
    /// first observed message.
    ///
    /// Fails with [`Error::NotFound`] when no record exists; callers record
    /// first-seen before asking.
    pub async fn is_within_probation(
        &self,
        user_id: UserId,
        chat_id: ChatId,
        probation_hours: u32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let record = self
            .store
            .get(user_id, chat_id)
            .await?
            .ok_or_else(|| Error::not_found(user_id, chat_id))?;
        let window = Duration::hours(i64::from(probation_hours));
        Ok(now.signed_duration_since(record.joined_at) < window)
    }
}
