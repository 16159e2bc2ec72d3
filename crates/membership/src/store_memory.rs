//! In-memory store for tests and ephemeral runs.

use std::{collections::HashMap, sync::Mutex};

use {
    async_trait::async_trait,
    spamguard_common::{ChatId, UserId},
};

use crate::{
    Result,
    store::{MembershipRecord, MembershipStore},
};

/// In-memory store backed by `HashMap`. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryMembershipStore {
    records: Mutex<HashMap<(UserId, ChatId), MembershipRecord>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn insert_if_absent(&self, record: MembershipRecord) -> Result<bool> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let key = (record.user_id, record.chat_id);
        if records.contains_key(&key) {
            return Ok(false);
        }
        records.insert(key, record);
        Ok(true)
    }

    async fn get(&self, user_id: UserId, chat_id: ChatId) -> Result<Option<MembershipRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(&(user_id, chat_id)).copied())
    }
}
