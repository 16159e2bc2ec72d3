//! In-process fakes shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use {
    async_trait::async_trait,
    spamguard_classifier::{RetrainOutcome, SpamClassifier, SpamVerdict},
    spamguard_common::{ChatId, MemberRole, MessageId, UserId},
    spamguard_membership::{MembershipRecord, MembershipStore},
};

use crate::{
    control::Control,
    gateway::{ChatGateway, DeliveryError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    pub control: Option<Control>,
}

#[derive(Default)]
struct GatewayState {
    roles: HashMap<(ChatId, UserId), MemberRole>,
    sent: Vec<Sent>,
    send_attempts: usize,
    send_failures: VecDeque<DeliveryError>,
    deleted: Vec<(ChatId, MessageId)>,
    delete_failures: VecDeque<DeliveryError>,
    cleared: Vec<(ChatId, MessageId)>,
    next_id: i32,
}

/// Records every outbound call. Unknown members are plain members.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
}

impl FakeGateway {
    fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_role(&self, chat_id: ChatId, user_id: UserId, role: MemberRole) {
        self.state().roles.insert((chat_id, user_id), role);
    }

    pub fn push_send_failure(&self, err: DeliveryError) {
        self.state().send_failures.push_back(err);
    }

    pub fn push_delete_failure(&self, err: DeliveryError) {
        self.state().delete_failures.push_back(err);
    }

    pub fn send_attempts(&self) -> usize {
        self.state().send_attempts
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state().sent.clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<Sent> {
        self.state()
            .sent
            .iter()
            .filter(|s| s.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.state().deleted.clone()
    }

    pub fn cleared(&self) -> Vec<(ChatId, MessageId)> {
        self.state().cleared.clone()
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberRole, DeliveryError> {
        Ok(self
            .state()
            .roles
            .get(&(chat_id, user_id))
            .copied()
            .unwrap_or(MemberRole::Member))
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        control: Option<&Control>,
    ) -> Result<MessageId, DeliveryError> {
        let mut state = self.state();
        state.send_attempts += 1;
        if let Some(err) = state.send_failures.pop_front() {
            return Err(err);
        }
        state.next_id += 1;
        let message_id = MessageId(1000 + state.next_id);
        state.sent.push(Sent {
            chat_id,
            message_id,
            text: text.to_string(),
            control: control.copied(),
        });
        Ok(message_id)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        let mut state = self.state();
        if let Some(err) = state.delete_failures.pop_front() {
            return Err(err);
        }
        state.deleted.push((chat_id, message_id));
        Ok(())
    }

    async fn clear_controls(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        self.state().cleared.push((chat_id, message_id));
        Ok(())
    }
}

#[derive(Default)]
struct ClassifierState {
    spam_texts: Vec<String>,
    unavailable: bool,
    classified: Vec<String>,
    false_positives: Vec<String>,
    confirmed_spam: Vec<String>,
    retrains: usize,
}

/// Treats any text containing one of the configured spam phrases as spam.
#[derive(Default)]
pub struct FakeClassifier {
    state: Mutex<ClassifierState>,
}

impl FakeClassifier {
    fn state(&self) -> std::sync::MutexGuard<'_, ClassifierState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn flag(&self, phrase: &str) {
        self.state().spam_texts.push(phrase.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    pub fn classified(&self) -> Vec<String> {
        self.state().classified.clone()
    }

    pub fn false_positives(&self) -> Vec<String> {
        self.state().false_positives.clone()
    }

    pub fn confirmed_spam(&self) -> Vec<String> {
        self.state().confirmed_spam.clone()
    }

    pub fn retrains(&self) -> usize {
        self.state().retrains
    }
}

#[async_trait]
impl SpamClassifier for FakeClassifier {
    async fn classify(&self, text: &str) -> spamguard_classifier::Result<SpamVerdict> {
        let mut state = self.state();
        state.classified.push(text.to_string());
        if state.unavailable {
            return Err(spamguard_classifier::Error::message("scorer down"));
        }
        let is_spam = state.spam_texts.iter().any(|p| text.contains(p.as_str()));
        Ok(SpamVerdict { is_spam })
    }

    async fn report_false_positive(&self, text: &str) -> spamguard_classifier::Result<()> {
        let mut state = self.state();
        state.false_positives.push(text.to_string());
        if state.unavailable {
            return Err(spamguard_classifier::Error::message("scorer down"));
        }
        Ok(())
    }

    async fn report_confirmed_spam(&self, text: &str) -> spamguard_classifier::Result<()> {
        let mut state = self.state();
        state.confirmed_spam.push(text.to_string());
        if state.unavailable {
            return Err(spamguard_classifier::Error::message("scorer down"));
        }
        Ok(())
    }

    async fn trigger_retrain(&self) -> spamguard_classifier::Result<RetrainOutcome> {
        let mut state = self.state();
        state.retrains += 1;
        if state.unavailable {
            return Err(spamguard_classifier::Error::message("scorer down"));
        }
        Ok(RetrainOutcome {
            message: "Model retrained".into(),
        })
    }
}

/// Membership store whose backend is down.
#[derive(Default)]
pub struct UnavailableStore {
    calls: Mutex<usize>,
}

impl UnavailableStore {
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fail<T>(&self) -> spamguard_membership::Result<T> {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Err(spamguard_membership::Error::message("database is locked"))
    }
}

#[async_trait]
impl MembershipStore for UnavailableStore {
    async fn insert_if_absent(
        &self,
        _record: MembershipRecord,
    ) -> spamguard_membership::Result<bool> {
        self.fail()
    }

    async fn get(
        &self,
        _user_id: UserId,
        _chat_id: ChatId,
    ) -> spamguard_membership::Result<Option<MembershipRecord>> {
        self.fail()
    }
}
