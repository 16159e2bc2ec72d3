use std::{sync::Arc, time::Duration};

use {
    chrono::Utc,
    spamguard_classifier::SpamClassifier,
    spamguard_common::{ChatId, MemberRole, MessageId, UserId},
    spamguard_membership::MembershipLedger,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use spamguard_metrics::{counter, labels, moderation as mod_metrics};

use crate::{
    Error, Result,
    control::Control,
    decision::{self, Action, SkipReason},
    delivery::{DeliveryGuard, DeliveryPolicy},
    flags::SharedFlags,
    gateway::{ChatGateway, DeliveryError},
    notice::{AdminNotice, NoticeKind, removal_warning},
    review::{self, AdminAction},
};

#[derive(Debug, Clone)]
pub struct ModerationSettings {
    /// Receives every notice and hosts every control.
    pub admin_chat_id: ChatId,
    /// Lifetime of the removal warning posted to the origin chat.
    pub notice_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
}

impl Sender {
    /// How the removal warning addresses the sender.
    #[must_use]
    pub fn addressee(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.first_name.clone(),
        }
    }
}

/// A chat message with text or a caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Sender,
    pub text: String,
}

/// An inline control pressed on a message the bot posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPress {
    /// Chat of the message hosting the control.
    pub chat_id: ChatId,
    /// Message hosting the control.
    pub message_id: MessageId,
    pub user_id: UserId,
    pub token: String,
    /// Text of the hosting message, when the platform still provides it.
    pub host_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(InboundMessage),
    Control(ControlPress),
}

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    /// Ham shown to the admins with a "mark as spam" control.
    ReviewRequested,
    /// Spam reported but left in place.
    Flagged,
    Deleted,
    /// Spam that had already disappeared from the chat.
    AlreadyRemoved,
    /// Spam the bot failed to delete.
    NotDeleted,
    /// An admin action ran; carries [`AdminAction::name`].
    Applied(&'static str),
    /// Nothing to do, e.g. an unknown command.
    Ignored,
    /// The event failed; carries [`Error::kind`].
    Failed(&'static str),
}

/// Per-message policy plus the admin review loop.
///
/// Events are handled one at a time by the caller; the only work that
/// outlives a call is the expiry of removal warnings.
pub struct ModerationEngine {
    settings: ModerationSettings,
    flags: SharedFlags,
    ledger: MembershipLedger,
    classifier: Arc<dyn SpamClassifier>,
    gateway: Arc<dyn ChatGateway>,
    delivery: DeliveryGuard,
}

impl ModerationEngine {
    pub fn new(
        settings: ModerationSettings,
        flags: SharedFlags,
        ledger: MembershipLedger,
        classifier: Arc<dyn SpamClassifier>,
        gateway: Arc<dyn ChatGateway>,
        policy: DeliveryPolicy,
    ) -> Self {
        let delivery = DeliveryGuard::new(Arc::clone(&gateway), policy);
        Self {
            settings,
            flags,
            ledger,
            classifier,
            gateway,
            delivery,
        }
    }

    pub fn flags(&self) -> &SharedFlags {
        &self.flags
    }

    pub fn settings(&self) -> &ModerationSettings {
        &self.settings
    }

    /// Handle one event, logging any failure instead of returning it.
    pub async fn handle_event(&self, event: InboundEvent) -> Outcome {
        let result = match &event {
            InboundEvent::Message(msg) => self.handle_message(msg).await,
            InboundEvent::Control(press) => self.handle_control(press).await,
        };
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "event handling failed, continuing");
                #[cfg(feature = "metrics")]
                counter!(mod_metrics::ERRORS_TOTAL, labels::KIND => e.kind()).increment(1);
                Outcome::Failed(e.kind())
            },
        }
    }

    /// Admin commands from privileged senders, moderation for everything
    /// else.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<Outcome> {
        let role = self
            .gateway
            .member_role(msg.chat_id, msg.sender.user_id)
            .await?;

        if role.is_privileged() {
            match review::parse_command(&msg.text) {
                Ok(Some(action)) => return self.apply(action, msg.chat_id).await,
                Ok(None) if msg.text.trim_start().starts_with('/') => {
                    debug!(
                        chat_id = msg.chat_id.0,
                        user_id = msg.sender.user_id.0,
                        "ignoring unknown command"
                    );
                    return Ok(Outcome::Ignored);
                },
                Ok(None) => {},
                Err(e) => {
                    self.notify_admin(AdminNotice::ack(format!("Command rejected: {e}"), None))
                        .await;
                    return Err(e);
                },
            }
        }

        self.moderate(msg, role).await
    }

    async fn moderate(&self, msg: &InboundMessage, role: MemberRole) -> Result<Outcome> {
        #[cfg(feature = "metrics")]
        counter!(mod_metrics::MESSAGES_TOTAL).increment(1);

        let flags = self.flags.snapshot();
        let user_id = msg.sender.user_id;

        if let Some(reason) = decision::exemption(role, &flags) {
            return Ok(skipped(reason));
        }

        let now = Utc::now();
        self.ledger
            .record_first_seen(user_id, msg.chat_id, now)
            .await?;
        let is_new = self
            .ledger
            .is_within_probation(user_id, msg.chat_id, flags.probation_hours, now)
            .await?;

        if let Some(reason) = decision::probation_gate(is_new, &flags) {
            return Ok(skipped(reason));
        }

        let verdict = self.classifier.classify(&msg.text).await.inspect_err(|e| {
            warn!(
                chat_id = msg.chat_id.0,
                message_id = msg.message_id.0,
                timeout = e.is_timeout(),
                "classifier failed, letting message through"
            );
        })?;
        debug!(
            chat_id = msg.chat_id.0,
            message_id = msg.message_id.0,
            user_id = user_id.0,
            is_spam = verdict.is_spam,
            "message classified"
        );
        #[cfg(feature = "metrics")]
        {
            let label = if verdict.is_spam { "spam" } else { "ham" };
            counter!(mod_metrics::VERDICTS_TOTAL, labels::VERDICT => label).increment(1);
        }

        let outcome = match decision::action_for(verdict.is_spam, &flags) {
            Action::RequestReview => {
                self.review(NoticeKind::NotSpam, msg).await;
                Outcome::ReviewRequested
            },
            Action::FlagOnly => {
                self.review(NoticeKind::NotDeletedGraceful, msg).await;
                Outcome::Flagged
            },
            Action::DeleteAndWarn => self.delete_spam(msg).await,
        };
        Ok(outcome)
    }

    async fn delete_spam(&self, msg: &InboundMessage) -> Outcome {
        let result = self
            .delivery
            .delete_reliable(msg.chat_id, msg.message_id)
            .await;

        let (kind, outcome) = match result {
            Ok(()) => {
                info!(
                    chat_id = msg.chat_id.0,
                    message_id = msg.message_id.0,
                    user_id = msg.sender.user_id.0,
                    "deleted spam"
                );
                #[cfg(feature = "metrics")]
                counter!(mod_metrics::DELETIONS_TOTAL).increment(1);
                (NoticeKind::Deleted, Outcome::Deleted)
            },
            Err(DeliveryError::AlreadyGone) => {
                debug!(
                    chat_id = msg.chat_id.0,
                    message_id = msg.message_id.0,
                    "spam already removed"
                );
                (NoticeKind::AlreadyRemoved, Outcome::AlreadyRemoved)
            },
            Err(e) => {
                warn!(
                    chat_id = msg.chat_id.0,
                    message_id = msg.message_id.0,
                    error = %e,
                    "failed to delete spam"
                );
                #[cfg(feature = "metrics")]
                counter!(mod_metrics::DELETION_FAILURES_TOTAL).increment(1);
                let kind = match e {
                    DeliveryError::PermissionDenied { .. } => NoticeKind::NotDeletedNoRights,
                    _ => NoticeKind::NotDeleted,
                };
                (kind, Outcome::NotDeleted)
            },
        };

        self.review(kind, msg).await;

        if outcome == Outcome::Deleted {
            // Detached; expiry is never awaited here.
            drop(self.delivery.send_ephemeral(
                msg.chat_id,
                removal_warning(&msg.sender.addressee()),
                self.settings.notice_ttl,
            ));
        }
        outcome
    }

    /// Decode and run a control press from the admin chat.
    pub async fn handle_control(&self, press: &ControlPress) -> Result<Outcome> {
        if press.chat_id != self.settings.admin_chat_id {
            return Err(Error::permission_denied(format!(
                "controls are only accepted in the admin chat, got chat {}",
                press.chat_id
            )));
        }

        let action = review::parse_callback(&press.token, press.host_text.as_deref())?;
        let outcome = self.apply(action, press.chat_id).await?;

        if let Err(e) = self
            .gateway
            .clear_controls(press.chat_id, press.message_id)
            .await
        {
            debug!(
                chat_id = press.chat_id.0,
                message_id = press.message_id.0,
                error = %e,
                "failed to clear controls"
            );
        }
        Ok(outcome)
    }

    /// Run an admin action. `origin_chat` is where it was issued.
    pub async fn apply(&self, action: AdminAction, origin_chat: ChatId) -> Result<Outcome> {
        let name = action.name();
        info!(action = name, chat_id = origin_chat.0, "admin action");
        #[cfg(feature = "metrics")]
        counter!(mod_metrics::ADMIN_ACTIONS_TOTAL, labels::ACTION => name).increment(1);

        match action {
            AdminAction::ToggleTraining => {
                let on = self.flags.toggle_training();
                self.ack(format!("Training mode: {}", on_off(on)), None)
                    .await;
            },
            AdminAction::ToggleGraceful => {
                let on = self.flags.toggle_graceful();
                self.ack(format!("Graceful mode: {}", on_off(on)), None)
                    .await;
            },
            AdminAction::SetProbation(hours) => {
                if let Err(e) = self.flags.set_probation_hours(hours) {
                    self.ack(format!("Command rejected: {e}"), None).await;
                    return Err(e);
                }
                self.ack(format!("Probation window: {hours} h"), None)
                    .await;
            },
            AdminAction::Retrain => {
                if origin_chat != self.settings.admin_chat_id {
                    debug!(chat_id = origin_chat.0, "retrain is only accepted in the admin chat");
                    return Ok(Outcome::Ignored);
                }
                self.retrain().await?;
            },
            AdminAction::AckRetrain => self.retrain().await?,
            AdminAction::ConfirmNotSpam { text } => {
                if let Err(e) = self.classifier.report_false_positive(&text).await {
                    warn!(error = %e, "failed to record false positive");
                }
                self.ack("Marked as not spam.", Some(Control::Retrain))
                    .await;
            },
            AdminAction::MarkSpam {
                chat_id,
                message_id,
                text,
            } => {
                match self.delivery.delete_reliable(chat_id, message_id).await {
                    Ok(()) => info!(
                        chat_id = chat_id.0,
                        message_id = message_id.0,
                        "deleted spam marked by admin"
                    ),
                    Err(DeliveryError::AlreadyGone) => debug!(
                        chat_id = chat_id.0,
                        message_id = message_id.0,
                        "marked message already gone"
                    ),
                    Err(e) => warn!(
                        chat_id = chat_id.0,
                        message_id = message_id.0,
                        error = %e,
                        "failed to delete message marked as spam"
                    ),
                }
                if let Err(e) = self.classifier.report_confirmed_spam(&text).await {
                    warn!(error = %e, "failed to record confirmed spam");
                }
                self.ack(
                    "Marked as spam. Retrain the model to apply.",
                    Some(Control::Retrain),
                )
                .await;
            },
        }
        Ok(Outcome::Applied(name))
    }

    async fn retrain(&self) -> Result<()> {
        match self.classifier.trigger_retrain().await {
            Ok(outcome) => {
                info!(message = %outcome.message, "model retrained");
                let text = if outcome.message.is_empty() {
                    "Model retrained.".to_string()
                } else {
                    format!("Model retrained: {}", outcome.message)
                };
                self.ack(text, None).await;
                Ok(())
            },
            Err(e) => {
                self.ack(format!("Retraining failed: {e}"), None).await;
                Err(e.into())
            },
        }
    }

    async fn review(&self, kind: NoticeKind, msg: &InboundMessage) {
        let origin = Control::MarkSpam {
            chat_id: msg.chat_id,
            message_id: msg.message_id,
        };
        self.notify_admin(AdminNotice::review(kind, &msg.text, origin))
            .await;
    }

    async fn ack(&self, text: impl Into<String>, control: Option<Control>) {
        self.notify_admin(AdminNotice::ack(text, control)).await;
    }

    /// Post to the admin chat. Failures are logged per message; a lost
    /// header does not stop the reviewed text and its control.
    async fn notify_admin(&self, notice: AdminNotice) {
        let admin = self.settings.admin_chat_id;
        for (text, control) in notice.messages() {
            if let Err(e) = self
                .delivery
                .send_reliable(admin, text, control.as_ref())
                .await
            {
                warn!(chat_id = admin.0, error = %e, "failed to notify admin chat");
            }
        }
    }
}

fn skipped(reason: SkipReason) -> Outcome {
    debug!(reason = reason.as_str(), "message skipped");
    #[cfg(feature = "metrics")]
    counter!(mod_metrics::SKIPPED_TOTAL, labels::REASON => reason.as_str()).increment(1);
    Outcome::Skipped(reason)
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
