//! Outbound side of the chat transport, as seen by the moderation core.

use std::time::Duration;

use {
    async_trait::async_trait,
    spamguard_common::{ChatId, MemberRole, MessageId, UserId},
    thiserror::Error,
};

use crate::control::Control;

/// Failure of a single transport call.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The platform asked us to wait before trying again.
    #[error("rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The bot lacks the rights for the operation.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// The target message no longer exists.
    #[error("message already gone")]
    AlreadyGone,

    #[error("{message}")]
    Other { message: String },
}

impl DeliveryError {
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Chat operations the moderation core performs.
///
/// Implementations map platform errors onto [`DeliveryError`] and never
/// retry on their own; retry policy lives in [`crate::DeliveryGuard`].
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Role of `user_id` in `chat_id`.
    async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberRole, DeliveryError>;

    /// Post `text` to `chat_id`, optionally with a single inline control.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        control: Option<&Control>,
    ) -> Result<MessageId, DeliveryError>;

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError>;

    /// Remove the inline controls from a message the bot sent earlier.
    async fn clear_controls(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError>;
}
