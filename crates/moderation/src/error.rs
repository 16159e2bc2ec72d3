use {
    spamguard_common::{ChatId, UserId},
    thiserror::Error,
};

use crate::gateway::DeliveryError;

/// Per-event failure. None of these stop the consumer loop.
#[derive(Debug, Error)]
pub enum Error {
    /// Ledger miss after first-seen was recorded.
    #[error("no membership record for user {user_id} in chat {chat_id}")]
    NotFound { user_id: UserId, chat_id: ChatId },

    #[error("membership storage failed: {0}")]
    Storage(#[source] spamguard_membership::Error),

    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(#[from] spamguard_classifier::Error),

    #[error("delivery failed: {0}")]
    Delivery(#[source] DeliveryError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },
}

impl Error {
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "storage",
            Self::ClassifierUnavailable(_) => "classifier_unavailable",
            Self::Delivery(_) => "delivery",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::PermissionDenied { .. } => "permission_denied",
        }
    }
}

impl From<spamguard_membership::Error> for Error {
    fn from(err: spamguard_membership::Error) -> Self {
        match err {
            spamguard_membership::Error::NotFound { user_id, chat_id } => {
                Self::NotFound { user_id, chat_id }
            },
            other => Self::Storage(other),
        }
    }
}

impl From<DeliveryError> for Error {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::PermissionDenied { message } => Self::PermissionDenied { message },
            other => Self::Delivery(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
