use {
    spamguard_common::{ChatId, UserId},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum Error {
    /// No first-seen record exists for the pair.
    #[error("no membership record for user {user_id} in chat {chat_id}")]
    NotFound { user_id: UserId, chat_id: ChatId },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn not_found(user_id: UserId, chat_id: ChatId) -> Self {
        Self::NotFound { user_id, chat_id }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Whether this is a ledger miss rather than a storage failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
