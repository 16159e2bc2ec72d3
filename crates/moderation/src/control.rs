//! Inline controls attached to admin notices.
//!
//! A control travels as a short callback token: `fine`, `retrain`, or
//! `spam:<chat_id>:<message_id>`. Tokens only carry numeric fields; the
//! message text a control refers to is the body of the notice hosting it
//! (see [`crate::notice`]).

use spamguard_common::{ChatId, MessageId};

const NOT_SPAM_TOKEN: &str = "fine";
const RETRAIN_TOKEN: &str = "retrain";
const MARK_SPAM_PREFIX: &str = "spam:";

/// Telegram rejects callback data longer than this.
#[cfg(test)]
const MAX_TOKEN_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// The hosted text was wrongly flagged.
    NotSpam,
    /// Ask the classifier to retrain.
    Retrain,
    /// The hosted text is spam; delete the original message.
    MarkSpam {
        chat_id: ChatId,
        message_id: MessageId,
    },
}

impl Control {
    /// Button caption.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotSpam => "Not spam",
            Self::Retrain => "Retrain model",
            Self::MarkSpam { .. } => "Spam",
        }
    }

    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::NotSpam => NOT_SPAM_TOKEN.to_string(),
            Self::Retrain => RETRAIN_TOKEN.to_string(),
            Self::MarkSpam {
                chat_id,
                message_id,
            } => format!("{MARK_SPAM_PREFIX}{chat_id}:{message_id}"),
        }
    }

    /// Decode a callback token. Unknown or malformed tokens yield `None`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            NOT_SPAM_TOKEN => Some(Self::NotSpam),
            RETRAIN_TOKEN => Some(Self::Retrain),
            _ => {
                let rest = token.strip_prefix(MARK_SPAM_PREFIX)?;
                let (chat, message) = rest.split_once(':')?;
                Some(Self::MarkSpam {
                    chat_id: chat.parse().ok()?,
                    message_id: message.parse().ok()?,
                })
            },
        }
    }
}
