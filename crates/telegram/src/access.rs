use {
    spamguard_common::ChatId,
    std::{collections::HashSet, fmt},
};

use crate::config::TelegramSettings;

/// Chats whose events the bot processes: the moderated chats plus the admin
/// chat.
#[derive(Debug, Clone)]
pub struct ChatAccess {
    admin_chat_id: ChatId,
    allowed: HashSet<ChatId>,
}

impl ChatAccess {
    pub fn new(admin_chat_id: ChatId, allowed: impl IntoIterator<Item = ChatId>) -> Self {
        Self {
            admin_chat_id,
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn from_settings(settings: &TelegramSettings) -> Self {
        Self::new(settings.admin_chat_id, settings.allowed_chats.iter().copied())
    }

    /// Determine if an event from `chat_id` should be processed.
    ///
    /// Returns `Err(reason)` if it should be dropped.
    pub fn check(&self, chat_id: ChatId) -> Result<(), AccessDenied> {
        if chat_id == self.admin_chat_id || self.allowed.contains(&chat_id) {
            Ok(())
        } else {
            Err(AccessDenied::ChatNotAllowed(chat_id))
        }
    }
}

/// Reason an event was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    ChatNotAllowed(ChatId),
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChatNotAllowed(chat_id) => write!(f, "chat {chat_id} is not moderated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_chat_is_always_allowed() {
        let access = ChatAccess::new(ChatId(-1), []);
        assert!(access.check(ChatId(-1)).is_ok());
    }

    #[test]
    fn listed_chats_are_allowed() {
        let access = ChatAccess::new(ChatId(-1), [ChatId(-2), ChatId(-3)]);
        assert!(access.check(ChatId(-3)).is_ok());
    }

    #[test]
    fn unknown_chats_are_denied() {
        let access = ChatAccess::new(ChatId(-1), [ChatId(-2)]);
        assert_eq!(
            access.check(ChatId(99)),
            Err(AccessDenied::ChatNotAllowed(ChatId(99)))
        );
        assert_eq!(
            AccessDenied::ChatNotAllowed(ChatId(99)).to_string(),
            "chat 99 is not moderated"
        );
    }
}
