use {
    secrecy::{ExposeSecret, Secret},
    spamguard_common::ChatId,
    std::time::Duration,
};

/// Runtime settings of the bot connection.
#[derive(Clone)]
pub struct TelegramSettings {
    /// Bot token from @BotFather.
    pub token: Secret<String>,
    /// Chat that receives notices and hosts review controls.
    pub admin_chat_id: ChatId,
    /// Chats under moderation.
    pub allowed_chats: Vec<ChatId>,
    /// `getUpdates` long-polling timeout, in seconds.
    pub poll_timeout_secs: u32,
}

impl TelegramSettings {
    /// HTTP client timeout. Must outlast the long poll or the client aborts
    /// requests Telegram is still holding open.
    #[must_use]
    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_timeout_secs) + 15)
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("token", &"[REDACTED]")
            .field("admin_chat_id", &self.admin_chat_id)
            .field("allowed_chats", &self.allowed_chats)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}
