use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    spamguard_common::ChatId,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamguardConfig {
    pub telegram: TelegramConfig,
    pub classifier: ClassifierConfig,
    pub moderation: ModerationConfig,
    pub delivery: DeliveryConfig,
    pub database: DatabaseConfig,
    pub metrics: MetricsConfig,
}

/// Bot credentials and the chats the bot is allowed to act in.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Chat that receives moderation notices and accepts review controls.
    pub admin_chat_id: Option<ChatId>,

    /// Chats under moderation. The admin chat is always allowed.
    pub allowed_chats: Vec<ChatId>,

    /// Long-polling timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u32,
}

impl TelegramConfig {
    /// Whether events from `chat_id` may be processed.
    #[must_use]
    pub fn is_chat_allowed(&self, chat_id: ChatId) -> bool {
        self.admin_chat_id == Some(chat_id) || self.allowed_chats.contains(&chat_id)
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("admin_chat_id", &self.admin_chat_id)
            .field("allowed_chats", &self.allowed_chats)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            admin_chat_id: None,
            allowed_chats: Vec::new(),
            poll_timeout_secs: 30,
        }
    }
}

/// Remote spam scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of the scoring service; endpoint paths are appended.
    pub base_url: String,
    /// Upper bound for predict and feedback calls, in seconds.
    pub timeout_secs: u64,
    /// Upper bound for the retrain call, in seconds. Retraining runs a
    /// training loop on the service side and is much slower than scoring.
    pub retrain_timeout_secs: u64,
    /// Value of the `result` field that marks a message as spam.
    pub spam_label: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://pyrobertaapi:8001".into(),
            timeout_secs: 30,
            retrain_timeout_secs: 600,
            spam_label: "Спам".into(),
        }
    }
}

/// Initial moderation mode. Admin commands change these at runtime; the
/// changes last until restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Membership age, in hours, during which messages are evaluated.
    pub probation_hours: u32,
    /// Evaluate every sender, administrators included.
    pub training_mode: bool,
    /// Flag spam to the admin chat but never delete it.
    pub graceful_mode: bool,
    /// Lifetime of the removal notice posted to the origin chat, in seconds.
    pub notice_ttl_secs: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            probation_hours: 2,
            training_mode: false,
            graceful_mode: false,
            notice_ttl_secs: 30,
        }
    }
}

/// Rate-limit retry bounds for outbound notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Retries after a "retry after" rejection before giving up.
    pub max_retries: u32,
    /// Cap on the accumulated wait across all retries of one send, in seconds.
    pub max_total_wait_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_total_wait_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL. Defaults to `spamguard.db` in the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Address for the Prometheus scrape endpoint, e.g. `127.0.0.1:9464`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
}
