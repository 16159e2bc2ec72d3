//! Metric name and label definitions.
//!
//! Every metric name recorded anywhere in spamguard lives here so the set of
//! exported series is documented in one place.

/// Moderation pipeline metrics
pub mod moderation {
    /// Inbound chat messages that reached the decision engine
    pub const MESSAGES_TOTAL: &str = "spamguard_moderation_messages_total";
    /// Messages skipped before classification (labelled by `reason`)
    pub const SKIPPED_TOTAL: &str = "spamguard_moderation_skipped_total";
    /// Classifier verdicts (labelled by `verdict`: spam, ham)
    pub const VERDICTS_TOTAL: &str = "spamguard_moderation_verdicts_total";
    /// Spam messages removed from a chat
    pub const DELETIONS_TOTAL: &str = "spamguard_moderation_deletions_total";
    /// Spam messages that could not be removed
    pub const DELETION_FAILURES_TOTAL: &str = "spamguard_moderation_deletion_failures_total";
    /// Admin commands and control presses (labelled by `action`)
    pub const ADMIN_ACTIONS_TOTAL: &str = "spamguard_moderation_admin_actions_total";
    /// Per-message errors swallowed by the consumer loop (labelled by `kind`)
    pub const ERRORS_TOTAL: &str = "spamguard_moderation_errors_total";
}

/// Outbound delivery metrics
pub mod delivery {
    /// Rate-limit retries performed by the delivery guard
    pub const RATE_LIMIT_RETRIES_TOTAL: &str = "spamguard_delivery_rate_limit_retries_total";
    /// Sends that failed after the guard gave up
    pub const FAILURES_TOTAL: &str = "spamguard_delivery_failures_total";
    /// Ephemeral notices deleted after their TTL
    pub const EPHEMERAL_EXPIRED_TOTAL: &str = "spamguard_delivery_ephemeral_expired_total";
}

/// Classifier client metrics
pub mod classifier {
    /// Requests sent to the scoring service (labelled by `endpoint`)
    pub const REQUESTS_TOTAL: &str = "spamguard_classifier_requests_total";
    /// Failed requests (labelled by `endpoint`)
    pub const ERRORS_TOTAL: &str = "spamguard_classifier_errors_total";
    /// Request duration in seconds (labelled by `endpoint`)
    pub const REQUEST_DURATION_SECONDS: &str = "spamguard_classifier_request_duration_seconds";
}

/// Telegram transport metrics
pub mod telegram {
    /// Updates received from `getUpdates`
    pub const UPDATES_RECEIVED_TOTAL: &str = "spamguard_telegram_updates_received_total";
    /// Updates dropped because the chat is not allowed
    pub const UPDATES_DROPPED_TOTAL: &str = "spamguard_telegram_updates_dropped_total";
    /// `getUpdates` failures
    pub const POLLING_ERRORS_TOTAL: &str = "spamguard_telegram_polling_errors_total";
}

/// Common label keys
pub mod labels {
    pub const REASON: &str = "reason";
    pub const VERDICT: &str = "verdict";
    pub const ACTION: &str = "action";
    pub const KIND: &str = "kind";
    pub const ENDPOINT: &str = "endpoint";
}

/// Histogram bucket boundaries
pub mod buckets {
    /// Classifier round-trip buckets (in seconds), 10ms to 2 minutes.
    pub const CLASSIFIER_DURATION: &[f64] = &[
        0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
    ];
}
