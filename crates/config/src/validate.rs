//! Semantic validation of a loaded configuration.
//!
//! Missing credentials are the only process-fatal problem; everything else
//! is reported so `spamguard doctor` can show it before the bot starts.

use {secrecy::ExposeSecret, std::path::PathBuf};

use crate::schema::SpamguardConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "telegram.admin_chat_id"
    pub path: &'static str,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Validate a configuration after env overrides have been applied.
#[must_use]
pub fn validate(config: &SpamguardConfig, config_path: Option<PathBuf>) -> ValidationResult {
    let mut result = ValidationResult {
        diagnostics: Vec::new(),
        config_path,
    };

    let token = config.telegram.token.expose_secret();
    if token.is_empty() {
        result.push(
            Severity::Error,
            "telegram.token",
            "bot token is not set (TELEGRAM_BOT_TOKEN)",
        );
    } else if token.contains("${") {
        result.push(
            Severity::Error,
            "telegram.token",
            "bot token contains an unresolved ${...} placeholder",
        );
    }

    if config.telegram.admin_chat_id.is_none() {
        result.push(
            Severity::Error,
            "telegram.admin_chat_id",
            "admin chat id is not set (ADMIN_CHAT_ID)",
        );
    }

    if config.telegram.allowed_chats.is_empty() {
        result.push(
            Severity::Warning,
            "telegram.allowed_chats",
            "no chats under moderation; only the admin chat will be processed",
        );
    }

    if config.moderation.probation_hours == 0 {
        result.push(
            Severity::Error,
            "moderation.probation_hours",
            "probation window must be at least one hour",
        );
    }

    if config.classifier.timeout_secs == 0 || config.classifier.retrain_timeout_secs == 0 {
        result.push(
            Severity::Error,
            "classifier.timeout_secs",
            "classifier timeouts must be positive",
        );
    }

    if http_url_rest(&config.classifier.base_url).is_none() {
        result.push(
            Severity::Error,
            "classifier.base_url",
            format!(
                "classifier url must start with http:// or https://: {:?}",
                config.classifier.base_url
            ),
        );
    }

    if config.delivery.max_total_wait_secs == 0 {
        result.push(
            Severity::Warning,
            "delivery.max_total_wait_secs",
            "rate-limited notices will never be retried",
        );
    }

    if let Some(listen) = config.metrics.listen.as_deref().filter(|_| config.metrics.enabled) {
        if listen.parse::<std::net::SocketAddr>().is_err() {
            result.push(
                Severity::Error,
                "metrics.listen",
                format!("not a socket address: {listen:?}"),
            );
        }
    }

    result
}

fn http_url_rest(url: &str) -> Option<&str> {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .filter(|rest| !rest.is_empty())
}
