//! Configuration loading, validation, env substitution, and env overrides.
//!
//! Config files: `spamguard.toml`, `spamguard.yaml`, or `spamguard.json`
//! Searched in `./` then `~/.config/spamguard/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, plus the
//! deployment variables `TELEGRAM_BOT_TOKEN`, `ADMIN_CHAT_ID`, `ALLOWED_CHATS`,
//! `CLASSIFIER_URL`, `PROBATION_HOURS` and `DATABASE_URL`.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, data_dir, database_url, discover_and_load, load_config},
    schema::{
        ClassifierConfig, DatabaseConfig, DeliveryConfig, MetricsConfig, ModerationConfig,
        SpamguardConfig, TelegramConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
