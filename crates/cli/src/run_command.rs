//! `spamguard run`: wire config, storage, classifier, and transport together
//! and poll until interrupted.

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    spamguard_classifier::{HttpClassifier, HttpClassifierConfig},
    spamguard_config::{Severity, SpamguardConfig},
    spamguard_membership::{MembershipLedger, store_sqlite::SqliteMembershipStore},
    spamguard_metrics::{MetricsRecorderConfig, init_metrics},
    spamguard_moderation::{
        DeliveryPolicy, ModerationEngine, ModerationFlags, ModerationSettings, SharedFlags,
    },
    spamguard_telegram::{TelegramGateway, TelegramSettings, build_bot, start_polling},
    tracing::{error, info, warn},
};

use crate::db_commands;

pub async fn run(config: SpamguardConfig, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = &config_path {
        info!(path = %path.display(), "loaded config");
    }

    let validation = spamguard_config::validate(&config, config_path);
    for d in &validation.diagnostics {
        match d.severity {
            Severity::Error => error!(path = d.path, "{}", d.message),
            Severity::Warning => warn!(path = d.path, "{}", d.message),
        }
    }
    if validation.has_errors() {
        anyhow::bail!(
            "configuration has {} error(s); run `spamguard doctor` for details",
            validation.count(Severity::Error)
        );
    }
    let Some(admin_chat_id) = config.telegram.admin_chat_id else {
        anyhow::bail!("admin chat id is not set");
    };

    let listen = config
        .metrics
        .listen
        .as_deref()
        .map(str::parse)
        .transpose()?;
    let _metrics = init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        listen,
        global_labels: vec![("service".into(), "spamguard".into())],
    })?;

    let pool = db_commands::open_pool(&config).await?;
    spamguard_membership::run_migrations(&pool).await?;
    let ledger = MembershipLedger::new(Arc::new(SqliteMembershipStore::with_pool(pool)));

    let classifier = HttpClassifier::new(HttpClassifierConfig {
        base_url: config.classifier.base_url.clone(),
        timeout: Duration::from_secs(config.classifier.timeout_secs),
        retrain_timeout: Duration::from_secs(config.classifier.retrain_timeout_secs),
        spam_label: config.classifier.spam_label.clone(),
    })?;

    let settings = TelegramSettings {
        token: config.telegram.token.clone(),
        admin_chat_id,
        allowed_chats: config.telegram.allowed_chats.clone(),
        poll_timeout_secs: config.telegram.poll_timeout_secs,
    };
    let bot = build_bot(&settings)?;

    let engine = Arc::new(ModerationEngine::new(
        ModerationSettings {
            admin_chat_id,
            notice_ttl: Duration::from_secs(config.moderation.notice_ttl_secs),
        },
        SharedFlags::new(ModerationFlags {
            training_mode: config.moderation.training_mode,
            graceful_mode: config.moderation.graceful_mode,
            probation_hours: config.moderation.probation_hours,
        }),
        ledger,
        Arc::new(classifier),
        Arc::new(TelegramGateway::new(bot.clone())),
        DeliveryPolicy {
            max_retries: config.delivery.max_retries,
            max_total_wait: Duration::from_secs(config.delivery.max_total_wait_secs),
        },
    ));

    let cancel = start_polling(bot, settings, engine).await?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
            cancel.cancel();
            Ok(())
        },
        () = cancel.cancelled() => {
            anyhow::bail!("polling stopped; is another instance running with the same token?")
        },
    }
}
