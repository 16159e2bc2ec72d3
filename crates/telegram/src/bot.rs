use std::{sync::Arc, time::Duration};

use {
    spamguard_moderation::ModerationEngine,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use spamguard_metrics::{counter, telegram as tg_metrics};

use crate::{
    Error, Result,
    access::ChatAccess,
    config::TelegramSettings,
    handlers::{self, HandlerContext},
};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Build the bot with an HTTP client that outlasts the long poll.
pub fn build_bot(settings: &TelegramSettings) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(settings.client_timeout())
        .build()
        .map_err(|e| Error::external("failed to build telegram http client", e))?;
    Ok(Bot::with_client(settings.token(), client))
}

/// Commands offered in the Telegram client's autocomplete.
fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("toggle_training", "Evaluate every sender, admins included"),
        BotCommand::new("toggle_graceful", "Flag spam without deleting it"),
        BotCommand::new("set_probation", "Set the probation window in hours"),
        BotCommand::new("retrain", "Retrain the spam model"),
    ]
}

/// Verify credentials and start the polling loop.
///
/// Updates are handled one at a time in arrival order. The loop runs until
/// the returned token is cancelled, or cancels it itself when another
/// process starts polling with the same token.
pub async fn start_polling(
    bot: Bot,
    settings: TelegramSettings,
    engine: Arc<ModerationEngine>,
) -> Result<CancellationToken> {
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().await?;

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    let flags = engine.flags().snapshot();
    info!(
        username = ?bot_username,
        admin_chat_id = settings.admin_chat_id.0,
        moderated_chats = settings.allowed_chats.len(),
        probation_hours = flags.probation_hours,
        training_mode = flags.training_mode,
        graceful_mode = flags.graceful_mode,
        "telegram bot connected"
    );

    let cancel = CancellationToken::new();
    let ctx = HandlerContext {
        access: ChatAccess::from_settings(&settings),
        engine,
    };
    tokio::spawn(poll_loop(bot, ctx, settings.poll_timeout_secs, cancel.clone()));
    Ok(cancel)
}

async fn poll_loop(bot: Bot, ctx: HandlerContext, timeout_secs: u32, cancel: CancellationToken) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = bot
                .get_updates()
                .offset(offset)
                .timeout(timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
                .send() => result,
        };

        match result {
            Ok(updates) => {
                if !updates.is_empty() {
                    debug!(count = updates.len(), "got telegram updates");
                }
                for update in updates {
                    offset = update.id.as_offset();
                    handlers::handle_update(update, &bot, &ctx).await;
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                error!("another instance is polling with this token, stopping");
                cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                #[cfg(feature = "metrics")]
                counter!(tg_metrics::POLLING_ERRORS_TOTAL).increment(1);
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                }
            },
        }
    }
    info!("telegram polling stopped");
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock_api::{ADMIN_CHAT, GROUP, MockBotApi, StaticClassifier, test_engine},
        secrecy::Secret,
        serde_json::json,
    };

    fn settings() -> TelegramSettings {
        TelegramSettings {
            token: Secret::new("test-token".into()),
            admin_chat_id: ADMIN_CHAT,
            allowed_chats: vec![GROUP],
            poll_timeout_secs: 1,
        }
    }

    async fn wait_for(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[test]
    fn registered_commands_are_parseable() {
        for command in bot_commands() {
            let text = format!("/{} 3", command.command);
            assert!(
                spamguard_moderation::review::parse_command(&text)
                    .unwrap()
                    .is_some(),
                "{text}"
            );
        }
    }

    #[tokio::test]
    async fn startup_registers_commands_and_clears_webhook() {
        let api = MockBotApi::start().await;
        let engine = test_engine(&api, Arc::new(StaticClassifier::default()));

        let cancel = start_polling(api.bot(), settings(), engine).await.unwrap();
        cancel.cancel();

        assert_eq!(api.calls("getme").len(), 1);
        assert_eq!(api.calls("deletewebhook").len(), 1);
        let commands = api.calls("setmycommands");
        assert_eq!(commands[0]["commands"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn polled_updates_reach_the_engine() {
        let api = MockBotApi::start().await;
        api.script(
            "getupdates",
            json!({
                "ok": true,
                "result": [{
                    "update_id": 10,
                    "callback_query": {
                        "id": "q-1",
                        "from": { "id": 1, "is_bot": false, "first_name": "Mod" },
                        "chat_instance": "ci",
                        "data": "retrain",
                        "message": {
                            "message_id": 7,
                            "date": 1,
                            "chat": { "id": ADMIN_CHAT.0, "type": "private" },
                            "text": "Marked as spam."
                        }
                    }
                }]
            }),
        );
        let classifier = Arc::new(StaticClassifier::default());
        let engine = test_engine(&api, Arc::clone(&classifier));

        let cancel = start_polling(api.bot(), settings(), engine).await.unwrap();
        wait_for(|| *classifier.retrains.lock().unwrap() == 1).await;
        // The next poll acknowledges the update.
        wait_for(|| {
            api.calls("getupdates")
                .iter()
                .any(|body| body["offset"] == 11)
        })
        .await;
        cancel.cancel();
    }

    #[tokio::test]
    async fn conflict_stops_polling() {
        let api = MockBotApi::start().await;
        api.script(
            "getupdates",
            json!({
                "ok": false,
                "error_code": 409,
                "description": "Conflict: terminated by other getUpdates request; make sure that only one bot instance is running"
            }),
        );
        let engine = test_engine(&api, Arc::new(StaticClassifier::default()));

        let cancel = start_polling(api.bot(), settings(), engine).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .expect("polling loop cancels itself on conflict");
    }
}
