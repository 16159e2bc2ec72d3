use std::sync::Arc;

use {
    spamguard_common::{ChatId, MessageId, UserId},
    spamguard_moderation::{
        ControlPress, InboundEvent, InboundMessage, ModerationEngine, Outcome, Sender,
    },
    teloxide::{
        prelude::*,
        types::{CallbackQuery, UpdateKind, User},
    },
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use spamguard_metrics::{counter, telegram as tg_metrics};

use crate::access::ChatAccess;

/// Shared context for update handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub access: ChatAccess,
    pub engine: Arc<ModerationEngine>,
}

/// Route one update. Unsupported update kinds are ignored.
pub async fn handle_update(update: Update, bot: &Bot, ctx: &HandlerContext) -> Option<Outcome> {
    #[cfg(feature = "metrics")]
    counter!(tg_metrics::UPDATES_RECEIVED_TOTAL).increment(1);

    match update.kind {
        UpdateKind::Message(msg) => handle_message(&msg, ctx).await,
        UpdateKind::CallbackQuery(query) => handle_callback_query(&query, bot, ctx).await,
        other => {
            debug!("ignoring non-message update: {other:?}");
            None
        },
    }
}

/// Moderate a chat message, or run it as an admin command.
pub async fn handle_message(msg: &Message, ctx: &HandlerContext) -> Option<Outcome> {
    let chat_id = ChatId(msg.chat.id.0);
    if let Err(reason) = ctx.access.check(chat_id) {
        info!(%reason, "dropping message");
        #[cfg(feature = "metrics")]
        counter!(tg_metrics::UPDATES_DROPPED_TOTAL).increment(1);
        return None;
    }

    let Some(inbound) = inbound_message(msg) else {
        debug!(chat_id = chat_id.0, "ignoring message without text or caption");
        return None;
    };

    let outcome = ctx.engine.handle_event(InboundEvent::Message(inbound)).await;
    debug!(chat_id = chat_id.0, message_id = msg.id.0, ?outcome, "message handled");
    Some(outcome)
}

/// Handle an inline button press on one of the bot's notices.
pub async fn handle_callback_query(
    query: &CallbackQuery,
    bot: &Bot,
    ctx: &HandlerContext,
) -> Option<Outcome> {
    let Some(press) = control_press(query) else {
        debug!(query_id = %query.id, "ignoring callback without data or message");
        return None;
    };

    if let Err(reason) = ctx.access.check(press.chat_id) {
        info!(%reason, "dropping callback query");
        #[cfg(feature = "metrics")]
        counter!(tg_metrics::UPDATES_DROPPED_TOTAL).increment(1);
        return None;
    }

    // Answer the callback to dismiss the loading spinner.
    if let Err(e) = bot.answer_callback_query(&query.id).await {
        debug!(error = %e, "failed to answer callback query");
    }

    let outcome = ctx.engine.handle_event(InboundEvent::Control(press)).await;
    debug!(?outcome, "callback handled");
    Some(outcome)
}

/// The text under moderation: message text, else the media caption.
pub fn message_text(msg: &Message) -> Option<&str> {
    msg.text().or_else(|| msg.caption())
}

pub fn inbound_message(msg: &Message) -> Option<InboundMessage> {
    let from = msg.from.as_ref()?;
    let text = message_text(msg)?;
    Some(InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        sender: sender(from),
        text: text.to_string(),
    })
}

pub fn control_press(query: &CallbackQuery) -> Option<ControlPress> {
    let token = query.data.as_deref()?;
    let host = query.message.as_ref()?;
    Some(ControlPress {
        chat_id: ChatId(host.chat().id.0),
        message_id: MessageId(host.id().0),
        user_id: user_id(&query.from),
        token: token.to_string(),
        host_text: host
            .regular_message()
            .and_then(|m| m.text())
            .map(str::to_string),
    })
}

fn sender(user: &User) -> Sender {
    Sender {
        user_id: user_id(user),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

fn user_id(user: &User) -> UserId {
    UserId(user.id.0 as i64)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock_api::{ADMIN_CHAT, GROUP, MockBotApi, StaticClassifier, test_engine},
        serde_json::{Value, json},
    };

    fn text_message(chat_id: ChatId, text: &str) -> Value {
        json!({
            "message_id": 31,
            "date": 1,
            "chat": { "id": chat_id.0, "type": "private" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "username": "alice"
            },
            "text": text
        })
    }

    fn message(value: Value) -> Message {
        serde_json::from_value(value).expect("deserialize message")
    }

    fn callback(data: &str, host_text: &str) -> CallbackQuery {
        serde_json::from_value(json!({
            "id": "q-1",
            "from": { "id": 1, "is_bot": false, "first_name": "Mod" },
            "chat_instance": "ci",
            "data": data,
            "message": {
                "message_id": 555,
                "date": 1,
                "chat": { "id": ADMIN_CHAT.0, "type": "private" },
                "text": host_text
            }
        }))
        .expect("deserialize callback query")
    }

    fn context(api: &MockBotApi, classifier: Arc<StaticClassifier>) -> HandlerContext {
        HandlerContext {
            access: ChatAccess::new(ADMIN_CHAT, [GROUP]),
            engine: test_engine(api, classifier),
        }
    }

    #[test]
    fn text_message_becomes_inbound() {
        let inbound = inbound_message(&message(text_message(GROUP, "hello"))).unwrap();
        assert_eq!(inbound.chat_id, GROUP);
        assert_eq!(inbound.message_id, MessageId(31));
        assert_eq!(inbound.sender.user_id, UserId(1001));
        assert_eq!(inbound.sender.username.as_deref(), Some("alice"));
        assert_eq!(inbound.text, "hello");
    }

    #[test]
    fn caption_is_used_when_there_is_no_text() {
        let msg = message(json!({
            "message_id": 2,
            "date": 1,
            "chat": { "id": GROUP.0, "type": "private" },
            "from": { "id": 5, "is_bot": false, "first_name": "Bob" },
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 1,
                "height": 1
            }],
            "caption": "cheap pills"
        }));
        assert_eq!(message_text(&msg), Some("cheap pills"));
        let inbound = inbound_message(&msg).unwrap();
        assert_eq!(inbound.sender.username, None);
        assert_eq!(inbound.sender.addressee(), "Bob");
    }

    #[test]
    fn media_without_caption_is_skipped() {
        let msg = message(json!({
            "message_id": 2,
            "date": 1,
            "chat": { "id": GROUP.0, "type": "private" },
            "from": { "id": 5, "is_bot": false, "first_name": "Bob" },
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 1,
                "height": 1
            }]
        }));
        assert!(inbound_message(&msg).is_none());
    }

    #[test]
    fn callback_becomes_control_press() {
        let press = control_press(&callback("fine", "buy")).unwrap();
        assert_eq!(press.chat_id, ADMIN_CHAT);
        assert_eq!(press.message_id, MessageId(555));
        assert_eq!(press.user_id, UserId(1));
        assert_eq!(press.token, "fine");
        assert_eq!(press.host_text.as_deref(), Some("buy"));
    }

    #[tokio::test]
    async fn messages_from_other_chats_are_dropped() {
        let api = MockBotApi::start().await;
        let ctx = context(&api, Arc::new(StaticClassifier::default()));

        let outcome = handle_message(&message(text_message(ChatId(-777), "hi")), &ctx).await;
        assert!(outcome.is_none());
        assert!(api.calls("getchatmember").is_empty());
    }

    #[tokio::test]
    async fn ham_from_member_is_sent_for_review() {
        let api = MockBotApi::start().await;
        let ctx = context(&api, Arc::new(StaticClassifier::default()));

        let outcome = handle_message(&message(text_message(GROUP, "hello all")), &ctx).await;
        assert_eq!(outcome, Some(Outcome::ReviewRequested));

        let sent = api.calls("sendmessage");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["chat_id"], ADMIN_CHAT.0);
        assert_eq!(sent[0]["text"], "Not spam:");
        assert!(sent[0].get("reply_markup").is_none());
        assert_eq!(sent[1]["chat_id"], ADMIN_CHAT.0);
        assert_eq!(sent[1]["text"], "hello all");
        assert_eq!(
            sent[1]["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "spam:-100:31"
        );
    }

    #[tokio::test]
    async fn spam_is_deleted_and_reported() {
        let api = MockBotApi::start().await;
        let ctx = context(
            &api,
            Arc::new(StaticClassifier {
                spam: true,
                ..Default::default()
            }),
        );

        let outcome = handle_message(&message(text_message(GROUP, "buy now")), &ctx).await;
        assert_eq!(outcome, Some(Outcome::Deleted));
        let deleted = api.calls("deletemessage");
        assert_eq!(deleted[0]["chat_id"], GROUP.0);
        assert_eq!(deleted[0]["message_id"], 31);
        assert_eq!(api.calls("sendmessage")[0]["chat_id"], ADMIN_CHAT.0);
    }

    #[tokio::test]
    async fn not_spam_press_reports_host_text() {
        let api = MockBotApi::start().await;
        let classifier = Arc::new(StaticClassifier::default());
        let ctx = context(&api, Arc::clone(&classifier));

        let outcome = handle_callback_query(
            &callback("fine", "actually fine"),
            &api.bot(),
            &ctx,
        )
        .await;

        assert_eq!(outcome, Some(Outcome::Applied("confirm_not_spam")));
        assert_eq!(*classifier.false_positives.lock().unwrap(), vec![
            "actually fine".to_string()
        ]);
        assert_eq!(api.calls("answercallbackquery").len(), 1);
        assert_eq!(api.calls("editmessagereplymarkup").len(), 1);
        let ack = api.calls("sendmessage");
        assert_eq!(
            ack[0]["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "retrain"
        );
    }
}
