//! Minimal Bot API double served over HTTP for transport tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde_json::{Value, json},
    spamguard_common::MessageId,
    teloxide::Bot,
};

#[derive(Default)]
struct MockState {
    calls: Vec<(String, Value)>,
    scripted: HashMap<String, VecDeque<Value>>,
    member_status: HashMap<i64, String>,
    next_message_id: i32,
}

/// Records every call by lowercase method name and answers with canned
/// successes unless a response was scripted for the method.
#[derive(Clone)]
pub struct MockBotApi {
    state: Arc<Mutex<MockState>>,
    bot: Bot,
}

impl MockBotApi {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            next_message_id: 1000,
            ..Default::default()
        }));
        let app = Router::new()
            .route("/{*path}", post(handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock bot api");
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        let bot = Bot::new("test-token").set_api_url(api_url);
        Self { state, bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Answer the next call to `method` with `response` verbatim.
    pub fn script(&self, method: &str, response: Value) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn set_member_status(&self, user_id: i64, status: &str) {
        self.state
            .lock()
            .unwrap()
            .member_status
            .insert(user_id, status.to_string());
    }

    /// Bodies of all calls to `method`, oldest first.
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn last_message_id(&self) -> MessageId {
        MessageId(self.state.lock().unwrap().next_message_id)
    }
}

async fn handler(
    State(state): State<Arc<Mutex<MockState>>>,
    uri: Uri,
    body: Bytes,
) -> Json<Value> {
    let method = uri
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    if method == "getupdates" {
        // Stand in for the long poll so an idle loop does not spin.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let mut state = state.lock().unwrap();
    state.calls.push((method.clone(), body.clone()));

    if let Some(response) = state
        .scripted
        .get_mut(&method)
        .and_then(VecDeque::pop_front)
    {
        return Json(response);
    }

    let result = match method.as_str() {
        "sendmessage" | "editmessagereplymarkup" => {
            state.next_message_id += 1;
            let message_id = body
                .get("message_id")
                .cloned()
                .unwrap_or_else(|| json!(state.next_message_id));
            json!({
                "message_id": message_id,
                "date": 0,
                "chat": { "id": body["chat_id"], "type": "private" },
                "text": body.get("text").cloned().unwrap_or_else(|| json!("ok")),
            })
        },
        "getchatmember" => {
            let user_id = body["user_id"].as_i64().unwrap_or_default();
            let status = state
                .member_status
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| "member".into());
            json!({
                "status": status,
                "user": { "id": user_id, "is_bot": false, "first_name": "User" },
                "is_anonymous": false,
            })
        },
        "getme" => json!({
            "id": 1,
            "is_bot": true,
            "first_name": "Spamguard",
            "username": "spamguard_bot",
            "can_join_groups": true,
            "can_read_all_group_messages": true,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false,
        }),
        "getupdates" => json!([]),
        _ => json!(true),
    };
    Json(json!({ "ok": true, "result": result }))
}

/// Classifier returning a fixed verdict and recording feedback.
#[derive(Default)]
pub struct StaticClassifier {
    pub spam: bool,
    pub false_positives: Mutex<Vec<String>>,
    pub retrains: Mutex<usize>,
}

#[async_trait::async_trait]
impl spamguard_classifier::SpamClassifier for StaticClassifier {
    async fn classify(
        &self,
        _text: &str,
    ) -> spamguard_classifier::Result<spamguard_classifier::SpamVerdict> {
        Ok(spamguard_classifier::SpamVerdict { is_spam: self.spam })
    }

    async fn report_false_positive(&self, text: &str) -> spamguard_classifier::Result<()> {
        self.false_positives.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn report_confirmed_spam(&self, _text: &str) -> spamguard_classifier::Result<()> {
        Ok(())
    }

    async fn trigger_retrain(&self) -> spamguard_classifier::Result<spamguard_classifier::RetrainOutcome> {
        *self.retrains.lock().unwrap() += 1;
        Ok(spamguard_classifier::RetrainOutcome {
            message: String::new(),
        })
    }
}

pub const ADMIN_CHAT: spamguard_common::ChatId = spamguard_common::ChatId(-900);
pub const GROUP: spamguard_common::ChatId = spamguard_common::ChatId(-100);

/// Engine wired to the mock API, an in-memory ledger and `classifier`.
pub fn test_engine(
    api: &MockBotApi,
    classifier: Arc<StaticClassifier>,
) -> Arc<spamguard_moderation::ModerationEngine> {
    use {
        spamguard_membership::{MembershipLedger, store_memory::InMemoryMembershipStore},
        spamguard_moderation::{DeliveryPolicy, ModerationEngine, ModerationSettings, SharedFlags},
    };

    let ledger = MembershipLedger::new(Arc::new(InMemoryMembershipStore::new()));
    Arc::new(ModerationEngine::new(
        ModerationSettings {
            admin_chat_id: ADMIN_CHAT,
            notice_ttl: std::time::Duration::from_secs(30),
        },
        SharedFlags::default(),
        ledger,
        classifier,
        Arc::new(crate::outbound::TelegramGateway::new(api.bot())),
        DeliveryPolicy::default(),
    ))
}
