use std::time::Duration;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use spamguard_metrics::{classifier as cls_metrics, counter, histogram, labels};

use crate::{
    Error, Result,
    client::{RetrainOutcome, SpamClassifier, SpamVerdict},
};

const PREDICT: &str = "/predict/";
const SAVE_FALSE_POSITIVE: &str = "/save_false_positive/";
const SAVE_SPAM: &str = "/save_spam/";
const RETRAIN: &str = "/retrain/";

#[derive(Debug, Clone)]
pub struct HttpClassifierConfig {
    pub base_url: String,
    /// Bound for predict and feedback calls.
    pub timeout: Duration,
    /// Bound for the retrain call.
    pub retrain_timeout: Duration,
    /// `result` value that marks spam; anything else is ham.
    pub spam_label: String,
}

#[derive(Serialize)]
struct TextItem<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    result: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// Scorer reached over JSON/HTTP.
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
    retrain_timeout: Duration,
    spam_label: String,
}

impl HttpClassifier {
    pub fn new(config: HttpClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::request("client", e))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retrain_timeout: config.retrain_timeout,
            spam_label: config.spam_label,
        })
    }

    async fn post(
        &self,
        endpoint: &'static str,
        text: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(cls_metrics::REQUESTS_TOTAL, labels::ENDPOINT => endpoint).increment(1);

        let url = format!("{}{endpoint}", self.base_url);
        let mut req = self.client.post(&url);
        if let Some(text) = text {
            req = req.json(&TextItem { text });
        }
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let result = match req.send().await {
            Ok(resp) if resp.status().is_success() => Ok(resp),
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                Err(Error::Status {
                    endpoint,
                    status,
                    body,
                })
            },
            Err(e) => Err(Error::request(endpoint, e)),
        };

        #[cfg(feature = "metrics")]
        {
            histogram!(cls_metrics::REQUEST_DURATION_SECONDS, labels::ENDPOINT => endpoint)
                .record(start.elapsed().as_secs_f64());
            if result.is_err() {
                counter!(cls_metrics::ERRORS_TOTAL, labels::ENDPOINT => endpoint).increment(1);
            }
        }

        result
    }
}

#[async_trait]
impl SpamClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<SpamVerdict> {
        let resp = self.post(PREDICT, Some(text), None).await?;
        let body: PredictResponse = resp
            .json()
            .await
            .map_err(|e| Error::request(PREDICT, e))?;
        let is_spam = body.result == self.spam_label;
        debug!(result = %body.result, is_spam, "classifier verdict");
        Ok(SpamVerdict { is_spam })
    }

    async fn report_false_positive(&self, text: &str) -> Result<()> {
        self.post(SAVE_FALSE_POSITIVE, Some(text), None).await?;
        debug!(text_len = text.len(), "reported false positive");
        Ok(())
    }

    async fn report_confirmed_spam(&self, text: &str) -> Result<()> {
        self.post(SAVE_SPAM, Some(text), None).await?;
        debug!(text_len = text.len(), "reported confirmed spam");
        Ok(())
    }

    async fn trigger_retrain(&self) -> Result<RetrainOutcome> {
        let resp = self
            .post(RETRAIN, None, Some(self.retrain_timeout))
            .await?;
        let message = match resp.json::<MessageResponse>().await {
            Ok(body) => body.message,
            Err(e) => {
                warn!(error = %e, "retrain response was not JSON");
                String::new()
            },
        };
        info!(%message, "classifier retrain finished");
        Ok(RetrainOutcome { message })
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn classifier(url: String) -> HttpClassifier {
        HttpClassifier::new(HttpClassifierConfig {
            base_url: url,
            timeout: Duration::from_secs(5),
            retrain_timeout: Duration::from_secs(5),
            spam_label: "Спам".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn classify_spam() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict/")
            .match_body(Matcher::Json(serde_json::json!({ "text": "buy now" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":"Спам"}"#)
            .create_async()
            .await;

        let verdict = classifier(server.url()).classify("buy now").await.unwrap();
        assert!(verdict.is_spam);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn classify_ham() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict/")
            .with_status(200)
            .with_body(r#"{"result":"Не спам"}"#)
            .create_async()
            .await;

        let verdict = classifier(server.url()).classify("hello").await.unwrap();
        assert!(!verdict.is_spam);
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict/")
            .with_status(200)
            .with_body(r#"{"result":"Спам"}"#)
            .create_async()
            .await;

        let c = classifier(format!("{}/", server.url()));
        assert!(c.classify("x").await.unwrap().is_spam);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict/")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let err = classifier(server.url()).classify("x").await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test]
    async fn garbage_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict/")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        assert!(classifier(server.url()).classify("x").await.is_err());
    }

    #[tokio::test]
    async fn connection_refused_is_an_error() {
        // Port 9 (discard) is closed on test machines.
        let c = classifier("http://127.0.0.1:9".into());
        assert!(c.classify("x").await.is_err());
    }

    #[tokio::test]
    async fn feedback_endpoints_send_exact_text() {
        let mut server = mockito::Server::new_async().await;
        let text = "привет: a:b:c";
        let fp = server
            .mock("POST", "/save_false_positive/")
            .match_body(Matcher::Json(serde_json::json!({ "text": text })))
            .with_status(200)
            .with_body(r#"{"message":"ok"}"#)
            .create_async()
            .await;
        let spam = server
            .mock("POST", "/save_spam/")
            .match_body(Matcher::Json(serde_json::json!({ "text": text })))
            .with_status(200)
            .with_body(r#"{"message":"ok"}"#)
            .create_async()
            .await;

        let c = classifier(server.url());
        c.report_false_positive(text).await.unwrap();
        c.report_confirmed_spam(text).await.unwrap();
        fp.assert_async().await;
        spam.assert_async().await;
    }

    #[tokio::test]
    async fn retrain_relays_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/retrain/")
            .with_status(200)
            .with_body(r#"{"message":"Нет данных для переобучения"}"#)
            .create_async()
            .await;

        let outcome = classifier(server.url()).trigger_retrain().await.unwrap();
        assert_eq!(outcome.message, "Нет данных для переобучения");
    }

    #[tokio::test]
    async fn retrain_failure_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/retrain/")
            .with_status(503)
            .create_async()
            .await;

        assert!(classifier(server.url()).trigger_retrain().await.is_err());
    }
}
