use async_trait::async_trait;

use crate::Result;

/// Binary verdict for one piece of text. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamVerdict {
    pub is_spam: bool,
}

/// What the service reported after a retrain request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrainOutcome {
    pub message: String,
}

/// Remote scorer plus its feedback channel.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<SpamVerdict>;

    /// Record text the scorer wrongly flagged.
    async fn report_false_positive(&self, text: &str) -> Result<()>;

    /// Record text the scorer missed.
    async fn report_confirmed_spam(&self, text: &str) -> Result<()>;

    /// Retrain on the feedback collected so far.
    async fn trigger_retrain(&self) -> Result<RetrainOutcome>;
}
