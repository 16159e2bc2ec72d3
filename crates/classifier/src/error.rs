use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection failure, timeout, or undecodable response.
    #[error("classifier request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("classifier {endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn request(endpoint: &'static str, source: reqwest::Error) -> Self {
        Self::Request { endpoint, source }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Whether the call hit its timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
