//! Client for the remote spam scorer.
//!
//! The scorer is an opaque HTTP service with one scoring endpoint, two
//! feedback endpoints, and a retrain trigger. Every call is a stateless
//! round-trip bounded by a timeout.

pub mod client;
pub mod error;
pub mod http;

pub use {
    client::{RetrainOutcome, SpamClassifier, SpamVerdict},
    error::{Error, Result},
    http::{HttpClassifier, HttpClassifierConfig},
};
