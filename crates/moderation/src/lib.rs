//! Moderation decision pipeline and the admin review protocol.
//!
//! Inbound chat messages from members on probation are scored by the remote
//! classifier and either passed to the admin chat for review, flagged, or
//! deleted with a short-lived notice to the sender. Admin commands and
//! inline controls close the loop: they toggle mode flags, feed corrections
//! back to the classifier, and trigger retraining.
//!
//! Every outbound notice goes through [`delivery::DeliveryGuard`], which owns
//! rate-limit retries so the decision logic never sees them.

pub mod control;
pub mod decision;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod flags;
pub mod gateway;
pub mod notice;
pub mod review;

#[cfg(test)]
mod testing;

pub use {
    control::Control,
    delivery::{DeliveryGuard, DeliveryPolicy},
    engine::{
        ControlPress, InboundEvent, InboundMessage, ModerationEngine, ModerationSettings,
        Outcome, Sender,
    },
    error::{Error, Result},
    flags::{ModerationFlags, SharedFlags},
    gateway::{ChatGateway, DeliveryError},
    review::AdminAction,
};
