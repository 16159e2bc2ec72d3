//! Shared identifiers, roles, and error helpers used across all spamguard crates.

pub mod error;
pub mod types;

pub use {
    error::{FromMessage, InvalidId},
    types::{ChatId, MemberRole, MessageId, UserId},
};
