use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InvalidId;

/// Platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Platform chat identifier. Group chats are negative on Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Message identifier, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i32);

macro_rules! id_impls {
    ($ty:ident, $inner:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $ty {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                trimmed
                    .parse::<$inner>()
                    .map(Self)
                    .map_err(|source| InvalidId {
                        input: trimmed.to_string(),
                        source,
                    })
            }
        }
    };
}

id_impls!(UserId, i64);
id_impls!(ChatId, i64);
id_impls!(MessageId, i32);

/// A sender's role in the chat a message was posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberRole {
    /// Owners and administrators may issue admin commands and are exempt
    /// from moderation outside training mode.
    #[must_use]
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Owner | Self::Administrator)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Owner => "owner",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Banned => "banned",
        };
        f.write_str(s)
    }
}
