//! Telegram transport for spamguard.
//!
//! Long-polls the Bot API with teloxide, turns messages and inline button
//! presses into moderation events, and implements the moderation
//! [`ChatGateway`](spamguard_moderation::ChatGateway) on top of the bot.

pub mod access;
pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;

#[cfg(test)]
mod mock_api;

pub use {
    access::{AccessDenied, ChatAccess},
    bot::{build_bot, start_polling},
    config::TelegramSettings,
    error::{Error, Result},
    outbound::TelegramGateway,
};
