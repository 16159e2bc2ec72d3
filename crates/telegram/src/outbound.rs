use {
    async_trait::async_trait,
    spamguard_common::{ChatId, MemberRole, MessageId, UserId},
    spamguard_moderation::{ChatGateway, Control, DeliveryError},
    teloxide::{
        ApiError, RequestError,
        payloads::{EditMessageReplyMarkupSetters, SendMessageSetters},
        prelude::*,
        types::{self as tg, ChatMemberKind, InlineKeyboardButton, InlineKeyboardMarkup},
    },
    tracing::debug,
};

/// [`ChatGateway`] backed by the Bot API.
///
/// Every call is a single request; rate limits surface as
/// [`DeliveryError::RateLimited`] for the delivery guard to handle.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberRole, DeliveryError> {
        let member = self
            .bot
            .get_chat_member(tg_chat(chat_id), tg_user(user_id))
            .await
            .map_err(delivery_error)?;
        Ok(member_role(&member.kind))
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        control: Option<&Control>,
    ) -> Result<MessageId, DeliveryError> {
        let mut request = self.bot.send_message(tg_chat(chat_id), text);
        if let Some(control) = control {
            request = request.reply_markup(keyboard(control));
        }
        let sent = request.await.map_err(delivery_error)?;
        Ok(MessageId(sent.id.0))
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        self.bot
            .delete_message(tg_chat(chat_id), tg::MessageId(message_id.0))
            .await
            .map_err(delivery_error)?;
        Ok(())
    }

    async fn clear_controls(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        match self
            .bot
            .edit_message_reply_markup(tg_chat(chat_id), tg::MessageId(message_id.0))
            .reply_markup(InlineKeyboardMarkup::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!(chat_id = chat_id.0, message_id = message_id.0, "controls already cleared");
                Ok(())
            },
            Err(e) => Err(delivery_error(e)),
        }
    }
}

/// One-button inline keyboard for `control`.
pub fn keyboard(control: &Control) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        control.label(),
        control.token(),
    )]])
}

pub fn member_role(kind: &ChatMemberKind) -> MemberRole {
    if kind.is_owner() {
        MemberRole::Owner
    } else if kind.is_administrator() {
        MemberRole::Administrator
    } else if kind.is_banned() {
        MemberRole::Banned
    } else if kind.is_left() {
        MemberRole::Left
    } else if kind.is_restricted() {
        MemberRole::Restricted
    } else {
        MemberRole::Member
    }
}

/// Classify a Bot API failure for the delivery guard.
pub fn delivery_error(err: RequestError) -> DeliveryError {
    match err {
        RequestError::RetryAfter(wait) => DeliveryError::RateLimited {
            retry_after: wait.duration(),
        },
        RequestError::Api(ApiError::MessageToDeleteNotFound | ApiError::MessageToEditNotFound) => {
            DeliveryError::AlreadyGone
        },
        RequestError::Api(
            ApiError::MessageCantBeDeleted
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::BotBlocked,
        ) => DeliveryError::permission_denied(err.to_string()),
        RequestError::Api(ApiError::Unknown(ref description))
            if description.to_ascii_lowercase().contains("not enough rights") =>
        {
            DeliveryError::permission_denied(description.clone())
        },
        other => DeliveryError::other(other.to_string()),
    }
}

pub(crate) fn tg_chat(chat_id: ChatId) -> tg::ChatId {
    tg::ChatId(chat_id.0)
}

pub(crate) fn tg_user(user_id: UserId) -> tg::UserId {
    tg::UserId(user_id.0.unsigned_abs())
}
