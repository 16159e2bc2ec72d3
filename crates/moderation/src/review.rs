//! Decoding of admin commands and control presses into [`AdminAction`].

use spamguard_common::{ChatId, MessageId};

use crate::{Error, Result, control::Control, notice::original_text};

/// Everything an admin can ask the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    ToggleTraining,
    ToggleGraceful,
    SetProbation(u32),
    /// `/retrain` typed in the admin chat.
    Retrain,
    /// "Not spam" pressed on a review notice.
    ConfirmNotSpam { text: String },
    /// "Spam" pressed on a review notice.
    MarkSpam {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    /// "Retrain model" pressed on an acknowledgment.
    AckRetrain,
}

impl AdminAction {
    /// Short label for logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleTraining => "toggle_training",
            Self::ToggleGraceful => "toggle_graceful",
            Self::SetProbation(_) => "set_probation",
            Self::Retrain => "retrain",
            Self::ConfirmNotSpam { .. } => "confirm_not_spam",
            Self::MarkSpam { .. } => "mark_spam",
            Self::AckRetrain => "ack_retrain",
        }
    }
}

/// Command names accepted for each action. The first is canonical; the
/// underscore form is what the bot registers for autocomplete.
const TOGGLE_TRAINING: &[&str] = &["toggle-training", "toggle_training", "trainingmode"];
const TOGGLE_GRACEFUL: &[&str] = &["toggle-graceful", "toggle_graceful", "gracefulmode"];
const SET_PROBATION: &[&str] = &["set-probation", "set_probation", "settime"];
const RETRAIN: &[&str] = &["retrain"];

/// Decode a typed command.
///
/// `Ok(None)` means the text is not a command this bot knows. A known
/// command with a bad argument is an [`Error::InvalidArgument`].
pub fn parse_command(text: &str) -> Result<Option<AdminAction>> {
    let Some(rest) = text.trim_start().strip_prefix('/') else {
        return Ok(None);
    };
    let (head, args) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    let name = head.split_once('@').map_or(head, |(name, _)| name);

    let action = if TOGGLE_TRAINING.contains(&name) {
        AdminAction::ToggleTraining
    } else if TOGGLE_GRACEFUL.contains(&name) {
        AdminAction::ToggleGraceful
    } else if SET_PROBATION.contains(&name) {
        AdminAction::SetProbation(parse_hours(args)?)
    } else if RETRAIN.contains(&name) {
        AdminAction::Retrain
    } else {
        return Ok(None);
    };
    Ok(Some(action))
}

fn parse_hours(args: &str) -> Result<u32> {
    let digits: String = args.chars().filter(|c| !c.is_whitespace()).collect();
    match digits.parse::<u32>() {
        Ok(0) => Err(Error::invalid_argument("hours must be a positive integer")),
        Ok(hours) => Ok(hours),
        Err(_) => Err(Error::invalid_argument(format!(
            "hours must be a positive integer, got {:?}",
            args.trim()
        ))),
    }
}

/// Decode a control press.
///
/// `host_text` is the text of the message the control was attached to;
/// review controls sit on the verbatim reviewed text.
pub fn parse_callback(token: &str, host_text: Option<&str>) -> Result<AdminAction> {
    let control = Control::from_token(token)
        .ok_or_else(|| Error::invalid_argument(format!("unknown control token {token:?}")))?;
    let reviewed_text = || {
        host_text
            .and_then(original_text)
            .map(str::to_string)
            .ok_or_else(|| Error::invalid_argument("control host has no reviewed text"))
    };

    Ok(match control {
        Control::NotSpam => AdminAction::ConfirmNotSpam {
            text: reviewed_text()?,
        },
        Control::Retrain => AdminAction::AckRetrain,
        Control::MarkSpam {
            chat_id,
            message_id,
        } => AdminAction::MarkSpam {
            chat_id,
            message_id,
            text: reviewed_text()?,
        },
    })
}
