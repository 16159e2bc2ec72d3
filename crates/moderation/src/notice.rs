//! Admin notice wording.
//!
//! A review notice is posted as two messages: a one-line header, then the
//! verbatim text of the message under review on its own. Only the text
//! message carries a control, so it never exceeds the platform's message
//! limit and controls read the text back with [`original_text`].

use crate::control::Control;

/// Outcome a review notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Classified as ham; an admin may still mark it as spam.
    NotSpam,
    Deleted,
    /// Spam whose message was gone before the bot could delete it.
    AlreadyRemoved,
    NotDeletedNoRights,
    /// Deletion failed for a reason other than missing rights.
    NotDeleted,
    NotDeletedGraceful,
}

impl NoticeKind {
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::NotSpam => "Not spam:",
            Self::Deleted => "Deleted as spam:",
            Self::AlreadyRemoved => "Spam, already removed from the chat:",
            Self::NotDeletedNoRights => "Spam, not deleted: insufficient rights:",
            Self::NotDeleted => "Spam, deletion failed:",
            Self::NotDeletedGraceful => "Spam, not deleted: graceful mode:",
        }
    }

    /// The control offered to the admin alongside this notice. `origin`
    /// is the "mark as spam" control pointing at the reviewed message.
    #[must_use]
    pub fn control(self, origin: Control) -> Control {
        match self {
            Self::NotSpam => origin,
            _ => Control::NotSpam,
        }
    }
}

/// Something to tell the admin chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminNotice {
    pub header: String,
    /// Reviewed text, posted as a separate message.
    pub body: Option<String>,
    pub control: Option<Control>,
}

impl AdminNotice {
    /// Notice about a moderated message, carrying its text verbatim.
    #[must_use]
    pub fn review(kind: NoticeKind, text: &str, origin: Control) -> Self {
        Self {
            header: kind.header().to_string(),
            body: Some(text.to_string()),
            control: Some(kind.control(origin)),
        }
    }

    /// Acknowledgment of an admin command or control press.
    #[must_use]
    pub fn ack(text: impl Into<String>, control: Option<Control>) -> Self {
        Self {
            header: text.into(),
            body: None,
            control,
        }
    }

    /// Messages to post, in order. The control rides on the last one.
    #[must_use]
    pub fn messages(&self) -> Vec<(&str, Option<Control>)> {
        match &self.body {
            Some(body) => vec![(self.header.as_str(), None), (body.as_str(), self.control)],
            None => vec![(self.header.as_str(), self.control)],
        }
    }
}

/// Recover the reviewed text from the message hosting a control.
#[must_use]
pub fn original_text(host: &str) -> Option<&str> {
    Some(host).filter(|text| !text.is_empty())
}

/// Warning posted to the origin chat after a deletion.
#[must_use]
pub fn removal_warning(addressee: &str) -> String {
    format!(
        "{addressee}, your message was removed because it looks like spam. \
         If this is a mistake, the moderators have been notified."
    )
}
