//! Pure moderation policy. The engine feeds these the facts it gathered and
//! executes whatever they return.

use spamguard_common::MemberRole;

use crate::flags::ModerationFlags;

/// Why a message was let through without evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Sender is an administrator or the owner.
    Exempt,
    /// Sender's probation window has passed.
    Established,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exempt => "exempt",
            Self::Established => "established",
        }
    }
}

/// What to do with a classified message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Ham: show it to the admins with a "mark as spam" control.
    RequestReview,
    /// Spam in graceful mode: tell the admins, leave the message alone.
    FlagOnly,
    /// Spam: delete it, tell the admins, warn the sender.
    DeleteAndWarn,
}

/// Role gate, checked before the ledger is touched.
#[must_use]
pub fn exemption(role: MemberRole, flags: &ModerationFlags) -> Option<SkipReason> {
    (role.is_privileged() && !flags.training_mode).then_some(SkipReason::Exempt)
}

/// Probation gate, checked before the classifier is called.
#[must_use]
pub fn probation_gate(is_new: bool, flags: &ModerationFlags) -> Option<SkipReason> {
    (!is_new && !flags.training_mode).then_some(SkipReason::Established)
}

#[must_use]
pub fn action_for(is_spam: bool, flags: &ModerationFlags) -> Action {
    match (is_spam, flags.graceful_mode) {
        (false, _) => Action::RequestReview,
        (true, true) => Action::FlagOnly,
        (true, false) => Action::DeleteAndWarn,
    }
}
