use std::sync::{Arc, Mutex};

use crate::{Error, Result};

/// Process-wide moderation mode. Reset to the configured values on restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationFlags {
    /// Evaluate every sender, administrators and established members included.
    pub training_mode: bool,
    /// Flag spam but never delete it.
    pub graceful_mode: bool,
    /// Membership age window, in hours, during which messages are evaluated.
    pub probation_hours: u32,
}

impl Default for ModerationFlags {
    fn default() -> Self {
        Self {
            training_mode: false,
            graceful_mode: false,
            probation_hours: 2,
        }
    }
}

/// Single synchronization point for [`ModerationFlags`].
///
/// The lock is only taken for a copy or a field write and is never held
/// across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SharedFlags {
    inner: Arc<Mutex<ModerationFlags>>,
}

impl SharedFlags {
    pub fn new(flags: ModerationFlags) -> Self {
        Self {
            inner: Arc::new(Mutex::new(flags)),
        }
    }

    /// Consistent copy of all flags.
    pub fn snapshot(&self) -> ModerationFlags {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Flip training mode, returning the new value.
    pub fn toggle_training(&self) -> bool {
        let mut flags = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        flags.training_mode = !flags.training_mode;
        flags.training_mode
    }

    /// Flip graceful mode, returning the new value.
    pub fn toggle_graceful(&self) -> bool {
        let mut flags = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        flags.graceful_mode = !flags.graceful_mode;
        flags.graceful_mode
    }

    pub fn set_probation_hours(&self, hours: u32) -> Result<()> {
        if hours == 0 {
            return Err(Error::invalid_argument("probation must be at least one hour"));
        }
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .probation_hours = hours;
        Ok(())
    }
}
