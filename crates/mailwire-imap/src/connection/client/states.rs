//! Type-state markers for IMAP client connection states.
//!
//! `NotAuthenticated` and `Authenticated` are plain markers; `Selected`
//! carries the snapshot of the currently selected mailbox.

use crate::types::MailboxInfo;

/// Marker type for the not-authenticated state.
///
/// Only CAPABILITY, STARTTLS, and LOGIN are valid here.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
///
/// Mailbox operations (LIST, SELECT, EXAMINE) are valid here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// State for a selected mailbox.
///
/// Carries the mailbox snapshot parsed from SELECT/EXAMINE; re-selecting
/// replaces it.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) info: MailboxInfo,
}

impl Selected {
    /// Creates a new selected state.
    #[must_use]
    pub const fn new(info: MailboxInfo) -> Self {
        Self { info }
    }

    /// Returns the mailbox snapshot.
    #[must_use]
    pub const fn info(&self) -> &MailboxInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send<T: Send>() {}
    fn _assert_sync<T: Sync>() {}

    #[test]
    fn test_state_markers_are_send_sync() {
        _assert_send::<NotAuthenticated>();
        _assert_sync::<NotAuthenticated>();
        _assert_send::<Authenticated>();
        _assert_sync::<Authenticated>();
        _assert_send::<Selected>();
        _assert_sync::<Selected>();
    }
}
