//! Write session abstraction.
//!
//! A write session buffers the pending inserts and updates of one
//! transaction. The processor controls when buffered work reaches the
//! backend by switching the flush mode and flushing explicitly at
//! operation boundaries.

use async_trait::async_trait;

use crate::error::StoreResult;

/// When buffered writes are sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// Writes may flush whenever the session sees fit.
    #[default]
    Auto,
    /// Writes are held until an explicit flush or commit.
    Commit,
}

/// A buffering write session for one transaction.
#[async_trait]
pub trait WriteSession: Send + Sync {
    /// Returns the current flush mode.
    fn flush_mode(&self) -> FlushMode;

    /// Sets the flush mode for subsequent writes.
    fn set_flush_mode(&self, mode: FlushMode);

    /// Sends all buffered writes to the backend.
    ///
    /// # Errors
    ///
    /// * `StoreError::Internal` - If the backend rejects the writes
    async fn flush(&self) -> StoreResult<()>;

    /// Number of buffered inserts.
    fn pending_inserts(&self) -> usize;

    /// Number of buffered updates.
    fn pending_updates(&self) -> usize;
}

/// Guard that switches the flush mode and restores the previous mode on
/// drop, so early returns cannot leave the session in manual mode.
pub struct FlushModeGuard<'a> {
    session: &'a dyn WriteSession,
    previous: FlushMode,
}

impl<'a> FlushModeGuard<'a> {
    /// Switches `session` to `mode`, remembering the mode it had.
    pub fn hold(session: &'a dyn WriteSession, mode: FlushMode) -> Self {
        let previous = session.flush_mode();
        session.set_flush_mode(mode);
        FlushModeGuard { session, previous }
    }
}

impl Drop for FlushModeGuard<'_> {
    fn drop(&mut self) {
        self.session.set_flush_mode(self.previous);
    }
}
