//! Debounce timer for position persistence.

use tokio::task::JoinHandle;

/// Holds the one pending persist task. Restarting or cancelling aborts it.
#[derive(Debug, Default)]
pub(crate) struct PersistTimer {
    pending: Option<JoinHandle<()>>,
}

impl PersistTimer {
    /// Replace the pending task, aborting the old one.
    pub(crate) fn restart(&mut self, handle: JoinHandle<()>) {
        self.cancel();
        self.pending = Some(handle);
    }

    /// Abort the pending task. Returns true if one was still waiting.
    pub(crate) fn cancel(&mut self) -> bool {
        self.pending.take().is_some_and(|handle| {
            let waiting = !handle.is_finished();
            handle.abort();
            waiting
        })
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for PersistTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
