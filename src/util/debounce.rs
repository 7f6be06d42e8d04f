use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period for search-as-you-type.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Timer-based trailing-edge debouncer.
///
/// Each [`call`](Debouncer::call) cancels the previously scheduled task (if
/// its timer has not fired yet) and schedules the new one after `delay`. Only
/// the last call within a quiet window runs. Not tied to any particular
/// state setter: the scheduled future can do anything, typically send an
/// event back to its owner.
///
/// Must be used from within a tokio runtime. Dropping the debouncer cancels
/// the pending task.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task` to run after the quiet period, replacing any pending one.
    pub fn call<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel() {
            tracing::trace!("Debounced call superseded");
        }
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancel the pending task. Returns true if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
