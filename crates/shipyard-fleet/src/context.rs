//! Run context — deadline and cancel signal shared by one deployment run.
//!
//! A `RunContext` is cheap to clone. Child contexts narrow the deadline but
//! share the parent's cancel signal, so a Ctrl-C fired on the process-wide
//! context is observed by every attempt derived from it.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RunContext {
    deadline: Instant,
    cancel: watch::Receiver<bool>,
}

impl RunContext {
    /// Create a context that expires after `timeout` and is cancelled when
    /// `true` is sent on the paired sender.
    pub fn new(timeout: Duration, cancel: watch::Receiver<bool>) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancel,
        }
    }

    /// Create a context bounded only by a deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::new(timeout, rx)
    }

    /// Derive a context whose deadline is at most `timeout` from now.
    pub fn child(&self, timeout: Duration) -> Self {
        Self {
            deadline: self.deadline.min(Instant::now() + timeout),
            cancel: self.cancel.clone(),
        }
    }

    /// A fresh context with its own `timeout`, independent of this
    /// context's deadline and cancel signal.
    ///
    /// Used for cleanup that must still run after this context expired or
    /// was cancelled.
    pub fn detached(&self, timeout: Duration) -> Self {
        Self::with_timeout(timeout)
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Whether the deadline has passed or the run was cancelled.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Sleep for `period`, waking early at the deadline or on cancellation.
    pub async fn sleep(&self, period: Duration) {
        let wake = self.deadline.min(Instant::now() + period);
        let mut cancel = self.cancel.clone();

        tokio::select! {
            _ = tokio::time::sleep_until(wake) => {}
            _ = async move {
                // A dropped sender can never cancel; fall back to the timer.
                if cancel.wait_for(|c| *c).await.is_err() {
                    std::future::pending::<()>().await;
                }
            } => {}
        }
    }
}
