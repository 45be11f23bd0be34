//! Run-wide interrupt signal.
//!
//! One [`Interrupt`] is created per installation run and cloned into every
//! task that has a wait point: the executor, validation poll loops, and the
//! orchestrator's stage boundaries. Triggering it unwinds all of them
//! promptly; partial recipes stay in whatever status they last reported.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable handle observing user cancellation.
///
/// # Example
///
/// ```rust
/// use observa_install::Interrupt;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let interrupt = Interrupt::new();
///     let watcher = interrupt.clone();
///
///     interrupt.trigger();
///     watcher.cancelled().await; // resolves immediately
///     assert!(watcher.is_triggered());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Create a new, untriggered interrupt.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Signal cancellation to every clone of this handle.
    ///
    /// Idempotent; later calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation has been signalled.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is signalled.
    ///
    /// Resolves immediately if the interrupt already fired. Intended for use
    /// inside `tokio::select!` alongside the work being guarded.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Closed sender means the run is over; treat it as cancelled too.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Spawn a task that triggers this interrupt on Ctrl-C.
    ///
    /// The embedding CLI calls this once before starting the run.
    pub fn listen_for_ctrl_c(&self) {
        let handle = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt signal received");
                handle.trigger();
            }
        });
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_observed_by_clones() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();

        assert!(!clone.is_triggered());
        interrupt.trigger();
        assert!(clone.is_triggered());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_trigger() {
        let interrupt = Interrupt::new();
        let watcher = interrupt.clone();

        let waiter = tokio::spawn(async move { watcher.cancelled().await });
        interrupt.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancelled() should resolve once triggered")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_if_already_triggered() {
        let interrupt = Interrupt::new();
        interrupt.trigger();

        tokio::time::timeout(Duration::from_secs(1), interrupt.cancelled())
            .await
            .expect("cancelled() should resolve immediately");
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        interrupt.trigger();
        assert!(interrupt.is_triggered());
    }
}
