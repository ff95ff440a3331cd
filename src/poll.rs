// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cancellable periodic work tied to an owning scope.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Lifetime of a view. Dropping (or cancelling) it stops every poller
/// spawned inside it.
#[derive(Debug, Default)]
pub struct Scope {
    token: CancellationToken,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nested scope, cancelled together with its parent.
    pub fn child(&self) -> Scope {
        Scope {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Runs a task every `period` until stopped.
#[derive(Debug)]
pub struct Poller {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Poller {
    /// Start polling. The first run happens one `period` after spawning.
    ///
    /// A run that overlaps the next tick delays that tick rather than
    /// bunching runs together.
    pub fn spawn<F, Fut>(scope: &Scope, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let token = scope.token.child_token();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }

                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = job() => {}
                }
            }

            tracing::debug!("Poller stopped");
        });

        Self { token, task }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_poller(scope: &Scope, period: Duration) -> (Poller, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let poller = Poller::spawn(scope, period, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (poller, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_after_one_period() {
        let scope = Scope::new();
        let (_poller, runs) = counting_poller(&scope, Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_drop_stops_poller() {
        let scope = Scope::new();
        let (poller, runs) = counting_poller(&scope, Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        drop(scope);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(poller.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_scope_cancelled_with_parent() {
        let parent = Scope::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
