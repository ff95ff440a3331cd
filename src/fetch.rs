// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Debounced, auth-gated data fetching.
//!
//! A [`FetchHandle`] owns one background task that is the only writer of
//! its [`FetchState`]. The task:
//! - waits for the session to be authenticated and resolved
//! - delays every triggered fetch by a trailing debounce window
//! - drops automatic fetches that land within the minimum interval of the
//!   previous call
//! - fires a dependency-less handle at most once automatically
//! - cancels the pending timer and the in-flight request when dependencies
//!   change or the session signs out, so a stale response never lands
//! - starts over, discarding data, when a different user signs in
//!
//! [`FetchHandle::refetch`] skips the debounce, dedup and rate-limit
//! guards but still requires authentication. Dropping the handle aborts
//! the task; no state update happens after that.

use crate::config::Config;
use crate::error::{ApiError, FetchError};
use crate::poll::{Poller, Scope};
use crate::session::Session;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Quiet period before a triggered fetch goes out.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Minimum spacing between two automatic fetches of one handle.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Timing knobs for a fetch handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub debounce: Duration,
    pub min_interval: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce,
            min_interval: config.min_fetch_interval,
        }
    }
}

/// What a view renders: last good data, whether a call is out, last error.
///
/// A failed call keeps `data` so stale content can be shown next to the error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

type FetchFn<D, T> = Box<dyn Fn(D) -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;
type Reply = oneshot::Sender<Result<(), FetchError>>;

enum Command<D> {
    SetDeps(D),
    Refetch(Reply),
}

/// A mounted fetch: the handle a view holds for one data source.
pub struct FetchHandle<D, T> {
    commands: mpsc::UnboundedSender<Command<D>>,
    state: watch::Receiver<FetchState<T>>,
    task: JoinHandle<()>,
}

impl<D, T> FetchHandle<D, T>
where
    D: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Mount a fetch that re-runs (debounced) whenever `deps` or the
    /// session's authentication changes.
    pub fn mount<F, Fut>(
        auth: watch::Receiver<Session>,
        deps: D,
        options: FetchOptions,
        fetch: F,
    ) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self::spawn(
            auth,
            deps,
            options,
            false,
            Box::new(move |deps| fetch(deps).boxed()),
        )
    }

    fn spawn(
        auth: watch::Receiver<Session>,
        deps: D,
        options: FetchOptions,
        once: bool,
        fetch: FetchFn<D, T>,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(FetchState::default());

        let driver = Driver {
            fetch,
            deps,
            options,
            once,
            commands: command_rx,
            auth,
            auth_open: true,
            ready: false,
            owner: None,
            state: state_tx,
            deadline: None,
            in_flight: None,
            last_call: None,
            fired: false,
        };

        Self {
            commands,
            state: state_rx,
            task: tokio::spawn(driver.run()),
        }
    }

    /// Replace the dependency value; the fetch re-runs after the debounce window.
    pub fn set_deps(&self, deps: D) {
        if self.commands.send(Command::SetDeps(deps)).is_err() {
            tracing::debug!("Dependency change on a stopped fetch handle");
        }
    }

    /// Fetch now, bypassing debounce, dedup and rate limiting.
    pub async fn refetch(&self) -> Result<(), FetchError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Refetch(tx))
            .map_err(|_| FetchError::Unmounted)?;
        rx.await.unwrap_or(Err(FetchError::Unmounted))
    }

    /// Re-issue [`refetch`](Self::refetch) every `period` until `scope` or
    /// the returned poller is dropped.
    pub fn poll_every(&self, scope: &Scope, period: Duration) -> Poller {
        let commands = self.commands.clone();
        Poller::spawn(scope, period, move || {
            let commands = commands.clone();
            async move {
                let (tx, rx) = oneshot::channel();
                if commands.send(Command::Refetch(tx)).is_err() {
                    return;
                }
                match rx.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!(error = %e, "Polling refetch did not update"),
                    Err(_) => {}
                }
            }
        })
    }

    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.clone()
    }

    /// Stop fetching. Pending timers and in-flight requests are discarded.
    pub fn unmount(self) {}
}

impl<T> FetchHandle<(), T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Mount a dependency-less fetch. It fires automatically at most once;
    /// later refreshes go through [`refetch`](Self::refetch).
    pub fn mount_once<F, Fut>(auth: watch::Receiver<Session>, options: FetchOptions, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self::spawn(auth, (), options, true, Box::new(move |()| fetch().boxed()))
    }
}

impl<D, T> Drop for FetchHandle<D, T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct InFlight<T> {
    request: BoxFuture<'static, Result<T, ApiError>>,
    reply: Option<Reply>,
}

struct Driver<D, T> {
    fetch: FetchFn<D, T>,
    deps: D,
    options: FetchOptions,
    once: bool,
    commands: mpsc::UnboundedReceiver<Command<D>>,
    auth: watch::Receiver<Session>,
    auth_open: bool,
    /// Authenticated and resolved, as last seen on `auth`.
    ready: bool,
    /// Id of the signed-in user the current data belongs to.
    owner: Option<String>,
    state: watch::Sender<FetchState<T>>,
    deadline: Option<Instant>,
    in_flight: Option<InFlight<T>>,
    last_call: Option<Instant>,
    fired: bool,
}

impl<D, T> Driver<D, T>
where
    D: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        let (ready, user_id) = session_key(&self.auth.borrow_and_update());
        self.ready = ready;
        if ready {
            self.owner = user_id;
        }
        self.schedule("mount");

        loop {
            let deadline = self.deadline;

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::SetDeps(deps)) => {
                        self.deps = deps;
                        self.cancel_in_flight();
                        self.schedule("dependencies changed");
                    }
                    Some(Command::Refetch(reply)) => self.refetch(reply),
                    None => break,
                },

                changed = self.auth.changed(), if self.auth_open => {
                    let (ready, user_id) = match changed {
                        Ok(()) => session_key(&self.auth.borrow_and_update()),
                        Err(_) => {
                            self.auth_open = false;
                            (false, None)
                        }
                    };
                    self.on_auth_change(ready, user_id);
                }

                _ = wait_until(deadline) => {
                    self.deadline = None;
                    self.fire();
                }

                result = wait_in_flight(&mut self.in_flight) => self.complete(result),
            }
        }
    }

    /// React to a session update. Intermediate updates may have been
    /// merged, so a different signed-in user counts as a change even when
    /// readiness did not flip.
    fn on_auth_change(&mut self, ready: bool, user_id: Option<String>) {
        let switched = ready && self.owner.is_some() && user_id != self.owner;
        if ready {
            self.owner = user_id;
        }

        if switched {
            tracing::debug!("Signed-in user changed, discarding previous data");
            self.deadline = None;
            self.cancel_in_flight();
            self.fired = false;
            self.state.send_replace(FetchState::default());
        } else if ready == self.ready {
            return;
        }

        self.ready = ready;
        if ready {
            self.schedule("authentication changed");
        } else {
            tracing::debug!("Session not ready, cancelling pending fetch");
            self.deadline = None;
            self.cancel_in_flight();
        }
    }

    /// Arm (or re-arm) the debounce timer.
    fn schedule(&mut self, reason: &'static str) {
        if !self.ready {
            tracing::debug!(reason, "Fetch deferred until session is ready");
            self.deadline = None;
            return;
        }

        if self.once && self.fired {
            tracing::debug!(reason, "Dependency-less fetch already issued");
            return;
        }

        self.deadline = Some(Instant::now() + self.options.debounce);
    }

    /// Debounce window elapsed: issue the call unless a guard says no.
    fn fire(&mut self) {
        if !self.ready || (self.once && self.fired) {
            return;
        }

        if let Some(last) = self.last_call {
            let since = Instant::now().duration_since(last);
            if since < self.options.min_interval {
                tracing::debug!(
                    since_ms = since.as_millis() as u64,
                    "Fetch dropped by minimum interval"
                );
                return;
            }
        }

        self.start(None);
    }

    fn refetch(&mut self, reply: Reply) {
        if !self.ready {
            let _ = reply.send(Err(FetchError::NotAuthenticated));
            return;
        }

        self.deadline = None;
        self.start(Some(reply));
    }

    fn start(&mut self, reply: Option<Reply>) {
        self.cancel_in_flight();

        self.last_call = Some(Instant::now());
        self.fired = true;
        self.state.send_modify(|s| s.loading = true);

        self.in_flight = Some(InFlight {
            request: (self.fetch)(self.deps.clone()),
            reply,
        });
    }

    fn cancel_in_flight(&mut self) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };

        if let Some(reply) = in_flight.reply {
            let _ = reply.send(Err(FetchError::Superseded));
        }
        self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }

    fn complete(&mut self, result: Result<T, ApiError>) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };

        let outcome = match result {
            Ok(data) => {
                self.state.send_modify(|s| {
                    s.data = Some(data);
                    s.error = None;
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fetch failed");
                let message = e.user_message();
                self.state.send_modify(|s| {
                    s.error = Some(message.clone());
                    s.loading = false;
                });
                Err(FetchError::Failed(message))
            }
        };

        if let Some(reply) = in_flight.reply {
            let _ = reply.send(outcome);
        }
    }
}

fn session_key(session: &Session) -> (bool, Option<String>) {
    (
        session.is_ready(),
        session.user.as_ref().map(|user| user.id.clone()),
    )
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn wait_in_flight<T>(slot: &mut Option<InFlight<T>>) -> Result<T, ApiError> {
    match slot {
        Some(in_flight) => (&mut in_flight.request).await,
        None => std::future::pending().await,
    }
}
