//! # Event Horizon Runtime
//!
//! The [`Store`] coordinates reducer execution and effect handling for one
//! feature instance.
//!
//! ## Core Components
//!
//! - **Store**: owns state, serialises reducer calls, executes effects
//! - **Effect Executor**: runs effect descriptions on tokio and feeds actions back
//! - **Lifecycle**: graceful [`Store::shutdown`] drains in-flight effects, hard
//!   [`Store::teardown`] aborts them and discards anything they would produce
//!
//! ## Example
//!
//! ```ignore
//! use horizon_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action and wait for the effects it started
//! let mut handle = store.send(Action::DoSomething).await?;
//! handle.wait().await;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//!
//! // The owning view is gone: nothing may touch this state any more
//! store.teardown();
//! ```

use horizon_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::AbortHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store is draining and no longer accepts new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// The store was torn down; its state must not be touched again
        #[error("Store has been torn down")]
        TornDown,

        /// Shutdown timed out with effects still running
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Waiting for an action or for effects timed out
        #[error("Operation timed out")]
        Timeout,

        /// The action broadcast channel closed
        #[error("Action channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const TORN_DOWN: u8 = 2;

/// Lifecycle phase of a [`Store`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Accepting actions
    Running,
    /// Graceful shutdown: in-flight effects may still feed back, new actions are rejected
    Draining,
    /// Hard stop: every action is rejected and in-flight effects were aborted
    TornDown,
}

impl Lifecycle {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            RUNNING => Self::Running,
            DRAINING => Self::Draining,
            _ => Self::TornDown,
        }
    }
}

/// Configuration for Store instances
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the broadcast channel carrying effect-produced actions
    pub broadcast_capacity: usize,
    /// Default timeout used by [`Store::shutdown_default`]
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on it resolves once every effect
/// started by that action has finished, including the reducer call for any
/// action those effects fed back.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running for this action
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    ///
    /// Aborted effects count as complete.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, so nothing can still be running
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Runs on completion, on panic and on abort alike.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements the store-wide pending counter on drop
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Where an action entered the store from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Sent by a caller through [`Store::send`]
    External,
    /// Produced by one of the store's own effects
    Feedback,
}

fn lock_tasks(tasks: &Mutex<Vec<AbortHandle>>) -> MutexGuard<'_, Vec<AbortHandle>> {
    // Abort handles stay valid even if another thread panicked mid-push
    match tasks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicU8, AtomicUsize, DecrementGuard, DRAINING, Duration, Effect, EffectHandle,
        EffectTracking, Lifecycle, Mutex, Ordering, Origin, PendingGuard, RUNNING, Reducer,
        RwLock, StoreConfig, StoreError, TORN_DOWN, lock_tasks,
    };
    use tokio::sync::broadcast;
    use tokio::task::AbortHandle;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, reducer calls are serialised by the write lock)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    /// 5. Lifecycle (drain or tear down)
    ///
    /// Clones share the same state and lifecycle.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        lifecycle: Arc<AtomicU8>,
        pending_effects: Arc<AtomicUsize>,
        tasks: Arc<Mutex<Vec<AbortHandle>>>,
        /// Actions produced by effects, published after the reducer applied them
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with default configuration
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                lifecycle: Arc::new(AtomicU8::new(RUNNING)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                tasks: Arc::new(Mutex::new(Vec::new())),
                action_broadcast,
            }
        }

        /// Current lifecycle phase
        #[must_use]
        pub fn lifecycle(&self) -> Lifecycle {
            Lifecycle::from_raw(self.lifecycle.load(Ordering::Acquire))
        }

        /// Number of effects still running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Send an action to the store
        ///
        /// The reducer runs synchronously under the write lock; returned effects
        /// are started before this method returns but may complete later.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] while draining
        /// - [`StoreError::TornDown`] after [`Store::teardown`]
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.dispatch(action, Origin::External).await
        }

        /// Send an action and wait for an effect-produced action matching `predicate`
        ///
        /// Subscribes before sending, so a fast effect cannot slip past.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`] if nothing matched in time
        /// - [`StoreError::ChannelClosed`] if the broadcast channel closed
        /// - any error returned by [`Store::send`]
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();
            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        ///
        /// Actions are published only after the reducer accepted them, so an
        /// observer never sees an action that a torn-down store discarded.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Graceful shutdown
        ///
        /// Rejects new external actions, lets in-flight effects finish and feed
        /// back, and returns once none are pending.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            let _ = self
                .lifecycle
                .compare_exchange(RUNNING, DRAINING, Ordering::AcqRel, Ordering::Acquire);

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects();
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }
                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Graceful shutdown using the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Hard stop
        ///
        /// After this call no action, external or fed back, reaches the reducer
        /// again, and every tracked effect task is aborted. Safe to call more
        /// than once and from synchronous code (e.g. `Drop`).
        ///
        /// Returns the number of effect tasks that were still running.
        pub fn teardown(&self) -> usize {
            let previous = self.lifecycle.swap(TORN_DOWN, Ordering::AcqRel);
            if previous == TORN_DOWN {
                return 0;
            }

            let handles: Vec<AbortHandle> = lock_tasks(&self.tasks).drain(..).collect();
            let mut aborted = 0;
            for handle in handles {
                if !handle.is_finished() {
                    handle.abort();
                    aborted += 1;
                }
            }

            tracing::debug!(aborted, "Store torn down");
            metrics::counter!("store.teardown.total").increment(1);
            metrics::counter!("store.teardown.aborted_effects").increment(aborted as u64);
            aborted
        }

        fn admission(&self, origin: Origin) -> Result<(), StoreError> {
            match (self.lifecycle(), origin) {
                (Lifecycle::Running, _) | (Lifecycle::Draining, Origin::Feedback) => Ok(()),
                (Lifecycle::Draining, Origin::External) => Err(StoreError::ShutdownInProgress),
                (Lifecycle::TornDown, _) => Err(StoreError::TornDown),
            }
        }

        async fn dispatch(&self, action: A, origin: Origin) -> Result<EffectHandle, StoreError> {
            if let Err(error) = self.admission(origin) {
                tracing::debug!(?origin, ?action, %error, "Rejected action");
                metrics::counter!("store.actions.rejected").increment(1);
                return Err(error);
            }

            metrics::counter!("store.commands.total").increment(1);
            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                // Teardown may have happened while waiting for the lock
                if let Err(error) = self.admission(origin) {
                    tracing::debug!(?origin, %error, "Rejected action after acquiring state");
                    metrics::counter!("store.actions.rejected").increment(1);
                    return Err(error);
                }

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::trace!(effects = effects.len(), "Reducer completed");
                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Feed an effect-produced action back into the reducer
        async fn feed_back(&self, action: A) {
            match self.dispatch(action.clone(), Origin::Feedback).await {
                Ok(_) => {
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => {
                    tracing::debug!(%error, "Discarded effect output");
                    metrics::counter!("store.feedback.discarded").increment(1);
                },
            }
        }

        fn spawn_tracked<F>(&self, tracking: &EffectTracking, work: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            if self.lifecycle() == Lifecycle::TornDown {
                tracing::trace!("Skipping effect for torn-down store");
                return;
            }

            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = DecrementGuard(tracking.clone());
            let pending = PendingGuard(Arc::clone(&self.pending_effects));

            let task = tokio::spawn(async move {
                let _guard = guard;
                let _pending = pending;
                work.await;
            });

            let mut tasks = lock_tasks(&self.tasks);
            tasks.retain(|handle| !handle.is_finished());
            tasks.push(task.abort_handle());
        }

        /// Execute an effect with tracking
        ///
        /// Effect failures never halt the store: a panicking task only drops its
        /// own guards, which keeps the counters honest.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into spawned tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();
                    self.spawn_tracked(&tracking, async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let store = self.clone();
                    self.spawn_tracked(&tracking, async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    let store = self.clone();
                    self.spawn_tracked(&tracking, async move {
                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                lifecycle: Arc::clone(&self.lifecycle),
                pending_effects: Arc::clone(&self.pending_effects),
                tasks: Arc::clone(&self.tasks),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;
