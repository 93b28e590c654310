//! # State Containers
//!
//! A container owns one feature's state machine. Events go in through
//! `dispatch`, the bound `Strategy` decides when (and whether) each one runs
//! its use case, and the outcome comes out as a new `State` on every
//! subscription.
//!
//! ```text
//! dispatch(event) ──▶ queue ──▶ worker ──strategy──▶ use case ──▶ emit(State)
//!                                                                    │
//!                                  current_state() ◀── Shared ───────┤
//!                                  Subscription    ◀─────────────────┘
//! ```
//!
//! All bookkeeping (current state, subscriber list, restart epoch, in-flight
//! handle) lives behind one mutex in `Shared`. Emission happens entirely
//! under that lock, so readers only ever see a fully formed state and two
//! processing paths never write at the same time. Concurrency is only ever
//! about which in-flight processing reaches `emit` first.
//!
//! `Droppable` and `Restartable` decide in `dispatch`, under that same lock,
//! so the outcome never depends on when the worker gets to an event. Each
//! event is queued with a `Ticket`:
//!
//! - `Restartable`: a new epoch. Dispatch aborts whatever is in flight, and a
//!   result that got past its last await anyway carries a stale epoch and is
//!   discarded by `emit`.
//! - `Droppable`: the container's single in-flight claim. While a claim is
//!   held, dispatch drops the event. Emitting the settled state releases it.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};

use crate::core::event::Event;
use crate::core::failure::Failure;
use crate::core::state::State;
use crate::core::strategy::Strategy;
use crate::core::use_case::UseCase;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// The container was torn down; the event was not accepted.
    Destroyed { container: String },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::Destroyed { container } => {
                write!(f, "container '{container}' has been destroyed")
            }
        }
    }
}

impl std::error::Error for ContainerError {}

impl From<ContainerError> for Failure {
    fn from(e: ContainerError) -> Self {
        Failure::unknown(e.to_string()).with_cause(e)
    }
}

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerOptions {
    pub strategy: Strategy,
    /// Emit `Loading` before each use case invocation.
    pub emit_loading: bool,
}

impl ContainerOptions {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            emit_loading: false,
        }
    }

    pub fn with_loading(mut self, emit_loading: bool) -> Self {
        self.emit_loading = emit_loading;
        self
    }
}

// ============================================================================
// Shared bookkeeping
// ============================================================================

struct Inner<T> {
    current: State<T>,
    subscribers: Vec<(u64, mpsc::UnboundedSender<State<T>>)>,
    next_subscriber: u64,
    /// Bumped on every restartable dispatch; older epochs are stale.
    epoch: u64,
    in_flight: Option<AbortHandle>,
    /// Held by the one droppable event allowed in flight.
    claim: Option<u64>,
    next_claim: u64,
    destroyed: bool,
}

/// What an event was admitted with at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ticket {
    Free,
    Epoch(u64),
    Claim(u64),
}

struct Shared<T> {
    name: String,
    inner: Mutex<Inner<T>>,
}

impl<T> Shared<T> {
    fn new(name: String) -> Self {
        Self {
            name,
            inner: Mutex::new(Inner {
                current: State::Initial,
                subscribers: Vec::new(),
                next_subscriber: 0,
                epoch: 0,
                in_flight: None,
                claim: None,
                next_claim: 0,
                destroyed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// False once a newer restartable event has been dispatched.
    fn is_current(&self, ticket: Ticket) -> bool {
        match ticket {
            Ticket::Epoch(epoch) => self.lock().epoch == epoch,
            Ticket::Free | Ticket::Claim(_) => true,
        }
    }

    /// Records the running task. A task it replaces is aborted if still running.
    fn set_in_flight(&self, handle: AbortHandle) {
        let mut inner = self.lock();
        if inner.destroyed {
            handle.abort();
            return;
        }
        if let Some(previous) = inner.in_flight.replace(handle)
            && !previous.is_finished()
        {
            previous.abort();
        }
    }

    /// Gives back a droppable claim if `ticket` still holds it.
    fn release(&self, ticket: Ticket) {
        release_claim(&mut self.lock(), ticket);
    }

    fn unsubscribe(&self, id: u64) {
        self.lock().subscribers.retain(|(sub, _)| *sub != id);
    }

    fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    /// Stops all future emission, aborts in-flight work and ends every
    /// subscription stream. Idempotent.
    fn destroy(&self) {
        let mut inner = self.lock();
        if inner.destroyed {
            return;
        }
        inner.destroyed = true;
        inner.subscribers.clear();
        if let Some(handle) = inner.in_flight.take() {
            handle.abort();
        }
        debug!("[{}] destroyed", self.name);
    }
}

impl<T: Clone> Shared<T> {
    /// Publishes `state` unless the container is destroyed or the ticket's
    /// epoch is stale. A settled state releases the ticket's claim in the
    /// same critical section. Returns whether the state became current.
    fn emit(&self, ticket: Ticket, state: State<T>) -> bool {
        let mut inner = self.lock();
        if inner.destroyed {
            debug!("[{}] discarding {} after teardown", self.name, state.label());
            return false;
        }
        if let Ticket::Epoch(epoch) = ticket
            && epoch != inner.epoch
        {
            debug!(
                "[{}] discarding stale {} (epoch {} < {})",
                self.name,
                state.label(),
                epoch,
                inner.epoch
            );
            return false;
        }
        debug!(
            "[{}] emit {} to {} subscriber(s)",
            self.name,
            state.label(),
            inner.subscribers.len()
        );
        let settled = state.is_settled();
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(state.clone()).is_ok());
        inner.current = state;
        if settled {
            release_claim(&mut inner, ticket);
        }
        true
    }

    fn current(&self) -> State<T> {
        self.lock().current.clone()
    }
}

fn release_claim<T>(inner: &mut Inner<T>, ticket: Ticket) {
    if let Ticket::Claim(id) = ticket
        && inner.claim == Some(id)
    {
        inner.claim = None;
    }
}

/// Releases a droppable claim when processing ends without settling
/// (abort or panic).
struct Release<T> {
    shared: Arc<Shared<T>>,
    ticket: Ticket,
}

impl<T> Drop for Release<T> {
    fn drop(&mut self) {
        self.shared.release(self.ticket);
    }
}

// ============================================================================
// Container
// ============================================================================

pub struct StateContainer<U: UseCase> {
    strategy: Strategy,
    queue: Mutex<Option<mpsc::UnboundedSender<(Event<U::Input>, Ticket)>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<Shared<U::Output>>,
}

impl<U> StateContainer<U>
where
    U: UseCase,
    U::Output: Clone,
{
    /// Creates a container and starts its worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(name: impl Into<String>, use_case: U, strategy: Strategy) -> Self {
        Self::with_options(name, use_case, ContainerOptions::new(strategy))
    }

    pub fn with_options(name: impl Into<String>, use_case: U, options: ContainerOptions) -> Self {
        let name = name.into();
        let shared = Arc::new(Shared::new(name.clone()));
        let (tx, rx) = mpsc::unbounded_channel();

        info!(
            "[{}] container started (strategy={}, use_case={}, loading={})",
            name,
            options.strategy,
            use_case.name(),
            options.emit_loading
        );

        let worker = tokio::spawn(run_worker(
            Arc::new(use_case),
            shared.clone(),
            options,
            rx,
        ));

        Self {
            strategy: options.strategy,
            queue: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            shared,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Enqueues an event. Never blocks and never waits for processing.
    ///
    /// `Restartable` cancels the in-flight event right here, and `Droppable`
    /// ignores the event right here if another one is in flight.
    pub fn dispatch(&self, event: Event<U::Input>) -> Result<(), ContainerError> {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let destroyed = || ContainerError::Destroyed {
            container: self.shared.name.clone(),
        };
        let Some(tx) = queue.as_ref() else {
            warn!(
                "[{}] dispatch of {} ({}) after teardown",
                self.shared.name,
                event.kind(),
                event.correlation_id()
            );
            return Err(destroyed());
        };

        let mut inner = self.shared.lock();
        let ticket = match self.strategy {
            Strategy::Sequential | Strategy::Concurrent => Ticket::Free,
            Strategy::Droppable => {
                if inner.claim.is_some() {
                    info!(
                        "[{}] dropped {} ({}): another event is in flight",
                        self.shared.name,
                        event.kind(),
                        event.correlation_id()
                    );
                    return Ok(());
                }
                inner.next_claim += 1;
                inner.claim = Some(inner.next_claim);
                Ticket::Claim(inner.next_claim)
            }
            Strategy::Restartable => {
                inner.epoch += 1;
                if let Some(previous) = inner.in_flight.take()
                    && !previous.is_finished()
                {
                    info!(
                        "[{}] cancelling in-flight event for {} ({})",
                        self.shared.name,
                        event.kind(),
                        event.correlation_id()
                    );
                    previous.abort();
                }
                Ticket::Epoch(inner.epoch)
            }
        };
        debug!(
            "[{}] queued {} ({}) as {:?}",
            self.shared.name,
            event.kind(),
            event.correlation_id(),
            ticket
        );
        // Sent under the lock so queue order matches ticket order.
        tx.send((event, ticket)).map_err(|_| destroyed())
    }

    /// Latest emitted state.
    pub fn current_state(&self) -> State<U::Output> {
        self.shared.current()
    }

    /// Registers an observer. The subscription first yields the current
    /// state, then every later emission in emission order.
    pub fn subscribe(&self) -> Subscription<U::Output> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.shared.lock();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        // Receiver is alive in this scope, so the replay cannot fail.
        let _ = tx.send(inner.current.clone());
        if !inner.destroyed {
            inner.subscribers.push((id, tx));
        }
        Subscription {
            id,
            receiver: rx,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.is_destroyed()
    }

    /// Tears the container down.
    ///
    /// `Concurrent` containers stop accepting events and let in-flight work
    /// finish and emit. Every other strategy aborts in-flight work at once.
    /// Either way nothing is emitted after this returns.
    pub async fn teardown(&self) {
        let queue = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(queue);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if self.strategy.drains_on_teardown() {
            info!("[{}] draining in-flight events", self.shared.name);
        } else {
            self.shared.destroy();
            if let Some(worker) = &worker {
                worker.abort();
            }
        }

        if let Some(worker) = worker
            && let Err(e) = worker.await
            && !e.is_cancelled()
        {
            warn!("[{}] worker ended abnormally: {}", self.shared.name, e);
        }

        self.shared.destroy();
        info!("[{}] container torn down", self.shared.name);
    }
}

impl<U: UseCase> Drop for StateContainer<U> {
    fn drop(&mut self) {
        // Closing the queue lets a concurrent worker drain and destroy itself.
        let queue = self
            .queue
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(queue);

        if !self.strategy.drains_on_teardown() {
            self.shared.destroy();
            if let Some(worker) = self
                .worker
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            {
                worker.abort();
            }
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

async fn run_worker<U>(
    use_case: Arc<U>,
    shared: Arc<Shared<U::Output>>,
    options: ContainerOptions,
    mut queue: mpsc::UnboundedReceiver<(Event<U::Input>, Ticket)>,
) where
    U: UseCase,
    U::Output: Clone,
{
    let loading = options.emit_loading;
    let mut concurrent = JoinSet::new();

    while let Some((event, ticket)) = queue.recv().await {
        match options.strategy {
            Strategy::Sequential => {
                process(use_case.clone(), shared.clone(), event, ticket, loading).await;
            }
            Strategy::Concurrent => {
                concurrent.spawn(process(use_case.clone(), shared.clone(), event, ticket, loading));
                // Reap whatever already finished so the set does not grow unbounded.
                while concurrent.try_join_next().is_some() {}
            }
            Strategy::Droppable | Strategy::Restartable => {
                if !shared.is_current(ticket) {
                    debug!(
                        "[{}] skipping {} ({}): superseded before it started",
                        shared.name,
                        event.kind(),
                        event.correlation_id()
                    );
                    continue;
                }
                let task = tokio::spawn(process(
                    use_case.clone(),
                    shared.clone(),
                    event,
                    ticket,
                    loading,
                ));
                shared.set_in_flight(task.abort_handle());
            }
        }
    }

    while concurrent.join_next().await.is_some() {}
    shared.destroy();
}

async fn process<U>(
    use_case: Arc<U>,
    shared: Arc<Shared<U::Output>>,
    event: Event<U::Input>,
    ticket: Ticket,
    loading: bool,
) where
    U: UseCase,
    U::Output: Clone,
{
    let _release = Release {
        shared: shared.clone(),
        ticket,
    };
    let kind = event.kind().to_string();
    let correlation_id = event.correlation_id();
    debug!(
        "[{}] processing {} ({}) with {}",
        shared.name,
        kind,
        correlation_id,
        use_case.name()
    );

    if loading {
        shared.emit(ticket, State::Loading);
    }

    let outcome = use_case.execute(event.into_payload()).await;
    if let Err(failure) = &outcome {
        info!(
            "[{}] {} ({}) failed: {}",
            shared.name, kind, correlation_id, failure
        );
    }

    if shared.emit(ticket, outcome.into()) {
        debug!("[{}] {} ({}) settled", shared.name, kind, correlation_id);
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// A live view of a container's emissions.
///
/// Dropping the subscription (or calling `unsubscribe`) stops delivery.
/// The stream ends once the container is destroyed.
pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::UnboundedReceiver<State<T>>,
    shared: Weak<Shared<T>>,
}

impl<T> Subscription<T> {
    /// Waits for the next state. `None` once the container is gone.
    pub async fn recv(&mut self) -> Option<State<T>> {
        self.receiver.recv().await
    }

    /// Returns an already delivered state without waiting.
    pub fn try_recv(&mut self) -> Option<State<T>> {
        self.receiver.try_recv().ok()
    }

    /// Waits until a `Success` or `Failure` arrives.
    pub async fn next_settled(&mut self) -> Option<State<T>> {
        while let Some(state) = self.receiver.recv().await {
            if state.is_settled() {
                return Some(state);
            }
        }
        None
    }

    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.unsubscribe(self.id);
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = State<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<State<T>>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
