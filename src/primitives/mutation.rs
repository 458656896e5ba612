// ============================================================================
// spark-logic - Mutation Helper
// Apply a change, then emit exactly once
// ============================================================================
//
// A mutation block either finishes immediately or hands back a future. The
// block says which by returning `Mutation::Ready` or `Mutation::Pending`, so
// there is no guessing about the shape of its result.
//
// Contract, for both paths:
// - Disposed at call time: the block does not run, result is Ok(None)
// - Block fails: the error comes back unchanged, no emit, version unchanged
// - Block succeeds: emit once (suppressed if disposed in the meantime)
//
// Pending blocks are not cancelled by dispose. They run to completion when
// polled, their emit is simply dropped.
// ============================================================================

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{FutureExt, LocalBoxFuture};

use crate::core::types::LogicState;
use crate::primitives::logic::Logic;

// =============================================================================
// WRITER
// =============================================================================

/// Write access handed to mutation blocks.
///
/// Writes through a `Writer` never emit; the surrounding mutation emits
/// once when the block completes. Async blocks keep the writer across
/// suspension points.
pub struct Writer<S> {
    logic: Logic<S>,
}

impl<S> Clone for Writer<S> {
    fn clone(&self) -> Self {
        Self {
            logic: self.logic.clone(),
        }
    }
}

impl<S: LogicState> Writer<S> {
    /// Change the state in place without emitting.
    pub fn write<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.logic.write_silently(f)
    }

    /// Read the state.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.logic.read(f)
    }

    /// Whether the holder was disposed while the block was running.
    pub fn is_disposed(&self) -> bool {
        self.logic.is_disposed()
    }

    /// The holder being mutated.
    pub fn logic(&self) -> &Logic<S> {
        &self.logic
    }
}

// =============================================================================
// MUTATION - what a block returns
// =============================================================================

/// Boxed future returned by a deferred mutation block.
pub type MutationFuture<T, E> = LocalBoxFuture<'static, Result<T, E>>;

/// Outcome of a mutation block: finished now, or finishing later.
pub enum Mutation<T, E> {
    /// The change is already applied
    Ready(Result<T, E>),
    /// The change completes when the future resolves
    Pending(MutationFuture<T, E>),
}

impl<T, E> Mutation<T, E> {
    /// Finished successfully
    pub fn ready(value: T) -> Self {
        Mutation::Ready(Ok(value))
    }

    /// Finished with an error
    pub fn failed(error: E) -> Self {
        Mutation::Ready(Err(error))
    }

    /// Finishes when `future` resolves
    pub fn pending(future: impl Future<Output = Result<T, E>> + 'static) -> Self {
        Mutation::Pending(future.boxed_local())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Mutation::Pending(_))
    }
}

impl<T, E> fmt::Debug for Mutation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Ready(result) => f
                .debug_tuple("Ready")
                .field(&if result.is_ok() { "ok" } else { "err" })
                .finish(),
            Mutation::Pending(_) => f.write_str("Pending"),
        }
    }
}

// =============================================================================
// APPLIED - what the caller gets back
// =============================================================================

/// Result of [`Logic::apply`].
///
/// `Ok(None)` means the holder was already disposed and the block never ran.
#[must_use = "a pending mutation does nothing unless polled"]
pub enum Applied<T, E> {
    /// The block finished; emit (if any) already happened
    Ready(Result<Option<T>, E>),
    /// The block is still running; emit happens on completion
    Pending(PendingMutation<T, E>),
}

impl<T: 'static, E: 'static> Applied<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Applied::Pending(_))
    }

    /// Turn either path into a future.
    pub fn into_future(self) -> PendingMutation<T, E> {
        match self {
            Applied::Ready(result) => PendingMutation::new(futures::future::ready(result)),
            Applied::Pending(pending) => pending,
        }
    }
}

/// A deferred mutation in flight.
///
/// Resolves after the block completes and the holder has emitted.
#[must_use = "a pending mutation does nothing unless polled"]
pub struct PendingMutation<T, E> {
    future: LocalBoxFuture<'static, Result<Option<T>, E>>,
}

impl<T, E> PendingMutation<T, E> {
    fn new(future: impl Future<Output = Result<Option<T>, E>> + 'static) -> Self {
        Self {
            future: future.boxed_local(),
        }
    }
}

impl<T, E> Future for PendingMutation<T, E> {
    type Output = Result<Option<T>, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.poll_unpin(cx)
    }
}

impl<T, E> fmt::Debug for PendingMutation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingMutation")
    }
}

// =============================================================================
// LOGIC MUTATION API
// =============================================================================

impl<S: LogicState> Logic<S> {
    /// Apply a mutation block that may complete now or later.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_logic::{Applied, Logic, Mutation, logic_state};
    ///
    /// struct Flag {
    ///     on: bool,
    /// }
    /// logic_state!(Flag => "flag");
    ///
    /// let flag = Logic::new(Flag { on: false });
    /// let applied = flag.apply(|writer| {
    ///     writer.write(|f| f.on = true);
    ///     Mutation::<(), ()>::ready(())
    /// });
    ///
    /// assert!(matches!(applied, Applied::Ready(Ok(Some(())))));
    /// assert_eq!(flag.version(), 1);
    /// ```
    pub fn apply<T, E>(&self, block: impl FnOnce(Writer<S>) -> Mutation<T, E>) -> Applied<T, E>
    where
        T: 'static,
        E: 'static,
    {
        if self.is_disposed() {
            tracing::trace!(message = "logic.mutate.suppressed", logic = self.label());
            return Applied::Ready(Ok(None));
        }

        match block(self.writer()) {
            Mutation::Ready(result) => Applied::Ready(self.settle(result)),
            Mutation::Pending(future) => {
                let logic = self.clone();
                Applied::Pending(PendingMutation::new(async move {
                    let result = future.await;
                    logic.settle(result)
                }))
            }
        }
    }

    /// Apply a synchronous change, then emit once.
    ///
    /// Returns `None` (without running `f`) if the holder is disposed.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        match self.run_now(|state| Ok::<R, Infallible>(f(state))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Apply a fallible synchronous change.
    ///
    /// On `Err` the error is returned and nothing is emitted. Writes the
    /// block made before failing are kept.
    pub fn try_mutate<R, E>(&self, f: impl FnOnce(&mut S) -> Result<R, E>) -> Result<Option<R>, E> {
        self.run_now(f)
    }

    /// Start an asynchronous change, emitting once when it completes.
    ///
    /// The block receives a [`Writer`] it can use across await points.
    /// Nothing runs until the returned future is polled.
    pub fn mutate_async<F, Fut, R, E>(&self, block: F) -> PendingMutation<R, E>
    where
        F: FnOnce(Writer<S>) -> Fut,
        Fut: Future<Output = Result<R, E>> + 'static,
        R: 'static,
        E: 'static,
    {
        self.apply(|writer| Mutation::pending(block(writer)))
            .into_future()
    }

    fn writer(&self) -> Writer<S> {
        Writer {
            logic: self.clone(),
        }
    }

    fn run_now<R, E>(&self, f: impl FnOnce(&mut S) -> Result<R, E>) -> Result<Option<R>, E> {
        if self.is_disposed() {
            tracing::trace!(message = "logic.mutate.suppressed", logic = self.label());
            return Ok(None);
        }
        // Borrow ends before emit so listeners can read
        let result = self.write_silently(f);
        self.settle(result)
    }

    fn settle<T, E>(&self, result: Result<T, E>) -> Result<Option<T>, E> {
        match result {
            Ok(value) => {
                self.emit();
                Ok(Some(value))
            }
            Err(error) => {
                tracing::debug!(
                    message = "logic.mutate.failed",
                    logic = self.label(),
                    version = self.version()
                );
                Err(error)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
