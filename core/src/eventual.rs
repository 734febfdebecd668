//! The canonical eventual value and the continuation that settles it.
//!
//! Every source shape is normalized into an [`Eventual`]. Callback-style
//! sources receive a [`Continuation`], the Rust form of the `(error, value)`
//! callback: the first settlement wins and later ones are ignored.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures_util::future::{self as future_util, BoxFuture, FutureExt};
use tokio::sync::oneshot;

use shift_types::SourceFault;

/// Operational error carried on the failure channel.
///
/// The error a source raises is the one the consumer receives; downcast it to
/// recover the original type.
pub type Failure = anyhow::Error;

type Settlement<T> = oneshot::Sender<Result<T, Failure>>;

/// A result that becomes available exactly once, as a value or a failure.
///
/// Panics raised while polling the wrapped future are turned into
/// [`SourceFault::Panicked`] failures.
#[must_use = "an eventual does nothing unless awaited"]
pub struct Eventual<T> {
    inner: BoxFuture<'static, Result<T, Failure>>,
}

impl<T: Send + 'static> Eventual<T> {
    /// Wrap any future yielding `Result<T, Failure>`.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        let guarded = AssertUnwindSafe(future)
            .catch_unwind()
            .map(|outcome| match outcome {
                Ok(result) => result,
                Err(payload) => Err(Failure::new(SourceFault::from_panic(payload.as_ref()))),
            });
        Self {
            inner: guarded.boxed(),
        }
    }

    /// An eventual that is already settled with `value`.
    pub fn resolved(value: T) -> Self {
        Self {
            inner: future_util::ready(Ok(value)).boxed(),
        }
    }

    /// An eventual that is already settled with `error`.
    pub fn rejected(error: impl Into<Failure>) -> Self {
        Self {
            inner: future_util::ready(Err(error.into())).boxed(),
        }
    }

    /// A pending eventual together with the continuation that settles it.
    ///
    /// If every clone of the continuation is dropped without settling, the
    /// eventual fails with [`SourceFault::Abandoned`].
    pub fn pending() -> (Self, Continuation<T>) {
        let (tx, rx) = oneshot::channel();
        let inner = async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(Failure::new(SourceFault::Abandoned)),
            }
        };
        (
            Self {
                inner: inner.boxed(),
            },
            Continuation {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
        )
    }
}

impl<T> Future for Eventual<T> {
    type Output = Result<T, Failure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Eventual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eventual").finish_non_exhaustive()
    }
}

/// The synthesized `(error, value)` callback handed to callback-style sources.
///
/// Clones share one settlement slot.
pub struct Continuation<T> {
    slot: Arc<Mutex<Option<Settlement<T>>>>,
}

impl<T> Clone for Continuation<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Continuation<T> {
    /// Settle the eventual with `result`.
    ///
    /// Returns `false` if it was already settled; the repeat is ignored.
    pub fn settle(&self, result: Result<T, Failure>) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(sender) = sender else {
            tracing::debug!("Continuation already settled, ignoring repeat settlement");
            return false;
        };

        match sender.send(result) {
            Ok(()) => {}
            Err(Ok(_)) => {
                tracing::trace!("Eventual dropped before settlement, discarding value");
            }
            Err(Err(error)) => {
                // Nobody can observe this rejection any more.
                tracing::debug!(error = %error, "Eventual dropped before settlement, swallowing rejection");
            }
        }
        true
    }

    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    pub fn reject(&self, error: impl Into<Failure>) -> bool {
        self.settle(Err(error.into()))
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<T> fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Run `f`, turning a panic into a [`SourceFault::Panicked`] failure.
pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> Result<R, Failure> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| Failure::new(SourceFault::from_panic(payload.as_ref())))
}
