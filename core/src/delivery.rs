//! Setup and delivery: the `from` half of the adapter.
//!
//! A [`Shifting`] pairs one optional callback with `from`. Without a callback
//! the normalized eventual is handed back to the caller. With one, a task is
//! spawned that waits for settlement and then invokes the callback. That task
//! is held behind a gate which opens only as `from` returns, so the callback
//! never fires before `from` has returned, whatever runtime it lands on.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use shift_types::{ShiftConfig, ShiftError, UnobservedLevel, panic_message};

use crate::eventual::{Eventual, Failure};
use crate::source::Source;

/// Completion callback in the `(error, value)` convention.
///
/// `Err(error)` means "error present, no value"; `Ok(value)` means "no error".
pub type Callback<T> = Arc<dyn Fn(Result<T, Failure>) + Send + Sync>;

/// Where the result of a `from` call will show up.
#[must_use = "an eventual delivery must be awaited to observe the result"]
pub enum Delivered<T> {
    /// No callback was configured; await this.
    Eventual(Eventual<T>),
    /// The result will arrive through the configured callback.
    Callback,
}

impl<T> Delivered<T> {
    pub fn into_eventual(self) -> Option<Eventual<T>> {
        match self {
            Delivered::Eventual(eventual) => Some(eventual),
            Delivered::Callback => None,
        }
    }

    #[must_use]
    pub fn is_callback(&self) -> bool {
        matches!(self, Delivered::Callback)
    }
}

impl<T> fmt::Debug for Delivered<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivered::Eventual(eventual) => f.debug_tuple("Eventual").field(eventual).finish(),
            Delivered::Callback => f.write_str("Callback"),
        }
    }
}

/// An adapter instance: one optional callback plus `from`.
pub struct Shifting<T> {
    callback: Option<Callback<T>>,
    config: ShiftConfig,
    handle: Option<Handle>,
}

/// Set up an adapter. `None` selects eventual mode.
pub fn shifting<T: Send + 'static>(callback: Option<Callback<T>>) -> Shifting<T> {
    Shifting::new(callback)
}

enum Route<T> {
    Eventual,
    Callback {
        callback: Callback<T>,
        handle: Handle,
        config: ShiftConfig,
    },
}

impl<T: Send + 'static> Shifting<T> {
    #[must_use]
    pub fn new(callback: Option<Callback<T>>) -> Self {
        Self {
            callback,
            config: ShiftConfig::default(),
            handle: None,
        }
    }

    /// Adapter that hands back eventual values.
    #[must_use]
    pub fn eventual() -> Self {
        Self::new(None)
    }

    /// Adapter that delivers every result to `callback`.
    #[must_use]
    pub fn with_callback(callback: impl Fn(Result<T, Failure>) + Send + Sync + 'static) -> Self {
        Self::new(Some(Arc::new(callback)))
    }

    pub fn with_config(mut self, config: ShiftConfig) -> Self {
        self.config = config;
        self
    }

    /// Deliver callbacks on `handle` instead of the ambient runtime.
    pub fn on(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    #[must_use]
    pub fn config(&self) -> ShiftConfig {
        self.config
    }

    /// Run `source` and deliver its outcome through this adapter's channel.
    ///
    /// The only synchronous error is [`ShiftError::NoRuntime`], returned
    /// before the source runs. Everything the source does wrong arrives
    /// through the eventual or the callback.
    pub fn from(&self, source: impl Into<Source<T>>) -> Result<Delivered<T>, ShiftError> {
        let route = self.route()?;
        let eventual = source.into().normalize();
        // Dropped on return, which opens the delivery gate.
        let (delivered, _gate) = route.deliver(eventual);
        Ok(delivered)
    }

    fn route(&self) -> Result<Route<T>, ShiftError> {
        let Some(callback) = &self.callback else {
            return Ok(Route::Eventual);
        };
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| ShiftError::NoRuntime)?,
        };
        Ok(Route::Callback {
            callback: Arc::clone(callback),
            handle,
            config: self.config,
        })
    }
}

impl<T> fmt::Debug for Shifting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shifting")
            .field("callback", &self.callback.is_some())
            .field("config", &self.config)
            .field("handle", &self.handle.is_some())
            .finish()
    }
}

/// Closing this sender releases a spawned delivery.
type Gate = oneshot::Sender<()>;

impl<T: Send + 'static> Route<T> {
    fn deliver(self, eventual: Eventual<T>) -> (Delivered<T>, Option<Gate>) {
        match self {
            Route::Eventual => (Delivered::Eventual(eventual), None),
            Route::Callback {
                callback,
                handle,
                config,
            } => {
                let (gate, opened) = oneshot::channel();
                handle.spawn(deliver_later(opened, eventual, callback, config));
                (Delivered::Callback, Some(gate))
            }
        }
    }
}

async fn deliver_later<T>(
    opened: oneshot::Receiver<()>,
    eventual: Eventual<T>,
    callback: Callback<T>,
    config: ShiftConfig,
) {
    // Nothing is ever sent; the gate opens when its sender is dropped.
    let _ = opened.await;
    let result = eventual.await;
    if config.deferral().yields() {
        tokio::task::yield_now().await;
    }

    let outcome = if result.is_ok() { "value" } else { "error" };
    tracing::trace!(outcome, "Delivering result to callback");

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(result))) {
        report_unobserved(config.unobserved(), &panic_message(payload.as_ref()));
    }
}

/// The callback already received its result; a panic inside it has nobody
/// left to go to.
fn report_unobserved(level: UnobservedLevel, message: &str) {
    match level {
        UnobservedLevel::Error => {
            tracing::error!(panic = message, "Callback panicked during delivery");
        }
        UnobservedLevel::Warn => {
            tracing::warn!(panic = message, "Callback panicked during delivery");
        }
        UnobservedLevel::Debug => {
            tracing::debug!(panic = message, "Callback panicked during delivery");
        }
        UnobservedLevel::Off => {}
    }
}
