//! Source shapes and their normalization into an [`Eventual`].

use std::fmt;
use std::future::Future;

use crate::eventual::{Continuation, Eventual, Failure, capture};

/// What a zero-argument source hands back: a plain value, or an eventual
/// value to be chained.
pub enum Outcome<T> {
    Value(T),
    Eventual(Eventual<T>),
}

impl<T: Send + 'static> Outcome<T> {
    fn into_eventual(self) -> Eventual<T> {
        match self {
            Outcome::Value(value) => Eventual::resolved(value),
            Outcome::Eventual(eventual) => eventual,
        }
    }
}

pub type ImmediateFn<T> = Box<dyn FnOnce() -> Result<Outcome<T>, Failure>>;
pub type CallbackFn<T> = Box<dyn FnOnce(Continuation<T>)>;

/// A unit of work in one of the three accepted shapes.
pub enum Source<T> {
    /// A zero-argument function, run synchronously.
    Immediate(ImmediateFn<T>),
    /// A function taking a single `(error, value)` continuation.
    Callback(CallbackFn<T>),
    /// An eventual value, chained as is.
    Eventual(Eventual<T>),
}

impl<T: Send + 'static> Source<T> {
    /// A zero-argument function returning its value directly.
    pub fn immediate(f: impl FnOnce() -> Result<T, Failure> + 'static) -> Self {
        Source::Immediate(Box::new(move || f().map(Outcome::Value)))
    }

    /// A zero-argument function returning an eventual value, which is chained
    /// rather than delivered as a literal.
    pub fn flatten(f: impl FnOnce() -> Result<Eventual<T>, Failure> + 'static) -> Self {
        Source::Immediate(Box::new(move || f().map(Outcome::Eventual)))
    }

    /// A function that settles the continuation it is given.
    pub fn callback(f: impl FnOnce(Continuation<T>) + 'static) -> Self {
        Source::Callback(Box::new(f))
    }

    /// Any future yielding `Result<T, Failure>`.
    pub fn eventual<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        Source::Eventual(Eventual::new(future))
    }

    /// Run the source (if it is a function) and return the eventual that
    /// represents its outcome. Never panics; failures land in the eventual.
    pub(crate) fn normalize(self) -> Eventual<T> {
        match self {
            Source::Immediate(f) => match capture(f) {
                Ok(Ok(outcome)) => outcome.into_eventual(),
                Ok(Err(error)) | Err(error) => Eventual::rejected(error),
            },
            Source::Callback(f) => {
                let (eventual, continuation) = Eventual::pending();
                let guard = continuation.clone();
                if let Err(error) = capture(move || f(continuation))
                    && !guard.reject(error)
                {
                    tracing::debug!("Callback source panicked after settling, keeping first result");
                }
                eventual
            }
            Source::Eventual(eventual) => eventual,
        }
    }
}

impl<T> From<Eventual<T>> for Source<T> {
    fn from(eventual: Eventual<T>) -> Self {
        Source::Eventual(eventual)
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Source::Immediate(_) => "Immediate",
            Source::Callback(_) => "Callback",
            Source::Eventual(_) => "Eventual",
        };
        f.debug_tuple("Source").field(&shape).finish()
    }
}
