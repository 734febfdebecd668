//! `apply` / `call`: invoke a function with an argument list and optional
//! bound context, picking its calling convention from its declared
//! parameter count.

use std::fmt;
use std::sync::Arc;

use shift_types::{Convention, ShiftError};

use crate::delivery::{Callback, Delivered, Shifting};
use crate::eventual::{Continuation, Eventual, Failure};
use crate::source::{Outcome, Source};

type ReturningBody<C, A, T> = Box<dyn FnOnce(Option<&C>, Vec<A>) -> Result<Outcome<T>, Failure>>;
type CallbackBody<C, A, T> = Box<dyn FnOnce(Option<&C>, Vec<A>, Continuation<T>)>;

enum Body<C, A, T> {
    Returning(ReturningBody<C, A, T>),
    Callback(CallbackBody<C, A, T>),
}

impl<C, A, T> Body<C, A, T> {
    fn convention(&self) -> Convention {
        match self {
            Body::Returning(_) => Convention::Returning,
            Body::Callback(_) => Convention::CallbackStyle,
        }
    }
}

/// A function with a declared parameter count.
///
/// `C` is the receiver type for bound calls, `A` the argument type, `T` the
/// success value. For callback-accepting functions the declared count
/// includes the trailing continuation.
pub struct Function<C, A, T> {
    arity: usize,
    body: Body<C, A, T>,
}

impl<C: 'static, A: 'static, T: Send + 'static> Function<C, A, T> {
    /// A function of `arity` parameters that returns its value.
    pub fn returning(
        arity: usize,
        f: impl FnOnce(Option<&C>, Vec<A>) -> Result<T, Failure> + 'static,
    ) -> Self {
        Self {
            arity,
            body: Body::Returning(Box::new(move |context: Option<&C>, args: Vec<A>| {
                f(context, args).map(Outcome::Value)
            })),
        }
    }

    /// A function of `arity` parameters that returns an eventual value.
    pub fn returning_eventual(
        arity: usize,
        f: impl FnOnce(Option<&C>, Vec<A>) -> Result<Eventual<T>, Failure> + 'static,
    ) -> Self {
        Self {
            arity,
            body: Body::Returning(Box::new(move |context: Option<&C>, args: Vec<A>| {
                f(context, args).map(Outcome::Eventual)
            })),
        }
    }

    /// A function taking `params` ordinary parameters followed by a
    /// continuation; it declares `params + 1` parameters, saturating at
    /// `usize::MAX`.
    pub fn with_callback(
        params: usize,
        f: impl FnOnce(Option<&C>, Vec<A>, Continuation<T>) + 'static,
    ) -> Self {
        Self {
            arity: params.saturating_add(1),
            body: Body::Callback(Box::new(f)),
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl<C, A, T> fmt::Debug for Function<C, A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("arity", &self.arity)
            .field("convention", &self.body.convention())
            .finish()
    }
}

/// A function, optionally bound to a receiver.
///
/// Build one from a bare [`Function`] or a `(context, function)` pair.
pub struct Target<C, A, T> {
    context: Option<C>,
    function: Function<C, A, T>,
}

impl<C, A, T> Target<C, A, T> {
    pub fn bound(context: C, function: Function<C, A, T>) -> Self {
        Self {
            context: Some(context),
            function,
        }
    }

    pub fn unbound(function: Function<C, A, T>) -> Self {
        Self {
            context: None,
            function,
        }
    }
}

impl<C, A, T> From<Function<C, A, T>> for Target<C, A, T> {
    fn from(function: Function<C, A, T>) -> Self {
        Self::unbound(function)
    }
}

impl<C, A, T> From<(C, Function<C, A, T>)> for Target<C, A, T> {
    fn from((context, function): (C, Function<C, A, T>)) -> Self {
        Self::bound(context, function)
    }
}

/// One entry of the flat argument list accepted by [`call`].
pub enum Trailing<A, T> {
    Arg(A),
    Callback(Callback<T>),
}

impl<A, T> Trailing<A, T> {
    pub fn callback(f: impl Fn(Result<T, Failure>) + Send + Sync + 'static) -> Self {
        Trailing::Callback(Arc::new(f))
    }

    fn into_callback(self) -> Option<Callback<T>> {
        match self {
            Trailing::Callback(callback) => Some(callback),
            Trailing::Arg(_) => None,
        }
    }
}

impl<T: Send + 'static> Shifting<T> {
    /// Invoke `target` with `args` and deliver its outcome through this
    /// adapter.
    ///
    /// Fails with [`ShiftError::UnknownConvention`] before anything runs if
    /// the declared parameter count fits neither convention.
    pub fn apply<C: 'static, A: 'static>(
        &self,
        target: impl Into<Target<C, A, T>>,
        args: impl IntoIterator<Item = A>,
    ) -> Result<Delivered<T>, ShiftError> {
        let Target { context, function } = target.into();
        let args: Vec<A> = args.into_iter().collect();
        let convention =
            Convention::resolve(function.arity, args.len(), function.body.convention())?;
        tracing::trace!(
            ?convention,
            arity = function.arity,
            supplied = args.len(),
            "Applying function"
        );

        let source = match function.body {
            Body::Returning(body) => {
                Source::Immediate(Box::new(move || body(context.as_ref(), args)))
            }
            Body::Callback(body) => Source::Callback(Box::new(move |continuation| {
                body(context.as_ref(), args, continuation);
            })),
        };
        self.from(source)
    }
}

/// Apply `target` to `args`; results go to `callback` if given, otherwise to
/// the returned eventual.
pub fn apply<C, A, T>(
    target: impl Into<Target<C, A, T>>,
    args: impl IntoIterator<Item = A>,
    callback: Option<Callback<T>>,
) -> Result<Delivered<T>, ShiftError>
where
    C: 'static,
    A: 'static,
    T: Send + 'static,
{
    Shifting::new(callback).apply(target, args)
}

/// Flat-argument form of [`apply`]: a trailing [`Trailing::Callback`] is
/// popped and used as the callback.
pub fn call<C, A, T>(
    target: impl Into<Target<C, A, T>>,
    trailing: impl IntoIterator<Item = Trailing<A, T>>,
) -> Result<Delivered<T>, ShiftError>
where
    C: 'static,
    A: 'static,
    T: Send + 'static,
{
    let mut trailing: Vec<Trailing<A, T>> = trailing.into_iter().collect();
    let callback = if matches!(trailing.last(), Some(Trailing::Callback(_))) {
        trailing.pop().and_then(Trailing::into_callback)
    } else {
        None
    };

    let args = trailing
        .into_iter()
        .enumerate()
        .map(|(position, entry)| match entry {
            Trailing::Arg(arg) => Ok(arg),
            Trailing::Callback(_) => Err(ShiftError::MisplacedCallback { position }),
        })
        .collect::<Result<Vec<A>, ShiftError>>()?;

    apply(target, args, callback)
}
