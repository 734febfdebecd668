//! Dual-convention async adapter.
//!
//! Work comes in one of three shapes and leaves in whichever convention the
//! caller picked:
//!
//! ```text
//! Source::{Immediate, Callback, Eventual}
//!         |
//!         v  normalize (source.rs)
//!     Eventual<T>
//!         |
//!         v  deliver (delivery.rs)
//! Delivered::Eventual(..)  or  callback(result) on a later tick
//! ```
//!
//! [`apply`] and [`call`] sit on top: they pick a function's convention from
//! its declared parameter count and feed the result through the same path.

mod delivery;
mod eventual;
mod invoke;
mod source;

pub use delivery::{Callback, Delivered, Shifting, shifting};
pub use eventual::{Continuation, Eventual, Failure};
pub use invoke::{Function, Target, Trailing, apply, call};
pub use source::{CallbackFn, ImmediateFn, Outcome, Source};

pub use shift_types::{
    ConfigError, Convention, Deferral, ShiftConfig, ShiftError, SourceFault, UnobservedLevel,
};
