//! Calling convention inference from a declared parameter count.

use crate::ShiftError;

/// How a function delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    /// Returns its result (or an eventual result) directly.
    Returning,
    /// Takes a trailing `(error, value)` continuation and settles it.
    CallbackStyle,
}

impl Convention {
    /// Decide the convention for a call supplying `supplied` arguments to a
    /// function declaring `declared` parameters.
    ///
    /// `declared == supplied` selects [`Convention::Returning`];
    /// `declared == supplied + 1` selects [`Convention::CallbackStyle`].
    /// The caller's own body kind must agree with the count, otherwise the
    /// convention is undeterminable.
    pub fn resolve(
        declared: usize,
        supplied: usize,
        body: Convention,
    ) -> Result<Convention, ShiftError> {
        let inferred = if declared == supplied {
            Some(Convention::Returning)
        } else if supplied.checked_add(1) == Some(declared) {
            Some(Convention::CallbackStyle)
        } else {
            None
        };

        match inferred {
            Some(convention) if convention == body => Ok(convention),
            _ => Err(ShiftError::UnknownConvention { declared, supplied }),
        }
    }
}
