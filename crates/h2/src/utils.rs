//! Utility macros shared by the stream and codec modules.

/// Returns early with an error if a condition does not hold.
///
/// Works like `assert!`, but yields `Err($error)` instead of panicking. The error
/// expression is only evaluated when the predicate is false, so it may log.
///
/// # Example
///
/// ```ignore
/// ensure!(self.work.is_none(), self.violation("pseudo header after request start"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
