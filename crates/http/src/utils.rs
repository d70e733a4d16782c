//! Utility macros used internally by the HTTP crate.

/// Returns early with `$error` if `$predicate` is false.
///
/// This is similar to `assert!`, but returns an error instead of panicking.
///
/// ```ignore
/// ensure!(headers.len() < MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
