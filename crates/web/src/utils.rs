/// Returns early with `$error` when `$predicate` does not hold.
///
/// ```ignore
/// ensure!(!name.is_empty(), RouteError::empty_placeholder(&template, position));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
