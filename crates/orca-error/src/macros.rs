/// Build a fundamental [`Error`](crate::Error) from format arguments.
///
/// ```
/// let table = "menus";
/// let err = orca_error::errorf!("table `{}` is locked", table);
/// assert_eq!(err.to_string(), "table `menus` is locked");
/// ```
#[macro_export]
macro_rules! errorf {
    ($($arg:tt)+) => {
        $crate::Error::new(::std::format!($($arg)+))
    };
}

/// Build a coded [`Error`](crate::Error) with a formatted diagnostic.
///
/// ```
/// use orca_error::{codes, with_code};
///
/// let err = with_code!(codes::MENU_NOT_FOUND, "menu `{}` missing", "users");
/// assert_eq!(err.code(), Some(codes::MENU_NOT_FOUND));
/// ```
#[macro_export]
macro_rules! with_code {
    ($code:expr, $($arg:tt)+) => {
        $crate::Error::with_code($code, ::std::format!($($arg)+))
    };
}

/// Wrap an error under a new code with a formatted diagnostic.
///
/// ```ignore
/// let rows = db.query(sql).map_err(|e| wrap_code!(e, codes::DATABASE, "listing {}", table))?;
/// ```
#[macro_export]
macro_rules! wrap_code {
    ($err:expr, $code:expr, $($arg:tt)+) => {
        $crate::Error::wrap_with_code($err, $code, ::std::format!($($arg)+))
    };
}

/// Early-return a coded error if a condition is false.
///
/// The error is converted with `Into`, so any error type with
/// `From<orca_error::Error>` works as the function's error type.
///
/// ```ignore
/// ensure!(!req.label.is_empty(), codes::VALIDATION, "label must not be empty");
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $code:expr, $($arg:tt)+) => {
        if !$cond {
            return ::std::result::Result::Err($crate::with_code!($code, $($arg)+).into());
        }
    };
}
