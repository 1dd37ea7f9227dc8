use crate::error::BoxError;
use crate::stack::StackTrace;
use crate::{Code, Error, OrcaResult};

// ── ResultExt: wrapping on Results ────────────────────────────────

/// Wrap the error side of any `Result` while it propagates.
///
/// `Ok` passes through untouched, so the absent-error law holds for free.
/// Stacks point at the line calling the extension method.
///
/// ```
/// use orca_error::{codes, ResultExt};
///
/// fn read_config() -> orca_error::OrcaResult<String> {
///     std::fs::read_to_string("/definitely/not/here.toml")
///         .wrap_with_code(codes::INTERNAL_SERVER, "reading config")
/// }
///
/// let err = read_config().unwrap_err();
/// assert_eq!(err.code(), Some(codes::INTERNAL_SERVER));
/// ```
pub trait ResultExt<T> {
    /// See [`Error::wrap`].
    fn wrap<M: Into<String>>(self, msg: M) -> OrcaResult<T>;

    /// See [`Error::wrap_with_code`].
    fn wrap_with_code<M: Into<String>>(self, code: Code, msg: M) -> OrcaResult<T>;

    /// See [`Error::with_message`].
    fn with_message<M: Into<String>>(self, msg: M) -> OrcaResult<T>;

    /// See [`Error::with_stack`].
    fn with_stack(self) -> OrcaResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    #[inline(never)]
    fn wrap<M: Into<String>>(self, msg: M) -> OrcaResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(Error::wrap_at(e.into(), msg.into(), StackTrace::capture(1))),
        }
    }

    #[inline(never)]
    fn wrap_with_code<M: Into<String>>(self, code: Code, msg: M) -> OrcaResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(Error::coded_at(
                code,
                msg.into(),
                Some(e.into()),
                StackTrace::capture(1),
            )),
        }
    }

    fn with_message<M: Into<String>>(self, msg: M) -> OrcaResult<T> {
        self.map_err(|e| Error::messaged(e.into(), msg.into()))
    }

    #[inline(never)]
    fn with_stack(self) -> OrcaResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(Error::with_stack_at(e.into(), StackTrace::capture(1))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chain, codes, Kind};

    fn parse_port(s: &str) -> OrcaResult<u16> {
        s.parse::<u16>().wrap_with_code(codes::BIND, format!("port `{}`", s))
    }

    #[test]
    fn ok_passes_through() {
        assert_eq!(parse_port("8080").unwrap(), 8080);
        let r: Result<u8, std::io::Error> = Ok(1);
        assert_eq!(r.wrap("never").unwrap(), 1);
    }

    #[test]
    fn err_gets_code() {
        let e = parse_port("http").unwrap_err();
        assert_eq!(e.code(), Some(codes::BIND));
        assert_eq!(e.message(), Some("port `http`"));
        assert!(chain::find::<std::num::ParseIntError>(&e).is_some());
    }

    #[test]
    fn wrap_on_result_keeps_inner_code() {
        let r: OrcaResult<()> = Err(Error::with_code(codes::DATABASE, "deadlock"));
        let e = r.wrap("saving menu").unwrap_err();
        assert_eq!(e.code(), Some(codes::DATABASE));
        assert_eq!(e.message(), Some("saving menu"));
    }

    #[test]
    fn with_message_and_with_stack() {
        let r: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "eof"));
        let e = r.with_message("reading body").unwrap_err();
        assert_eq!(e.kind(), Kind::Messaged);

        let r: OrcaResult<()> = Err(e);
        let e = r.with_stack().unwrap_err();
        assert_eq!(e.kind(), Kind::StackOnly);
        assert_eq!(e.to_string(), "reading body");
    }
}
