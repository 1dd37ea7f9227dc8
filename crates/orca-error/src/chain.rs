//! Chain traversal.
//!
//! Two walks exist over the same list of nodes:
//!
//! - **unwrap** ([`unwrap`], [`chain`], [`StdError::source`]): one step per
//!   logical wrap. A stack node built by [`Error::wrap`] and the annotation
//!   under it count as one step.
//! - **cause** ([`cause`]): follows direct causes all the way down and
//!   returns the innermost error.
//!
//! Both stop at the first error that is not one of ours.

use std::error::Error as StdError;

use crate::error::BoxError;
use crate::stack::StackTrace;
use crate::{Code, Error, Kind};

/// Next node of `err`'s chain, or `None` at a root or a foreign error.
#[inline]
pub fn unwrap<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    err.downcast_ref::<Error>().and_then(Error::unwrap_next)
}

/// Iterator over `err` and every node reachable through [`unwrap`],
/// outermost first.
pub fn chain<'a>(err: &'a (dyn StdError + 'static)) -> Chain<'a> {
    Chain { next: Some(err) }
}

#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = unwrap(cur);
        Some(cur)
    }
}

impl core::iter::FusedIterator for Chain<'_> {}

/// Number of nodes [`chain`] yields for `err`.
pub fn depth(err: &(dyn StdError + 'static)) -> usize {
    chain(err).count()
}

/// Innermost error reachable through direct causes.
///
/// Returns `err` itself when it has no cause or is not one of ours.
pub fn cause<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut cur = err;
    while let Some(next) = cur.downcast_ref::<Error>().and_then(Error::direct_cause) {
        cur = next;
    }
    cur
}

/// `true` if any node of `err`'s chain equals `target`.
pub fn is<T>(err: &(dyn StdError + 'static), target: &T) -> bool
where
    T: StdError + PartialEq + 'static,
{
    chain(err).any(|node| node.downcast_ref::<T>() == Some(target))
}

/// `true` if `target` is one of the nodes of `err`'s chain, by identity.
pub fn contains(err: &(dyn StdError + 'static), target: &(dyn StdError + 'static)) -> bool {
    let target = target as *const (dyn StdError + 'static);
    chain(err).any(|node| core::ptr::addr_eq(node as *const (dyn StdError + 'static), target))
}

/// First node of `err`'s chain whose concrete type is `T`.
pub fn find<'a, T>(err: &'a (dyn StdError + 'static)) -> Option<&'a T>
where
    T: StdError + 'static,
{
    chain(err).find_map(|node| node.downcast_ref::<T>())
}

/// First coded node of `err`'s chain.
pub fn find_coded<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a Error> {
    chain(err)
        .filter_map(|node| node.downcast_ref::<Error>())
        .find(|e| e.kind() == Kind::Coded)
}

/// Code of the outermost coded node.
pub fn first_code(err: &(dyn StdError + 'static)) -> Option<Code> {
    find_coded(err).and_then(Error::code)
}

/// `true` if any node of `err`'s chain carries `code`.
pub fn is_code(err: &(dyn StdError + 'static), code: Code) -> bool {
    chain(err)
        .filter_map(|node| node.downcast_ref::<Error>())
        .any(|e| e.code() == Some(code))
}

// ── Absent-error pass-through ─────────────────────────────────────
//
// Each of these returns `None` for `None` and otherwise builds the same node
// as the matching `Error` constructor.

/// [`Error::wrap`] over an optional error.
#[inline(never)]
pub fn wrap<E, M>(err: Option<E>, msg: M) -> Option<Error>
where
    E: Into<BoxError>,
    M: Into<String>,
{
    let err = err?;
    Some(Error::wrap_at(err.into(), msg.into(), StackTrace::capture(1)))
}

/// [`Error::wrap_with_code`] over an optional error.
#[inline(never)]
pub fn wrap_with_code<E, M>(err: Option<E>, code: Code, msg: M) -> Option<Error>
where
    E: Into<BoxError>,
    M: Into<String>,
{
    let err = err?;
    Some(Error::coded_at(code, msg.into(), Some(err.into()), StackTrace::capture(1)))
}

/// [`Error::with_message`] over an optional error.
pub fn with_message<E, M>(err: Option<E>, msg: M) -> Option<Error>
where
    E: Into<BoxError>,
    M: Into<String>,
{
    err.map(|e| Error::messaged(e.into(), msg.into()))
}

/// [`Error::with_stack`] over an optional error.
#[inline(never)]
pub fn with_stack<E>(err: Option<E>) -> Option<Error>
where
    E: Into<BoxError>,
{
    let err = err?;
    Some(Error::with_stack_at(err.into(), StackTrace::capture(1)))
}
