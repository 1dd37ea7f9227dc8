use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use crate::chain;
use crate::format::{self, FormatOptions};
use crate::stack::StackTrace;
use crate::Code;

/// Owned cause of an error node.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A node of an error chain.
///
/// Four closed representations, one external API:
///
/// - **Fundamental**: message + stack, no cause. The usual chain root.
/// - **StackOnly**: wraps a cause and records where it passed through.
/// - **Messaged**: wraps a cause with an annotation. No stack.
/// - **Coded**: carries a [`Code`], an internal diagnostic message, a stack
///   and optionally a cause.
///
/// Nodes are immutable. Every wrapping operation builds a new node that owns
/// its cause, so a chain is a singly-linked list from the outermost wrap to
/// the original error.
///
/// Errors from outside this crate can sit at the bottom of a chain. They are
/// opaque: no code, no stack, no further cause.
pub struct Error {
    repr: Repr,
}

enum Repr {
    Fundamental {
        msg: String,
        stack: StackTrace,
    },
    StackOnly {
        cause: BoxError,
        stack: StackTrace,
    },
    Messaged {
        cause: BoxError,
        msg: String,
    },
    Coded {
        code: Code,
        msg: String,
        cause: Option<BoxError>,
        stack: StackTrace,
    },
}

/// Which representation a node uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Fundamental,
    StackOnly,
    Messaged,
    Coded,
}

// ── Constructors ──────────────────────────────────────────────────
//
// Each public constructor captures with `skip = 1` so that frame 0 is the
// code that called it. They must not be inlined for that to hold.

impl Error {
    /// New chain root with a message and the caller's stack.
    ///
    /// ```
    /// let err = orca_error::Error::new("config file missing");
    /// assert_eq!(err.to_string(), "config file missing");
    /// ```
    #[inline(never)]
    pub fn new(msg: impl Into<String>) -> Self {
        Self::fundamental_at(msg.into(), StackTrace::capture(1))
    }

    /// New chain root carrying `code`.
    ///
    /// `msg` is the internal diagnostic; clients see the registered message.
    #[inline(never)]
    pub fn with_code(code: Code, msg: impl Into<String>) -> Self {
        Self::coded_at(code, msg.into(), None, StackTrace::capture(1))
    }

    /// Annotate `cause` with a message and a fresh stack.
    ///
    /// If `cause`'s chain already holds a code, the new node keeps that code
    /// with `msg` as its diagnostic, so the code survives the wrap.
    #[inline(never)]
    pub fn wrap(cause: impl Into<BoxError>, msg: impl Into<String>) -> Self {
        Self::wrap_at(cause.into(), msg.into(), StackTrace::capture(1))
    }

    /// Attach `code` on top of `cause`, overriding any code it carries.
    #[inline(never)]
    pub fn wrap_with_code(cause: impl Into<BoxError>, code: Code, msg: impl Into<String>) -> Self {
        Self::coded_at(code, msg.into(), Some(cause.into()), StackTrace::capture(1))
    }

    /// Annotate `cause` without recording a stack or touching its code.
    pub fn with_message(cause: impl Into<BoxError>, msg: impl Into<String>) -> Self {
        Self::messaged(cause.into(), msg.into())
    }

    /// Record a fresh stack on top of `cause`.
    ///
    /// A coded chain stays coded: the new node repeats the first coded
    /// node's code and diagnostic.
    #[inline(never)]
    pub fn with_stack(cause: impl Into<BoxError>) -> Self {
        Self::with_stack_at(cause.into(), StackTrace::capture(1))
    }

    pub(crate) fn fundamental_at(msg: String, stack: StackTrace) -> Self {
        Self {
            repr: Repr::Fundamental { msg, stack },
        }
    }

    pub(crate) fn coded_at(
        code: Code,
        msg: String,
        cause: Option<BoxError>,
        stack: StackTrace,
    ) -> Self {
        Self {
            repr: Repr::Coded {
                code,
                msg,
                cause,
                stack,
            },
        }
    }

    pub(crate) fn messaged(cause: BoxError, msg: String) -> Self {
        Self {
            repr: Repr::Messaged { cause, msg },
        }
    }

    pub(crate) fn wrap_at(cause: BoxError, msg: String, stack: StackTrace) -> Self {
        if let Some(code) = chain::first_code(&*cause) {
            return Self::coded_at(code, msg, Some(cause), stack);
        }
        let annotated: BoxError = Box::new(Self::messaged(cause, msg));
        Self {
            repr: Repr::StackOnly {
                cause: annotated,
                stack,
            },
        }
    }

    pub(crate) fn with_stack_at(cause: BoxError, stack: StackTrace) -> Self {
        let inherited = chain::find_coded(&*cause)
            .and_then(|e| Some((e.code()?, e.message()?.to_string())));
        match inherited {
            Some((code, msg)) => Self::coded_at(code, msg, Some(cause), stack),
            None => Self {
                repr: Repr::StackOnly { cause, stack },
            },
        }
    }
}

// ── Accessors ─────────────────────────────────────────────────────

impl Error {
    #[inline]
    pub fn kind(&self) -> Kind {
        match &self.repr {
            Repr::Fundamental { .. } => Kind::Fundamental,
            Repr::StackOnly { .. } => Kind::StackOnly,
            Repr::Messaged { .. } => Kind::Messaged,
            Repr::Coded { .. } => Kind::Coded,
        }
    }

    /// The code carried by this node. Only coded nodes have one; use
    /// [`chain::first_code`] to search the whole chain.
    #[inline]
    pub fn code(&self) -> Option<Code> {
        match &self.repr {
            Repr::Coded { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The message stored on this node, if it has one of its own.
    pub fn message(&self) -> Option<&str> {
        match &self.repr {
            Repr::Fundamental { msg, .. }
            | Repr::Messaged { msg, .. }
            | Repr::Coded { msg, .. } => Some(msg),
            Repr::StackOnly { .. } => None,
        }
    }

    /// The stack recorded when this node was built.
    pub fn stack(&self) -> Option<&StackTrace> {
        match &self.repr {
            Repr::Fundamental { stack, .. }
            | Repr::StackOnly { stack, .. }
            | Repr::Coded { stack, .. } => Some(stack),
            Repr::Messaged { .. } => None,
        }
    }

    /// The cause this node directly owns.
    ///
    /// Unlike [`StdError::source`] this never skips a node.
    pub fn direct_cause(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.repr {
            Repr::Fundamental { .. } => None,
            Repr::StackOnly { cause, .. } | Repr::Messaged { cause, .. } => Some(&**cause),
            Repr::Coded { cause, .. } => cause.as_deref().map(|c| c as &(dyn StdError + 'static)),
        }
    }

    /// The next node in the chain.
    ///
    /// A stack-only node passes straight through a non-fundamental node of
    /// ours that it wraps, so `Error::wrap` (which builds a stack node over a
    /// message node) counts as a single step.
    pub fn unwrap_next(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.repr {
            Repr::StackOnly { cause, .. } => {
                let inner: &(dyn StdError + 'static) = &**cause;
                match inner.downcast_ref::<Error>() {
                    Some(e) if e.kind() != Kind::Fundamental => e.unwrap_next(),
                    _ => Some(inner),
                }
            }
            _ => self.direct_cause(),
        }
    }

    /// Innermost error reached through direct causes.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        chain::cause(self)
    }

    /// Text for this node alone: its own message, or the cause's text for a
    /// stack-only node.
    pub(crate) fn diagnostic(&self) -> Cow<'_, str> {
        match &self.repr {
            Repr::Fundamental { msg, .. }
            | Repr::Messaged { msg, .. }
            | Repr::Coded { msg, .. } => Cow::Borrowed(msg),
            Repr::StackOnly { cause, .. } => Cow::Owned(cause.to_string()),
        }
    }

    /// Display adapter that resolves codes through `registry`.
    ///
    /// ```
    /// use orca_error::{codes, Error, Registry};
    ///
    /// let registry = Registry::new();
    /// codes::bootstrap(&registry).unwrap();
    ///
    /// let err = Error::with_code(codes::MENU_NOT_FOUND, "menu `users` missing");
    /// assert_eq!(err.to_string(), "menu `users` missing");
    /// assert_eq!(err.display_with(&registry).to_string(), "Menu not found");
    /// ```
    pub fn display_with<'a>(&'a self, registry: &'a crate::Registry) -> format::WithRegistry<'a> {
        format::WithRegistry::new(self, registry)
    }
}

// ── std::error::Error ─────────────────────────────────────────────

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.unwrap_next()
    }
}

// ── Display ───────────────────────────────────────────────────────

/// Flags select the rendering:
///
/// | Flag     | Output                                        |
/// |----------|-----------------------------------------------|
/// | `{}`     | message of the outermost node                 |
/// | `{:-}`   | outermost node with caller and code           |
/// | `{:+}`   | every node with caller and code, `"; \n"`-joined |
/// | `{:#}`   | JSON records, message only                    |
/// | `{:-#}`  | JSON record of the outermost node, all fields |
/// | `{:+#}`  | JSON records of every node, all fields        |
///
/// Without a registry, codes print as stored and messages are the internal
/// diagnostics. Use [`Error::display_with`] for client-safe text.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opts = FormatOptions::from_formatter(f);
        f.write_str(&format::render(self, None, opts))
    }
}

// ── Debug ─────────────────────────────────────────────────────────

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Fundamental { msg, stack } => f
                .debug_struct("Error::Fundamental")
                .field("msg", msg)
                .field("stack", stack)
                .finish(),
            Repr::StackOnly { cause, stack } => f
                .debug_struct("Error::StackOnly")
                .field("cause", cause)
                .field("stack", stack)
                .finish(),
            Repr::Messaged { cause, msg } => f
                .debug_struct("Error::Messaged")
                .field("msg", msg)
                .field("cause", cause)
                .finish(),
            Repr::Coded { code, msg, cause, stack } => f
                .debug_struct("Error::Coded")
                .field("code", code)
                .field("msg", msg)
                .field("cause", cause)
                .field("stack", stack)
                .finish(),
        }
    }
}
