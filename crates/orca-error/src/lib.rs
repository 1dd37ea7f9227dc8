//! # orca-error
//!
//! Structured errors for HTTP services: every error can carry a stable
//! numeric [`Code`], the call site that built it, and the low-level cause it
//! wraps. The boundary resolves the outermost code through a [`Registry`] to
//! get an HTTP status and a user-safe message, while the full chain goes to
//! the log.
//!
//! ## Design
//!
//! An [`Error`] node is one of four closed representations:
//!
//! - **Fundamental**: message + stack. Chain root.
//! - **StackOnly**: cause + stack.
//! - **Messaged**: cause + message.
//! - **Coded**: code + diagnostic message + stack, optional cause.
//!
//! Nodes are immutable and own their cause. Wrapping a coded chain keeps its
//! code unless the wrap explicitly sets a new one.
//!
//! Stacks are raw program counters until something formats them; symbol
//! lookups are memoized per counter (see [`stack`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use orca_error::{codes, with_code, Error, OrcaResult, Registry, ResultExt};
//!
//! fn find_menu(id: u32) -> OrcaResult<String> {
//!     Err(with_code!(codes::MENU_NOT_FOUND, "menu {} not in table", id))
//! }
//!
//! fn handler() -> OrcaResult<String> {
//!     find_menu(7).wrap("GET /menus/7")
//! }
//!
//! let registry = Registry::new();
//! codes::bootstrap(&registry).unwrap();
//!
//! let err = handler().unwrap_err();
//! let coder = registry.coder_for(&err);
//! assert_eq!(coder.http_status(), 404);
//! assert_eq!(coder.message(), "Menu not found");
//!
//! // Brief: internal diagnostic of the outermost node.
//! assert_eq!(err.to_string(), "GET /menus/7");
//! // With the registry: what a client may see.
//! assert_eq!(err.display_with(&registry).to_string(), "Menu not found");
//! ```
//!
//! ## Format Flags
//!
//! | Flag    | Output |
//! |---------|--------|
//! | `{}`    | message of the outermost node |
//! | `{:-}`  | outermost node with caller and code |
//! | `{:+}`  | whole chain with callers and codes |
//! | `{:#}`  | JSON, message only |
//! | `{:-#}` | JSON, outermost node, all fields |
//! | `{:+#}` | JSON, whole chain, all fields |

#[macro_use]
mod macros;
mod code;
mod convert;
mod error;
mod registry;

pub mod chain;
pub mod codes;
pub mod format;
pub mod stack;

// ── Public API ────────────────────────────────────────────────────

pub use code::{is_allowed_status, Code, Coder, DefaultCoder, ALLOWED_HTTP_STATUS};
pub use convert::ResultExt;
pub use error::{BoxError, Error, Kind};
pub use format::{FormatOptions, Record};
pub use registry::{Registry, RegistryError};
pub use stack::{Frame, StackTrace};

/// Convenience Result alias.
pub type OrcaResult<T> = Result<T, Error>;
