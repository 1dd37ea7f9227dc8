//! Built-in code table.
//!
//! # Code Ranges
//!
//! | Range             | Module                        |
//! |-------------------|-------------------------------|
//! | `100001 - 100099` | base: success, generic errors |
//! | `100101 - 100199` | menu management               |
//!
//! `bootstrap` registers every constant here with its HTTP status and
//! user-safe message.
//!
//! ```rust
//! use orca_error::{codes, Registry};
//!
//! let registry = Registry::new();
//! codes::bootstrap(&registry).expect("code table is consistent");
//! assert_eq!(registry.lookup(codes::SUCCESS).unwrap().http_status(), 200);
//! ```

mod base;
mod menu;
mod register;

pub use base::*;
pub use menu::*;
pub use register::bootstrap;
