//! Menu management codes.

use crate::Code;

/// 400: A menu with the same code or label already exists.
pub const MENU_ALREADY_EXIST: Code = Code(100101);

/// 404: Menu not found.
pub const MENU_NOT_FOUND:     Code = Code(100102);
