//! Common codes shared by every module.

use crate::Code;

/// 200: OK.
pub const SUCCESS:         Code = Code(100001);

/// 500: Internal server error. Also the fallback for unknown codes.
pub const INTERNAL_SERVER: Code = Code(100002);

/// 500: Database error.
pub const DATABASE:        Code = Code(100003);

/// 400: Bad request.
pub const BAD_REQUEST:     Code = Code(100004);

/// 404: Page not found.
pub const PAGE_NOT_FOUND:  Code = Code(100005);

/// 400: Validation failed.
pub const VALIDATION:      Code = Code(100006);

/// 400: Invalid request parameters.
pub const BIND:            Code = Code(100007);
