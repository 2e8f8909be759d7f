//! Exit codes for CLI operations
//!
//! A failing renderer is not listed here: its own exit status is returned.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - unparseable manifest stream or drop-set file
pub const INPUT_ERROR: i32 = 2;

/// Template error - a manifest cannot be rewritten, or the result is not valid Jinja
pub const TEMPLATE_ERROR: i32 = 3;

/// IO error - file not found, permission denied, renderer missing
pub const IO_ERROR: i32 = 5;
