//! Process exit codes.

/// Every requested cycle produced a bundle.
pub const OK: i32 = 0;
/// A cycle, the configuration, or the client setup failed.
pub const FAILURE: i32 = 1;
