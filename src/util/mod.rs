//! Utility functions and helpers

pub mod attempt;
pub mod lazy;
pub mod truncate;

pub use attempt::{attempt, attempt_named};
pub use lazy::{LazyValue, Locked, Strategy, Unlocked};
pub use truncate::{truncate_default, truncate_to_byte_limit, DEFAULT_BYTE_LIMIT};
