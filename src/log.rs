//! Conditional logging.
//!
//! With the `tracing` feature enabled this re-exports the `tracing`
//! macro; without it, the macro expands to nothing so the compiler drops
//! the format arguments entirely.

#[cfg(feature = "tracing")]
pub use tracing::debug;

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::debug;
