#![forbid(unsafe_code)]

//! Logging shims for the value layer.
//!
//! With the `tracing` feature the `trace!`/`debug!` macros are re-exported
//! from `tracing`. Without it they expand to nothing, so call sites in this
//! crate never need their own `cfg` guards.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }
}
