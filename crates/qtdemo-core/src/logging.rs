#![forbid(unsafe_code)]

//! Logging facade.
//!
//! With the `tracing` feature, `trace!`, `debug!`, `info!` and `warn!` are the
//! `tracing` macros. Without it they expand to nothing, so scheduler code can
//! log unconditionally through `crate::debug!` and friends.

#[cfg(feature = "tracing")]
pub use tracing::{debug, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Discards its arguments.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}
