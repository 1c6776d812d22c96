#![forbid(unsafe_code)]

//! Logging shims.
//!
//! With the `tracing` feature these re-export the `tracing` macros. Without
//! it they expand to nothing, so call sites never need their own `cfg`.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {debug, trace};

/// Label shown in `Debug` output and log events for atoms created without one.
pub(crate) const ANON_LABEL: &str = "<anon>";
