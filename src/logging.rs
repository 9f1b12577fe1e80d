//! Logging shim
//!
//! Parsing and dispatch emit a handful of diagnostic events. They are routed
//! to the `log` crate (default feature) or to `tracing` (feature `tracing`),
//! always under the `deeplink` target so hosts can filter them in one place.
//!
//! With both features disabled the arguments are still type-checked but
//! nothing is emitted.
//!
//! ```ignore
//! debug_log!("dispatching {} to fallback", uri);
//! ```

/// Forwards one event at `$level` to every enabled backend.
#[doc(hidden)]
#[macro_export]
macro_rules! __deeplink_event {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::$level!(target: "deeplink", $($arg)*);
        #[cfg(feature = "log")]
        ::log::$level!(target: "deeplink", $($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Trace-level logging
///
/// Per-candidate match decisions.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        $crate::__deeplink_event!(trace, $($arg)*)
    };
}

/// Debug-level logging
///
/// Parse failures and dispatch outcomes.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::__deeplink_event!(debug, $($arg)*)
    };
}

/// Warn-level logging
///
/// Misconfiguration detected while building a parser.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::__deeplink_event!(warn, $($arg)*)
    };
}
