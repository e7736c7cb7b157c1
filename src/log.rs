//! Diagnostic logging, contingent on the hidden `__log` feature
//!
//! Logging is best effort and strictly for bring-up. Only enable `__log`
//! when debugging, and when you're certain that your logger isn't itself
//! routed over the USB link this crate is bridging.

macro_rules! debug {
    ($($args:tt)*) => {
        #[cfg(feature = "__log")]
        ::__log::debug!($($args)*)
    };
}

macro_rules! warn {
    ($($args:tt)*) => {
        #[cfg(feature = "__log")]
        ::__log::warn!($($args)*)
    };
}
