//! Logging macros dispatching to `defmt` or `log` depending on the enabled
//! feature, compiled out entirely when neither is selected.

#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);
        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::trace!($($arg)*);
        #[cfg(all(not(feature = "defmt"), not(feature = "log")))]
        let _ = ($($arg)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);
        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::debug!($($arg)*);
        #[cfg(all(not(feature = "defmt"), not(feature = "log")))]
        let _ = ($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);
        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::info!($($arg)*);
        #[cfg(all(not(feature = "defmt"), not(feature = "log")))]
        let _ = ($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);
        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::warn!($($arg)*);
        #[cfg(all(not(feature = "defmt"), not(feature = "log")))]
        let _ = ($($arg)*);
    }};
}

macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);
        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::error!($($arg)*);
        #[cfg(all(not(feature = "defmt"), not(feature = "log")))]
        let _ = ($($arg)*);
    }};
}
