//! Logging shims.
//!
//! On target the `defmt` feature routes everything through `defmt`; host builds
//! and tests go through the `log` facade. Format strings must stay within the
//! subset both accept (`{}` / `{:?}` with integer and string arguments).
#![allow(unused_macros)]

macro_rules! trace {
  ($($arg:tt)*) => {{
    #[cfg(feature = "defmt")]
    ::defmt::trace!($($arg)*);
    #[cfg(not(feature = "defmt"))]
    ::log::trace!($($arg)*);
  }};
}

macro_rules! debug {
  ($($arg:tt)*) => {{
    #[cfg(feature = "defmt")]
    ::defmt::debug!($($arg)*);
    #[cfg(not(feature = "defmt"))]
    ::log::debug!($($arg)*);
  }};
}

macro_rules! info {
  ($($arg:tt)*) => {{
    #[cfg(feature = "defmt")]
    ::defmt::info!($($arg)*);
    #[cfg(not(feature = "defmt"))]
    ::log::info!($($arg)*);
  }};
}

macro_rules! warn {
  ($($arg:tt)*) => {{
    #[cfg(feature = "defmt")]
    ::defmt::warn!($($arg)*);
    #[cfg(not(feature = "defmt"))]
    ::log::warn!($($arg)*);
  }};
}
