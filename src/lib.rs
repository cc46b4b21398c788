#![cfg_attr(not(test), no_std)]

pub mod compute;
pub mod config;

// These modules depend on embassy/async features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod tasks;
