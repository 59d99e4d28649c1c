#![doc = include_str!("../../README.md")]
#![no_std]

#[macro_use]
mod macros;

pub mod hooks;
pub mod menu;
pub mod split;
pub mod state;
#[cfg(feature = "storage")]
pub mod storage;

pub use seam_types as types;

/// The mutex flavor used for cross-task channels. Critical-section based, so
/// the same code runs on single-core targets and under `std` tests.
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub use split::central::{CentralSync, run_split_central};
pub use split::peripheral::SplitPeripheral;
pub use state::{LinkState, SharedState};
