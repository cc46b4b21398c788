//! Embassy tasks module
//!
//! Contains the async tasks for the firmware: the BLE host and the
//! heartbeat LED.

pub mod ble;
pub mod led;

pub use ble::ble_task;
pub use led::heartbeat_task;
