//! Bluetooth Low Energy module
//!
//! Exposes the compute unit as a GATT peripheral: one service with operand,
//! operator and result characteristics.

pub mod service;

pub use service::ComputeUnitService;
