//! Compute core: the arithmetic engine and the GATT-facing service state.
//!
//! Everything in here is hardware-independent and runs in host unit tests;
//! the BLE task binds it to the stack through the [`service::AttributeBackend`]
//! trait.

pub mod engine;
pub mod service;

pub use service::{AttributeHandles, ComputeService};
