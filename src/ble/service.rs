//! Compute unit GATT service definition
//!
//! Wire layout is fixed for interoperability with existing centrals:
//! - Service UUID: 0xAA00
//! - Operand A:    0xAA0F (read, write) - little-endian f32
//! - Operand B:    0xAA1F (read, write) - little-endian f32
//! - Operator:     0xAA2F (write)       - single ASCII byte
//! - Result:       0xAA3F (read, notify) - little-endian f32

use trouble_host::prelude::*;

/// 16-bit service UUID, also advertised in the complete UUID list.
/// Must match the `gatt_service` attribute below.
pub const SERVICE_UUID: u16 = 0xAA00;

/// Compute unit service
///
/// A central writes the two operands and the operator; the result is
/// recomputed on every accepted write and pushed via notification. Operands
/// and operator echo accepted values so reads reflect the last write.
#[gatt_service(uuid = "0xAA00")]
pub struct ComputeUnitService {
    /// Operand A - left-hand side of the selected operation
    #[characteristic(uuid = "0xAA0F", read, write, value = 0.0)]
    pub operand_a: f32,

    /// Operand B - right-hand side of the selected operation
    #[characteristic(uuid = "0xAA1F", read, write, value = 0.0)]
    pub operand_b: f32,

    /// Operator code: one of `+ - * / ^ #`, anything else is invalid
    #[characteristic(uuid = "0xAA2F", write, value = b'+')]
    pub operator: u8,

    /// Computed result - never peer-writable
    #[characteristic(uuid = "0xAA3F", read, notify, value = 0.0)]
    pub result: f32,
}
