//! Compute service: state binding and write dispatch
//!
//! Owns the `(A, B, operator, result)` tuple behind the four GATT
//! characteristics and reacts to characteristic writes: decode the payload,
//! echo the accepted value back onto its attribute, recompute through the
//! engine and publish the result.
//!
//! The stack is reached only through [`AttributeBackend`], so this module
//! stays hardware-independent and testable on the host. The single-threaded
//! dispatch model means exactly one `on_write` runs at a time; the tuple
//! needs no locking.

use core::future::Future;

use crate::compute::engine;

/// Default operator at construction
pub const DEFAULT_OPERATOR: u8 = b'+';

/// Operand payloads are raw little-endian 32-bit floats
pub const OPERAND_LEN: usize = 4;

/// Which operand characteristic a write targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    A,
    B,
}

/// GATT attribute handles for the four characteristics of the service
///
/// Captured once at server construction; `on_write` dispatches on these.
#[derive(Debug, Clone, Copy)]
pub struct AttributeHandles {
    pub operand_a: u16,
    pub operand_b: u16,
    pub operator: u16,
    pub result: u16,
}

/// Attribute table access for the compute service
///
/// Echoes are plain writes into the local attribute table so a subsequent
/// read returns the stored value; publishing the result also notifies any
/// subscribed peer. The BLE task implements this over the TrouBLE server,
/// tests use a mock.
pub trait AttributeBackend {
    /// Store an accepted operand value so later reads return it
    fn echo_operand(&mut self, operand: Operand, value: f32);

    /// Store the accepted operator byte
    fn echo_operator(&mut self, value: u8);

    /// Store a freshly computed result and notify any subscriber
    fn publish_result(&mut self, value: f32) -> impl Future<Output = ()>;
}

/// The compute state machine
///
/// One instance exists for the process lifetime; it is created by the BLE
/// task before advertising starts and survives across connections.
pub struct ComputeService {
    handles: AttributeHandles,
    operand_a: f32,
    operand_b: f32,
    operator: u8,
    result: f32,
}

impl ComputeService {
    /// Create the service with its defaults: operands and result zero,
    /// operator `+`.
    pub fn new(handles: AttributeHandles) -> Self {
        Self {
            handles,
            operand_a: 0.0,
            operand_b: 0.0,
            operator: DEFAULT_OPERATOR,
            result: 0.0,
        }
    }

    /// Handle a characteristic write from the peer.
    ///
    /// Dispatches on handle identity: operand and operator writes are
    /// decoded, stored and echoed; writes to unrelated handles are ignored.
    /// The result is recomputed and republished after every dispatch, even
    /// for unrelated handles - recomputation is idempotent and cheap.
    ///
    /// Nothing is raised to the caller: malformed payloads decode to zero
    /// and an unrecognised operator resets the result to zero with a logged
    /// diagnostic.
    pub async fn on_write<B: AttributeBackend>(&mut self, backend: &mut B, handle: u16, payload: &[u8]) {
        if handle == self.handles.operand_a {
            self.operand_a = decode_operand(payload);
            backend.echo_operand(Operand::A, self.operand_a);
            log::info!("Got input for A: {}", self.operand_a);
        } else if handle == self.handles.operand_b {
            self.operand_b = decode_operand(payload);
            backend.echo_operand(Operand::B, self.operand_b);
            log::info!("Got input for B: {}", self.operand_b);
        } else if handle == self.handles.operator {
            self.operator = decode_operator(payload);
            backend.echo_operator(self.operator);
            log::info!("Got operator: {:?}", self.operator as char);
        }

        self.result = match engine::evaluate(self.operand_a, self.operand_b, self.operator) {
            Ok(value) => value,
            Err(engine::InvalidOperator(byte)) => {
                log::warn!("Invalid operator byte 0x{:02x}, result reset to 0", byte);
                0.0
            }
        };
        backend.publish_result(self.result).await;
    }

    /// Attribute handles this service dispatches on
    pub fn handles(&self) -> &AttributeHandles {
        &self.handles
    }

    /// Current operand A
    pub fn operand_a(&self) -> f32 {
        self.operand_a
    }

    /// Current operand B
    pub fn operand_b(&self) -> f32 {
        self.operand_b
    }

    /// Current operator byte (may be outside the recognised set)
    pub fn operator(&self) -> u8 {
        self.operator
    }

    /// Last computed result
    pub fn result(&self) -> f32 {
        self.result
    }
}

/// Decode an operand payload as a little-endian 32-bit float.
///
/// Fails soft: payloads shorter than four bytes decode to zero. Extra bytes
/// beyond the first four are ignored.
fn decode_operand(payload: &[u8]) -> f32 {
    match payload.first_chunk::<OPERAND_LEN>() {
        Some(raw) => f32::from_le_bytes(*raw),
        None => 0.0,
    }
}

/// Decode an operator payload: the first byte. An empty payload decodes to
/// zero, which is the invalid-operator state.
fn decode_operator(payload: &[u8]) -> u8 {
    payload.first().copied().unwrap_or(0)
}

#[cfg(test)]
pub mod mock {
    //! Mock attribute backend for testing

    use super::*;
    use core::cell::RefCell;
    use heapless::Vec;

    /// A recorded echo write
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Echo {
        Operand(Operand, f32),
        Operator(u8),
    }

    /// Mock backend recording every echo and publish
    pub struct MockBackend {
        echoes: RefCell<Vec<Echo, 16>>,
        published: RefCell<Vec<f32, 16>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                echoes: RefCell::new(Vec::new()),
                published: RefCell::new(Vec::new()),
            }
        }

        /// All echo writes in order
        pub fn echoes(&self) -> Vec<Echo, 16> {
            self.echoes.borrow().clone()
        }

        /// All published result values in order
        pub fn published(&self) -> Vec<f32, 16> {
            self.published.borrow().clone()
        }

        /// The most recently published result
        pub fn last_published(&self) -> Option<f32> {
            self.published.borrow().last().copied()
        }
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AttributeBackend for MockBackend {
        fn echo_operand(&mut self, operand: Operand, value: f32) {
            let _ = self.echoes.borrow_mut().push(Echo::Operand(operand, value));
        }

        fn echo_operator(&mut self, value: u8) {
            let _ = self.echoes.borrow_mut().push(Echo::Operator(value));
        }

        async fn publish_result(&mut self, value: f32) {
            let _ = self.published.borrow_mut().push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Echo, MockBackend};
    use super::*;

    const HANDLES: AttributeHandles = AttributeHandles {
        operand_a: 0x0010,
        operand_b: 0x0012,
        operator: 0x0014,
        result: 0x0016,
    };

    fn service() -> ComputeService {
        ComputeService::new(HANDLES)
    }

    /// Drive a full operand/operand/operator write sequence
    async fn write_all(
        service: &mut ComputeService,
        backend: &mut MockBackend,
        a: f32,
        b: f32,
        operator: u8,
    ) {
        service.on_write(backend, HANDLES.operand_a, &a.to_le_bytes()).await;
        service.on_write(backend, HANDLES.operand_b, &b.to_le_bytes()).await;
        service.on_write(backend, HANDLES.operator, &[operator]).await;
    }

    #[test]
    fn test_defaults() {
        let service = service();
        assert_eq!(service.operand_a(), 0.0);
        assert_eq!(service.operand_b(), 0.0);
        assert_eq!(service.operator(), b'+');
        assert_eq!(service.result(), 0.0);
    }

    #[test]
    fn test_divide_scenario() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 6.0, 3.0, b'/').await;
        });

        assert_eq!(service.result(), 2.0);
        assert_eq!(backend.last_published(), Some(2.0));
        // One publish per write
        assert_eq!(backend.published().len(), 3);
    }

    #[test]
    fn test_divide_by_zero_scenario() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 2.0, 0.0, b'/').await;
        });

        assert_eq!(service.result(), 2.0);
        assert_eq!(backend.last_published(), Some(2.0));
    }

    #[test]
    fn test_root_scenario() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 2.0, 8.0, b'#').await;
        });

        // 8^(1/2)
        let result = backend.last_published().unwrap();
        assert!((result - 2.828_427_1).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_operator_resets_result() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 6.0, 3.0, b'*').await;
            assert_eq!(service.result(), 18.0);

            service.on_write(&mut backend, HANDLES.operator, &[b'z']).await;
        });

        // Operator state persists even when invalid, result resets to zero
        assert_eq!(service.operator(), b'z');
        assert_eq!(service.result(), 0.0);
        assert_eq!(backend.last_published(), Some(0.0));
    }

    #[test]
    fn test_echo_property() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            service
                .on_write(&mut backend, HANDLES.operand_a, &6.5f32.to_le_bytes())
                .await;
        });

        // The stored value is echoed back, exactly
        assert_eq!(backend.echoes().as_slice(), &[Echo::Operand(Operand::A, 6.5)]);
        assert_eq!(service.operand_a(), 6.5);
    }

    #[test]
    fn test_operator_echo() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            service.on_write(&mut backend, HANDLES.operator, &[b'-']).await;
        });

        assert_eq!(backend.echoes().as_slice(), &[Echo::Operator(b'-')]);
    }

    #[test]
    fn test_idempotence() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 9.0, 3.0, b'/').await;
            let first = service.result();
            write_all(&mut service, &mut backend, 9.0, 3.0, b'/').await;
            assert_eq!(service.result(), first);
        });

        assert_eq!(service.result(), 3.0);
    }

    #[test]
    fn test_unrelated_handle_republishes_without_echo() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 4.0, 2.0, b'+').await;
            service.on_write(&mut backend, 0x00FF, &[0xAB, 0xCD]).await;
        });

        // No echo for the foreign handle, state untouched, but the result
        // was recomputed and republished
        assert_eq!(backend.echoes().len(), 3);
        assert_eq!(backend.published().len(), 4);
        assert_eq!(service.result(), 6.0);
        assert_eq!(backend.last_published(), Some(6.0));
    }

    #[test]
    fn test_short_operand_payload_decodes_to_zero() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 5.0, 5.0, b'+').await;
            service.on_write(&mut backend, HANDLES.operand_b, &[0x01, 0x02]).await;
        });

        assert_eq!(service.operand_b(), 0.0);
        assert_eq!(service.result(), 5.0);
    }

    #[test]
    fn test_empty_operator_payload_is_invalid() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            write_all(&mut service, &mut backend, 5.0, 5.0, b'+').await;
            service.on_write(&mut backend, HANDLES.operator, &[]).await;
        });

        assert_eq!(service.operator(), 0);
        assert_eq!(service.result(), 0.0);
    }

    #[test]
    fn test_result_follows_every_state_change() {
        let mut service = service();
        let mut backend = MockBackend::new();

        futures::executor::block_on(async {
            // Default operator is '+', so the result tracks each operand write
            service
                .on_write(&mut backend, HANDLES.operand_a, &5.0f32.to_le_bytes())
                .await;
            assert_eq!(service.result(), 5.0);

            service
                .on_write(&mut backend, HANDLES.operand_b, &1.5f32.to_le_bytes())
                .await;
            assert_eq!(service.result(), 6.5);
        });

        assert_eq!(backend.published().as_slice(), &[5.0, 6.5]);
    }
}
