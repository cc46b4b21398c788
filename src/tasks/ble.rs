//! BLE task for the compute unit peripheral
//!
//! Brings up the TrouBLE host, advertises the compute service and feeds
//! characteristic writes into the [`ComputeService`] state machine. The
//! service state lives here for the process lifetime and survives across
//! connections; advertising restarts after every disconnect.

use core::fmt::Write as _;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use trouble_host::prelude::*;

use crate::ble::service::{ComputeUnitService, SERVICE_UUID};
use crate::compute::service::{AttributeBackend, AttributeHandles, ComputeService, Operand};
use crate::config;

/// Number of maximum concurrent connections
const CONNECTIONS_MAX: usize = 1;
/// Number of L2CAP channels
const L2CAP_CHANNELS_MAX: usize = 3;

/// BLE GATT server with the compute unit service
#[gatt_server(mutex_type = CriticalSectionRawMutex)]
struct Server {
    compute: ComputeUnitService,
}

/// Attribute table access backed by the live GATT server.
///
/// Echoes go straight into the attribute table so peer reads return the
/// stored value; the result is additionally pushed as a notification.
struct GattBackend<'a, 'b, 'c, 'd> {
    server: &'d Server<'a>,
    conn: &'d GattConnection<'b, 'c, DefaultPacketPool>,
}

impl AttributeBackend for GattBackend<'_, '_, '_, '_> {
    fn echo_operand(&mut self, operand: Operand, value: f32) {
        let characteristic = match operand {
            Operand::A => &self.server.compute.operand_a,
            Operand::B => &self.server.compute.operand_b,
        };
        let _ = self.server.set(characteristic, &value);
    }

    fn echo_operator(&mut self, value: u8) {
        let _ = self.server.set(&self.server.compute.operator, &value);
    }

    async fn publish_result(&mut self, value: f32) {
        // Store first so reads stay consistent even without a subscriber,
        // then notify (fails harmlessly when notifications are off)
        let _ = self.server.set(&self.server.compute.result, &value);
        let _ = self.server.compute.result.notify(self.conn, &value).await;
    }
}

/// Format the advertised device name: prefix plus the device ID in hex
fn format_device_name(device_id: &[u8; 3]) -> heapless::String<20> {
    let mut name = heapless::String::new();
    let _ = write!(
        name,
        "{}{:02X}{:02X}{:02X}",
        config::ble::DEVICE_NAME_PREFIX,
        device_id[0],
        device_id[1],
        device_id[2]
    );
    name
}

/// Main BLE task that manages the Bluetooth stack and connections
///
/// This task:
/// 1. Initialises the BLE host and registers the compute service
/// 2. Advertises as "ComputeUnit-XXXXXX" (unique per device)
/// 3. Accepts one connection at a time and dispatches GATT writes into
///    the compute state machine
/// 4. Publishes the recomputed result as a notification
pub async fn ble_task<C: Controller>(controller: C, device_id: [u8; 3]) {
    let device_name = format_device_name(&device_id);

    log::info!("BLE: Starting as '{}'", device_name);

    // Create BLE host resources
    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();

    // Build the BLE stack with address derived from device ID
    let stack = trouble_host::new(controller, &mut resources).set_random_address(Address::random([
        device_id[0],
        device_id[1],
        device_id[2],
        0x0A,
        0xAA,
        0xC3,
    ]));

    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    // Create GATT server with GAP configuration; the service table must
    // exist before advertising starts so the advertised UUID is real
    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: device_name.as_str(),
        appearance: &appearance::UNKNOWN,
    });
    let server: Server = match Server::new_with_config(gap) {
        Ok(s) => s,
        Err(_) => return,
    };

    // The one compute service instance, bound to the characteristic
    // handles. Lives until reset; state carries across connections.
    let mut service = ComputeService::new(AttributeHandles {
        operand_a: server.compute.operand_a.handle,
        operand_b: server.compute.operand_b.handle,
        operator: server.compute.operator.handle,
        result: server.compute.result.handle,
    });

    // Run both the BLE runner and peripheral logic concurrently using select
    let runner_task = runner.run();

    let peripheral_task = async {
        let mut adv_data = [0u8; 31];
        let len = match AdStructure::encode_slice(
            &[
                AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                AdStructure::ServiceUuids16(&[SERVICE_UUID.to_le_bytes()]),
                AdStructure::CompleteLocalName(device_name.as_bytes()),
            ],
            &mut adv_data,
        ) {
            Ok(l) => l,
            Err(_) => return,
        };

        let interval = Duration::from_micros(config::ble::ADV_INTERVAL_TICKS * config::ble::ADV_TICK_US);
        let adv_params = AdvertisementParameters {
            interval_min: interval,
            interval_max: interval,
            ..Default::default()
        };

        loop {
            // Start advertising
            log::info!("BLE: Advertising...");
            let advertiser = match peripheral
                .advertise(
                    &adv_params,
                    Advertisement::ConnectableScannableUndirected {
                        adv_data: &adv_data[..len],
                        scan_data: &[],
                    },
                )
                .await
            {
                Ok(a) => a,
                Err(_) => continue,
            };

            // Wait for connection
            let acceptor = match advertiser.accept().await {
                Ok(a) => {
                    log::info!("BLE: Connected");
                    a
                }
                Err(_) => continue,
            };

            // Attach to attribute server (using Deref to get &AttributeServer)
            let conn = match acceptor.with_attribute_server(&*server) {
                Ok(c) => c,
                Err(_) => continue,
            };

            // Handle this connection
            loop {
                match conn.next().await {
                    GattConnectionEvent::Disconnected { reason: _ } => {
                        log::info!("BLE: Disconnected");
                        break;
                    }
                    GattConnectionEvent::Gatt { event } => match event {
                        GattEvent::Write(write_event) => {
                            let mut backend = GattBackend {
                                server: &server,
                                conn: &conn,
                            };
                            service
                                .on_write(&mut backend, write_event.handle(), write_event.data())
                                .await;
                            // Accept the write
                            let _ = write_event.accept();
                        }
                        GattEvent::Read(read_event) => {
                            let _ = read_event.accept();
                        }
                        GattEvent::Other(other_event) => {
                            let _ = other_event.accept();
                        }
                    },
                    _ => {}
                }
            }
            // Loop back to advertise again after a disconnect
        }
    };

    embassy_futures::select::select(runner_task, peripheral_task).await;
}
