//! Hardware and BLE configuration constants for the ESP32-S3 compute unit

/// LED pin
pub mod led {
    pub const PIN: u8 = 48;

    /// Heartbeat blink period in milliseconds
    pub const HEARTBEAT_PERIOD_MS: u64 = 500;
}

/// BLE advertising configuration
pub mod ble {
    /// Device name prefix; a unique hex suffix from the eFuse MAC is appended
    pub const DEVICE_NAME_PREFIX: &str = "ComputeUnit-";

    /// Advertising interval in 0.625 ms ticks (1000 ticks = 625 ms)
    pub const ADV_INTERVAL_TICKS: u64 = 1000;

    /// Duration of one advertising interval tick in microseconds
    pub const ADV_TICK_US: u64 = 625;
}
