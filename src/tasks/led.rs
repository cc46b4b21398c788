//! Heartbeat LED task
//!
//! Toggles the LED on a fixed period so a glance at the board shows the
//! scheduler is alive. No coupling to the compute logic.

use embassy_time::{Duration, Timer};
use esp_hal::gpio::Output;

use crate::config;

/// Task that blinks the LED forever
pub async fn heartbeat_task(mut led: Output<'static>) {
    loop {
        Timer::after(Duration::from_millis(config::led::HEARTBEAT_PERIOD_MS)).await;
        led.toggle();
    }
}
