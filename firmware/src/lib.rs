//! Joystick converter firmware for RP2040.
//!
//! Reads controller input reports framed over UART, runs them through the
//! [`remap_core`] engine once per millisecond and presents the result to the
//! host as a composite USB HID gamepad, keyboard and mouse.

#![no_std]

// Re-export core types for convenience
pub use input_proto::{Buttons, InputState};
pub use remap_core::{
    AppState, Config, ConverterBridge, MacroTable, RemapEngine, Report, ReportSink, StatusLed,
};

pub mod status_pin;
pub mod storage;
pub mod uart_input;
pub mod usb_output;

pub use status_pin::StatusPin;
pub use storage::{load_config, save_config, CONFIG_OFFSET};
pub use uart_input::{InputLink, UartInputSource, UartReceiver, LINK_TIMEOUT_MS};
pub use usb_output::{configure_usb_hid, ReportQueue, UsbHidOutput, UsbReportSink, REPORT_DESCRIPTOR};

/// Milliseconds since boot, truncated to the engine's wrapping 32-bit clock.
#[inline]
pub fn now_ms() -> u32 {
    embassy_time::Instant::now().as_millis() as u32
}
