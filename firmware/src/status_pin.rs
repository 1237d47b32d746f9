//! Status LED driver.

use embedded_hal::digital::OutputPin;
use remap_core::{AppState, StatusLed};

/// Drives any output pin with the blink pattern of the current [`AppState`].
pub struct StatusPin<P> {
    pin: P,
    led: StatusLed,
}

impl<P: OutputPin> StatusPin<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            led: StatusLed::new(),
        }
    }

    /// Toggle the pin if the blink interval for `state` elapsed.
    pub fn update(&mut self, now: u32, state: AppState) {
        if let Some(on) = self.led.update(now, state) {
            // GPIO writes on the RP2040 are infallible
            let _ = if on { self.pin.set_high() } else { self.pin.set_low() };
        }
    }
}
