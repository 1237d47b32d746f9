//! Application state and the status LED blink schedule.

/// Coarse application state, reflected on the status LED.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppState {
    #[default]
    Init,
    WaitingForInput,
    Active,
    ConfigMode,
    Error,
}

impl AppState {
    /// LED toggle period in milliseconds.
    #[must_use]
    pub const fn blink_interval_ms(self) -> u32 {
        match self {
            Self::Init => 100,
            Self::WaitingForInput => 500,
            Self::Active => 2000,
            Self::ConfigMode => 200,
            Self::Error => 100,
        }
    }
}

/// Toggles an LED at the rate of the current [`AppState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusLed {
    last_toggle: u32,
    on: bool,
}

impl StatusLed {
    pub const fn new() -> Self {
        Self {
            last_toggle: 0,
            on: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Returns the new LED level if the blink interval elapsed since the
    /// last toggle, `None` otherwise.
    pub fn update(&mut self, now: u32, state: AppState) -> Option<bool> {
        if now.wrapping_sub(self.last_toggle) < state.blink_interval_ms() {
            return None;
        }
        self.on = !self.on;
        self.last_toggle = now;
        Some(self.on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals() {
        assert_eq!(AppState::Init.blink_interval_ms(), 100);
        assert_eq!(AppState::WaitingForInput.blink_interval_ms(), 500);
        assert_eq!(AppState::Active.blink_interval_ms(), 2000);
        assert_eq!(AppState::ConfigMode.blink_interval_ms(), 200);
        assert_eq!(AppState::Error.blink_interval_ms(), 100);
    }

    #[test]
    fn test_toggles_on_interval() {
        let mut led = StatusLed::new();
        assert_eq!(led.update(499, AppState::WaitingForInput), None);
        assert_eq!(led.update(500, AppState::WaitingForInput), Some(true));
        assert_eq!(led.update(999, AppState::WaitingForInput), None);
        assert_eq!(led.update(1000, AppState::WaitingForInput), Some(false));
        assert!(!led.is_on());
    }

    #[test]
    fn test_state_change_uses_new_interval() {
        let mut led = StatusLed::new();
        assert_eq!(led.update(100, AppState::Init), Some(true));
        assert_eq!(led.update(200, AppState::Active), None);
        assert_eq!(led.update(2100, AppState::Active), Some(false));
    }

    #[test]
    fn test_clock_rollover() {
        let mut led = StatusLed::new();
        assert_eq!(led.update(u32::MAX - 50, AppState::Init), Some(true));
        assert_eq!(led.update(10, AppState::Init), None);
        assert_eq!(led.update(49, AppState::Init), Some(false));
    }
}
