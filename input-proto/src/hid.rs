//! Raw HID gamepad input report decoding.
//!
//! Layout (little-endian):
//!
//! | Bytes | Field |
//! |-------|-------|
//! | 0-1   | Buttons |
//! | 2-3   | Left stick X |
//! | 4-5   | Left stick Y |
//! | 6-7   | Right stick X (12-byte reports only) |
//! | 8-9   | Right stick Y (12-byte reports only) |
//! | 10    | Left trigger (12-byte reports only) |
//! | 11    | Right trigger (12-byte reports only) |
//!
//! Short 8-byte reports only carry buttons and the left stick; the remaining
//! fields stay neutral.

use crate::types::{AnalogStick, Buttons, InputState};

/// Shortest report accepted by [`parse_report`].
pub const MIN_REPORT_LEN: usize = 8;

/// Report length that carries the right stick and triggers.
pub const FULL_REPORT_LEN: usize = 12;

/// Error type for HID report decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReportError {
    /// Report shorter than [`MIN_REPORT_LEN`].
    TooShort(usize),
}

impl core::fmt::Display for HidReportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooShort(len) => write!(f, "HID report too short: {len} bytes"),
        }
    }
}

#[inline]
fn le_i16(report: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([report[at], report[at + 1]])
}

/// Decode a raw HID gamepad input report into an [`InputState`].
///
/// # Errors
///
/// Returns [`HidReportError::TooShort`] if the report has fewer than
/// [`MIN_REPORT_LEN`] bytes.
pub fn parse_report(report: &[u8]) -> Result<InputState, HidReportError> {
    if report.len() < MIN_REPORT_LEN {
        return Err(HidReportError::TooShort(report.len()));
    }

    let mut state = InputState::neutral();
    state.buttons = Buttons(u16::from_le_bytes([report[0], report[1]]));
    state.left_stick = AnalogStick::new(le_i16(report, 2), le_i16(report, 4));

    if report.len() >= FULL_REPORT_LEN {
        state.right_stick = AnalogStick::new(le_i16(report, 6), le_i16(report, 8));
        state.left_trigger = report[10];
        state.right_trigger = report[11];
    }

    Ok(state)
}
