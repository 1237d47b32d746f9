//! Fixed-layout output reports for the gamepad, keyboard and mouse interfaces.
//!
//! The byte layouts match the composite HID report descriptor served by the
//! firmware; the report ID is prepended by the transport.

use input_proto::InputState;

/// Report ID of the gamepad collection.
pub const REPORT_ID_GAMEPAD: u8 = 1;
/// Report ID of the keyboard collection.
pub const REPORT_ID_KEYBOARD: u8 = 2;
/// Report ID of the mouse collection.
pub const REPORT_ID_MOUSE: u8 = 3;

/// Hat switch value for "no direction".
pub const HAT_CENTERED: u8 = 8;

/// Number of keycode slots in a keyboard report.
pub const KEYBOARD_SLOTS: usize = 6;

/// Convert a signed 16-bit trigger axis to the report's unsigned byte.
///
/// `-32768` maps to `0` and `32767` to `255`. Hosts rely on this exact
/// transform.
#[inline]
#[must_use]
pub const fn trigger_to_byte(value: i16) -> u8 {
    ((value as i32 + 32768) >> 8) as u8
}

/// Gamepad report: 16 buttons, four 16-bit axes, two 8-bit triggers, hat.
///
/// Total size: 13 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadReport {
    pub buttons: u16,
    pub left_x: i16,
    pub left_y: i16,
    pub right_x: i16,
    pub right_y: i16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    /// 0-7 for the eight directions, [`HAT_CENTERED`] for none.
    pub hat: u8,
}

impl GamepadReport {
    pub const SIZE: usize = 13;

    /// Build a report from button bits, stick axes and signed trigger axes.
    #[must_use]
    pub const fn new(buttons: u16, axes: [i16; 4], triggers: [i16; 2]) -> Self {
        Self {
            buttons,
            left_x: axes[0],
            left_y: axes[1],
            right_x: axes[2],
            right_y: axes[3],
            left_trigger: trigger_to_byte(triggers[0]),
            right_trigger: trigger_to_byte(triggers[1]),
            hat: HAT_CENTERED,
        }
    }

    /// Passthrough of an input snapshot.
    ///
    /// Buttons, stick axes and the 8-bit triggers are copied as-is; nothing
    /// on this path rescales analog values.
    #[must_use]
    pub const fn passthrough(state: &InputState) -> Self {
        let axes = state.axes();
        Self {
            buttons: state.buttons.raw(),
            left_x: axes[0],
            left_y: axes[1],
            right_x: axes[2],
            right_y: axes[3],
            left_trigger: state.left_trigger,
            right_trigger: state.right_trigger,
            hat: HAT_CENTERED,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..2].copy_from_slice(&self.buttons.to_le_bytes());
        out[2..4].copy_from_slice(&self.left_x.to_le_bytes());
        out[4..6].copy_from_slice(&self.left_y.to_le_bytes());
        out[6..8].copy_from_slice(&self.right_x.to_le_bytes());
        out[8..10].copy_from_slice(&self.right_y.to_le_bytes());
        out[10] = self.left_trigger;
        out[11] = self.right_trigger;
        out[12] = self.hat;
        out
    }
}

/// Boot-compatible keyboard report: modifiers, reserved byte, six key slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keycodes: [u8; KEYBOARD_SLOTS],
}

impl KeyboardReport {
    pub const SIZE: usize = 8;

    /// All keys released.
    #[must_use]
    pub const fn released() -> Self {
        Self {
            modifiers: 0,
            keycodes: [0; KEYBOARD_SLOTS],
        }
    }

    /// Exactly one key down, in the first slot.
    #[must_use]
    pub const fn single(keycode: u8) -> Self {
        let mut keycodes = [0; KEYBOARD_SLOTS];
        keycodes[0] = keycode;
        Self {
            modifiers: 0,
            keycodes,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.modifiers;
        out[2..].copy_from_slice(&self.keycodes);
        out
    }
}

/// Relative mouse report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
}

impl MouseReport {
    pub const SIZE: usize = 4;

    #[must_use]
    pub const fn new(buttons: u8, x: i8, y: i8) -> Self {
        Self {
            buttons,
            x,
            y,
            wheel: 0,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        [self.buttons, self.x as u8, self.y as u8, self.wheel as u8]
    }
}

/// Any report the converter can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    Gamepad(GamepadReport),
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
}

impl Report {
    /// Largest report body, excluding the report ID.
    pub const MAX_SIZE: usize = GamepadReport::SIZE;

    #[must_use]
    pub const fn report_id(&self) -> u8 {
        match self {
            Self::Gamepad(_) => REPORT_ID_GAMEPAD,
            Self::Keyboard(_) => REPORT_ID_KEYBOARD,
            Self::Mouse(_) => REPORT_ID_MOUSE,
        }
    }

    /// Write report ID and body into `buf`, returning the number of bytes.
    pub fn write_with_id(&self, buf: &mut [u8; Report::MAX_SIZE + 1]) -> usize {
        buf[0] = self.report_id();
        let len = match self {
            Self::Gamepad(r) => {
                buf[1..=GamepadReport::SIZE].copy_from_slice(&r.as_bytes());
                GamepadReport::SIZE
            }
            Self::Keyboard(r) => {
                buf[1..=KeyboardReport::SIZE].copy_from_slice(&r.as_bytes());
                KeyboardReport::SIZE
            }
            Self::Mouse(r) => {
                buf[1..=MouseReport::SIZE].copy_from_slice(&r.as_bytes());
                MouseReport::SIZE
            }
        };
        len + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_proto::{AnalogStick, Buttons};

    #[test]
    fn test_trigger_transform_endpoints() {
        assert_eq!(trigger_to_byte(-32768), 0);
        assert_eq!(trigger_to_byte(32767), 255);
        assert_eq!(trigger_to_byte(0), 128);
        assert_eq!(trigger_to_byte(-1), 127);
    }

    #[test]
    fn test_passthrough_copies_sticks_and_buttons() {
        let state = InputState {
            buttons: Buttons::A | Buttons::RS,
            left_stick: AnalogStick::new(-32768, 32767),
            right_stick: AnalogStick::new(1234, -4321),
            left_trigger: 0,
            right_trigger: 255,
            ..InputState::neutral()
        };
        let report = GamepadReport::passthrough(&state);

        assert_eq!(report.buttons, state.buttons.raw());
        assert_eq!(
            [report.left_x, report.left_y, report.right_x, report.right_y],
            state.axes()
        );
        assert_eq!(report.left_trigger, 0);
        assert_eq!(report.right_trigger, 255);
        assert_eq!(report.hat, HAT_CENTERED);
    }

    #[test]
    fn test_passthrough_triggers_full_range() {
        for t in [0u8, 1, 10, 127, 128, 250, 255] {
            let state = InputState {
                left_trigger: t,
                right_trigger: 255 - t,
                ..InputState::neutral()
            };
            let report = GamepadReport::passthrough(&state);
            assert_eq!((report.left_trigger, report.right_trigger), (t, 255 - t));
        }
    }

    #[test]
    fn test_gamepad_bytes() {
        let report = GamepadReport::new(0x0102, [1, -1, 256, -256], [-32768, 32767]);
        assert_eq!(
            report.as_bytes(),
            [0x02, 0x01, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x01, 0x00, 0xFF, 0, 255, HAT_CENTERED]
        );
    }

    #[test]
    fn test_keyboard_single_and_released() {
        assert_eq!(KeyboardReport::single(0x04).keycodes, [0x04, 0, 0, 0, 0, 0]);
        assert_eq!(KeyboardReport::single(0x04).modifiers, 0);
        assert_eq!(KeyboardReport::released().keycodes, [0; 6]);
        assert_eq!(
            KeyboardReport::single(0x2C).as_bytes(),
            [0, 0, 0x2C, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_mouse_bytes() {
        assert_eq!(MouseReport::new(0x01, -1, 127).as_bytes(), [0x01, 0xFF, 0x7F, 0]);
    }

    #[test]
    fn test_write_with_id() {
        let mut buf = [0u8; Report::MAX_SIZE + 1];
        let len = Report::Mouse(MouseReport::new(2, 3, 4)).write_with_id(&mut buf);
        assert_eq!(&buf[..len], &[REPORT_ID_MOUSE, 2, 3, 4, 0]);

        let len = Report::Keyboard(KeyboardReport::single(0x05)).write_with_id(&mut buf);
        assert_eq!(len, 9);
        assert_eq!(buf[0], REPORT_ID_KEYBOARD);
        assert_eq!(buf[3], 0x05);
    }
}
