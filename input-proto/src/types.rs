//! Input snapshot types: Buttons, AnalogStick, Dpad, InputState.

use core::ops::{BitAnd, BitOr, BitOrAssign, BitXor, Not};

/// Controller button state as a 16-bit bitfield.
///
/// Bit assignments follow the converter's input report layout. Bits 10-15
/// carry vendor-specific buttons and have no named constant.
///
/// # Example
///
/// ```
/// use input_proto::Buttons;
///
/// let buttons = Buttons::A | Buttons::START;
/// assert!(buttons.contains(Buttons::A));
/// assert!(!buttons.contains(Buttons::B));
/// assert_eq!(Buttons::bit(7), Buttons::START);
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const A: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const X: Self = Self(1 << 2);
    pub const Y: Self = Self(1 << 3);
    pub const LB: Self = Self(1 << 4); // Left bumper
    pub const RB: Self = Self(1 << 5); // Right bumper
    pub const BACK: Self = Self(1 << 6);
    pub const START: Self = Self(1 << 7);
    pub const LS: Self = Self(1 << 8); // Left stick press
    pub const RS: Self = Self(1 << 9); // Right stick press

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Number of button bits tracked.
    pub const COUNT: u8 = 16;

    /// The single-button mask for bit `index` (0-15).
    ///
    /// Indices past 15 yield [`Buttons::NONE`].
    #[inline]
    #[must_use]
    pub const fn bit(index: u8) -> Self {
        if index < Self::COUNT {
            Self(1 << index)
        } else {
            Self::NONE
        }
    }

    /// Check if all of the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if any of the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn intersects(self, button: Buttons) -> bool {
        (self.0 & button.0) != 0
    }

    /// Alias for [`Buttons::contains`].
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Buttons) -> bool {
        self.contains(button)
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for Buttons {
    #[inline]
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitXor for Buttons {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Analog stick with X/Y axes, range [-32768, 32767].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogStick {
    pub x: i16,
    pub y: i16,
}

impl AnalogStick {
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    pub const NEUTRAL: Self = Self { x: 0, y: 0 };
}

/// D-pad position, each axis in {-1, 0, 1}.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dpad {
    pub x: i8,
    pub y: i8,
}

impl Dpad {
    pub const CENTERED: Self = Self { x: 0, y: 0 };

    #[must_use]
    pub const fn is_centered(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// One input snapshot, produced by the transport once per tick.
///
/// Sticks are full-range signed 16-bit, triggers 8-bit. The d-pad is carried
/// for completeness; nothing downstream maps it yet.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputState {
    pub buttons: Buttons,
    pub left_stick: AnalogStick,
    pub right_stick: AnalogStick,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub dpad: Dpad,
}

impl InputState {
    /// No buttons pressed, sticks and d-pad centered, triggers released.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: Buttons::NONE,
            left_stick: AnalogStick::NEUTRAL,
            right_stick: AnalogStick::NEUTRAL,
            left_trigger: 0,
            right_trigger: 0,
            dpad: Dpad::CENTERED,
        }
    }

    /// Stick axes in report order: left X, left Y, right X, right Y.
    #[inline]
    #[must_use]
    pub const fn axes(&self) -> [i16; 4] {
        [
            self.left_stick.x,
            self.left_stick.y,
            self.right_stick.x,
            self.right_stick.y,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_bit_matches_constants() {
        assert_eq!(Buttons::bit(0), Buttons::A);
        assert_eq!(Buttons::bit(8), Buttons::LS);
        assert_eq!(Buttons::bit(15), Buttons(0x8000));
        assert_eq!(Buttons::bit(16), Buttons::NONE);
    }

    #[test]
    fn test_buttons_set_clear() {
        let mut buttons = Buttons::NONE;
        buttons.set(Buttons::RB, true);
        assert!(buttons.is_pressed(Buttons::RB));
        buttons.set(Buttons::RB, false);
        assert!(buttons.is_empty());
    }

    #[test]
    fn test_buttons_xor_yields_changed_bits() {
        let prev = Buttons::A | Buttons::B;
        let curr = Buttons::B | Buttons::Y;
        assert_eq!(prev ^ curr, Buttons::A | Buttons::Y);
    }

    #[test]
    fn test_intersects_vs_contains() {
        let buttons = Buttons::X;
        assert!(buttons.intersects(Buttons::X | Buttons::Y));
        assert!(!buttons.contains(Buttons::X | Buttons::Y));
    }

    #[test]
    fn test_neutral_state() {
        let state = InputState::neutral();
        assert_eq!(state, InputState::default());
        assert!(state.dpad.is_centered());
        assert_eq!(state.axes(), [0; 4]);
    }
}
