//! Output encoder: renders logical actions into reports for the active
//! output device class and hands them to a [`ReportSink`].
//!
//! Reports for a class the current [`OutputType`] does not present are
//! discarded, as are reports the sink is not ready for.

use crate::mapping::OutputType;
use crate::output::{OutputError, ReportSink};
use crate::report::{GamepadReport, KeyboardReport, MouseReport, Report};
use input_proto::InputState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputEncoder {
    output_type: OutputType,
}

impl OutputEncoder {
    #[must_use]
    pub const fn new(output_type: OutputType) -> Self {
        Self { output_type }
    }

    #[inline]
    #[must_use]
    pub const fn output_type(&self) -> OutputType {
        self.output_type
    }

    #[must_use]
    pub const fn accepts(&self, report: &Report) -> bool {
        match report {
            Report::Gamepad(_) => self.output_type.sends_gamepad(),
            Report::Keyboard(_) => self.output_type.sends_keyboard(),
            Report::Mouse(_) => self.output_type.sends_mouse(),
        }
    }

    /// Send `report` if the output type presents its class and the sink is
    /// ready. Returns whether the sink accepted it.
    pub fn emit<S: ReportSink>(&self, sink: &mut S, report: Report) -> bool {
        if !self.accepts(&report) {
            trace!("Dropping {:?} report for output type {:?}", report, self.output_type);
            return false;
        }
        if !sink.is_ready() {
            trace!("Transport not ready, dropping report {}", report.report_id());
            return false;
        }
        match sink.send(&report) {
            Ok(()) => true,
            Err(OutputError::NotReady) => {
                trace!("Transport not ready, dropping report {}", report.report_id());
                false
            }
            Err(e) => {
                warn!("Report {} send failed: {:?}", report.report_id(), e);
                false
            }
        }
    }

    /// Forward a full input snapshot as a gamepad report.
    pub fn gamepad<S: ReportSink>(&self, sink: &mut S, state: &InputState) -> bool {
        self.emit(sink, Report::Gamepad(GamepadReport::passthrough(state)))
    }

    /// One key down in the first slot, all others clear.
    pub fn key_press<S: ReportSink>(&self, sink: &mut S, keycode: u8) -> bool {
        self.emit(sink, Report::Keyboard(KeyboardReport::single(keycode)))
    }

    pub fn keys_released<S: ReportSink>(&self, sink: &mut S) -> bool {
        self.emit(sink, Report::Keyboard(KeyboardReport::released()))
    }

    pub fn mouse<S: ReportSink>(&self, sink: &mut S, buttons: u8, dx: i8, dy: i8) -> bool {
        self.emit(sink, Report::Mouse(MouseReport::new(buttons, dx, dy)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::*;
    use input_proto::{AnalogStick, Buttons};
    use std::vec::Vec;

    /// Sink that records every report it accepts.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub sent: Vec<Report>,
        pub busy: bool,
        pub fail: Option<OutputError>,
    }

    impl ReportSink for RecordingSink {
        fn send(&mut self, report: &Report) -> Result<(), OutputError> {
            if let Some(e) = self.fail {
                return Err(e);
            }
            self.sent.push(*report);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            !self.busy
        }
    }

    #[test]
    fn test_gamepad_only_for_gamepad_output() {
        let state = InputState {
            buttons: Buttons::X,
            right_stick: AnalogStick::new(100, -100),
            ..InputState::neutral()
        };
        let mut sink = RecordingSink::default();

        assert!(OutputEncoder::new(OutputType::Gamepad).gamepad(&mut sink, &state));
        assert!(!OutputEncoder::new(OutputType::Combo).gamepad(&mut sink, &state));
        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn test_keyboard_and_mouse_gating() {
        let mut sink = RecordingSink::default();

        let keyboard = OutputEncoder::new(OutputType::Keyboard);
        assert!(keyboard.key_press(&mut sink, 0x04));
        assert!(!keyboard.mouse(&mut sink, 1, 0, 0));

        let mouse = OutputEncoder::new(OutputType::Mouse);
        assert!(!mouse.keys_released(&mut sink));
        assert!(mouse.mouse(&mut sink, 1, 0, 0));

        let combo = OutputEncoder::new(OutputType::Combo);
        assert!(combo.keys_released(&mut sink));
        assert!(combo.mouse(&mut sink, 0, 5, -5));

        assert_eq!(
            sink.sent,
            [
                Report::Keyboard(KeyboardReport::single(0x04)),
                Report::Mouse(MouseReport::new(1, 0, 0)),
                Report::Keyboard(KeyboardReport::released()),
                Report::Mouse(MouseReport::new(0, 5, -5)),
            ]
        );
    }

    #[test]
    fn test_not_ready_drops_without_queueing() {
        let encoder = OutputEncoder::new(OutputType::Keyboard);
        let mut sink = RecordingSink {
            busy: true,
            ..RecordingSink::default()
        };

        assert!(!encoder.key_press(&mut sink, 0x04));
        sink.busy = false;
        assert!(encoder.keys_released(&mut sink));

        // Only the report issued while ready went out
        assert_eq!(sink.sent, [Report::Keyboard(KeyboardReport::released())]);
    }

    #[test]
    fn test_send_error_is_swallowed() {
        let encoder = OutputEncoder::new(OutputType::Mouse);
        let mut sink = RecordingSink {
            fail: Some(OutputError::Io),
            ..RecordingSink::default()
        };
        assert!(!encoder.mouse(&mut sink, 1, 1, 1));
        assert!(sink.sent.is_empty());
    }
}
