//! The remapping engine: one explicitly owned context holding the
//! configuration, macro table, edge detector and macro scheduler.
//!
//! A tick runs in a fixed order: edge detection, mapping dispatch, then one
//! scheduler advancement. Nothing in a tick blocks or waits.

use crate::detector::{ButtonEdge, EdgeDetector};
use crate::encoder::OutputEncoder;
use crate::macros::{MacroError, MacroTable};
use crate::mapping::{Config, MappingAction};
use crate::output::ReportSink;
use crate::scheduler::{MacroScheduler, TickOutcome};
use input_proto::{Buttons, InputState};

/// Right stick units per mouse count.
pub const MOUSE_STICK_DIVISOR: i16 = 256;

/// Last processed input and whether any has been seen, for debug tooling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSnapshot {
    pub state: InputState,
    pub valid: bool,
}

/// Convert a right stick position to a relative mouse delta.
///
/// Truncates toward zero; `None` when both axes round to zero.
#[inline]
#[must_use]
pub fn stick_to_mouse(x: i16, y: i16) -> Option<(i8, i8)> {
    // i16 / 256 always fits i8
    let dx = (x / MOUSE_STICK_DIVISOR) as i8;
    let dy = (y / MOUSE_STICK_DIVISOR) as i8;
    (dx != 0 || dy != 0).then_some((dx, dy))
}

#[derive(Clone, Debug, Default)]
pub struct RemapEngine {
    config: Config,
    macros: MacroTable,
    detector: EdgeDetector,
    scheduler: MacroScheduler,
    last_input: Option<InputState>,
    prior_buttons: Buttons,
}

impl RemapEngine {
    #[must_use]
    pub fn new(config: Config, macros: MacroTable) -> Self {
        Self {
            config,
            macros,
            detector: EdgeDetector::new(),
            scheduler: MacroScheduler::new(),
            last_input: None,
            prior_buttons: Buttons::NONE,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable configuration access. Only reachable between ticks.
    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[inline]
    #[must_use]
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    #[inline]
    pub fn macros_mut(&mut self) -> &mut MacroTable {
        &mut self.macros
    }

    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &MacroScheduler {
        &self.scheduler
    }

    fn encoder(&self) -> OutputEncoder {
        OutputEncoder::new(self.config.output_type())
    }

    /// Run one full tick: process `input` if the transport had a valid
    /// snapshot, then advance the macro scheduler by one step.
    pub fn tick<S: ReportSink>(&mut self, now: u32, input: Option<&InputState>, sink: &mut S) -> TickOutcome {
        if let Some(state) = input {
            self.process_input(now, state, sink);
        }
        self.run_macros(now, sink)
    }

    /// Edge detection and mapping dispatch for one input snapshot.
    pub fn process_input<S: ReportSink>(&mut self, now: u32, input: &InputState, sink: &mut S) {
        let encoder = self.encoder();
        let previous = self.detector.previous();

        for edge in self.detector.update(input.buttons) {
            self.dispatch_edge(now, edge, &encoder, sink);
        }

        // Every tick, edges or not
        if encoder.output_type().sends_gamepad() && self.config.mappings().is_empty() {
            encoder.gamepad(sink, input);
        }

        if encoder.output_type().sends_mouse() {
            if let Some((dx, dy)) = stick_to_mouse(input.right_stick.x, input.right_stick.y) {
                encoder.mouse(sink, 0, dx, dy);
            }
        }

        self.prior_buttons = previous;
        self.last_input = Some(*input);
    }

    fn dispatch_edge<S: ReportSink>(
        &mut self,
        now: u32,
        edge: ButtonEdge,
        encoder: &OutputEncoder,
        sink: &mut S,
    ) {
        let Some(mapping) = self.config.find_mapping(edge.button).copied() else {
            return;
        };

        match mapping.action {
            MappingAction::None => {}
            MappingAction::Button(target) => {
                // Informational only: remapped gamepad buttons are not re-encoded.
                debug!(
                    "Button {} -> button {} ({})",
                    edge.button.raw(),
                    target.raw(),
                    if edge.pressed { "pressed" } else { "released" }
                );
            }
            MappingAction::Key(keycode) => {
                if edge.pressed {
                    encoder.key_press(sink, keycode);
                    debug!("Button {} -> key {}", edge.button.raw(), keycode);
                } else {
                    encoder.keys_released(sink);
                }
            }
            MappingAction::MouseButton(mask) => {
                if edge.pressed {
                    encoder.mouse(sink, mask, 0, 0);
                    debug!("Button {} -> mouse button {}", edge.button.raw(), mask);
                } else {
                    encoder.mouse(sink, 0, 0, 0);
                }
            }
            MappingAction::Macro(macro_id) => {
                if edge.pressed {
                    debug!("Button {} -> macro {}", edge.button.raw(), macro_id);
                    // Rejections are logged by the scheduler; lost triggers are not retried.
                    let _ = self.scheduler.execute(macro_id, now, &self.macros);
                }
            }
        }
    }

    /// Advance the macro scheduler by one step.
    pub fn run_macros<S: ReportSink>(&mut self, now: u32, sink: &mut S) -> TickOutcome {
        let encoder = self.encoder();
        self.scheduler.tick(now, &self.macros, &encoder, sink)
    }

    /// Start a macro outside of a mapped button press.
    pub fn execute_macro(&mut self, macro_id: u8, now: u32) -> Result<(), MacroError> {
        self.scheduler.execute(macro_id, now, &self.macros)
    }

    /// Last processed input plus a validity flag.
    #[must_use]
    pub fn snapshot(&self) -> InputSnapshot {
        match self.last_input {
            Some(state) => InputSnapshot { state, valid: true },
            None => InputSnapshot::default(),
        }
    }

    /// Whether `button` went down in the last processed input.
    #[must_use]
    pub fn button_pressed(&self, button: Buttons) -> bool {
        self.last_input
            .is_some_and(|s| s.buttons.intersects(button) && !self.prior_buttons.intersects(button))
    }

    /// Whether `button` went up in the last processed input.
    #[must_use]
    pub fn button_released(&self, button: Buttons) -> bool {
        self.last_input
            .is_some_and(|s| !s.buttons.intersects(button) && self.prior_buttons.intersects(button))
    }

    /// Forget input history, e.g. after the input device disconnects.
    pub fn reset_input(&mut self) {
        self.detector.reset();
        self.last_input = None;
        self.prior_buttons = Buttons::NONE;
    }

    /// Forget input history and put every enabled report back to neutral,
    /// so nothing stays held on the host after the input device goes away.
    ///
    /// A running macro keeps running.
    pub fn release_all<S: ReportSink>(&mut self, sink: &mut S) {
        self.reset_input();
        let encoder = self.encoder();
        let output_type = encoder.output_type();
        if output_type.sends_gamepad() {
            encoder.gamepad(sink, &InputState::neutral());
        }
        if output_type.sends_keyboard() {
            encoder.keys_released(sink);
        }
        if output_type.sends_mouse() {
            encoder.mouse(sink, 0, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::encoder::tests::RecordingSink;
    use crate::macros::{Macro, MacroStep};
    use crate::mapping::{Mapping, OutputType};
    use crate::report::{GamepadReport, KeyboardReport, MouseReport, Report};
    use crate::scheduler::MacroState;
    use input_proto::AnalogStick;

    fn pressed(buttons: Buttons) -> InputState {
        InputState {
            buttons,
            ..InputState::neutral()
        }
    }

    fn engine_with(output_type: OutputType, mappings: &[Mapping]) -> RemapEngine {
        let mut config = Config::new(output_type);
        for &m in mappings {
            config.add_mapping(m).unwrap();
        }
        RemapEngine::new(config, MacroTable::new())
    }

    #[test]
    fn test_key_mapping_press_and_release() {
        let mut engine = engine_with(
            OutputType::Keyboard,
            &[Mapping::new(Buttons(0x0001), MappingAction::Key(0x04))],
        );
        let mut sink = RecordingSink::default();

        engine.tick(0, Some(&pressed(Buttons(0x0001))), &mut sink);
        assert_eq!(
            sink.sent,
            [Report::Keyboard(KeyboardReport {
                modifiers: 0,
                keycodes: [0x04, 0, 0, 0, 0, 0]
            })]
        );

        // Holding emits nothing further
        engine.tick(1, Some(&pressed(Buttons(0x0001))), &mut sink);
        assert_eq!(sink.sent.len(), 1);

        engine.tick(2, Some(&pressed(Buttons::NONE)), &mut sink);
        assert_eq!(
            sink.sent[1],
            Report::Keyboard(KeyboardReport {
                modifiers: 0,
                keycodes: [0; 6]
            })
        );
        assert_eq!(sink.sent.len(), 2);
    }

    #[test]
    fn test_mouse_button_mapping() {
        let mut engine = engine_with(
            OutputType::Mouse,
            &[Mapping::new(Buttons::RB, MappingAction::MouseButton(0x02))],
        );
        let mut sink = RecordingSink::default();

        engine.tick(0, Some(&pressed(Buttons::RB)), &mut sink);
        engine.tick(1, Some(&pressed(Buttons::NONE)), &mut sink);
        assert_eq!(
            sink.sent,
            [
                Report::Mouse(MouseReport::new(0x02, 0, 0)),
                Report::Mouse(MouseReport::new(0, 0, 0)),
            ]
        );
    }

    #[test]
    fn test_button_mapping_is_inert() {
        let mut engine = engine_with(
            OutputType::Gamepad,
            &[Mapping::new(Buttons::A, MappingAction::Button(Buttons::B))],
        );
        let mut sink = RecordingSink::default();

        engine.tick(0, Some(&pressed(Buttons::A)), &mut sink);
        engine.tick(1, Some(&pressed(Buttons::NONE)), &mut sink);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_chord_source_never_fires() {
        let chord = Buttons::A | Buttons::B;
        let mut engine = engine_with(
            OutputType::Keyboard,
            &[Mapping::new(chord, MappingAction::Key(0x04))],
        );
        let mut sink = RecordingSink::default();

        engine.tick(0, Some(&pressed(chord)), &mut sink);
        engine.tick(1, Some(&pressed(Buttons::NONE)), &mut sink);
        assert!(sink.sent.is_empty());
        assert_eq!(engine.config().mappings().len(), 1);
    }

    #[test]
    fn test_unmapped_button_not_forwarded_once_table_populated() {
        let mut engine = engine_with(
            OutputType::Gamepad,
            &[Mapping::new(Buttons::A, MappingAction::Key(0x04))],
        );
        let mut sink = RecordingSink::default();
        engine.tick(0, Some(&pressed(Buttons::X)), &mut sink);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_passthrough_every_tick_unmodified() {
        let mut engine = engine_with(OutputType::Gamepad, &[]);
        let mut sink = RecordingSink::default();
        let state = InputState {
            buttons: Buttons::A | Buttons::START,
            left_stick: AnalogStick::new(-32768, 12345),
            right_stick: AnalogStick::new(32767, -1),
            left_trigger: 10,
            right_trigger: 250,
            ..InputState::neutral()
        };

        // Same state three times: no edges after the first tick
        for now in 0..3 {
            engine.tick(now, Some(&state), &mut sink);
        }

        assert_eq!(sink.sent.len(), 3);
        for report in &sink.sent {
            let Report::Gamepad(report) = report else {
                panic!("expected gamepad report, got {report:?}");
            };
            assert_eq!(*report, GamepadReport::passthrough(&state));
            assert_eq!(report.buttons, state.buttons.raw());
            assert_eq!(
                [report.left_x, report.left_y, report.right_x, report.right_y],
                [-32768, 12345, 32767, -1]
            );
            assert_eq!((report.left_trigger, report.right_trigger), (10, 250));
        }
    }

    #[test]
    fn test_passthrough_tracks_analog_changes() {
        let mut engine = engine_with(OutputType::Gamepad, &[]);
        let mut sink = RecordingSink::default();

        for x in [0i16, 100, 200] {
            let state = InputState {
                left_stick: AnalogStick::new(x, 0),
                ..InputState::neutral()
            };
            engine.tick(u32::from(x as u16), Some(&state), &mut sink);
        }
        let xs: std::vec::Vec<i16> = sink
            .sent
            .iter()
            .filter_map(|r| match r {
                Report::Gamepad(g) => Some(g.left_x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, [0, 100, 200]);
    }

    #[test]
    fn test_right_stick_mouse_emulation() {
        let mut engine = engine_with(OutputType::Combo, &[]);
        let mut sink = RecordingSink::default();

        let mut state = InputState::neutral();
        state.right_stick = AnalogStick::new(255, -255);
        engine.tick(0, Some(&state), &mut sink);
        assert!(sink.sent.is_empty(), "sub-unit deflection truncates to zero");

        state.right_stick = AnalogStick::new(-32768, 32767);
        engine.tick(1, Some(&state), &mut sink);
        assert_eq!(sink.sent, [Report::Mouse(MouseReport::new(0, -128, 127))]);
    }

    #[test]
    fn test_stick_to_mouse_truncates_toward_zero() {
        assert_eq!(stick_to_mouse(511, -511), Some((1, -1)));
        assert_eq!(stick_to_mouse(-256, 0), Some((-1, 0)));
        assert_eq!(stick_to_mouse(-255, 255), None);
    }

    #[test]
    fn test_macro_mapping_runs_and_release_does_not_cancel() {
        let mut config = Config::new(OutputType::Keyboard);
        config
            .add_mapping(Mapping::new(Buttons::Y, MappingAction::Macro(9)))
            .unwrap();
        let mut macros = MacroTable::new();
        macros
            .add(
                Macro::new(
                    9,
                    &[MacroStep::KeyPress(0x0B), MacroStep::Delay(20), MacroStep::KeyRelease],
                )
                .unwrap(),
            )
            .unwrap();
        let mut engine = RemapEngine::new(config, macros);
        let mut sink = RecordingSink::default();

        // Press: macro starts and its first step runs in the same tick
        engine.tick(0, Some(&pressed(Buttons::Y)), &mut sink);
        assert_eq!(sink.sent, [Report::Keyboard(KeyboardReport::single(0x0B))]);

        // Release does not stop it
        engine.tick(5, Some(&pressed(Buttons::NONE)), &mut sink);
        assert!(engine.scheduler().is_running());

        engine.tick(20, Some(&pressed(Buttons::NONE)), &mut sink);
        assert_eq!(sink.sent.last(), Some(&Report::Keyboard(KeyboardReport::released())));

        engine.tick(21, None, &mut sink);
        assert_eq!(engine.scheduler().state(), MacroState::Idle);
    }

    #[test]
    fn test_second_trigger_while_running_is_dropped() {
        let mut config = Config::new(OutputType::Keyboard);
        config
            .add_mapping(Mapping::new(Buttons::A, MappingAction::Macro(1)))
            .unwrap();
        config
            .add_mapping(Mapping::new(Buttons::B, MappingAction::Macro(2)))
            .unwrap();
        let mut macros = MacroTable::new();
        macros.add(Macro::new(1, &[MacroStep::Delay(100)]).unwrap()).unwrap();
        macros.add(Macro::new(2, &[MacroStep::KeyPress(0x04)]).unwrap()).unwrap();
        let mut engine = RemapEngine::new(config, macros);
        let mut sink = RecordingSink::default();

        engine.tick(0, Some(&pressed(Buttons::A)), &mut sink);
        engine.tick(1, Some(&pressed(Buttons::A | Buttons::B)), &mut sink);
        assert!(sink.sent.is_empty());
        assert_eq!(engine.execute_macro(2, 2), Err(MacroError::AlreadyRunning(2)));
    }

    #[test]
    fn test_scheduler_advances_without_input() {
        let mut macros = MacroTable::new();
        macros
            .add(Macro::new(1, &[MacroStep::MouseButtonPress(1), MacroStep::MouseButtonRelease]).unwrap())
            .unwrap();
        let mut engine = RemapEngine::new(Config::new(OutputType::Mouse), macros);
        let mut sink = RecordingSink::default();

        engine.execute_macro(1, 0).unwrap();
        engine.tick(0, None, &mut sink);
        engine.tick(1, None, &mut sink);
        assert_eq!(sink.sent.len(), 2);
        assert!(!engine.snapshot().valid);
    }

    #[test]
    fn test_press_release_queries_and_snapshot() {
        let mut engine = engine_with(OutputType::Gamepad, &[]);
        let mut sink = RecordingSink::default();
        assert!(!engine.button_pressed(Buttons::A));

        engine.process_input(0, &pressed(Buttons::A), &mut sink);
        assert!(engine.button_pressed(Buttons::A));
        assert!(!engine.button_released(Buttons::A));

        engine.process_input(1, &pressed(Buttons::A), &mut sink);
        assert!(!engine.button_pressed(Buttons::A));

        engine.process_input(2, &pressed(Buttons::NONE), &mut sink);
        assert!(engine.button_released(Buttons::A));

        let snapshot = engine.snapshot();
        assert!(snapshot.valid);
        assert_eq!(snapshot.state, pressed(Buttons::NONE));

        engine.reset_input();
        assert!(!engine.snapshot().valid);
    }

    #[test]
    fn test_release_all_neutralizes_enabled_reports() {
        let mut engine = engine_with(
            OutputType::Combo,
            &[Mapping::new(Buttons::A, MappingAction::Key(0x04))],
        );
        let mut sink = RecordingSink::default();
        engine.tick(0, Some(&pressed(Buttons::A)), &mut sink);
        sink.sent.clear();

        engine.release_all(&mut sink);
        assert_eq!(
            sink.sent,
            [
                Report::Keyboard(KeyboardReport::released()),
                Report::Mouse(MouseReport::new(0, 0, 0)),
            ]
        );

        // History is gone: holding A again is a fresh press
        engine.tick(1, Some(&pressed(Buttons::A)), &mut sink);
        assert_eq!(sink.sent.last(), Some(&Report::Keyboard(KeyboardReport::single(0x04))));
    }
}
