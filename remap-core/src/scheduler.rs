//! Tick-driven macro scheduler.
//!
//! At most one macro runs at a time. Each [`MacroScheduler::tick`] dispatches
//! at most one step; only [`MacroStep::Delay`] stays on the same step across
//! ticks. A running macro ends only by running out of steps.

use crate::encoder::OutputEncoder;
use crate::macros::{MacroError, MacroStep, MacroTable};
use crate::output::ReportSink;

/// Scheduler state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroState {
    #[default]
    Idle,
    Running {
        macro_id: u8,
        step_index: usize,
        /// Millisecond timestamp at which the current step became active.
        step_start: u32,
    },
}

/// What a single [`MacroScheduler::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Nothing running.
    Idle,
    /// The running macro had no steps left (or vanished) and is now finished.
    Finished(u8),
    /// The current step was dispatched and the macro advanced.
    Advanced(MacroStep),
    /// A delay step is still waiting.
    Waiting,
    /// An unsupported step was skipped.
    Skipped(u8),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacroScheduler {
    state: MacroState,
}

impl MacroScheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: MacroState::Idle,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> MacroState {
        self.state
    }

    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, MacroState::Running { .. })
    }

    /// Start macro `macro_id` at step 0.
    ///
    /// Requests are never queued: while another macro runs every request is
    /// rejected, whether or not `macro_id` exists.
    ///
    /// # Errors
    ///
    /// - [`MacroError::AlreadyRunning`] if a macro is running.
    /// - [`MacroError::NotFound`] if `macro_id` is not in `macros`.
    pub fn execute(&mut self, macro_id: u8, now: u32, macros: &MacroTable) -> Result<(), MacroError> {
        if let MacroState::Running { macro_id: current, .. } = self.state {
            warn!(
                "Macro {} already executing, ignoring request for {}",
                current, macro_id
            );
            return Err(MacroError::AlreadyRunning(macro_id));
        }

        let Some(mac) = macros.get(macro_id) else {
            warn!("Macro {} not found", macro_id);
            return Err(MacroError::NotFound(macro_id));
        };

        info!("Executing macro {} with {} steps", macro_id, mac.len());
        self.state = MacroState::Running {
            macro_id,
            step_index: 0,
            step_start: now,
        };
        Ok(())
    }

    /// Advance the running macro by at most one output step.
    ///
    /// A delay that has expired is consumed in the same tick as the step that
    /// follows it, so an action scheduled after `Delay(ms)` fires exactly
    /// when the delay ends. At most one report-producing step is dispatched
    /// per tick.
    ///
    /// `now` is a free-running millisecond clock; elapsed time is computed
    /// with wrapping subtraction so delays survive counter rollover.
    pub fn tick<S: ReportSink>(
        &mut self,
        now: u32,
        macros: &MacroTable,
        encoder: &OutputEncoder,
        sink: &mut S,
    ) -> TickOutcome {
        let MacroState::Running {
            macro_id,
            mut step_index,
            mut step_start,
        } = self.state
        else {
            return TickOutcome::Idle;
        };
        let Some(mac) = macros.get(macro_id) else {
            self.state = MacroState::Idle;
            warn!("Macro {} no longer exists, stopping", macro_id);
            return TickOutcome::Finished(macro_id);
        };

        let mut outcome = TickOutcome::Waiting;
        loop {
            let Some(&step) = mac.step(step_index) else {
                if outcome == TickOutcome::Waiting {
                    self.state = MacroState::Idle;
                    info!("Macro {} execution complete", macro_id);
                    return TickOutcome::Finished(macro_id);
                }
                break;
            };

            match step {
                MacroStep::Delay(ms) => {
                    if now.wrapping_sub(step_start) < u32::from(ms) {
                        break;
                    }
                    debug!("Macro delay {} ms complete", ms);
                    outcome = TickOutcome::Advanced(step);
                    step_index += 1;
                    step_start = now;
                    continue;
                }
                MacroStep::KeyPress(keycode) => {
                    encoder.key_press(sink, keycode);
                    debug!("Macro key press {}", keycode);
                    outcome = TickOutcome::Advanced(step);
                }
                MacroStep::KeyRelease => {
                    encoder.keys_released(sink);
                    debug!("Macro key release");
                    outcome = TickOutcome::Advanced(step);
                }
                MacroStep::MouseMove { dx, dy } => {
                    encoder.mouse(sink, 0, dx, dy);
                    debug!("Macro mouse move ({}, {})", dx, dy);
                    outcome = TickOutcome::Advanced(step);
                }
                MacroStep::MouseButtonPress(mask) => {
                    encoder.mouse(sink, mask, 0, 0);
                    debug!("Macro mouse button press {}", mask);
                    outcome = TickOutcome::Advanced(step);
                }
                MacroStep::MouseButtonRelease => {
                    encoder.mouse(sink, 0, 0, 0);
                    debug!("Macro mouse button release");
                    outcome = TickOutcome::Advanced(step);
                }
                MacroStep::Unknown(action) => {
                    warn!(
                        "Macro {} step {}: unknown action {}, skipping",
                        macro_id, step_index, action
                    );
                    outcome = TickOutcome::Skipped(action);
                }
            }
            step_index += 1;
            step_start = now;
            break;
        }

        self.state = MacroState::Running {
            macro_id,
            step_index,
            step_start,
        };
        outcome
    }
}
