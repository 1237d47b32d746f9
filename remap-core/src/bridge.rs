//! ConverterBridge: drives the remap engine from an input source into a
//! report sink, one tick at a time.

use crate::engine::RemapEngine;
use crate::input::InputSource;
use crate::output::ReportSink;
use crate::status::AppState;

/// Owns the input source, the report sink and the engine between them.
///
/// The bridge is the single writer of engine state; callers hand it a
/// millisecond timestamp once per tick and it does the rest.
///
/// # Disconnects
///
/// When the input device goes away the bridge releases every enabled report
/// on the host, so no key or button stays held. This happens in every app
/// state, including the sticky `ConfigMode` and `Error`.
pub struct ConverterBridge<I, O> {
    input: I,
    output: O,
    engine: RemapEngine,
    state: AppState,
    connected: bool,
}

impl<I: InputSource, O: ReportSink> ConverterBridge<I, O> {
    /// Create a new bridge. Starts in [`AppState::Init`].
    pub fn new(input: I, output: O, engine: RemapEngine) -> Self {
        Self {
            input,
            output,
            engine,
            state: AppState::Init,
            connected: false,
        }
    }

    /// Run one control loop tick at time `now` (milliseconds).
    ///
    /// Polls the input once, feeds a valid snapshot through edge detection
    /// and mapping dispatch, then advances the macro scheduler by one step
    /// whether or not input arrived. Returns the application state after
    /// the tick.
    pub fn process_one(&mut self, now: u32) -> AppState {
        self.track_connection();

        let input = if self.input.is_connected() {
            self.input.poll()
        } else {
            None
        };
        self.engine.tick(now, input.as_ref(), &mut self.output);
        self.state
    }

    fn track_connection(&mut self) {
        let connected = self.input.is_connected();
        if connected != self.connected {
            self.connected = connected;
            if connected {
                info!("Input device connected");
            } else {
                // Whatever the app state, nothing may stay held on the host
                info!("Input device disconnected");
                self.engine.release_all(&mut self.output);
            }
        }

        self.state = match (self.state, connected) {
            (AppState::Init | AppState::WaitingForInput, true) => AppState::Active,
            (AppState::Init | AppState::Active, false) => AppState::WaitingForInput,
            (state, _) => state,
        };
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Force a state, e.g. [`AppState::ConfigMode`] while a host tool edits
    /// the configuration. `ConfigMode` and `Error` are only left through
    /// another call to this method.
    pub fn set_state(&mut self, state: AppState) {
        if self.state != state {
            debug!("App state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn engine(&self) -> &RemapEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RemapEngine {
        &mut self.engine
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Decompose the bridge into its parts.
    pub fn into_parts(self) -> (I, O, RemapEngine) {
        (self.input, self.output, self.engine)
    }
}
