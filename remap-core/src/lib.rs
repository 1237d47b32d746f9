//! Platform-agnostic remapping and macro engine for the joystick converter.
//!
//! Each control loop tick runs, in order:
//!
//! 1. [`EdgeDetector`] - diff the button bitmap against the previous tick
//! 2. mapping dispatch in [`RemapEngine`] - turn edges into keyboard, mouse
//!    or macro actions, or pass the whole snapshot through as a gamepad report
//! 3. [`MacroScheduler`] - advance the running macro by at most one step
//!
//! Every report goes through the [`OutputEncoder`], which drops what the
//! active [`OutputType`] does not carry and anything the [`ReportSink`] is
//! not ready for. Nothing here blocks, allocates or panics.
//!
//! # Example
//!
//! ```
//! use input_proto::{Buttons, InputState};
//! use remap_core::{
//!     Config, KeyboardReport, Mapping, MappingAction, MacroTable, OutputError, OutputType,
//!     RemapEngine, Report, ReportSink,
//! };
//!
//! struct LastReport(Option<Report>);
//!
//! impl ReportSink for LastReport {
//!     fn send(&mut self, report: &Report) -> Result<(), OutputError> {
//!         self.0 = Some(*report);
//!         Ok(())
//!     }
//!
//!     fn is_ready(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let mut config = Config::new(OutputType::Keyboard);
//! config.add_mapping(Mapping::new(Buttons::A, MappingAction::Key(0x04))).unwrap();
//! let mut engine = RemapEngine::new(config, MacroTable::new());
//! let mut sink = LastReport(None);
//!
//! let input = InputState { buttons: Buttons::A, ..InputState::neutral() };
//! engine.tick(0, Some(&input), &mut sink);
//! assert_eq!(sink.0, Some(Report::Keyboard(KeyboardReport::single(0x04))));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt and derive `defmt::Format` (embedded)
//! - **`log`**: Log through the `log` facade (host tools)

#![cfg_attr(not(feature = "std"), no_std)]

// Must come first so the logging macros are visible to every module below
#[macro_use]
mod fmt;

pub mod bridge;
pub mod detector;
pub mod encoder;
pub mod engine;
pub mod image;
pub mod input;
pub mod macros;
pub mod mapping;
pub mod output;
pub mod report;
pub mod scheduler;
pub mod status;

pub use bridge::ConverterBridge;
pub use detector::{ButtonEdge, EdgeDetector, Edges};
pub use encoder::OutputEncoder;
pub use engine::{stick_to_mouse, InputSnapshot, RemapEngine};
pub use image::{ImageError, IMAGE_MAGIC, IMAGE_VERSION, MAX_IMAGE_LEN};
pub use input::InputSource;
pub use macros::{Macro, MacroError, MacroStep, MacroTable, MAX_MACROS, MAX_MACRO_STEPS};
pub use mapping::{Config, ConfigError, Mapping, MappingAction, MappingTable, OutputType, MAX_MAPPINGS};
pub use output::{OutputError, ReportSink};
pub use report::{GamepadReport, KeyboardReport, MouseReport, Report};
pub use scheduler::{MacroScheduler, MacroState, TickOutcome};
pub use status::{AppState, StatusLed};

pub use input_proto;
