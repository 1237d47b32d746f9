//! Controller input types and input-side transport codecs for the joystick converter.
//!
//! - **Types**: the per-tick input snapshot consumed by the remapping engine
//!   - [`Buttons`] - 16-bit button bitfield
//!   - [`AnalogStick`] - Analog stick X/Y position
//!   - [`Dpad`] - Two-axis d-pad value
//!   - [`InputState`] - Complete controller snapshot
//!
//! - **HID**: decode raw gamepad input reports ([`parse_report`])
//!
//! - **Framing**: carry HID input reports over UART
//!   - [`FrameDecoder`] - Byte-at-a-time frame decoder
//!   - [`encode_frame()`] - Build a frame for host tooling
//!
//! # Frame Format
//!
//! ```text
//! 0xA5 <len> <payload...> <crc8>
//! ```
//!
//! - `0xA5` - Frame header
//! - `len` - Payload length in bytes (1-32)
//! - `payload` - Raw HID gamepad input report
//! - `crc8` - CRC-8/SMBUS over `len` and `payload`
//!
//! # Example
//!
//! ```
//! use input_proto::{encode_frame, parse_report, Buttons, FrameDecoder};
//!
//! let report = [0x01, 0x00, 0xE8, 0x03, 0x18, 0xFC, 0, 0];
//! let mut buf = [0u8; 40];
//! let len = encode_frame(&report, &mut buf).unwrap();
//!
//! let mut decoder = FrameDecoder::new();
//! let frame = buf[..len]
//!     .iter()
//!     .find_map(|&b| decoder.push(b))
//!     .unwrap()
//!     .unwrap();
//!
//! let state = parse_report(frame.payload()).unwrap();
//! assert!(state.buttons.is_pressed(Buttons::A));
//! assert_eq!(state.left_stick.x, 1000);
//! assert_eq!(state.left_stick.y, -1000);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable [`encode_frame_to_vec()`]
//! - **`embedded-io`**: Enable [`write_frame_io()`] for I/O peripherals

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod frame;
pub mod hid;
pub mod types;

pub use frame::{calculate_crc8, encode_frame, Frame, FrameDecoder, FrameError, FRAME_HEADER, MAX_FRAME_SIZE, MAX_PAYLOAD_LEN};
#[cfg(feature = "heapless")]
pub use frame::encode_frame_to_vec;
#[cfg(feature = "embedded-io")]
pub use frame::write_frame_io;
pub use hid::{parse_report, HidReportError, MIN_REPORT_LEN, FULL_REPORT_LEN};
pub use types::{AnalogStick, Buttons, Dpad, InputState};
