//! UART input: framed HID gamepad reports from the input side.

use defmt::{debug, warn};
use embassy_rp::uart::{Async, Error as UartError, UartRx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use input_proto::{parse_report, Frame, FrameDecoder, FrameError, HidReportError, InputState};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use remap_core::InputSource;

use crate::now_ms;

/// The input counts as disconnected after this long without a valid frame.
pub const LINK_TIMEOUT_MS: u32 = 500;

/// Shared state between the UART receive task and the control loop.
///
/// Uses a [`Signal`] so the control loop only ever sees the latest
/// snapshot; intermediate states that arrive between ticks are dropped.
pub struct InputLink {
    latest: Signal<CriticalSectionRawMutex, InputState>,
    last_frame_ms: AtomicU32,
    seen: AtomicBool,
}

impl InputLink {
    pub const fn new() -> Self {
        Self {
            latest: Signal::new(),
            last_frame_ms: AtomicU32::new(0),
            seen: AtomicBool::new(false),
        }
    }

    fn publish(&self, state: InputState, now: u32) {
        self.last_frame_ms.store(now, Ordering::Relaxed);
        self.seen.store(true, Ordering::Relaxed);
        self.latest.signal(state);
    }

    fn is_alive(&self, now: u32) -> bool {
        self.seen.load(Ordering::Relaxed)
            && now.wrapping_sub(self.last_frame_ms.load(Ordering::Relaxed)) < LINK_TIMEOUT_MS
    }
}

impl Default for InputLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive side: owns the UART and decodes frames into the [`InputLink`].
///
/// # Pins
///
/// Uses UART1 by default:
/// - GPIO 8: TX
/// - GPIO 9: RX
/// - GPIO 10: CTS (optional, with `uart-flow-control` feature)
/// - GPIO 11: RTS (optional, with `uart-flow-control` feature)
pub struct UartReceiver<'d> {
    rx: UartRx<'d, Async>,
    decoder: FrameDecoder,
    link: &'d InputLink,
}

impl<'d> UartReceiver<'d> {
    pub fn new(rx: UartRx<'d, Async>, link: &'d InputLink) -> Self {
        Self {
            rx,
            decoder: FrameDecoder::new(),
            link,
        }
    }

    /// Read bytes forever, publishing every valid report.
    pub async fn run(&mut self) -> ! {
        let mut byte = [0u8; 1];
        loop {
            if let Err(e) = self.rx.read(&mut byte).await {
                warn!("UART error: {:?}", uart_error_name(e));
                self.decoder.reset();
                continue;
            }
            let Some(result) = self.decoder.push(byte[0]) else {
                continue;
            };
            match decode(result) {
                Ok(state) => self.link.publish(state, now_ms()),
                Err(e) => debug!("Dropped input frame: {:?}", e),
            }
        }
    }
}

/// Control loop side of the [`InputLink`].
pub struct UartInputSource<'d> {
    link: &'d InputLink,
}

impl<'d> UartInputSource<'d> {
    pub fn new(link: &'d InputLink) -> Self {
        Self { link }
    }
}

impl InputSource for UartInputSource<'_> {
    fn poll(&mut self) -> Option<InputState> {
        self.link.latest.try_take()
    }

    fn is_connected(&self) -> bool {
        self.link.is_alive(now_ms())
    }
}

/// Why a received frame produced no input state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
enum DropReason {
    Frame(FrameError),
    Report(HidReportError),
}

impl From<FrameError> for DropReason {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<HidReportError> for DropReason {
    fn from(e: HidReportError) -> Self {
        Self::Report(e)
    }
}

fn decode(result: Result<Frame, FrameError>) -> Result<InputState, DropReason> {
    let frame = result?;
    Ok(parse_report(frame.payload())?)
}

fn uart_error_name(e: UartError) -> &'static str {
    match e {
        UartError::Framing => "framing",
        UartError::Break => "break",
        UartError::Overrun => "overrun",
        UartError::Parity => "parity",
        _ => "unknown",
    }
}
