//! USB HID composite output: gamepad, keyboard and mouse behind one
//! interface, told apart by report ID.

use defmt::{info, warn};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use portable_atomic::{AtomicBool, Ordering};
use remap_core::{OutputError, Report, ReportSink};

/// Report ID byte plus the largest report.
pub const MAX_PACKET_SIZE: usize = 16;

/// Reports waiting for the USB endpoint.
const QUEUE_DEPTH: usize = 8;

pub type ReportQueue = Channel<CriticalSectionRawMutex, Report, QUEUE_DEPTH>;

type UsbDriver<'d> = Driver<'d, USB>;

/// Composite HID report descriptor.
///
/// - Report 1: gamepad, 16 buttons, 4 x 16-bit axes, 2 x 8-bit triggers,
///   4-bit hat switch (13 bytes)
/// - Report 2: boot-style keyboard, modifiers, reserved byte, 6 key slots
/// - Report 3: mouse, 5 buttons, relative X/Y and wheel
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    //
    // --- Buttons (16 buttons) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x10, //   Usage Maximum (Button 16)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x10, //   Report Count (16)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Sticks (LX, LY, RX, RY) ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x16, 0x00, 0x80, //   Logical Minimum (-32768)
    0x26, 0xFF, 0x7F, //   Logical Maximum (32767)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Triggers ---
    0x09, 0x33, //   Usage (Rx)
    0x09, 0x34, //   Usage (Ry)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Hat switch, 8 = null ---
    0x09, 0x39, //   Usage (Hat switch)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x07, //   Logical Maximum (7)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x65, 0x14, //   Unit (English Rotation)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Constant) - padding
    0xC0, // End Collection
    //
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    //
    // --- Modifiers ---
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Constant) - reserved
    //
    // --- Key slots ---
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x06, //   Report Count (6)
    0x81, 0x00, //   Input (Data, Array, Absolute)
    0xC0, // End Collection
    //
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x03, //   Report ID (3)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    //
    // --- Buttons (5) ---
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (Button 1)
    0x29, 0x05, //     Usage Maximum (Button 5)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x05, //     Report Count (5)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x75, 0x03, //     Report Size (3)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x03, //     Input (Constant) - padding
    //
    // --- Movement and wheel ---
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection
    0xC0, // End Collection
];

/// Control loop side of the USB output.
///
/// Never blocks: reports go into a bounded queue drained by
/// [`UsbHidOutput::run`], and are dropped while the host has not configured
/// the device or the queue is full.
pub struct UsbReportSink<'d> {
    sender: Sender<'d, CriticalSectionRawMutex, Report, QUEUE_DEPTH>,
    ready: &'d AtomicBool,
}

impl<'d> UsbReportSink<'d> {
    pub fn new(queue: &'d ReportQueue, ready: &'d AtomicBool) -> Self {
        Self {
            sender: queue.sender(),
            ready,
        }
    }
}

impl ReportSink for UsbReportSink<'_> {
    fn send(&mut self, report: &Report) -> Result<(), OutputError> {
        self.sender.try_send(*report).map_err(|_| OutputError::NotReady)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }
}

/// USB side of the output: writes queued reports to the HID endpoint.
pub struct UsbHidOutput<'d> {
    writer: HidWriter<'d, UsbDriver<'d>, MAX_PACKET_SIZE>,
    queue: &'d ReportQueue,
    ready: &'d AtomicBool,
}

impl<'d> UsbHidOutput<'d> {
    pub fn new(
        writer: HidWriter<'d, UsbDriver<'d>, MAX_PACKET_SIZE>,
        queue: &'d ReportQueue,
        ready: &'d AtomicBool,
    ) -> Self {
        Self {
            writer,
            queue,
            ready,
        }
    }

    async fn wait_ready(&mut self) {
        self.writer.ready().await;
        self.ready.store(true, Ordering::Relaxed);
        info!("USB HID ready");
    }

    /// Forward queued reports forever, re-waiting for enumeration whenever
    /// the host disables the endpoint.
    pub async fn run(&mut self) -> ! {
        self.wait_ready().await;

        let mut buf = [0u8; Report::MAX_SIZE + 1];
        loop {
            let report = self.queue.receive().await;
            let len = report.write_with_id(&mut buf);
            match self.writer.write(&buf[..len]).await {
                Ok(()) => {}
                Err(EndpointError::Disabled) => {
                    warn!("USB endpoint disabled, waiting for host");
                    self.ready.store(false, Ordering::Relaxed);
                    self.queue.clear();
                    self.wait_ready().await;
                }
                Err(e) => warn!("USB write failed: {:?}", e),
            }
        }
    }
}

/// Configure the HID class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, UsbDriver<'d>>,
    state: &'d mut State<'d>,
) -> HidWriter<'d, UsbDriver<'d>, MAX_PACKET_SIZE> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 1,
        max_packet_size: MAX_PACKET_SIZE as u16,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
