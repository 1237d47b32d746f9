#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::flash::Flash;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{UART1, USB};
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_rp::usb::Driver;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use joystick_converter::{
    configure_usb_hid, load_config, now_ms, AppState, ConverterBridge, InputLink, MacroTable,
    RemapEngine, ReportQueue, StatusPin, UartInputSource, UartReceiver, UsbHidOutput,
    UsbReportSink,
};
use portable_atomic::AtomicBool;
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Latest input snapshot from the UART task.
static INPUT_LINK: InputLink = InputLink::new();

/// Reports from the control loop to the USB output task.
static REPORT_QUEUE: ReportQueue = ReportQueue::new();

/// Set once the host has configured the HID interface.
static USB_READY: AtomicBool = AtomicBool::new(false);

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();

type Bridge = ConverterBridge<UartInputSource<'static>, UsbReportSink<'static>>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Joystick converter starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Configuration ---
    let mut flash = Flash::new_blocking(p.FLASH);
    let config = load_config(&mut flash);

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;

    #[cfg(not(feature = "uart-flow-control"))]
    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    #[cfg(feature = "uart-flow-control")]
    let uart = Uart::new_with_rtscts(
        p.UART1,
        p.PIN_8,  // TX
        p.PIN_9,  // RX
        p.PIN_11, // RTS
        p.PIN_10, // CTS
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (_tx, rx) = uart.split();
    let receiver = UartReceiver::new(rx, &INPUT_LINK);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Gamepad");
    usb_config.product = Some("Joystick Converter");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 256]),
        CONTROL_BUF.init([0; 64]),
    );

    let hid_writer = configure_usb_hid(&mut builder, HID_STATE.init(State::new()));
    let usb_device = builder.build();
    let usb_output = UsbHidOutput::new(hid_writer, &REPORT_QUEUE, &USB_READY);

    // --- Engine ---
    let engine = RemapEngine::new(config, MacroTable::new());
    let bridge = ConverterBridge::new(
        UartInputSource::new(&INPUT_LINK),
        UsbReportSink::new(&REPORT_QUEUE, &USB_READY),
        engine,
    );

    // On-board LED on Pico
    let led = StatusPin::new(Output::new(p.PIN_25, Level::High));

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(uart_task(receiver).unwrap());
    spawner.spawn(output_task(usb_output).unwrap());
    spawner.spawn(control_task(bridge, led).unwrap());

    info!("Initialization complete, waiting for input device...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// UART task - decodes input frames into the shared input link.
#[embassy_executor::task]
async fn uart_task(mut receiver: UartReceiver<'static>) {
    receiver.run().await
}

/// Output task - drains the report queue into the HID endpoint.
#[embassy_executor::task]
async fn output_task(mut output: UsbHidOutput<'static>) {
    output.run().await
}

/// Control loop - one engine tick per millisecond, plus the status LED.
#[embassy_executor::task]
async fn control_task(mut bridge: Bridge, mut led: StatusPin<Output<'static>>) {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    let mut last_state = AppState::Init;

    loop {
        let now = now_ms();
        let state = bridge.process_one(now);
        if state != last_state {
            info!("State: {:?}", state);
            last_state = state;
        }
        led.update(now, state);
        ticker.next().await;
    }
}
