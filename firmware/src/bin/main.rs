#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{UART1, USB};
use embassy_rp::uart::{Async, Config as UartConfig, Uart, UartRx, UartTx};
use embassy_rp::usb::Driver;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::{Builder, Config as UsbConfig};
use gamebot_firmware::{
    configure_usb_hid, pump_reports, pump_rx, pump_tx, ChannelReportSink, ChannelSerial, Gamebot,
    GamebotConfig, JoystickReport, ReportChannel, RxChannel, TickClock, TxChannel,
    UsbStateHandler, BAUD_RATE,
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

/// Millisecond counters shared by the tick task and the main loop.
static CLOCK: TickClock = TickClock::new();

static RX_CHANNEL: RxChannel = RxChannel::new();
static TX_CHANNEL: TxChannel = TxChannel::new();
static REPORT_CHANNEL: ReportChannel = ReportChannel::new();
static USB_CONFIGURED: AtomicBool = AtomicBool::new(false);

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static HID_STATE: StaticCell<State> = StaticCell::new();
static USB_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("gamebot starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BAUD_RATE;

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
    let (uart_tx, uart_rx) = uart.split();

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Gamepad");
    usb_config.product = Some("Gamebot Serial Joystick");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );
    builder.handler(USB_HANDLER.init(UsbStateHandler::new(&USB_CONFIGURED)));

    let hid_state = HID_STATE.init(State::new());
    let hid_writer = configure_usb_hid(&mut builder, hid_state);

    let usb_device = builder.build();

    // --- Command pipeline ---
    let gamebot = Gamebot::new(&CLOCK, GamebotConfig::default());
    let serial = ChannelSerial::new(&RX_CHANNEL, &TX_CHANNEL);
    let sink = ChannelReportSink::new(&REPORT_CHANNEL, &USB_CONFIGURED);

    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(tick_task(&CLOCK).unwrap());
    spawner.spawn(uart_rx_task(uart_rx).unwrap());
    spawner.spawn(uart_tx_task(uart_tx).unwrap());
    spawner.spawn(hid_task(hid_writer).unwrap());
    spawner.spawn(control_task(gamebot, serial, sink).unwrap());

    info!("gamebot initialized, waiting for commands...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Advances the shared clock once per millisecond.
#[embassy_executor::task]
async fn tick_task(clock: &'static TickClock) {
    info!("tick task started");
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        clock.tick();
    }
}

#[embassy_executor::task]
async fn uart_rx_task(rx: UartRx<'static, Async>) {
    pump_rx(rx, &RX_CHANNEL).await
}

#[embassy_executor::task]
async fn uart_tx_task(tx: UartTx<'static, Async>) {
    pump_tx(tx, &TX_CHANNEL).await
}

#[embassy_executor::task]
async fn hid_task(writer: HidWriter<'static, Driver<'static, USB>, { JoystickReport::SIZE }>) {
    pump_reports(writer, &REPORT_CHANNEL).await
}

/// Main loop - polls the command pipeline, yielding between passes.
#[embassy_executor::task]
async fn control_task(
    mut gamebot: Gamebot<'static>,
    mut serial: ChannelSerial,
    mut sink: ChannelReportSink,
) {
    gamebot.write_banner();
    loop {
        gamebot.poll(&mut serial, &mut sink);
        yield_now().await;
    }
}
