//! Serial-controlled USB joystick for RP2040.
//!
//! Glue between the hardware and the platform-agnostic [`gamebot_core`]
//! pipeline: UART bytes reach the main loop through channels, and joystick
//! reports leave it through a one-slot channel drained by the USB HID task.

#![no_std]

// Re-export core types for convenience
pub use gamebot_core::{
    Gamebot, GamebotConfig, JoystickReport, OutputError, ReportSink, SerialError, SerialPort,
    TickClock, BANNER, BAUD_RATE,
};

pub mod serial;
pub mod usb_output;

pub use serial::{pump_rx, pump_tx, ChannelSerial, RxChannel, TxChannel};
pub use usb_output::{
    configure_usb_hid, pump_reports, ChannelReportSink, ReportChannel, UsbStateHandler,
};
