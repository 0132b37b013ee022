//! USB HID joystick output.

use defmt::{info, warn};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::{Builder, Handler};
use gamebot_core::{JoystickReport, OutputError, ReportSink};
use portable_atomic::{AtomicBool, Ordering};

/// One report in flight between the main loop and the HID task.
pub type ReportChannel = Channel<CriticalSectionRawMutex, JoystickReport, 1>;

/// HID Joystick Report Descriptor.
///
/// Matches [`JoystickReport::as_bytes`]:
/// - 14 buttons, 2 bits padding
/// - hat switch (4 bits, 8 = centered), 4 bits padding
/// - 4 axes (X, Y, Z, Rz), unsigned 8-bit, 0x80 centered
/// - 1 vendor byte
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Buttons (14 buttons) ---
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x35, 0x00, //   Physical Minimum (0)
    0x45, 0x01, //   Physical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x0E, //   Report Count (14)
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x0E, //   Usage Maximum (Button 14)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x01, //   Input (Constant)
    //
    // --- Hat switch ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x25, 0x07, //   Logical Maximum (7)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x65, 0x14, //   Unit (English Rotation, Degrees)
    0x09, 0x39, //   Usage (Hat Switch)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x65, 0x00, //   Unit (None)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x01, //   Input (Constant)
    //
    // --- Sticks ---
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x46, 0xFF, 0x00, //   Physical Maximum (255)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Vendor byte ---
    0x06, 0x00, 0xFF, //   Usage Page (Vendor Defined)
    0x09, 0x20, //   Usage (0x20)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];

/// Tracks whether the host has configured the device.
pub struct UsbStateHandler {
    configured: &'static AtomicBool,
}

impl UsbStateHandler {
    #[must_use]
    pub const fn new(configured: &'static AtomicBool) -> Self {
        Self { configured }
    }
}

impl Handler for UsbStateHandler {
    fn reset(&mut self) {
        self.configured.store(false, Ordering::Release);
    }

    fn configured(&mut self, configured: bool) {
        self.configured.store(configured, Ordering::Release);
        if configured {
            info!("USB configured");
        } else {
            info!("USB unconfigured");
        }
    }
}

/// [`ReportSink`] handing reports to the HID task.
///
/// A report counts as accepted once it sits in the channel; while the
/// previous one is still waiting for the endpoint the sink reports
/// [`OutputError::Busy`].
pub struct ChannelReportSink {
    channel: &'static ReportChannel,
    configured: &'static AtomicBool,
}

impl ChannelReportSink {
    #[must_use]
    pub const fn new(channel: &'static ReportChannel, configured: &'static AtomicBool) -> Self {
        Self {
            channel,
            configured,
        }
    }
}

impl ReportSink for ChannelReportSink {
    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }

    fn try_send(&mut self, report: &JoystickReport) -> Result<(), OutputError> {
        if !self.is_configured() {
            return Err(OutputError::NotReady);
        }
        self.channel
            .try_send(*report)
            .map_err(|_| OutputError::Busy)
    }
}

/// Write every report from `channel` to the interrupt IN endpoint.
pub async fn pump_reports(
    mut writer: HidWriter<'static, Driver<'static, USB>, { JoystickReport::SIZE }>,
    channel: &'static ReportChannel,
) -> ! {
    writer.ready().await;
    info!("USB HID ready");

    loop {
        let report = channel.receive().await;
        if let Err(e) = writer.write(&report.as_bytes()).await {
            warn!("HID write error: {:?}", e);
        }
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
) -> HidWriter<'d, Driver<'d, USB>, { JoystickReport::SIZE }> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 1,
        max_packet_size: JoystickReport::SIZE as u16,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
