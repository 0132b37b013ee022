//! HID report sink trait and error types.

use gamebot_proto::JoystickReport;

/// Error type for report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
    /// Endpoint busy; the report was not taken and should be offered again.
    Busy,
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "output I/O error"),
            Self::NotReady => write!(f, "output not ready"),
            Self::Busy => write!(f, "endpoint busy"),
        }
    }
}

/// Destination for joystick reports (USB HID IN endpoint).
///
/// `try_send` must not block: a report that cannot be taken immediately is
/// refused with [`OutputError::Busy`] and offered again on a later poll.
pub trait ReportSink {
    /// Whether the host has configured the device.
    fn is_configured(&self) -> bool;

    /// Offer one report to the host.
    fn try_send(&mut self, report: &JoystickReport) -> Result<(), OutputError>;
}
