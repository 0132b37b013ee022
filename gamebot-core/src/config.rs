//! Compile-time defaults and runtime settings.

/// Copies of each new report pushed to the host.
pub const ECHO_TIMES: u8 = 3;

/// Minimum spacing between copies, in milliseconds.
pub const ECHO_INTERVAL_MS: u8 = 2;

/// Hold time for press commands that carry no duration.
pub const DEFAULT_PRESS_MS: u16 = 55;

/// Slots in each serial ring.
pub const RING_SIZE: usize = 32;

/// Slots in the command queue (one is kept free).
pub const QUEUE_SIZE: usize = 8;

/// Serial link speed used by the firmware.
pub const BAUD_RATE: u32 = 9600;

/// Written to the serial link once at start-up.
pub const BANNER: &[u8] = b"\r\ngamebot-serial 1.0\r\n";

/// Playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamebotConfig {
    /// Copies of each new report to send.
    pub echo_times: u8,
    /// Milliseconds between copies.
    pub echo_interval_ms: u8,
    /// Initial default press duration (changeable at runtime).
    pub default_press_ms: u16,
    /// Do not let an element expire until the host has seen it at least once.
    pub hold_until_delivered: bool,
}

impl GamebotConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            echo_times: ECHO_TIMES,
            echo_interval_ms: ECHO_INTERVAL_MS,
            default_press_ms: DEFAULT_PRESS_MS,
            hold_until_delivered: true,
        }
    }
}

impl Default for GamebotConfig {
    fn default() -> Self {
        Self::new()
    }
}
