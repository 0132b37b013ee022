//! Serial port trait and error types.

/// Error type for serial operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// UART/communication I/O error.
    Io,
    /// UART framing error.
    Framing,
    /// Receive overrun (bytes lost in hardware).
    Overrun,
    /// Line break detected.
    Break,
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "serial I/O error"),
            Self::Framing => write!(f, "framing error"),
            Self::Overrun => write!(f, "receive overrun"),
            Self::Break => write!(f, "line break"),
        }
    }
}

/// Non-blocking byte-oriented serial channel.
///
/// The main loop polls this once per iteration; none of the methods may
/// wait. Implementations typically sit on top of interrupt- or DMA-fed
/// queues.
pub trait SerialPort {
    /// Take one received byte if any is waiting.
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError>;

    /// Whether [`write_byte`](Self::write_byte) would be accepted right now.
    fn write_ready(&self) -> bool;

    /// Queue one byte for transmission. Only called after `write_ready()`.
    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError>;
}
