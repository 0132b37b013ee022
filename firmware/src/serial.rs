//! UART transport for the command link.
//!
//! Two tasks move bytes between the UART and a pair of channels;
//! [`ChannelSerial`] gives the main loop non-blocking access to them.
//!
//! # Pins
//!
//! Uses UART1 by default:
//! - GPIO 8: TX
//! - GPIO 9: RX
//! - GPIO 10: CTS (optional, with `uart-flow-control` feature)
//! - GPIO 11: RTS (optional, with `uart-flow-control` feature)

use defmt::{error, warn};
use embassy_rp::uart::{Async, Error as UartError, UartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use gamebot_core::{SerialError, SerialPort};

/// Depth of each byte channel.
pub const CHANNEL_DEPTH: usize = 64;

/// Received bytes, or the line error that replaced one.
pub type RxChannel = Channel<CriticalSectionRawMutex, Result<u8, SerialError>, CHANNEL_DEPTH>;

/// Bytes waiting for the transmitter.
pub type TxChannel = Channel<CriticalSectionRawMutex, u8, CHANNEL_DEPTH>;

/// Convert UART errors to [`SerialError`].
///
/// A helper instead of a `From` impl: both types live in other crates.
#[inline]
fn uart_error_to_serial_error(e: UartError) -> SerialError {
    match e {
        UartError::Framing => SerialError::Framing,
        UartError::Overrun => SerialError::Overrun,
        UartError::Break => SerialError::Break,
        _ => SerialError::Io,
    }
}

/// [`SerialPort`] backed by the UART channels.
pub struct ChannelSerial {
    rx: &'static RxChannel,
    tx: &'static TxChannel,
}

impl ChannelSerial {
    #[must_use]
    pub const fn new(rx: &'static RxChannel, tx: &'static TxChannel) -> Self {
        Self { rx, tx }
    }
}

impl SerialPort for ChannelSerial {
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        match self.rx.try_receive() {
            Ok(item) => item.map(Some),
            Err(_) => Ok(None),
        }
    }

    fn write_ready(&self) -> bool {
        !self.tx.is_full()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        self.tx.try_send(byte).map_err(|_| SerialError::Io)
    }
}

/// Read the UART forever, forwarding each byte (or error) to `channel`.
///
/// Bytes arriving while the channel is full are dropped.
pub async fn pump_rx(mut rx: UartRx<'static, Async>, channel: &'static RxChannel) -> ! {
    let mut byte = [0u8; 1];
    loop {
        let item = match rx.read(&mut byte).await {
            Ok(()) => Ok(byte[0]),
            Err(e) => {
                error!("UART read error: {:?}", e);
                Err(uart_error_to_serial_error(e))
            }
        };
        if channel.try_send(item).is_err() {
            warn!("rx channel full, byte dropped");
        }
    }
}

/// Drain `channel` into the UART forever.
pub async fn pump_tx(mut tx: UartTx<'static, Async>, channel: &'static TxChannel) -> ! {
    loop {
        let byte = channel.receive().await;
        if let Err(e) = tx.write(&[byte]).await {
            error!("UART write error: {:?}", e);
        }
    }
}
