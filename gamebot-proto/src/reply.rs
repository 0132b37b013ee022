//! Reply payloads sent back to the host.
//!
//! Most requests are answered with a single status byte ([`ReplyCode`]).
//! Query, pending and debug requests get a structured reply whose first
//! byte echoes the request code.

use core::fmt;

use crate::frame::{DecodeStats, FrameError};
use crate::request::RequestCode;

/// Single-byte reply codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReplyCode {
    Success = b'0',
    Error = b'1',
    Overflow = b'2',
    Alive = b'A',
}

impl TryFrom<u8> for ReplyCode {
    type Error = ReplyError;

    fn try_from(value: u8) -> Result<Self, ReplyError> {
        match value {
            b'0' => Ok(Self::Success),
            b'1' => Ok(Self::Error),
            b'2' => Ok(Self::Overflow),
            b'A' => Ok(Self::Alive),
            other => Err(ReplyError::UnknownCode(other)),
        }
    }
}

/// Errors produced while decoding a reply on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyError {
    Empty,
    UnknownCode(u8),
    Length,
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty reply"),
            Self::UnknownCode(code) => write!(f, "unknown reply code 0x{:02x}", code),
            Self::Length => write!(f, "bad reply length"),
        }
    }
}

/// Set in [`StateReport`] flags when the USB device is configured.
pub const FLAG_CONFIGURED: u8 = 0x01;

/// Answer to a query-state request.
///
/// Layout (14 bytes, big-endian):
///
/// ```text
/// 'Q' flags q_head q_tail q_len ticks[4] elapsed[4] echo_remaining
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateReport {
    pub configured: bool,
    pub queue_head: u8,
    pub queue_tail: u8,
    pub queue_len: u8,
    pub ticks: u32,
    pub elapsed_ms: u32,
    pub echo_remaining: u8,
}

impl StateReport {
    pub const SIZE: usize = 14;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = RequestCode::QueryState as u8;
        out[1] = if self.configured { FLAG_CONFIGURED } else { 0 };
        out[2] = self.queue_head;
        out[3] = self.queue_tail;
        out[4] = self.queue_len;
        out[5..9].copy_from_slice(&self.ticks.to_be_bytes());
        out[9..13].copy_from_slice(&self.elapsed_ms.to_be_bytes());
        out[13] = self.echo_remaining;
        out
    }

    pub fn decode(payload: &[u8]) -> Result<Self, ReplyError> {
        if payload.len() != Self::SIZE {
            return Err(ReplyError::Length);
        }
        Ok(Self {
            configured: payload[1] & FLAG_CONFIGURED != 0,
            queue_head: payload[2],
            queue_tail: payload[3],
            queue_len: payload[4],
            ticks: u32::from_be_bytes([payload[5], payload[6], payload[7], payload[8]]),
            elapsed_ms: u32::from_be_bytes([payload[9], payload[10], payload[11], payload[12]]),
            echo_remaining: payload[13],
        })
    }
}

/// Answer to a report-pending request: `['p', queued, free]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingReport {
    pub queued: u8,
    pub free: u8,
}

impl PendingReport {
    pub const SIZE: usize = 3;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        [RequestCode::ReportPending as u8, self.queued, self.free]
    }
}

/// Answer to a debug request.
///
/// `['D', rx_used, tx_used, frames[2], checksum_errors[2], discarded[2]]`,
/// counters big-endian and saturating at `u16::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebugReport {
    pub rx_used: u8,
    pub tx_used: u8,
    pub frames: u16,
    pub checksum_errors: u16,
    pub discarded: u16,
}

impl DebugReport {
    pub const SIZE: usize = 9;

    #[must_use]
    pub fn new(rx_used: usize, tx_used: usize, stats: DecodeStats) -> Self {
        Self {
            rx_used: saturate_u8(rx_used),
            tx_used: saturate_u8(tx_used),
            frames: saturate_u16(stats.frames),
            checksum_errors: saturate_u16(stats.checksum_errors),
            discarded: saturate_u16(stats.discarded),
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = RequestCode::Debug as u8;
        out[1] = self.rx_used;
        out[2] = self.tx_used;
        out[3..5].copy_from_slice(&self.frames.to_be_bytes());
        out[5..7].copy_from_slice(&self.checksum_errors.to_be_bytes());
        out[7..9].copy_from_slice(&self.discarded.to_be_bytes());
        out
    }
}

fn saturate_u8(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

fn saturate_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// A reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    Code(ReplyCode),
    State(StateReport),
    Pending(PendingReport),
    Debug(DebugReport),
}

impl From<ReplyCode> for Reply {
    fn from(code: ReplyCode) -> Self {
        Self::Code(code)
    }
}

impl Reply {
    pub const SUCCESS: Self = Self::Code(ReplyCode::Success);
    pub const ERROR: Self = Self::Code(ReplyCode::Error);
    pub const OVERFLOW: Self = Self::Code(ReplyCode::Overflow);
    pub const ALIVE: Self = Self::Code(ReplyCode::Alive);

    /// Encode the reply payload (without framing) into `buf`.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, FrameError> {
        match self {
            Self::Code(code) => copy_out(&[*code as u8], buf),
            Self::State(state) => copy_out(&state.to_bytes(), buf),
            Self::Pending(pending) => copy_out(&pending.to_bytes(), buf),
            Self::Debug(debug) => copy_out(&debug.to_bytes(), buf),
        }
    }

    /// Decode a reply payload.
    pub fn decode(payload: &[u8]) -> Result<Self, ReplyError> {
        let first = *payload.first().ok_or(ReplyError::Empty)?;
        if first == RequestCode::QueryState as u8 {
            return StateReport::decode(payload).map(Self::State);
        }
        if first == RequestCode::ReportPending as u8 {
            return match payload {
                [_, queued, free] => Ok(Self::Pending(PendingReport {
                    queued: *queued,
                    free: *free,
                })),
                _ => Err(ReplyError::Length),
            };
        }
        if first == RequestCode::Debug as u8 {
            if payload.len() != DebugReport::SIZE {
                return Err(ReplyError::Length);
            }
            return Ok(Self::Debug(DebugReport {
                rx_used: payload[1],
                tx_used: payload[2],
                frames: u16::from_be_bytes([payload[3], payload[4]]),
                checksum_errors: u16::from_be_bytes([payload[5], payload[6]]),
                discarded: u16::from_be_bytes([payload[7], payload[8]]),
            }));
        }
        if payload.len() != 1 {
            return Err(ReplyError::Length);
        }
        ReplyCode::try_from(first).map(Self::Code)
    }
}

fn copy_out(bytes: &[u8], buf: &mut [u8]) -> Result<usize, FrameError> {
    let dst = buf
        .get_mut(..bytes.len())
        .ok_or(FrameError::BufferTooSmall)?;
    dst.copy_from_slice(bytes);
    Ok(bytes.len())
}
