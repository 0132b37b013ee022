//! Packet framing on top of a byte ring.
//!
//! Frame format:
//!
//! ```text
//! 'P' LEN PAYLOAD[L] CHECKSUM 'E'
//! ```
//!
//! - `LEN` carries the payload length `L` (0..=15) in both nibbles, XOR-ed
//!   with `0xF0`: `LEN = (L | L << 4) ^ 0xF0`. A byte whose nibbles disagree
//!   after un-inverting is not a length byte.
//! - `CHECKSUM` is the low byte of the payload's CRC-32 (see [`crate::crc`]).
//!
//! The decoder resynchronises by discarding one byte at a time whenever the
//! bytes at the head of the ring cannot start a frame.

use core::fmt;

use heapless::Vec;

use crate::crc::frame_checksum;
use crate::ring::RingBuffer;

/// Start-of-frame marker.
pub const FRAME_START: u8 = b'P';

/// End-of-frame marker.
pub const FRAME_END: u8 = b'E';

/// Largest payload a frame can carry.
pub const MAX_PAYLOAD_LEN: usize = 15;

/// START + LEN + CHECKSUM + END.
pub const MIN_FRAME_LEN: usize = 4;

/// Largest encoded frame.
pub const MAX_FRAME_LEN: usize = MIN_FRAME_LEN + MAX_PAYLOAD_LEN;

/// Mask applied to the doubled length nibble.
pub const LENGTH_INVERT: u8 = 0xF0;

/// Owned frame payload.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Errors that can occur while framing or unframing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload is longer than [`MAX_PAYLOAD_LEN`].
    PayloadTooLarge,
    /// Frame was well-formed but the checksum did not match.
    Checksum,
    /// Output buffer cannot hold the encoded frame.
    BufferTooSmall,
    /// Not enough bytes for a complete frame yet.
    Incomplete,
    /// Bytes do not form a frame (bad marker or length byte).
    InvalidFrame,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Incomplete => write!(f, "incomplete frame"),
            Self::InvalidFrame => write!(f, "invalid frame"),
        }
    }
}

/// Encode a payload length into the LEN byte.
#[inline]
#[must_use]
pub const fn encode_length(len: u8) -> u8 {
    let len = len & 0x0F;
    (len | (len << 4)) ^ LENGTH_INVERT
}

/// Decode a LEN byte. `None` if the nibbles disagree.
#[inline]
#[must_use]
pub const fn decode_length(byte: u8) -> Option<u8> {
    let raw = byte ^ LENGTH_INVERT;
    if raw >> 4 == raw & 0x0F {
        Some(raw & 0x0F)
    } else {
        None
    }
}

/// A decoded frame. Only the payload survives decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    payload: Payload,
}

impl Frame {
    /// Build a frame around a copy of `payload`.
    pub fn new(payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Payload::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { payload })
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Size of this frame on the wire.
    #[inline]
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        MIN_FRAME_LEN + self.payload.len()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame({=[u8]:x})", self.payload.as_slice())
    }
}

/// Append a framed payload to `ring`.
///
/// Bytes are pushed one at a time and are subject to the ring's saturation
/// policy; callers that care check [`RingBuffer::free`] first.
pub fn encode<const N: usize>(payload: &[u8], ring: &mut RingBuffer<N>) -> Result<(), FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge);
    }
    ring.push(FRAME_START);
    ring.push(encode_length(payload.len() as u8));
    ring.push_slice(payload);
    ring.push(frame_checksum(payload));
    ring.push(FRAME_END);
    Ok(())
}

/// Encode a framed payload into a flat buffer.
///
/// Returns the number of bytes written.
pub fn encode_into(payload: &[u8], buf: &mut [u8]) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge);
    }
    let frame_len = MIN_FRAME_LEN + payload.len();
    if buf.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    buf[0] = FRAME_START;
    buf[1] = encode_length(payload.len() as u8);
    buf[2..2 + payload.len()].copy_from_slice(payload);
    buf[2 + payload.len()] = frame_checksum(payload);
    buf[3 + payload.len()] = FRAME_END;

    Ok(frame_len)
}

/// Counters kept by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeStats {
    /// Frames delivered with a valid checksum.
    pub frames: u32,
    /// Well-formed frames rejected for a bad checksum.
    pub checksum_errors: u32,
    /// Bytes discarded while hunting for a frame start.
    pub discarded: u32,
}

/// Frame decoder over a [`RingBuffer`].
///
/// Holds no partial-frame state: everything it needs stays in the ring
/// until a complete frame is present, so it can be called at any time.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    stats: DecodeStats,
}

impl FrameCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stats: DecodeStats {
                frames: 0,
                checksum_errors: 0,
                discarded: 0,
            },
        }
    }

    #[inline]
    #[must_use]
    pub const fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Try to take one frame off the front of `ring`.
    ///
    /// - `None`: not enough bytes for a frame yet; nothing consumed except
    ///   garbage in front of a possible frame start.
    /// - `Some(Ok(frame))`: a valid frame was consumed.
    /// - `Some(Err(FrameError::Checksum))`: a well-formed frame with a bad
    ///   checksum was consumed and dropped.
    pub fn decode<const N: usize>(
        &mut self,
        ring: &mut RingBuffer<N>,
    ) -> Option<Result<Frame, FrameError>> {
        loop {
            let available = ring.used();
            if available < MIN_FRAME_LEN {
                return None;
            }

            if ring.peek(0) != FRAME_START {
                self.discard(ring);
                continue;
            }

            let Some(len) = decode_length(ring.peek(1)) else {
                self.discard(ring);
                continue;
            };
            let len = usize::from(len);

            let expected = MIN_FRAME_LEN + len;
            if available < expected {
                return None;
            }

            if ring.peek(expected - 1) != FRAME_END {
                self.discard(ring);
                continue;
            }

            // START, LEN
            ring.pop();
            ring.pop();
            let mut bytes = [0u8; MAX_PAYLOAD_LEN];
            for slot in bytes.iter_mut().take(len) {
                *slot = ring.pop();
            }
            let checksum = ring.pop();
            // END
            ring.pop();

            let payload = &bytes[..len];
            if frame_checksum(payload) != checksum {
                self.stats.checksum_errors = self.stats.checksum_errors.saturating_add(1);
                return Some(Err(FrameError::Checksum));
            }

            self.stats.frames = self.stats.frames.saturating_add(1);
            return Some(Frame::new(payload));
        }
    }

    /// Decode a single frame at the start of `bytes`.
    ///
    /// Host-side counterpart of [`decode`](Self::decode) for flat buffers.
    /// Does not resynchronise. Returns the frame and the number of bytes it
    /// occupied.
    pub fn decode_slice(bytes: &[u8]) -> Result<(Frame, usize), FrameError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(FrameError::Incomplete);
        }
        if bytes[0] != FRAME_START {
            return Err(FrameError::InvalidFrame);
        }
        let len = usize::from(decode_length(bytes[1]).ok_or(FrameError::InvalidFrame)?);
        let expected = MIN_FRAME_LEN + len;
        if bytes.len() < expected {
            return Err(FrameError::Incomplete);
        }
        if bytes[expected - 1] != FRAME_END {
            return Err(FrameError::InvalidFrame);
        }

        let payload = &bytes[2..2 + len];
        if frame_checksum(payload) != bytes[2 + len] {
            return Err(FrameError::Checksum);
        }
        Ok((Frame::new(payload)?, expected))
    }

    fn discard<const N: usize>(&mut self, ring: &mut RingBuffer<N>) {
        ring.pop();
        self.stats.discarded = self.stats.discarded.saturating_add(1);
    }
}
