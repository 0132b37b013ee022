//! Serial packet protocol for the gamebot joystick emulator.
//!
//! This crate holds everything that crosses the serial link between the
//! controlling host and the device:
//!
//! - **Types**: joystick state as presented over USB
//!   - [`Buttons`] - Button bitfield
//!   - [`Hat`] - D-pad direction
//!   - [`Stick`] - Analog stick X/Y position
//!   - [`JoystickReport`] - Complete 8-byte HID input report
//!
//! - **Transport**: bytes in and out
//!   - [`RingBuffer`] - Fixed-size byte ring with overflow sentinel
//!   - [`FrameCodec`] - Decode frames out of a ring, with statistics
//!   - [`encode_frame`] / [`encode_frame_into`] - Frame a payload
//!
//! - **Messages**: what the frames carry
//!   - [`Request`] - Parsed host request
//!   - [`Reply`] - Device answer
//!
//! # Frame Format
//!
//! ```text
//! 'P' LEN PAYLOAD[0..=15] CHECKSUM 'E'
//! ```
//!
//! `LEN` repeats the payload length in both nibbles and is XOR-ed with `0xF0`.
//! `CHECKSUM` is the low byte of the payload's CRC-32.
//!
//! # Example
//!
//! ```
//! use gamebot_proto::{encode_frame, FrameCodec, Request, RingBuffer};
//!
//! let mut ring: RingBuffer = RingBuffer::new();
//! encode_frame(b"T", &mut ring).unwrap();
//!
//! let mut codec = FrameCodec::new();
//! let frame = codec.decode(&mut ring).unwrap().unwrap();
//! assert_eq!(Request::parse(frame.payload()), Ok(Request::Test));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod crc;
pub mod frame;
pub mod reply;
pub mod request;
pub mod ring;
pub mod types;

pub use crc::{crc32, frame_checksum, Crc32Digest};
pub use frame::{
    decode_length, encode as encode_frame, encode_into as encode_frame_into, encode_length,
    DecodeStats, Frame, FrameCodec, FrameError, Payload, FRAME_END, FRAME_START, MAX_FRAME_LEN,
    MAX_PAYLOAD_LEN, MIN_FRAME_LEN,
};
pub use reply::{
    DebugReport, PendingReport, Reply, ReplyCode, ReplyError, StateReport, FLAG_CONFIGURED,
};
pub use request::{Request, RequestCode, RequestError, Target};
pub use ring::{RingBuffer, DEFAULT_RING_SIZE, OVERFLOW_SENTINEL};
pub use types::{Buttons, Hat, InvalidHat, JoystickReport, Stick};
