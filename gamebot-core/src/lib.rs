//! Platform-agnostic command pipeline for the gamebot joystick emulator.
//!
//! A controlling host sends framed requests over a serial link; this crate
//! queues the joystick states they describe and plays them back, one timed
//! element at a time, as USB HID reports. Nothing here touches hardware:
//! the serial port and the HID endpoint are reached through traits, and
//! time comes from a [`TickClock`] advanced by a 1 ms tick source.
//!
//! # Overview
//!
//! - [`queue`]: Bounded FIFO of timed states ([`CommandQueue`])
//! - [`clock`]: Tick counters shared with the timer ([`TickClock`])
//! - [`scheduler`]: Playback state machine ([`PlaybackScheduler`])
//! - [`dispatch`]: Request execution ([`Dispatcher`])
//! - [`serial`]: Serial port trait ([`SerialPort`])
//! - [`hid`]: Report sink trait ([`ReportSink`])
//! - [`gamebot`]: The device context running all of the above ([`Gamebot`])
//!
//! # Main Loop
//!
//! ```text
//! loop {
//!     gamebot.poll(&mut serial, &mut hid);   // HID step, serial step, playback step
//! }
//! // elsewhere, every millisecond:
//! CLOCK.tick();
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod gamebot;
pub mod hid;
pub mod queue;
pub mod scheduler;
pub mod serial;

pub use clock::TickClock;
pub use config::{
    GamebotConfig, BANNER, BAUD_RATE, DEFAULT_PRESS_MS, ECHO_INTERVAL_MS, ECHO_TIMES, QUEUE_SIZE,
    RING_SIZE,
};
pub use dispatch::{DeviceStatus, DispatchContext, Dispatcher};
pub use gamebot::Gamebot;
pub use hid::{OutputError, ReportSink};
pub use queue::{CommandElement, CommandQueue};
pub use scheduler::{PlaybackScheduler, PlaybackState, StepOutcome};
pub use serial::{SerialError, SerialPort};

// Wire types used throughout the public API.
pub use gamebot_proto::{
    Buttons, Hat, JoystickReport, Reply, ReplyCode, Request, RequestError, RingBuffer, Stick,
};
