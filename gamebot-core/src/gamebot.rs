//! Gamebot: the device context tying serial, queue, playback and HID together.

use gamebot_proto::{
    encode_frame, DecodeStats, FrameCodec, FrameError, Reply, ReplyCode, RingBuffer,
    MAX_FRAME_LEN, MAX_PAYLOAD_LEN,
};

use crate::clock::TickClock;
use crate::config::{GamebotConfig, BANNER, QUEUE_SIZE, RING_SIZE};
use crate::dispatch::{DeviceStatus, DispatchContext, Dispatcher};
use crate::hid::{OutputError, ReportSink};
use crate::queue::CommandQueue;
use crate::scheduler::{PlaybackScheduler, StepOutcome};
use crate::serial::SerialPort;

/// Owns all device state except the tick counters, which live in a
/// [`TickClock`] shared with the 1 ms tick source.
///
/// Drive it by calling [`poll`](Self::poll) from a loop; every step is
/// non-blocking.
///
/// # Example
///
/// ```
/// use gamebot_core::{Gamebot, GamebotConfig, TickClock};
///
/// static CLOCK: TickClock = TickClock::new();
///
/// let mut gamebot: Gamebot<'_> = Gamebot::new(&CLOCK, GamebotConfig::default());
/// gamebot.ingest(&[b'P', 0xE1, b'T', 0x60, b'E']);
/// assert_eq!(gamebot.process_frames(), 1);
/// assert!(gamebot.tx().used() > 0);
/// ```
pub struct Gamebot<'c, const RING: usize = RING_SIZE, const QUEUE: usize = QUEUE_SIZE> {
    clock: &'c TickClock,
    config: GamebotConfig,
    rx: RingBuffer<RING>,
    tx: RingBuffer<RING>,
    codec: FrameCodec,
    queue: CommandQueue<QUEUE>,
    scheduler: PlaybackScheduler,
    dispatcher: Dispatcher,
    configured: bool,
}

impl<'c, const RING: usize, const QUEUE: usize> Gamebot<'c, RING, QUEUE> {
    /// Create a context with empty rings and queue and the neutral report
    /// armed for sending.
    pub fn new(clock: &'c TickClock, config: GamebotConfig) -> Self {
        clock.set_hold_until_delivered(config.hold_until_delivered);
        Self {
            clock,
            config,
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            codec: FrameCodec::new(),
            queue: CommandQueue::new(),
            scheduler: PlaybackScheduler::new(&config),
            dispatcher: Dispatcher::new(config.default_press_ms),
            configured: false,
        }
    }

    /// One pass of the main loop: HID, then serial, then playback.
    pub fn poll<S: SerialPort, H: ReportSink>(&mut self, port: &mut S, sink: &mut H) {
        self.hid_step(sink);
        self.serial_step(port);
        self.scheduler_step();
    }

    /// Offer the current report to the host if a copy is due.
    pub fn hid_step<H: ReportSink>(&mut self, sink: &mut H) {
        self.configured = sink.is_configured();
        if !self.configured {
            return;
        }
        let Some(report) = self.scheduler.pending_report(self.clock) else {
            return;
        };
        match sink.try_send(&report) {
            Ok(()) => self.scheduler.report_accepted(self.clock),
            Err(OutputError::Busy) => {}
            Err(e) => warn!("report not sent: {}", e),
        }
    }

    /// Move received bytes in, answer complete frames, move replies out.
    ///
    /// Bytes are taken from the port only while the inbound ring can store
    /// them unchanged, and replies are flushed after every batch. Repeats
    /// until a round neither reads nor answers anything.
    pub fn serial_step<S: SerialPort>(&mut self, port: &mut S) {
        loop {
            let received = self.receive(port);
            let answered = self.process_frames();
            self.flush(port);
            if received == 0 && answered == 0 {
                break;
            }
        }
    }

    /// Advance playback.
    pub fn scheduler_step(&mut self) {
        match self.scheduler.step(&mut self.queue, self.clock) {
            StepOutcome::Activated => {
                if let Some(active) = self.scheduler.active() {
                    debug!("playing {}ms, {} queued", active.duration_ms, self.queue.len());
                }
            }
            StepOutcome::Drained => debug!("queue drained"),
            StepOutcome::Unchanged => {}
        }
    }

    /// Push raw bytes into the inbound ring. Returns how many were stored
    /// unchanged.
    pub fn ingest(&mut self, bytes: &[u8]) -> usize {
        self.rx.push_slice(bytes)
    }

    /// Decode and answer complete frames from the inbound ring while the
    /// outbound ring can take a full reply frame. Returns how many frames
    /// (good or rejected) were answered; the rest wait for the next call.
    pub fn process_frames(&mut self) -> usize {
        let mut answered = 0;
        while self.tx.free() >= MAX_FRAME_LEN {
            let Some(result) = self.codec.decode(&mut self.rx) else {
                break;
            };
            match result {
                Ok(frame) => {
                    let reply = self.dispatch(frame.payload());
                    self.send_reply(&reply);
                }
                Err(e) => {
                    warn!("frame dropped: {}", e);
                    self.send_reply(&Reply::ERROR);
                }
            }
            answered += 1;
        }
        answered
    }

    /// Execute one request payload and return its reply.
    pub fn dispatch(&mut self, payload: &[u8]) -> Reply {
        let status = self.status();
        let ctx = DispatchContext {
            queue: &mut self.queue,
            scheduler: &mut self.scheduler,
            clock: self.clock,
            status,
        };
        self.dispatcher.handle(payload, ctx)
    }

    /// Frame a reply into the outbound ring.
    pub fn send_reply(&mut self, reply: &Reply) {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        match reply.encode(&mut buf) {
            Ok(len) => self.send_payload(&buf[..len]),
            Err(e) => {
                warn!("reply not encoded: {}", e);
                self.send_error();
            }
        }
    }

    /// Frame an arbitrary payload into the outbound ring. A payload that
    /// cannot be framed is replaced by the generic error reply.
    pub fn send_payload(&mut self, payload: &[u8]) {
        if let Err(e) = encode_frame(payload, &mut self.tx) {
            warn!("reply of {} bytes not framed: {}", payload.len(), e);
            self.send_error();
        }
    }

    /// Drain the outbound ring into the port while it accepts bytes.
    pub fn flush<S: SerialPort>(&mut self, port: &mut S) {
        while !self.tx.is_empty() && port.write_ready() {
            let byte = self.tx.pop();
            if let Err(e) = port.write_byte(byte) {
                warn!("serial write: {}", e);
                break;
            }
        }
    }

    /// Queue the start-up banner for sending.
    pub fn write_banner(&mut self) {
        self.tx.push_slice(BANNER);
    }

    /// Snapshot for query and debug replies.
    #[must_use]
    pub fn status(&self) -> DeviceStatus {
        DeviceStatus {
            configured: self.configured,
            rx_used: self.rx.used(),
            tx_used: self.tx.used(),
            decode: self.codec.stats(),
        }
    }

    #[inline]
    #[must_use]
    pub fn clock(&self) -> &'c TickClock {
        self.clock
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GamebotConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn queue(&self) -> &CommandQueue<QUEUE> {
        &self.queue
    }

    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    #[inline]
    #[must_use]
    pub fn rx(&self) -> &RingBuffer<RING> {
        &self.rx
    }

    #[inline]
    #[must_use]
    pub fn tx(&self) -> &RingBuffer<RING> {
        &self.tx
    }

    #[inline]
    #[must_use]
    pub fn decode_stats(&self) -> DecodeStats {
        self.codec.stats()
    }

    #[inline]
    #[must_use]
    pub fn default_press_ms(&self) -> u16 {
        self.dispatcher.default_press_ms()
    }

    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Take bytes from the port while the inbound ring has a free slot
    /// besides the one the overflow sentinel would claim.
    fn receive<S: SerialPort>(&mut self, port: &mut S) -> usize {
        let mut received = 0;
        while self.rx.free() > 1 {
            match port.read_byte() {
                Ok(Some(byte)) => {
                    self.rx.push(byte);
                    received += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("serial read: {}", e);
                    break;
                }
            }
        }
        received
    }

    fn send_error(&mut self) {
        // One-byte payload: cannot fail.
        let _: Result<(), FrameError> = encode_frame(&[ReplyCode::Error as u8], &mut self.tx);
    }
}
