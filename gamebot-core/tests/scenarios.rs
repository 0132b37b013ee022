//! End-to-end scenarios: framed requests in over a mock serial port,
//! joystick reports out through a mock HID sink.

use std::collections::VecDeque;

use gamebot_core::{
    Buttons, Gamebot, GamebotConfig, JoystickReport, OutputError, PlaybackState, ReportSink,
    SerialError, SerialPort, TickClock, BANNER,
};
use gamebot_proto::{encode_frame_into, FrameCodec, Reply, ReplyCode, StateReport, MAX_FRAME_LEN};

#[derive(Default)]
struct MockSerial {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl MockSerial {
    fn send(&mut self, payload: &[u8]) {
        self.input.extend(frame(payload));
    }

    fn send_raw(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Decode and remove every reply frame written so far.
    fn replies(&mut self) -> Vec<Reply> {
        let mut replies = Vec::new();
        let mut offset = 0;
        while offset < self.output.len() {
            let (frame, used) = FrameCodec::decode_slice(&self.output[offset..])
                .expect("device only writes whole frames");
            replies.push(Reply::decode(frame.payload()).expect("valid reply payload"));
            offset += used;
        }
        self.output.clear();
        replies
    }
}

impl SerialPort for MockSerial {
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        Ok(self.input.pop_front())
    }

    fn write_ready(&self) -> bool {
        true
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        self.output.push(byte);
        Ok(())
    }
}

struct MockHid {
    configured: bool,
    busy: bool,
    sent: Vec<JoystickReport>,
}

impl MockHid {
    fn new() -> Self {
        Self {
            configured: true,
            busy: false,
            sent: Vec::new(),
        }
    }
}

impl ReportSink for MockHid {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn try_send(&mut self, report: &JoystickReport) -> Result<(), OutputError> {
        if self.busy {
            return Err(OutputError::Busy);
        }
        self.sent.push(*report);
        Ok(())
    }
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = [0u8; MAX_FRAME_LEN];
    let len = encode_frame_into(payload, &mut buf).expect("payload fits");
    buf[..len].to_vec()
}

fn with_buttons(buttons: Buttons) -> JoystickReport {
    JoystickReport {
        buttons,
        ..JoystickReport::neutral()
    }
}

#[test]
fn alive_request_gets_alive_reply() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    serial.send(b"T");
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(serial.replies(), vec![Reply::ALIVE]);
}

#[test]
fn press_then_release() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    // Press A for 10 ms.
    serial.send(&[b'b', 0x00, 0x04, 0x00, 0x0A]);
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(serial.replies(), vec![Reply::SUCCESS]);
    assert_eq!(gamebot.scheduler().state(), PlaybackState::Active);

    for _ in 0..40 {
        clock.tick();
        gamebot.poll(&mut serial, &mut hid);
    }

    let neutral = JoystickReport::neutral();
    let a = with_buttons(Buttons::A);
    // Start-up report, three copies of the press, three of the release.
    assert_eq!(hid.sent, vec![neutral, a, a, a, neutral, neutral, neutral]);
    assert!(gamebot.queue().is_empty());
    assert_eq!(gamebot.scheduler().state(), PlaybackState::Idle);
}

#[test]
fn overflow_leaves_no_partial_press() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();
    hid.configured = false;

    for _ in 0..4 {
        serial.send(&[b'b', 0x00, 0x02]);
    }
    gamebot.poll(&mut serial, &mut hid);

    assert_eq!(
        serial.replies(),
        vec![Reply::SUCCESS, Reply::SUCCESS, Reply::SUCCESS, Reply::OVERFLOW]
    );
    // Six queued, one of them already taken by playback.
    assert_eq!(gamebot.queue().len(), 5);
    assert_eq!(gamebot.scheduler().report().buttons, Buttons::B);
}

#[test]
fn clear_returns_to_neutral() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    serial.send(&[b's', 0x00, 0x04, 0x00, 0x00, 0x80, 0x80, 0x80, 0x03, 0xE8]);
    serial.send(&[b'b', 0x00, 0x01]);
    gamebot.poll(&mut serial, &mut hid);
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(gamebot.scheduler().report().hat, gamebot_core::Hat::Top);
    assert_eq!(gamebot.queue().len(), 3);

    serial.send(b"C");
    clock.tick();
    clock.tick();
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(serial.replies().last(), Some(&Reply::SUCCESS));
    assert!(gamebot.queue().is_empty());
    assert_eq!(gamebot.scheduler().state(), PlaybackState::Idle);

    hid.sent.clear();
    clock.tick();
    clock.tick();
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(hid.sent, vec![JoystickReport::neutral()]);
}

#[test]
fn ten_millisecond_element_expires_on_tenth_tick() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    // Set B for 10 ms, then set X for 10 ms.
    serial.send(&[b'B', 0x00, 0x02, 0x00, 0x0A]);
    serial.send(&[b'B', 0x00, 0x08, 0x00, 0x0A]);
    gamebot.poll(&mut serial, &mut hid);
    // Delivered once.
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(hid.sent.last(), Some(&with_buttons(Buttons::B)));

    for tick in 1..=9 {
        clock.tick();
        gamebot.poll(&mut serial, &mut hid);
        assert_eq!(
            gamebot.scheduler().report().buttons,
            Buttons::B,
            "still held after tick {tick}"
        );
    }
    clock.tick();
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(gamebot.scheduler().report().buttons, Buttons::X);
}

#[test]
fn undelivered_element_is_held() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();
    hid.busy = true;

    serial.send(&[b'B', 0x00, 0x02, 0x00, 0x0A]);
    for _ in 0..50 {
        gamebot.poll(&mut serial, &mut hid);
        clock.tick();
    }
    assert_eq!(gamebot.scheduler().report().buttons, Buttons::B);
    assert_eq!(clock.elapsed_ms(), 9);

    hid.busy = false;
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(hid.sent, vec![with_buttons(Buttons::B)]);
    assert_eq!(gamebot.scheduler().state(), PlaybackState::Active);

    clock.tick();
    gamebot.poll(&mut serial, &mut hid);
    assert!(gamebot.scheduler().report().is_neutral());
}

#[test]
fn hold_rule_can_be_disabled() {
    let clock = TickClock::new();
    let config = GamebotConfig {
        hold_until_delivered: false,
        ..GamebotConfig::default()
    };
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, config);
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();
    hid.configured = false;

    serial.send(&[b'B', 0x00, 0x02, 0x00, 0x0A]);
    gamebot.poll(&mut serial, &mut hid);
    for _ in 0..10 {
        clock.tick();
    }
    gamebot.poll(&mut serial, &mut hid);
    assert!(gamebot.scheduler().report().is_neutral());
}

#[test]
fn garbage_byte_is_skipped() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    serial.send_raw(&[0x55]);
    serial.send(b"T");
    gamebot.poll(&mut serial, &mut hid);
    assert_eq!(serial.replies(), vec![Reply::ALIVE]);
    assert_eq!(gamebot.decode_stats().discarded, 1);
}

#[test]
fn corrupted_frame_gets_error_reply() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    let mut bytes = frame(&[b'b', 0x00, 0x04]);
    bytes[3] ^= 0x10;
    serial.send_raw(&bytes);
    gamebot.poll(&mut serial, &mut hid);

    assert_eq!(serial.replies(), vec![Reply::ERROR]);
    assert!(gamebot.queue().is_empty());
    assert_eq!(gamebot.decode_stats().checksum_errors, 1);
}

#[test]
fn query_reports_state() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    clock.tick();
    clock.tick();
    serial.send(b"Q");
    gamebot.poll(&mut serial, &mut hid);

    let replies = serial.replies();
    let Some(Reply::State(state)) = replies.first().copied() else {
        panic!("expected a state reply, got {replies:?}");
    };
    assert_eq!(
        state,
        StateReport {
            configured: true,
            queue_head: 0,
            queue_tail: 0,
            queue_len: 0,
            ticks: 2,
            elapsed_ms: 2,
            echo_remaining: 2,
        }
    );
}

#[test]
fn oversize_reply_becomes_error_frame() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();

    gamebot.send_payload(&[0u8; 16]);
    gamebot.flush(&mut serial);
    assert_eq!(serial.output, frame(&[ReplyCode::Error as u8]));
}

#[test]
fn banner_goes_out_first() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    gamebot.write_banner();
    serial.send(b"T");
    gamebot.poll(&mut serial, &mut hid);

    assert!(serial.output.starts_with(BANNER));
    serial.output.drain(..BANNER.len());
    assert_eq!(serial.replies(), vec![Reply::ALIVE]);
}

#[test]
fn burst_longer_than_ring_is_answered_in_full() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    for _ in 0..5 {
        serial.send(&[b'h', 0x00]);
    }
    serial.send(b"T");
    assert!(serial.input.len() > gamebot.rx().capacity());
    gamebot.poll(&mut serial, &mut hid);

    assert!(serial.input.is_empty());
    assert_eq!(
        serial.replies(),
        vec![
            Reply::SUCCESS,
            Reply::SUCCESS,
            Reply::SUCCESS,
            Reply::OVERFLOW,
            Reply::OVERFLOW,
            Reply::ALIVE,
        ]
    );
    let stats = gamebot.decode_stats();
    assert_eq!(stats.frames, 6);
    assert_eq!(stats.checksum_errors, 0);
    assert_eq!(stats.discarded, 0);
}

#[test]
fn back_to_back_queries_get_whole_replies() {
    let clock = TickClock::new();
    let mut gamebot: Gamebot<'_> = Gamebot::new(&clock, GamebotConfig::default());
    let mut serial = MockSerial::default();
    let mut hid = MockHid::new();

    serial.send(b"Q");
    serial.send(b"Q");
    serial.send(b"Q");
    gamebot.poll(&mut serial, &mut hid);

    let replies = serial.replies();
    assert_eq!(replies.len(), 3);
    assert!(replies.iter().all(|r| matches!(r, Reply::State(_))));
    assert!(gamebot.rx().is_empty());
    assert!(gamebot.tx().is_empty());
}
