//! Time-driven playback of the command queue.
//!
//! The scheduler owns a copy of the element being played, so queue slots can
//! be reused as soon as an element is taken. Each new report is offered to
//! the HID side `echo_times` times, spaced by `echo_interval_ms`.

use gamebot_proto::JoystickReport;

use crate::clock::TickClock;
use crate::config::GamebotConfig;
use crate::queue::{CommandElement, CommandQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// Nothing playing; the report is neutral.
    Idle,
    /// An element is being held.
    Active,
}

/// What a call to [`PlaybackScheduler::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    Unchanged,
    /// A new element was taken from the queue.
    Activated,
    /// The queue ran dry and playback went idle.
    Drained,
}

#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    active: Option<CommandElement>,
    report: JoystickReport,
    echo_remaining: u8,
    echo_times: u8,
    echo_interval_ms: u8,
}

impl PlaybackScheduler {
    /// Idle scheduler with the neutral report armed for sending.
    ///
    /// Every report goes out at least once, even with `echo_times == 0`;
    /// the delivery hold would otherwise never release.
    #[must_use]
    pub const fn new(config: &GamebotConfig) -> Self {
        let echo_times = if config.echo_times == 0 {
            1
        } else {
            config.echo_times
        };
        Self {
            active: None,
            report: JoystickReport::neutral(),
            echo_remaining: echo_times,
            echo_times,
            echo_interval_ms: config.echo_interval_ms,
        }
    }

    /// Advance playback: expire the active element if its time is up, then
    /// take the next one.
    pub fn step<const N: usize>(
        &mut self,
        queue: &mut CommandQueue<N>,
        clock: &TickClock,
    ) -> StepOutcome {
        let was_active = match self.active {
            Some(active) if !Self::is_complete(&active, clock) => return StepOutcome::Unchanged,
            Some(_) => {
                self.active = None;
                true
            }
            None => false,
        };

        if let Some(element) = queue.pop() {
            self.active = Some(element);
            self.report = element.report;
            self.rearm(clock);
            clock.arm(element.duration_ms);
            return StepOutcome::Activated;
        }

        clock.release();
        if !self.report.is_neutral() {
            self.report = JoystickReport::neutral();
            self.rearm(clock);
            return StepOutcome::Drained;
        }
        if was_active {
            StepOutcome::Drained
        } else {
            StepOutcome::Unchanged
        }
    }

    /// The report to hand to the HID side now, if a copy is due.
    #[must_use]
    pub fn pending_report(&self, clock: &TickClock) -> Option<JoystickReport> {
        (self.echo_remaining > 0 && clock.echo_wait_ms() == 0).then_some(self.report)
    }

    /// Record that the HID side accepted the pending report.
    pub fn report_accepted(&mut self, clock: &TickClock) {
        self.echo_remaining = self.echo_remaining.saturating_sub(1);
        clock.mark_delivered();
        clock.start_echo_wait(self.echo_interval_ms);
    }

    /// Abandon playback: idle, neutral report, armed for sending.
    pub fn reset(&mut self, clock: &TickClock) {
        self.active = None;
        self.report = JoystickReport::neutral();
        clock.release();
        self.rearm(clock);
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        if self.active.is_some() {
            PlaybackState::Active
        } else {
            PlaybackState::Idle
        }
    }

    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<&CommandElement> {
        self.active.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn report(&self) -> &JoystickReport {
        &self.report
    }

    #[inline]
    #[must_use]
    pub fn echo_remaining(&self) -> u8 {
        self.echo_remaining
    }

    fn is_complete(active: &CommandElement, clock: &TickClock) -> bool {
        let delivered = clock.is_delivered() || !clock.hold_until_delivered();
        delivered && clock.elapsed_ms() >= u32::from(active.duration_ms)
    }

    fn rearm(&mut self, clock: &TickClock) {
        self.echo_remaining = self.echo_times;
        clock.start_echo_wait(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamebot_proto::{Buttons, Hat};

    fn held(buttons: Buttons, duration_ms: u16) -> CommandElement {
        CommandElement::new(
            JoystickReport {
                buttons,
                ..JoystickReport::neutral()
            },
            duration_ms,
        )
    }

    fn deliver(scheduler: &mut PlaybackScheduler, clock: &TickClock) -> Option<JoystickReport> {
        let report = scheduler.pending_report(clock)?;
        scheduler.report_accepted(clock);
        Some(report)
    }

    #[test]
    fn test_startup_report_is_armed() {
        let clock = TickClock::new();
        let scheduler = PlaybackScheduler::new(&GamebotConfig::new());
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert_eq!(scheduler.echo_remaining(), 3);
        assert_eq!(scheduler.pending_report(&clock), Some(JoystickReport::neutral()));
    }

    #[test]
    fn test_zero_echo_times_still_sends_once() {
        let clock = TickClock::new();
        let mut queue: CommandQueue = CommandQueue::new();
        let config = GamebotConfig {
            echo_times: 0,
            ..GamebotConfig::new()
        };
        let mut scheduler = PlaybackScheduler::new(&config);
        *queue.push().unwrap() = held(Buttons::B, 2);

        assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Activated);
        assert_eq!(scheduler.echo_remaining(), 1);
        for _ in 0..5 {
            clock.tick();
        }
        // Held: nothing delivered yet.
        assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Unchanged);

        assert!(deliver(&mut scheduler, &clock).is_some());
        assert_eq!(deliver(&mut scheduler, &clock), None);
        clock.tick();
        clock.tick();
        assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Drained);
        assert!(scheduler.report().is_neutral());
    }

    #[test]
    fn test_idle_empty_queue_is_unchanged() {
        let clock = TickClock::new();
        let mut queue: CommandQueue = CommandQueue::new();
        let mut scheduler = PlaybackScheduler::new(&GamebotConfig::new());
        assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Unchanged);
        assert!(scheduler.report().is_neutral());
    }

    #[test]
    fn test_activation_copies_element() {
        let clock = TickClock::new();
        let mut queue: CommandQueue = CommandQueue::new();
        let mut scheduler = PlaybackScheduler::new(&GamebotConfig::new());
        *queue.push().unwrap() = held(Buttons::A, 5);

        assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Activated);
        assert_eq!(scheduler.state(), PlaybackState::Active);
        assert_eq!(scheduler.report().buttons, Buttons::A);
        assert!(queue.is_empty());

        // The queue slot may be overwritten without affecting playback.
        *queue.push().unwrap() = held(Buttons::B, 5);
        assert_eq!(scheduler.active().map(|e| e.report.buttons), Some(Buttons::A));
    }

    #[test]
    fn test_echo_copies_are_spaced() {
        let clock = TickClock::new();
        let mut queue: CommandQueue = CommandQueue::new();
        let mut scheduler = PlaybackScheduler::new(&GamebotConfig::new());
        *queue.push().unwrap() = held(Buttons::X, 100);
        scheduler.step(&mut queue, &clock);

        assert!(deliver(&mut scheduler, &clock).is_some());
        assert_eq!(scheduler.echo_remaining(), 2);
        assert!(scheduler.pending_report(&clock).is_none());
        clock.tick();
        assert!(scheduler.pending_report(&clock).is_none());
        clock.tick();
        assert!(deliver(&mut scheduler, &clock).is_some());
        clock.tick();
        clock.tick();
        assert!(deliver(&mut scheduler, &clock).is_some());
        assert_eq!(scheduler.echo_remaining(), 0);
        clock.tick();
        clock.tick();
        assert!(scheduler.pending_report(&clock).is_none());
    }

    #[test]
    fn test_element_held_until_first_delivery() {
        let clock = TickClock::new();
        let mut queue: CommandQueue = CommandQueue::new();
        let mut scheduler = PlaybackScheduler::new(&GamebotConfig::new());
        *queue.push().unwrap() = held(Buttons::A, 0);
        scheduler.step(&mut queue, &clock);

        for _ in 0..5 {
            clock.tick();
            assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Unchanged);
        }
        assert_eq!(deliver(&mut scheduler, &clock).map(|r| r.buttons), Some(Buttons::A));
        assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Drained);
        assert!(scheduler.report().is_neutral());
        assert_eq!(scheduler.echo_remaining(), 3);
    }

    #[test]
    fn test_drain_after_neutral_element_does_not_rearm() {
        let clock = TickClock::new();
        let mut queue: CommandQueue = CommandQueue::new();
        let mut scheduler = PlaybackScheduler::new(&GamebotConfig::new());
        queue.push();
        scheduler.step(&mut queue, &clock);
        while deliver(&mut scheduler, &clock).is_some() {
            clock.tick();
            clock.tick();
        }
        assert_eq!(scheduler.step(&mut queue, &clock), StepOutcome::Drained);
        assert_eq!(scheduler.echo_remaining(), 0);
        assert_eq!(scheduler.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_reset_goes_idle_and_neutral() {
        let clock = TickClock::new();
        let mut queue: CommandQueue = CommandQueue::new();
        let mut scheduler = PlaybackScheduler::new(&GamebotConfig::new());
        let slot = queue.push().unwrap();
        slot.report.hat = Hat::Bottom;
        slot.duration_ms = 1000;
        scheduler.step(&mut queue, &clock);
        deliver(&mut scheduler, &clock);

        scheduler.reset(&clock);
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(scheduler.report().is_neutral());
        assert_eq!(scheduler.pending_report(&clock), Some(JoystickReport::neutral()));
    }
}
