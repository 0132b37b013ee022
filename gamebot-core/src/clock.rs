//! Millisecond clock shared between the tick source and the main loop.
//!
//! The tick side only ever calls [`TickClock::tick`]; everything else is
//! driven from the cooperative loop. Each counter has a single writer except
//! the two countdowns, which both sides touch through `fetch_update`.

use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Tick counters and the hold-until-delivered gate.
#[derive(Debug)]
pub struct TickClock {
    ticks: AtomicU32,
    elapsed_ms: AtomicU32,
    hold_limit_ms: AtomicU32,
    delivered: AtomicBool,
    hold_until_delivered: AtomicBool,
    echo_wait_ms: AtomicU8,
}

impl TickClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            elapsed_ms: AtomicU32::new(0),
            hold_limit_ms: AtomicU32::new(0),
            delivered: AtomicBool::new(true),
            hold_until_delivered: AtomicBool::new(true),
            echo_wait_ms: AtomicU8::new(0),
        }
    }

    /// Advance by one millisecond. Constant time, lock free.
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let _ = self
            .echo_wait_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| w.checked_sub(1));

        let delivered = self.delivered.load(Ordering::Acquire)
            || !self.hold_until_delivered.load(Ordering::Relaxed);
        let limit = self.hold_limit_ms.load(Ordering::Acquire);
        let _ = self
            .elapsed_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |e| {
                let next = e.saturating_add(1);
                // The step that would expire an undelivered report is withheld.
                (delivered || next < limit).then_some(next)
            });
    }

    /// Ticks since start-up (wraps).
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Milliseconds the active element has been held.
    #[inline]
    #[must_use]
    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms.load(Ordering::Acquire)
    }

    /// Remaining spacing before the next report copy may go out.
    #[inline]
    #[must_use]
    pub fn echo_wait_ms(&self) -> u8 {
        self.echo_wait_ms.load(Ordering::Acquire)
    }

    /// Whether the active report has been accepted by the host at least once.
    #[inline]
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered.load(Ordering::Acquire)
    }

    #[inline]
    #[must_use]
    pub fn hold_until_delivered(&self) -> bool {
        self.hold_until_delivered.load(Ordering::Relaxed)
    }

    pub fn set_hold_until_delivered(&self, hold: bool) {
        self.hold_until_delivered.store(hold, Ordering::Relaxed);
    }

    /// Start timing a freshly activated element.
    pub(crate) fn arm(&self, duration_ms: u16) {
        self.delivered.store(false, Ordering::Release);
        self.hold_limit_ms
            .store(u32::from(duration_ms), Ordering::Release);
        self.elapsed_ms.store(0, Ordering::Release);
    }

    /// Stop gating the elapsed counter (nothing active).
    pub(crate) fn release(&self) {
        self.hold_limit_ms.store(0, Ordering::Release);
        self.delivered.store(true, Ordering::Release);
    }

    pub(crate) fn mark_delivered(&self) {
        self.delivered.store(true, Ordering::Release);
    }

    pub(crate) fn start_echo_wait(&self, ms: u8) {
        self.echo_wait_ms.store(ms, Ordering::Release);
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts() {
        let clock = TickClock::new();
        for _ in 0..5 {
            clock.tick();
        }
        assert_eq!(clock.ticks(), 5);
        assert_eq!(clock.elapsed_ms(), 5);
    }

    #[test]
    fn test_echo_wait_counts_down_to_zero() {
        let clock = TickClock::new();
        clock.start_echo_wait(2);
        clock.tick();
        assert_eq!(clock.echo_wait_ms(), 1);
        clock.tick();
        clock.tick();
        assert_eq!(clock.echo_wait_ms(), 0);
    }

    #[test]
    fn test_undelivered_element_stops_short_of_expiry() {
        let clock = TickClock::new();
        clock.arm(3);
        for _ in 0..10 {
            clock.tick();
        }
        assert_eq!(clock.elapsed_ms(), 2);

        clock.mark_delivered();
        clock.tick();
        assert_eq!(clock.elapsed_ms(), 3);
    }

    #[test]
    fn test_zero_duration_never_advances_until_delivered() {
        let clock = TickClock::new();
        clock.arm(0);
        clock.tick();
        assert_eq!(clock.elapsed_ms(), 0);
    }

    #[test]
    fn test_hold_rule_disabled() {
        let clock = TickClock::new();
        clock.set_hold_until_delivered(false);
        clock.arm(3);
        for _ in 0..10 {
            clock.tick();
        }
        assert_eq!(clock.elapsed_ms(), 10);
    }

    #[test]
    fn test_release_lets_elapsed_run() {
        let clock = TickClock::new();
        clock.arm(1);
        clock.release();
        clock.tick();
        clock.tick();
        assert_eq!(clock.elapsed_ms(), 2);
        assert!(clock.is_delivered());
    }
}
