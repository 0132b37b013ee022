//! Bounded FIFO of timed joystick states.

use gamebot_proto::JoystickReport;

use crate::config::QUEUE_SIZE;

/// One step of playback: a report held for `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandElement {
    pub report: JoystickReport,
    pub duration_ms: u16,
}

impl CommandElement {
    /// Neutral report, zero duration.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            report: JoystickReport::neutral(),
            duration_ms: 0,
        }
    }

    #[must_use]
    pub const fn new(report: JoystickReport, duration_ms: u16) -> Self {
        Self {
            report,
            duration_ms,
        }
    }
}

impl Default for CommandElement {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Circular queue of [`CommandElement`]s.
///
/// One slot is kept free, so `N` slots hold `N - 1` elements. The dispatcher
/// is the only producer and the playback scheduler the only consumer.
#[derive(Debug, Clone)]
pub struct CommandQueue<const N: usize = QUEUE_SIZE> {
    slots: [CommandElement; N],
    /// Next slot to fill.
    head: usize,
    /// Next slot to take.
    tail: usize,
}

impl<const N: usize> CommandQueue<N> {
    #[must_use]
    pub const fn new() -> Self {
        assert!(N >= 2 && N <= 256, "queue size must fit the status reply");
        Self {
            slots: [CommandElement::neutral(); N],
            head: 0,
            tail: 0,
        }
    }

    /// Claim the next slot, reset to neutral, for the caller to fill in.
    ///
    /// Returns `None` when full.
    pub fn push(&mut self) -> Option<&mut CommandElement> {
        if self.free() == 0 {
            return None;
        }
        let index = self.head;
        self.head = (self.head + 1) % N;
        let slot = &mut self.slots[index];
        *slot = CommandElement::neutral();
        Some(slot)
    }

    /// Take a copy of the oldest element out of the queue.
    pub fn pop(&mut self) -> Option<CommandElement> {
        if self.is_empty() {
            return None;
        }
        let element = self.slots[self.tail];
        self.tail = (self.tail + 1) % N;
        Some(element)
    }

    /// Drop all queued elements.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    #[must_use]
    pub const fn free(&self) -> usize {
        N - 1 - self.len()
    }

    /// Elements the queue can hold.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    #[inline]
    #[must_use]
    pub const fn head(&self) -> usize {
        self.head
    }

    #[inline]
    #[must_use]
    pub const fn tail(&self) -> usize {
        self.tail
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
