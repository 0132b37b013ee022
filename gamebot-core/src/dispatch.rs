//! Request dispatch: turns a decoded payload into queue actions and a reply.

use gamebot_proto::{
    DebugReport, DecodeStats, PendingReport, Reply, Request, StateReport, Target,
};

use crate::clock::TickClock;
use crate::queue::{CommandElement, CommandQueue};
use crate::scheduler::PlaybackScheduler;

/// Link and decoder state reported by query and debug requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus {
    /// USB device configured by the host.
    pub configured: bool,
    /// Bytes waiting in the inbound ring.
    pub rx_used: usize,
    /// Bytes waiting in the outbound ring.
    pub tx_used: usize,
    pub decode: DecodeStats,
}

/// Everything a request may read or change.
pub struct DispatchContext<'a, const N: usize> {
    pub queue: &'a mut CommandQueue<N>,
    pub scheduler: &'a mut PlaybackScheduler,
    pub clock: &'a TickClock,
    pub status: DeviceStatus,
}

/// Executes requests. Holds the runtime-adjustable default press duration.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    default_press_ms: u16,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(default_press_ms: u16) -> Self {
        Self { default_press_ms }
    }

    #[inline]
    #[must_use]
    pub const fn default_press_ms(&self) -> u16 {
        self.default_press_ms
    }

    /// Parse and execute one payload. Malformed payloads change nothing and
    /// are answered with the generic error reply.
    pub fn handle<const N: usize>(&mut self, payload: &[u8], ctx: DispatchContext<'_, N>) -> Reply {
        match Request::parse(payload) {
            Ok(request) => self.execute(request, ctx),
            Err(e) => {
                warn!("rejected request: {}", e);
                Reply::ERROR
            }
        }
    }

    /// Execute an already parsed request.
    pub fn execute<const N: usize>(&mut self, request: Request, ctx: DispatchContext<'_, N>) -> Reply {
        let DispatchContext {
            queue,
            scheduler,
            clock,
            status,
        } = ctx;

        trace!("request {}", request);

        match request {
            Request::Test => Reply::ALIVE,
            Request::QueryState => Reply::State(StateReport {
                configured: status.configured,
                queue_head: queue.head() as u8,
                queue_tail: queue.tail() as u8,
                queue_len: queue.len() as u8,
                ticks: clock.ticks(),
                elapsed_ms: clock.elapsed_ms(),
                echo_remaining: scheduler.echo_remaining(),
            }),
            Request::Debug => Reply::Debug(DebugReport::new(
                status.rx_used,
                status.tx_used,
                status.decode,
            )),
            // No OUT endpoint data is kept.
            Request::GetUsbOutData => Reply::ERROR,
            Request::Press {
                target,
                duration_ms,
            } => {
                let held = self.element(target, duration_ms);
                enqueue(queue, &[held, CommandElement::neutral()])
            }
            Request::Set {
                target,
                duration_ms,
            } => {
                let held = self.element(target, duration_ms);
                enqueue(queue, &[held])
            }
            Request::Unset { duration_ms } => {
                let neutral = CommandElement {
                    duration_ms: duration_ms.unwrap_or(self.default_press_ms),
                    ..CommandElement::neutral()
                };
                enqueue(queue, &[neutral])
            }
            Request::SetDefaultDuration(ms) => {
                debug!("default press duration {}ms", ms);
                self.default_press_ms = ms;
                Reply::SUCCESS
            }
            Request::Pause(ms) => {
                let pause = CommandElement {
                    duration_ms: ms,
                    ..CommandElement::neutral()
                };
                enqueue(queue, &[pause])
            }
            Request::ReportPending => Reply::Pending(PendingReport {
                queued: queue.len() as u8,
                free: queue.free() as u8,
            }),
            Request::Clear => {
                debug!("clear");
                queue.reset();
                scheduler.reset(clock);
                Reply::SUCCESS
            }
        }
    }

    fn element(&self, target: Target, duration_ms: Option<u16>) -> CommandElement {
        CommandElement::new(
            target.to_report(),
            duration_ms.unwrap_or(self.default_press_ms),
        )
    }
}

/// Queue all of `elements` or none of them.
fn enqueue<const N: usize>(queue: &mut CommandQueue<N>, elements: &[CommandElement]) -> Reply {
    if queue.free() < elements.len() {
        warn!("queue full, {} free", queue.free());
        return Reply::OVERFLOW;
    }
    for element in elements {
        match queue.push() {
            Some(slot) => *slot = *element,
            None => return Reply::OVERFLOW,
        }
    }
    Reply::SUCCESS
}
