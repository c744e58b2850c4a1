//! Bus master bound to one transport

use gridctl_containers::{ListQueue, PriorityQueue};
use gridctl_sched::{AsyncState, ByPriority, Coroutine, Master, Scheduler, Task};

use crate::{BusWrite, Transport};

/// Relaunches allowed for one transaction after recoverable errors
pub const DEFAULT_MAX_RETRIES: u8 = 3;

/// Consecutive failed transactions before the master gives up
pub const DEFAULT_FAILURE_THRESHOLD: u8 = 8;

/// FIFO scheduler of writes on one bus
pub type BusScheduler<T, C, const N: usize> = Scheduler<BusMaster<T>, ListQueue<Coroutine<BusWrite>, N>, C>;

/// Scheduler serving the highest priority write first
pub type PriorityBusScheduler<T, C, const N: usize> =
    Scheduler<BusMaster<T>, PriorityQueue<Coroutine<BusWrite>, ByPriority, N>, C>;

/// Transaction counters since the last reset
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusStats {
    pub finished: u32,
    pub failed: u32,
    pub retries: u32,
}

/// Polls a [`Transport`] on behalf of the scheduler
///
/// Recoverable errors relaunch the same write up to `max_retries` times.
/// After `failure_threshold` failed writes in a row the master reports
/// itself failed and the scheduler stops until [`Master::reset`].
#[derive(Debug)]
pub struct BusMaster<T> {
    transport: T,
    max_retries: u8,
    failure_threshold: u8,
    attempts: u8,
    consecutive_failures: u8,
    failed: bool,
    stats: BusStats,
}

impl<T: Transport> BusMaster<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            max_retries: DEFAULT_MAX_RETRIES,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            attempts: 0,
            consecutive_failures: 0,
            failed: false,
            stats: BusStats {
                finished: 0,
                failed: 0,
                retries: 0,
            },
        }
    }

    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Zero disables the sticky failure
    pub const fn with_failure_threshold(mut self, threshold: u8) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn stats(&self) -> BusStats {
        self.stats
    }

    pub fn consecutive_failures(&self) -> u8 {
        self.consecutive_failures
    }
}

impl<T: Transport> Master for BusMaster<T> {
    type Bus = T;
    type Task = BusWrite;

    fn bus(&self) -> &T {
        &self.transport
    }

    fn bus_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn is_ready(&self) -> bool {
        self.transport.is_finished()
    }

    fn is_failed(&self) -> bool {
        self.failed
    }

    fn waiting_for_completion(&mut self, task: &mut BusWrite) -> AsyncState {
        task.outcome(&self.transport)
    }

    fn recover(&mut self, task: &mut BusWrite) -> AsyncState {
        if self.attempts >= self.max_retries {
            return AsyncState::Failed;
        }
        if !self.transport.is_finished() {
            return AsyncState::Recoverable;
        }
        self.attempts += 1;
        self.stats.retries += 1;
        task.launch(&mut self.transport)
    }

    fn task_retired(&mut self, outcome: AsyncState) {
        self.attempts = 0;
        match outcome {
            AsyncState::Finished => {
                self.consecutive_failures = 0;
                self.stats.finished += 1;
            }
            AsyncState::Failed => {
                self.stats.failed += 1;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.failure_threshold != 0 && self.consecutive_failures >= self.failure_threshold {
                    self.failed = true;
                }
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.failed = false;
        self.attempts = 0;
        self.consecutive_failures = 0;
    }
}
