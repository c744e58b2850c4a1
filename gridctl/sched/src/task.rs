//! Task, coroutine and master abstractions

use gridctl_containers::Compare;

use crate::AsyncState;

/// Non-blocking unit of work running on a bus `B`
pub trait Task<B: ?Sized> {
    /// Task specific launch precondition
    fn is_ready(&self, bus: &B) -> bool {
        let _ = bus;
        true
    }

    /// Start the work, never blocks
    ///
    /// Returns `Launched` when started, or the outcome if the bus refused
    /// the request outright.
    fn launch(&mut self, bus: &mut B) -> AsyncState;

    /// True once the work completed successfully
    fn is_finished(&self, bus: &B) -> bool;
}

/// Ordering key for priority queues, greater runs first
pub trait Prioritized {
    fn priority(&self) -> u8;
}

/// A task together with the state the scheduler tracks for it
#[derive(Debug, Clone)]
pub struct Coroutine<T> {
    state: AsyncState,
    task: T,
}

impl<T> Coroutine<T> {
    pub const fn new(task: T) -> Self {
        Self {
            state: AsyncState::Idle,
            task,
        }
    }

    pub fn state(&self) -> AsyncState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: AsyncState) {
        self.state = state;
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn task_mut(&mut self) -> &mut T {
        &mut self.task
    }

    pub fn into_inner(self) -> T {
        self.task
    }
}

/// Orders coroutines by their task priority
#[derive(Debug, Default, Clone, Copy)]
pub struct ByPriority;

impl<T: Prioritized> Compare<Coroutine<T>> for ByPriority {
    fn less(&self, a: &Coroutine<T>, b: &Coroutine<T>) -> bool {
        a.task.priority() < b.task.priority()
    }
}

/// Binds tasks to the one resource they share
///
/// The master decides whether the resource can take a new task, polls
/// launched tasks and chooses how to recover from a retryable failure.
pub trait Master {
    type Bus: ?Sized;
    type Task: Task<Self::Bus>;

    fn bus(&self) -> &Self::Bus;

    fn bus_mut(&mut self) -> &mut Self::Bus;

    /// Resource can take a new task
    fn is_ready(&self) -> bool;

    /// Resource is unusable until [`reset`](Self::reset)
    fn is_failed(&self) -> bool {
        false
    }

    /// Poll a launched task that has not finished
    fn waiting_for_completion(&mut self, task: &mut Self::Task) -> AsyncState;

    /// Handle a task in `Recoverable`
    fn recover(&mut self, task: &mut Self::Task) -> AsyncState;

    /// Head task left the queue in `outcome`
    fn task_retired(&mut self, outcome: AsyncState) {
        let _ = outcome;
    }

    /// Re-arm after a sticky failure
    fn reset(&mut self) {}
}
