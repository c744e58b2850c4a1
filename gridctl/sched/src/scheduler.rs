//! Generic scheduler
//!
//! [`Scheduler::update`] is the single driver call, meant to run once per
//! control-loop tick. Each call does a bounded amount of work: retiring a
//! finished head lets the next task launch within the same call, and the
//! number of retirements per call is capped by
//! [`UNTRUSTED_ITERATION_LIMIT`].
//!
//! A launched task owns the transport until it leaves `Launched` or
//! `Recoverable`; tasks pushed ahead of it in the queue wait their turn.

use gridctl_containers::{NodeId, TaskQueue};
use gridctl_core::{grid_log, Context, ErrorCode, GridResult, Severity, UNTRUSTED_ITERATION_LIMIT};

use crate::{AsyncState, Coroutine, Master, Task};

const FACILITY: &str = "SCHED";

/// Drives the tasks queued on one master
pub struct Scheduler<M, Q, C>
where
    M: Master,
    Q: TaskQueue<Item = Coroutine<M::Task>>,
    C: Context,
{
    master: M,
    queue: Q,
    ctx: C,
    running: Option<NodeId>,
}

impl<M, Q, C> Scheduler<M, Q, C>
where
    M: Master,
    Q: TaskQueue<Item = Coroutine<M::Task>>,
    C: Context,
{
    pub fn new(master: M, queue: Q, ctx: C) -> Self {
        Self {
            master,
            queue,
            ctx,
            running: None,
        }
    }

    pub fn master(&self) -> &M {
        &self.master
    }

    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// Store a task in a new orphan node
    pub fn alloc(&mut self, task: M::Task) -> GridResult<NodeId> {
        self.queue
            .alloc(Coroutine::new(task))
            .map_err(|err| self.report(err, "alloc: no room for a new task"))
    }

    /// Free a node that is not running, returning its task
    pub fn release(&mut self, node: NodeId) -> GridResult<M::Task> {
        self.refuse_if_running(node, "release")?;
        self.forget_current(node);
        self.queue
            .release(node)
            .map(Coroutine::into_inner)
            .map_err(|err| self.report(err, "release: unknown node"))
    }

    /// Enqueue a node and reset its task to `Idle`
    pub fn push(&mut self, node: NodeId) -> GridResult<()> {
        self.refuse_if_running(node, "push")?;
        self.queue
            .push(node)
            .map_err(|err| self.report(err, "push: node rejected by queue"))?;
        self.set_state(node, AsyncState::Idle);
        Ok(())
    }

    /// Remove a node that has not been launched yet
    ///
    /// The transport has no abort primitive, so a running head is refused
    /// with `InvalidCall`.
    pub fn cancel(&mut self, node: NodeId) -> GridResult<()> {
        self.refuse_if_running(node, "cancel")?;
        self.forget_current(node);
        self.queue
            .cancel(node)
            .map_err(|err| self.report(err, "cancel: node rejected by queue"))
    }

    fn refuse_if_running(&self, node: NodeId, op: &str) -> GridResult<()> {
        if self.queue.is_queued(node) && self.state_of(node) == Some(AsyncState::Launched) {
            self.ctx.assert_error(ErrorCode::InvalidCall, op);
            return Err(ErrorCode::InvalidCall);
        }
        Ok(())
    }

    /// Tell the master the task it was serving is gone
    fn forget_current(&mut self, node: NodeId) {
        if self.current() == Some(node) {
            let outcome = self.state_of(node).unwrap_or(AsyncState::Idle);
            self.master.task_retired(outcome);
        }
        if self.running == Some(node) {
            self.running = None;
        }
    }

    fn report(&self, err: ErrorCode, msg: &str) -> ErrorCode {
        // a full bounded container is a sizing defect
        if err.is_programming_error() || err == ErrorCode::Memory {
            self.ctx.assert_error(err, msg);
        } else {
            grid_log!(self.ctx, FACILITY, Severity::Error, "{}: {}", msg, err.name());
        }
        err
    }

    /// Head of the queue
    pub fn next(&self) -> Option<NodeId> {
        self.queue.next()
    }

    /// Task `update` serves next: the one in flight, else the head
    pub fn current(&self) -> Option<NodeId> {
        match self.running {
            Some(node) if self.queue.is_queued(node) => Some(node),
            _ => self.queue.next(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_queued(&self, node: NodeId) -> bool {
        self.queue.is_queued(node)
    }

    /// Last state recorded for `node`, kept after retirement
    pub fn state_of(&self, node: NodeId) -> Option<AsyncState> {
        self.queue.get(node).map(Coroutine::state)
    }

    pub fn task(&self, node: NodeId) -> Option<&M::Task> {
        self.queue.get(node).map(Coroutine::task)
    }

    /// Mutate a task in place; callers must not touch a running task
    pub fn with_task_mut<R>(&mut self, node: NodeId, f: impl FnOnce(&mut M::Task) -> R) -> Option<R> {
        self.queue.with_mut(node, |co| f(co.task_mut()))
    }

    /// Drop every queued task without visiting them
    pub fn fast_clear(&mut self) -> GridResult<()> {
        self.running = None;
        self.queue.fast_clear()
    }

    /// Drop every queued task, leaving each node orphan
    pub fn deep_clear(&mut self) -> GridResult<()> {
        self.running = None;
        self.queue.deep_clear()
    }

    /// What `update` would currently see, without side effects
    pub fn state(&self) -> AsyncState {
        if self.master.is_failed() {
            return AsyncState::MasterFailed;
        }
        let Some(head) = self.current() else {
            return AsyncState::Idle;
        };
        if !self.master.is_ready() {
            return AsyncState::MasterBusy;
        }
        self.state_of(head).unwrap_or(AsyncState::Failed)
    }

    /// Re-arm a master in sticky failure; the head gets relaunched
    pub fn revive(&mut self) {
        self.master.reset();
        if let Some(head) = self.current() {
            if self.state_of(head) == Some(AsyncState::MasterFailed) {
                self.set_state(head, AsyncState::Idle);
            }
        }
    }

    /// Advance the current task, never blocks
    pub fn update(&mut self) -> AsyncState {
        self.update_with_limit(UNTRUSTED_ITERATION_LIMIT)
    }

    /// [`update`](Self::update) with an explicit retirement budget
    pub fn update_with_limit(&mut self, limit: u16) -> AsyncState {
        let mut sentinel = limit;
        loop {
            if sentinel == 0 {
                self.ctx
                    .assert_error(ErrorCode::InfiniteLoop, "scheduler update: iteration limit reached");
                return AsyncState::Failed;
            }
            if self.master.is_failed() {
                return AsyncState::MasterFailed;
            }
            let Some(head) = self.current() else {
                self.running = None;
                return AsyncState::Idle;
            };
            let Some(state) = self.state_of(head) else {
                self.ctx
                    .assert_error(ErrorCode::InvalidState, "scheduler update: head holds no task");
                return AsyncState::Failed;
            };

            let next = match state {
                AsyncState::Idle | AsyncState::MasterBusy | AsyncState::Waiting => {
                    let master = &mut self.master;
                    self.queue.with_mut(head, |co| {
                        if !master.is_ready() {
                            AsyncState::MasterBusy
                        } else if !co.task().is_ready(master.bus()) {
                            AsyncState::Waiting
                        } else {
                            co.task_mut().launch(master.bus_mut())
                        }
                    })
                }
                AsyncState::Launched => {
                    let master = &mut self.master;
                    self.queue.with_mut(head, |co| {
                        if co.task().is_finished(master.bus()) {
                            AsyncState::Finished
                        } else {
                            master.waiting_for_completion(co.task_mut())
                        }
                    })
                }
                AsyncState::Recoverable => {
                    let master = &mut self.master;
                    self.queue.with_mut(head, |co| master.recover(co.task_mut()))
                }
                AsyncState::Finished | AsyncState::Failed => {
                    self.retire(head, state);
                    sentinel -= 1;
                    continue;
                }
                AsyncState::MasterFailed => return AsyncState::MasterFailed,
                AsyncState::Timedout => {
                    self.ctx
                        .assert_error(ErrorCode::InvalidState, "scheduler update: invalid task state");
                    self.set_state(head, AsyncState::Failed);
                    return AsyncState::Failed;
                }
            };

            let Some(next) = next else {
                self.ctx
                    .assert_error(ErrorCode::InvalidState, "scheduler update: head vanished");
                return AsyncState::Failed;
            };
            self.set_state(head, next);
            self.running = match next {
                AsyncState::Launched | AsyncState::Recoverable => Some(head),
                _ => None,
            };
            if !next.is_terminal() {
                return next;
            }
        }
    }

    /// Run one update and report whether the queue drained
    ///
    /// `WouldBlock` while work remains, an error once the master is down.
    pub fn poll_idle(&mut self) -> nb::Result<(), ErrorCode> {
        match self.update() {
            AsyncState::Idle => Ok(()),
            AsyncState::MasterFailed => Err(nb::Error::Other(ErrorCode::HwError)),
            _ => Err(nb::Error::WouldBlock),
        }
    }

    fn retire(&mut self, head: NodeId, outcome: AsyncState) {
        if let Err(err) = self.queue.cancel(head) {
            self.report(err, "retire: head rejected by queue");
        }
        if self.running == Some(head) {
            self.running = None;
        }
        self.master.task_retired(outcome);
        if outcome == AsyncState::Failed {
            grid_log!(self.ctx, FACILITY, Severity::Warning, "task {} failed", head);
        }
    }

    fn set_state(&mut self, node: NodeId, state: AsyncState) {
        self.queue.with_mut(node, |co| co.set_state(state));
    }
}
