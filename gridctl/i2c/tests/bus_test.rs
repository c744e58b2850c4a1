//! Bus scheduling tests for gridctl-i2c

use gridctl_core::mock::RecordingContext;
use gridctl_i2c::mock::{MockTransport, Outcome};
use gridctl_i2c::{mcp23017, BusMaster, BusScheduler, BusWrite, I2cError, PriorityBusScheduler};
use gridctl_sched::{AsyncState, Scheduler};
use gridctl_containers::{ListQueue, PriorityQueue};

fn fifo(ctx: &RecordingContext, master: BusMaster<MockTransport>) -> BusScheduler<MockTransport, &RecordingContext, 8> {
    Scheduler::new(master, ListQueue::fifo(), ctx)
}

fn gpio(index: u8, a: u8, b: u8) -> BusWrite {
    mcp23017::write_gpio(mcp23017::address(index).unwrap(), a, b).unwrap()
}

#[test]
fn test_three_writes_run_in_order() {
    let ctx = RecordingContext::new();
    let mut sched = fifo(&ctx, BusMaster::new(MockTransport::new()));
    let nodes: Vec<_> = (0..3)
        .map(|i| {
            let node = sched.alloc(gpio(i, i, 0)).unwrap();
            sched.push(node).unwrap();
            node
        })
        .collect();

    assert_eq!(sched.update(), AsyncState::Launched);
    assert_eq!(sched.state_of(nodes[0]), Some(AsyncState::Launched));
    assert_eq!(sched.state_of(nodes[1]), Some(AsyncState::Idle));
    assert_eq!(sched.state_of(nodes[2]), Some(AsyncState::Idle));
    assert_eq!(sched.master().transport().write_count(), 1);

    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Launched);
    assert!(!sched.is_queued(nodes[0]));
    assert_eq!(sched.state_of(nodes[0]), Some(AsyncState::Finished));
    assert_eq!(sched.state_of(nodes[1]), Some(AsyncState::Launched));

    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Launched);
    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Idle);

    assert_eq!(sched.state(), AsyncState::Idle);
    assert!(sched.is_empty());
    let addresses: Vec<u8> = sched.master().transport().writes().iter().map(|w| w.address).collect();
    assert_eq!(addresses, vec![0x20, 0x21, 0x22]);
    assert_eq!(sched.master().stats().finished, 3);
}

#[test]
fn test_outcome_mapping() {
    let cases = [
        (Outcome::Complete, AsyncState::Finished),
        (Outcome::Error(I2cError::AddressNak), AsyncState::Failed),
        (Outcome::Error(I2cError::ArbitrationLost), AsyncState::Recoverable),
        (Outcome::Short(2), AsyncState::Failed),
    ];
    for (outcome, expected) in cases {
        let ctx = RecordingContext::new();
        let mut sched = fifo(&ctx, BusMaster::new(MockTransport::new()));
        sched.master_mut().transport_mut().script(outcome);
        let node = sched.alloc(gpio(0, 0xFF, 0xFF)).unwrap();
        sched.push(node).unwrap();
        sched.update();
        sched.master_mut().transport_mut().finish();
        sched.update();
        assert_eq!(sched.state_of(node), Some(expected), "{:?}", outcome);
    }
}

#[test]
fn test_recoverable_write_is_retried() {
    let ctx = RecordingContext::new();
    let mut sched = fifo(&ctx, BusMaster::new(MockTransport::new()));
    sched
        .master_mut()
        .transport_mut()
        .script(Outcome::Error(I2cError::DataNak));
    let node = sched.alloc(gpio(1, 0x0F, 0xF0)).unwrap();
    sched.push(node).unwrap();

    sched.update();
    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Recoverable);
    assert_eq!(sched.update(), AsyncState::Launched);
    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Idle);

    assert_eq!(sched.state_of(node), Some(AsyncState::Finished));
    assert_eq!(sched.master().transport().write_count(), 2);
    assert_eq!(sched.master().stats().retries, 1);
}

#[test]
fn test_retry_budget_exhaustion_fails_task() {
    let ctx = RecordingContext::new();
    let mut sched = fifo(&ctx, BusMaster::new(MockTransport::auto_complete()).with_max_retries(1));
    for _ in 0..2 {
        sched
            .master_mut()
            .transport_mut()
            .script(Outcome::Error(I2cError::BitError));
    }
    let node = sched.alloc(gpio(0, 1, 1)).unwrap();
    sched.push(node).unwrap();

    for _ in 0..6 {
        sched.update();
    }
    assert_eq!(sched.state_of(node), Some(AsyncState::Failed));
    assert_eq!(sched.master().transport().write_count(), 2);
    assert!(ctx.logged("failed"));
}

#[test]
fn test_rejected_launch_chains_to_next_write() {
    let ctx = RecordingContext::new();
    let mut sched = fifo(&ctx, BusMaster::new(MockTransport::new()));
    sched
        .master_mut()
        .transport_mut()
        .script(Outcome::Reject(I2cError::InvalidRequest));
    let bad = sched.alloc(gpio(0, 0, 0)).unwrap();
    let good = sched.alloc(gpio(1, 0, 0)).unwrap();
    sched.push(bad).unwrap();
    sched.push(good).unwrap();

    assert_eq!(sched.update(), AsyncState::Launched);
    assert_eq!(sched.state_of(bad), Some(AsyncState::Failed));
    assert_eq!(sched.state_of(good), Some(AsyncState::Launched));
}

#[test]
fn test_consecutive_failures_take_bus_down() {
    let ctx = RecordingContext::new();
    let master = BusMaster::new(MockTransport::auto_complete()).with_failure_threshold(2);
    let mut sched = fifo(&ctx, master);
    for _ in 0..2 {
        sched
            .master_mut()
            .transport_mut()
            .script(Outcome::Error(I2cError::AddressNak));
    }
    let nodes: Vec<_> = (0..3)
        .map(|i| {
            let node = sched.alloc(gpio(i, 0, 0)).unwrap();
            sched.push(node).unwrap();
            node
        })
        .collect();

    let mut last = AsyncState::Idle;
    for _ in 0..4 {
        last = sched.update();
    }
    assert_eq!(last, AsyncState::MasterFailed);
    assert_eq!(sched.state(), AsyncState::MasterFailed);
    assert!(sched.is_queued(nodes[2]));
    assert_eq!(sched.poll_idle(), Err(nb::Error::Other(gridctl_core::ErrorCode::HwError)));

    sched.revive();
    assert_eq!(sched.update(), AsyncState::Launched);
    assert_eq!(sched.update(), AsyncState::Idle);
    assert_eq!(sched.state_of(nodes[2]), Some(AsyncState::Finished));
}

#[test]
fn test_rearmed_node_is_reused() {
    let ctx = RecordingContext::new();
    let mut sched = fifo(&ctx, BusMaster::new(MockTransport::auto_complete()));
    let node = sched.alloc(gpio(2, 0, 0)).unwrap();
    for value in [0x11, 0x22, 0x33] {
        sched
            .with_task_mut(node, |write| write.set_payload(&[mcp23017::reg::GPIOA, value, !value]))
            .unwrap()
            .unwrap();
        sched.push(node).unwrap();
        while sched.poll_idle().is_err() {}
    }
    let last = sched.master().transport().last_write().unwrap();
    assert_eq!(&last.bytes[..], &[0x12, 0x33, 0xCC]);
    assert_eq!(sched.master().transport().write_count(), 3);
}

#[test]
fn test_priority_bus_serves_urgent_first() {
    let ctx = RecordingContext::new();
    let mut sched: PriorityBusScheduler<MockTransport, _, 4> =
        Scheduler::new(BusMaster::new(MockTransport::auto_complete()), PriorityQueue::default(), &ctx);
    for (index, priority) in [(0, 1), (1, 7), (2, 3)] {
        let node = sched.alloc(gpio(index, 0, 0).with_priority(priority)).unwrap();
        sched.push(node).unwrap();
    }
    assert_eq!(sched.update(), AsyncState::Launched);
    let first = sched.master().transport().writes()[0].address;
    assert_eq!(first, 0x21);
    while sched.poll_idle().is_err() {}
    let order: Vec<u8> = sched.master().transport().writes().iter().map(|w| w.address).collect();
    assert_eq!(order, vec![0x21, 0x22, 0x20]);
}

#[test]
fn test_urgent_push_waits_for_write_in_flight() {
    let ctx = RecordingContext::new();
    let mut sched: PriorityBusScheduler<MockTransport, _, 4> =
        Scheduler::new(BusMaster::new(MockTransport::new()), PriorityQueue::default(), &ctx);
    sched.master_mut().transport_mut().script(Outcome::Error(I2cError::AddressNak));

    let low = sched.alloc(gpio(0, 0, 0).with_priority(1)).unwrap();
    sched.push(low).unwrap();
    assert_eq!(sched.update(), AsyncState::Launched);
    assert_eq!(sched.current(), Some(low));

    let high = sched.alloc(gpio(1, 0, 0).with_priority(7)).unwrap();
    sched.push(high).unwrap();
    assert_eq!(sched.next(), Some(high));
    assert_eq!(sched.current(), Some(low));
    assert_eq!(sched.update(), AsyncState::Launched);
    assert_eq!(sched.state_of(high), Some(AsyncState::Idle));
    assert_eq!(sched.master().transport().write_count(), 1);

    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Launched);
    assert_eq!(sched.state_of(low), Some(AsyncState::Failed));
    assert_eq!(sched.state_of(high), Some(AsyncState::Launched));

    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Idle);
    assert_eq!(sched.state_of(high), Some(AsyncState::Finished));
    let order: Vec<u8> = sched.master().transport().writes().iter().map(|w| w.address).collect();
    assert_eq!(order, vec![0x20, 0x21]);
    assert_eq!(sched.master().stats().failed, 1);
    assert_eq!(sched.master().stats().finished, 1);
}

#[test]
fn test_lifo_push_waits_for_write_in_flight() {
    let ctx = RecordingContext::new();
    let mut sched: BusScheduler<MockTransport, _, 8> =
        Scheduler::new(BusMaster::new(MockTransport::new()), ListQueue::lifo(), &ctx);
    sched.master_mut().transport_mut().script(Outcome::Short(1));

    let first = sched.alloc(gpio(0, 1, 1)).unwrap();
    sched.push(first).unwrap();
    assert_eq!(sched.update(), AsyncState::Launched);
    let second = sched.alloc(gpio(1, 2, 2)).unwrap();
    sched.push(second).unwrap();
    assert_eq!(sched.update(), AsyncState::Launched);
    assert_eq!(sched.master().transport().write_count(), 1);

    sched.master_mut().transport_mut().finish();
    sched.update();
    assert_eq!(sched.state_of(first), Some(AsyncState::Failed));
    sched.master_mut().transport_mut().finish();
    assert_eq!(sched.update(), AsyncState::Idle);
    assert_eq!(sched.state_of(second), Some(AsyncState::Finished));
}
