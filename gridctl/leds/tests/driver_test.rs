//! Refresh cycle tests for gridctl-leds

use std::cell::Cell;

use gridctl_core::mock::{ManualClock, RecordingContext};
use gridctl_core::{Clock, Context, ErrorCode, Flag, GridResult, Severity};
use gridctl_i2c::mock::{MockTransport, Outcome};
use gridctl_i2c::I2cError;
use gridctl_leds::layout;
use gridctl_leds::{ColumnSelect, CycleState, DriverConfig, LedRingState, LedsDriver, PadColor};

#[derive(Default)]
struct RecordingSelect {
    selected: Vec<u8>,
    lit: Option<u8>,
}

impl ColumnSelect for RecordingSelect {
    fn select(&mut self, column: u8) -> GridResult<()> {
        self.selected.push(column);
        self.lit = Some(column);
        Ok(())
    }

    fn disable(&mut self) -> GridResult<()> {
        self.lit = None;
        Ok(())
    }
}

/// Clock moving one millisecond every time it is read
#[derive(Default)]
struct TickingClock(Cell<u32>);

impl Clock for TickingClock {
    fn now_ms(&self) -> u32 {
        let now = self.0.get();
        self.0.set(now + 1);
        now
    }
}

type Driver<'a> = LedsDriver<MockTransport, &'a RecordingContext, RecordingSelect, &'a ManualClock>;

fn config() -> DriverConfig {
    DriverConfig::builder().log_level(Severity::Debug).build()
}

fn driver<'a>(ctx: &'a RecordingContext, clock: &'a ManualClock) -> Driver<'a> {
    LedsDriver::new(MockTransport::auto_complete(), ctx, RecordingSelect::default(), clock, config()).unwrap()
}

/// Driver after a successful setup at 125 Hz, 10 ms timeout, history cleared
fn ready<'a>(ctx: &'a RecordingContext, clock: &'a ManualClock) -> Driver<'a> {
    let mut driver = driver(ctx, clock);
    driver.setup(125, 10).unwrap();
    transport(&mut driver).clear_writes();
    driver
}

fn transport<'d>(driver: &'d mut Driver<'_>) -> &'d mut MockTransport {
    driver.bus_mut().master_mut().transport_mut()
}

fn writes(driver: &Driver<'_>) -> Vec<(u8, Vec<u8>)> {
    driver
        .bus()
        .master()
        .transport()
        .writes()
        .iter()
        .map(|w| (w.address, w.bytes.to_vec()))
        .collect()
}

fn run_until_column(driver: &mut Driver<'_>, clock: &ManualClock, column: u8) {
    for _ in 0..100 {
        if driver.column() == column && driver.cycle_state() == CycleState::Ready {
            return;
        }
        clock.advance(1);
        driver.update().unwrap();
    }
    panic!("column {} never reached", column);
}

#[test]
fn test_update_before_setup_fails() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = driver(&ctx, &clock);
    assert!(!driver.is_available());
    assert_eq!(driver.update(), Err(ErrorCode::HwError));
}

#[test]
fn test_setup_configures_every_expander() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = driver(&ctx, &clock);
    driver.setup(50, 200).unwrap();

    assert!(driver.is_available());
    assert!(ctx.flag(Flag::LedsDriverAvailable));
    assert_eq!(driver.config().column_period_ms(), 2);
    assert_eq!(
        writes(&driver),
        vec![
            (0x20, vec![0x0A, 0x00]),
            (0x20, vec![0x00, 0x00, 0x00]),
            (0x21, vec![0x0A, 0x00]),
            (0x21, vec![0x00, 0x00, 0x00]),
            (0x22, vec![0x0A, 0x00]),
            (0x22, vec![0x00, 0x00, 0x00]),
        ]
    );
    assert!(driver.bus().is_empty());
}

#[test]
fn test_setup_fails_on_missing_expander() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = driver(&ctx, &clock);
    transport(&mut driver).script(Outcome::Complete);
    transport(&mut driver).script(Outcome::Complete);
    transport(&mut driver).script(Outcome::Error(I2cError::AddressNak));

    assert_eq!(driver.setup(50, 200), Err(ErrorCode::HwError));
    assert!(!driver.is_available());
    assert!(!ctx.flag(Flag::LedsDriverAvailable));
    assert!(ctx.logged("expander 1 did not accept setup"));
    assert_eq!(driver.update(), Err(ErrorCode::HwError));
}

#[test]
fn test_setup_times_out_on_stuck_bus() {
    let ctx = RecordingContext::new();
    let clock = TickingClock::default();
    let mut driver: LedsDriver<MockTransport, &RecordingContext, RecordingSelect, &TickingClock> =
        LedsDriver::new(MockTransport::new(), &ctx, RecordingSelect::default(), &clock, config()).unwrap();

    assert_eq!(driver.setup(50, 10), Err(ErrorCode::HwError));
    assert!(ctx.logged("TIMEOUT"));
    assert_eq!(driver.bus().master().transport().write_count(), 1);
}

#[test]
fn test_setup_recovers_after_stuck_bus() {
    let ctx = RecordingContext::new();
    let clock = TickingClock::default();
    let mut driver: LedsDriver<MockTransport, &RecordingContext, RecordingSelect, &TickingClock> =
        LedsDriver::new(MockTransport::new(), &ctx, RecordingSelect::default(), &clock, config()).unwrap();
    assert_eq!(driver.setup(50, 10), Err(ErrorCode::HwError));

    let transport = driver.bus_mut().master_mut().transport_mut();
    transport.set_auto_complete(true);
    transport.finish();
    driver.setup(50, 10).unwrap();
    assert!(driver.is_available());
    assert!(driver.bus().is_empty());
    assert_eq!(ctx.assert_count(), 0);
    assert_eq!(driver.bus().master().transport().write_count(), 7);
}

#[test]
fn test_invalid_rate_is_rejected() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = driver(&ctx, &clock);
    assert_eq!(driver.setup(0, 200), Err(ErrorCode::InvalidArgument));
    assert!(!driver.is_available());
}

#[test]
fn test_first_column_writes_every_expander() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(100);
    let mut driver = ready(&ctx, &clock);
    driver.write(&layout::CLIP[0][0], PadColor::Orange);

    driver.update().unwrap();
    assert_eq!(driver.cycle_state(), CycleState::UpdatingGpios);
    assert_eq!(driver.select().lit, None);

    run_until_column(&mut driver, &clock, 1);
    assert_eq!(
        writes(&driver),
        vec![
            (0x20, vec![0x12, 0x00, 0x00]),
            (0x21, vec![0x12, 0x00, 0x00]),
            (0x22, vec![0x12, 0x08, 0x08]),
        ]
    );
    assert_eq!(driver.select().selected, vec![0]);
    assert_eq!(driver.select().lit, Some(0));
    assert_eq!(driver.stale_columns(), 0);
}

#[test]
fn test_unchanged_columns_skip_the_bus() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = ready(&ctx, &clock);

    run_until_column(&mut driver, &clock, 1);
    assert_eq!(writes(&driver).len(), 3);
    for _ in 0..7 {
        clock.advance(1);
        driver.update().unwrap();
        assert_eq!(driver.cycle_state(), CycleState::Ready);
    }
    assert_eq!(driver.column(), 0);
    assert_eq!(writes(&driver).len(), 3);
    assert_eq!(driver.select().selected, vec![0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_column_waits_for_its_period() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = driver(&ctx, &clock);
    driver.setup(50, 10).unwrap();
    run_until_column(&mut driver, &clock, 1);

    driver.update().unwrap();
    assert_eq!(driver.column(), 1);
    clock.advance(1);
    driver.update().unwrap();
    assert_eq!(driver.column(), 1);
    clock.advance(1);
    driver.update().unwrap();
    assert_eq!(driver.column(), 2);
}

#[test]
fn test_ring_lands_on_two_expanders() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = ready(&ctx, &clock);
    let encoder = layout::TRACK_ENCODERS[2];
    driver.write(&encoder, LedRingState::new(3, 5));
    assert_eq!(driver.read(&encoder), 0x01F0);

    run_until_column(&mut driver, &clock, 3);
    let written = writes(&driver);
    assert_eq!(written.len(), 5);
    assert_eq!(written[3], (0x20, vec![0x12, 0x01, 0x00]));
    assert_eq!(written[4], (0x21, vec![0x12, 0xF0, 0x00]));
}

#[test]
fn test_pad_api() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = driver(&ctx, &clock);

    driver.write(&layout::CLIP[4][7], PadColor::Red);
    assert_eq!(driver.read(&layout::CLIP[4][7]), PadColor::Red);
    driver.toggle(&layout::CLIP[4][7]);
    assert_eq!(driver.read(&layout::CLIP[4][7]), PadColor::Green);

    driver.write(&layout::METRONOME, true);
    assert!(driver.read(&layout::METRONOME));
    driver.toggle(&layout::METRONOME);
    assert!(!driver.read(&layout::METRONOME));

    driver.write(&layout::DEVICE_ENCODERS[0], LedRingState::center());
    driver.toggle(&layout::DEVICE_ENCODERS[0]);
    assert_eq!(driver.read(&layout::DEVICE_ENCODERS[0]), 0xFEFE);

    driver.clear();
    assert_eq!(driver.read(&layout::CLIP[4][7]), PadColor::Off);
    assert_eq!(driver.read(&layout::DEVICE_ENCODERS[0]), 0);
}

#[test]
fn test_failed_write_marks_column_stale() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = ready(&ctx, &clock);
    transport(&mut driver).script(Outcome::Complete);
    transport(&mut driver).script(Outcome::Complete);
    transport(&mut driver).script(Outcome::Error(I2cError::AddressNak));

    run_until_column(&mut driver, &clock, 1);
    assert_eq!(driver.stale_columns(), 0b0000_0001);
    assert!(ctx.logged("expander 2 write failed on column 0"));
    assert!(ctx.logged("column 0 stale"));

    run_until_column(&mut driver, &clock, 0);
    run_until_column(&mut driver, &clock, 1);
    assert_eq!(driver.stale_columns(), 0);
    assert!(driver.is_available());
}

#[test]
fn test_timeout_leaves_column_stale() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let mut driver = ready(&ctx, &clock);
    transport(&mut driver).set_auto_complete(false);

    driver.update().unwrap();
    driver.update().unwrap();
    assert_eq!(writes(&driver).len(), 1);

    clock.advance(11);
    driver.update().unwrap();
    assert_eq!(driver.cycle_state(), CycleState::Ending);
    assert!(ctx.logged("column 0 timed out"));
    assert_eq!(driver.bus().len(), 1);

    driver.update().unwrap();
    assert_eq!(driver.cycle_state(), CycleState::Ending);
    clock.advance(11);
    driver.update().unwrap();
    assert_eq!(driver.cycle_state(), CycleState::Ready);
    assert_eq!(driver.stale_columns(), 0b0000_0001);
    assert!(ctx.logged("column 0 stale"));

    transport(&mut driver).set_auto_complete(true);
    transport(&mut driver).finish();
    for _ in 0..200 {
        clock.advance(1);
        driver.update().unwrap();
    }
    assert_eq!(driver.stale_columns(), 0);
}

#[test]
fn test_dead_bus_disables_driver() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let config = DriverConfig::builder().failure_threshold(2).build();
    let mut driver: Driver<'_> =
        LedsDriver::new(MockTransport::auto_complete(), &ctx, RecordingSelect::default(), &clock, config).unwrap();
    driver.setup(125, 10).unwrap();
    for _ in 0..2 {
        transport(&mut driver).script(Outcome::Error(I2cError::AddressNak));
    }

    driver.update().unwrap();
    assert_eq!(driver.update(), Err(ErrorCode::HwError));
    assert!(!driver.is_available());
    assert!(!ctx.flag(Flag::LedsDriverAvailable));
    assert!(ctx.logged("bus down"));
    assert_eq!(driver.update(), Err(ErrorCode::HwError));

    driver.setup(125, 10).unwrap();
    assert!(driver.is_available());
    run_until_column(&mut driver, &clock, 1);
}

#[test]
fn test_log_level_filters_driver_messages() {
    let ctx = RecordingContext::new();
    let clock = ManualClock::new(0);
    let config = DriverConfig::builder().log_level(Severity::Warning).build();
    let mut driver: Driver<'_> =
        LedsDriver::new(MockTransport::auto_complete(), &ctx, RecordingSelect::default(), &clock, config).unwrap();
    driver.setup(125, 10).unwrap();
    assert!(!ctx.logged("ready"));

    let _driver = ready(&ctx, &clock);
    assert!(ctx.logged("ready, 125 Hz refresh"));
}
