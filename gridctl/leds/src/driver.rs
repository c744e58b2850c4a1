//! LED multiplex driver
//!
//! One column is refreshed per cycle. In `Ready` the driver waits for the
//! column period, compares the column bytes with what each expander
//! currently drives and queues a GPIO write for every expander that
//! differs. `UpdatingGpios` waits for those writes to retire, `Ending`
//! waits for the bus to drain, then the column is lit and the next one
//! becomes current. A column that does not make it within `timeout_ms` is
//! lit anyway and reported stale.

use core::fmt;

use gridctl_containers::{ListQueue, NodeId};
use gridctl_core::{Clock, Context, Deadline, ErrorCode, Flag, GridResult, Severity};
use gridctl_i2c::{mcp23017, BusMaster, BusScheduler, Transport};
use gridctl_sched::{AsyncState, Scheduler};
use heapless::Vec;

use crate::{ColumnSelect, DriverConfig, LedAddress, PixelBuffer, PortBytes, EXPANDERS, MULTIPLEX_COLUMNS};

const FACILITY: &str = "LEDS";

const DEVICES: usize = EXPANDERS as usize;

/// IOCON and IODIR for every expander
const SETUP_WRITES: usize = 2 * DEVICES;

/// Queue anchor, one GPIO write and the setup writes of every expander
pub const QUEUE_SLOTS: usize = 1 + DEVICES + SETUP_WRITES;

/// Sequential addressing, interleaved banks, push-pull interrupts
const IOCON_FLAGS: u8 = 0;

/// Every pin an output
const ALL_OUTPUTS: u16 = 0x0000;

/// Position of the driver within a column refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Waiting to start the next column
    Ready,
    /// GPIO writes of the current column on the bus
    UpdatingGpios,
    /// Waiting for the bus to drain
    Ending,
}

#[cfg(feature = "defmt")]
impl defmt::Format for CycleState {
    fn format(&self, fmt: defmt::Formatter) {
        let name = match self {
            Self::Ready => "READY",
            Self::UpdatingGpios => "UPDATING_GPIOS",
            Self::Ending => "ENDING",
        };
        defmt::write!(fmt, "{=str}", name);
    }
}

/// Drives the LED matrix through the I2C bus scheduler
pub struct LedsDriver<T, C, S, K>
where
    T: Transport,
    C: Context,
    S: ColumnSelect,
    K: Clock,
{
    bus: BusScheduler<T, C, QUEUE_SLOTS>,
    gpio_nodes: Vec<NodeId, DEVICES>,
    select: S,
    clock: K,
    config: DriverConfig,
    pixels: PixelBuffer,
    latched: [Option<PortBytes>; DEVICES],
    writing: [PortBytes; DEVICES],
    pending: u8,
    column: u8,
    state: CycleState,
    column_started: u32,
    deadline: Deadline,
    column_failed: bool,
    stale: u8,
    available: bool,
}

impl<T, C, S, K> LedsDriver<T, C, S, K>
where
    T: Transport,
    C: Context,
    S: ColumnSelect,
    K: Clock,
{
    /// Build an unavailable driver, [`setup`](Self::setup) brings it up
    pub fn new(transport: T, ctx: C, select: S, clock: K, config: DriverConfig) -> GridResult<Self> {
        let master = BusMaster::new(transport)
            .with_max_retries(config.max_retries)
            .with_failure_threshold(config.failure_threshold);
        let mut bus: BusScheduler<T, C, QUEUE_SLOTS> = Scheduler::new(master, ListQueue::fifo(), ctx);

        let mut gpio_nodes = Vec::new();
        for index in 0..EXPANDERS {
            let write = mcp23017::write_gpio(mcp23017::address(index)?, 0, 0)?;
            let node = bus.alloc(write)?;
            gpio_nodes.push(node).map_err(|_| ErrorCode::Memory)?;
        }

        let now = clock.now_ms();
        Ok(Self {
            bus,
            gpio_nodes,
            select,
            clock,
            config,
            pixels: PixelBuffer::new(),
            latched: [None; DEVICES],
            writing: [[0; 2]; DEVICES],
            pending: 0,
            column: 0,
            state: CycleState::Ready,
            column_started: now,
            deadline: Deadline::after(now, 0),
            column_failed: false,
            stale: 0,
            available: false,
        })
    }

    /// Configure every expander, blocking until done or `timeout_ms`
    ///
    /// On failure the driver stays unavailable and returns `HwError`.
    /// Calling it again re-arms a driver whose bus went down.
    pub fn setup(&mut self, refresh_rate_hz: u32, timeout_ms: u32) -> GridResult<()> {
        self.set_available(false);
        self.config.refresh_rate_hz = refresh_rate_hz;
        self.config.timeout_ms = timeout_ms;
        if let Err(err) = self.config.validate() {
            self.log(Severity::Error, format_args!("invalid refresh settings"));
            return Err(err);
        }

        self.bus.revive();
        self.bus.deep_clear()?;
        let mut nodes: Vec<NodeId, SETUP_WRITES> = Vec::new();
        let result = self.run_setup(&mut nodes);
        let cleanup = self.release_setup(nodes);
        if let Err(err) = result.and(cleanup) {
            let _ = self.select.disable();
            self.log(Severity::Error, format_args!("setup failed: {}", err.name()));
            return Err(ErrorCode::HwError);
        }

        let now = self.clock.now_ms();
        self.latched = [None; DEVICES];
        self.pending = 0;
        self.column = 0;
        self.stale = 0;
        self.state = CycleState::Ready;
        self.column_started = now.wrapping_sub(self.config.column_period_ms());
        self.set_available(true);
        self.log(
            Severity::Info,
            format_args!("ready, {} Hz refresh", self.config.refresh_rate_hz),
        );
        Ok(())
    }

    fn run_setup(&mut self, nodes: &mut Vec<NodeId, SETUP_WRITES>) -> GridResult<()> {
        self.select.disable()?;
        for index in 0..EXPANDERS {
            let address = mcp23017::address(index)?;
            for write in [
                mcp23017::configure(address, IOCON_FLAGS)?,
                mcp23017::set_direction(address, ALL_OUTPUTS)?,
            ] {
                let node = self.bus.alloc(write)?;
                nodes.push(node).map_err(|_| ErrorCode::Memory)?;
                self.bus.push(node)?;
            }
        }

        let deadline = Deadline::after(self.clock.now_ms(), self.config.timeout_ms);
        loop {
            match self.bus.update() {
                AsyncState::Idle => break,
                AsyncState::MasterFailed => return Err(ErrorCode::HwError),
                _ if deadline.is_expired(self.clock.now_ms()) => return Err(ErrorCode::Timeout),
                _ => {}
            }
        }

        for (index, node) in nodes.iter().enumerate() {
            if self.bus.state_of(*node) != Some(AsyncState::Finished) {
                self.log(
                    Severity::Error,
                    format_args!("expander {} did not accept setup", index / 2),
                );
                return Err(ErrorCode::HwError);
            }
        }
        Ok(())
    }

    /// Drop the setup writes, a stuck one included
    fn release_setup(&mut self, nodes: Vec<NodeId, SETUP_WRITES>) -> GridResult<()> {
        let cleared = self.bus.deep_clear();
        let mut released: GridResult<()> = Ok(());
        for node in nodes {
            released = released.and(self.bus.release(node).map(drop));
        }
        cleared.and(released)
    }

    /// Advance the refresh cycle by one step, never blocks
    pub fn update(&mut self) -> GridResult<()> {
        if !self.available {
            return Err(ErrorCode::HwError);
        }
        let now = self.clock.now_ms();
        match self.state {
            CycleState::Ready => self.begin_cycle(now),
            CycleState::UpdatingGpios => self.update_gpios(now),
            CycleState::Ending => self.end_cycle(now),
        }
    }

    fn begin_cycle(&mut self, now: u32) -> GridResult<()> {
        if now.wrapping_sub(self.column_started) < self.config.column_period_ms() {
            return Ok(());
        }

        self.column_failed = false;
        self.pending = 0;
        for index in 0..DEVICES {
            let bytes = self.pixels.port_bytes(self.column, index as u8);
            if self.latched[index] == Some(bytes) {
                continue;
            }
            let node = self.gpio_nodes[index];
            if self.bus.is_queued(node) {
                // previous write never retired
                self.column_failed = true;
                continue;
            }
            self.latched[index] = None;
            self.writing[index] = bytes;
            self.bus
                .with_task_mut(node, |write| {
                    write.set_payload(&[mcp23017::reg::GPIOA, bytes[0], bytes[1]])
                })
                .ok_or(ErrorCode::InvalidState)??;
            self.bus.push(node)?;
            self.pending |= 1 << index;
        }

        if self.pending == 0 {
            return self.show_column(now);
        }
        self.select.disable()?;
        self.deadline = Deadline::after(now, self.config.timeout_ms);
        self.state = CycleState::UpdatingGpios;
        Ok(())
    }

    fn update_gpios(&mut self, now: u32) -> GridResult<()> {
        if self.bus.update() == AsyncState::MasterFailed {
            return self.bus_down();
        }
        self.collect_retired();
        if self.pending == 0 {
            self.enter_ending(now);
            return Ok(());
        }
        if !self.deadline.is_expired(now) {
            return Ok(());
        }

        for index in 0..DEVICES {
            let node = self.gpio_nodes[index];
            if self.pending & (1 << index) != 0 && self.bus.state_of(node) != Some(AsyncState::Launched) {
                self.bus.cancel(node)?;
                self.pending &= !(1 << index);
            }
        }
        self.column_failed = true;
        self.log(
            Severity::Warning,
            format_args!("column {} timed out after {} ms", self.column, self.config.timeout_ms),
        );
        self.enter_ending(now);
        Ok(())
    }

    fn end_cycle(&mut self, now: u32) -> GridResult<()> {
        let bus = self.bus.update();
        if bus == AsyncState::MasterFailed {
            return self.bus_down();
        }
        self.collect_retired();
        if bus != AsyncState::Idle {
            if !self.deadline.is_expired(now) {
                return Ok(());
            }
            self.column_failed = true;
            self.log(
                Severity::Error,
                format_args!("bus still busy after column {}", self.column),
            );
        }
        self.show_column(now)
    }

    fn enter_ending(&mut self, now: u32) {
        self.state = CycleState::Ending;
        self.deadline = Deadline::after(now, self.config.timeout_ms);
    }

    /// Latch what the retired writes of this cycle put on the expanders
    fn collect_retired(&mut self) {
        for index in 0..DEVICES {
            let node = self.gpio_nodes[index];
            if self.pending & (1 << index) == 0 || self.bus.is_queued(node) {
                continue;
            }
            self.pending &= !(1 << index);
            if self.bus.state_of(node) == Some(AsyncState::Finished) {
                self.latched[index] = Some(self.writing[index]);
            } else {
                self.column_failed = true;
                self.log(
                    Severity::Warning,
                    format_args!("expander {} write failed on column {}", index, self.column),
                );
            }
        }
    }

    fn show_column(&mut self, now: u32) -> GridResult<()> {
        if let Err(err) = self.select.select(self.column) {
            self.log(Severity::Error, format_args!("cannot select column {}", self.column));
            return Err(err);
        }
        let bit = 1 << self.column;
        if self.column_failed {
            if self.stale & bit == 0 {
                self.log(Severity::Warning, format_args!("column {} stale", self.column));
            }
            self.stale |= bit;
        } else {
            self.stale &= !bit;
        }
        self.column_started = now;
        self.column = (self.column + 1) % MULTIPLEX_COLUMNS;
        self.state = CycleState::Ready;
        Ok(())
    }

    fn bus_down(&mut self) -> GridResult<()> {
        self.set_available(false);
        let _ = self.select.disable();
        self.log(Severity::Critical, format_args!("I2C bus down, LEDs disabled"));
        Err(ErrorCode::HwError)
    }

    fn set_available(&mut self, available: bool) {
        self.available = available;
        self.bus.context().set_flag(Flag::LedsDriverAvailable, available);
    }

    fn log(&self, severity: Severity, args: fmt::Arguments<'_>) {
        if self.config.filter().accepts(severity) {
            self.bus.context().log(FACILITY, severity, args);
        }
    }

    /// Change the state of an LED, visible after the next pass on its column
    pub fn write<L: LedAddress>(&mut self, led: &L, state: impl Into<L::State>) {
        led.store(&mut self.pixels, state.into());
    }

    pub fn toggle<L: LedAddress>(&mut self, led: &L) {
        led.toggle(&mut self.pixels);
    }

    pub fn read<L: LedAddress>(&self, led: &L) -> L::State {
        led.load(&self.pixels)
    }

    /// Turn every LED off
    pub fn clear(&mut self) {
        self.pixels.clear();
    }

    /// Column the next cycle refreshes
    pub fn column(&self) -> u8 {
        self.column
    }

    pub fn cycle_state(&self) -> CycleState {
        self.state
    }

    /// Bit `n` set while column `n` shows outdated data
    pub fn stale_columns(&self) -> u8 {
        self.stale
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn bus(&self) -> &BusScheduler<T, C, QUEUE_SLOTS> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut BusScheduler<T, C, QUEUE_SLOTS> {
        &mut self.bus
    }

    pub fn select(&self) -> &S {
        &self.select
    }
}
