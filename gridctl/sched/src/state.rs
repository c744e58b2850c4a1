//! Task lifecycle states

use core::fmt;

/// State of a scheduled task
///
/// `Idle`, `MasterBusy` and `Waiting` mean not launched yet. `Finished` and
/// `Failed` are terminal and get the task removed from its queue.
/// `MasterFailed` is sticky for the whole scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AsyncState {
    /// Not launched yet
    Idle,
    /// Launch attempted while the master was not ready
    MasterBusy,
    /// Launch attempted while the task itself was not ready
    Waiting,
    /// Running, completion pending
    Launched,
    /// Done with success
    Finished,
    /// Failed, launching again may work
    Recoverable,
    /// Did not complete in time
    Timedout,
    /// Failed, launching again is useless
    Failed,
    /// The master is unusable
    MasterFailed,
}

impl AsyncState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::MasterBusy => "MasterBusy",
            Self::Waiting => "Waiting",
            Self::Launched => "Launched",
            Self::Finished => "Finished",
            Self::Recoverable => "Recoverable",
            Self::Timedout => "Timedout",
            Self::Failed => "Failed",
            Self::MasterFailed => "MasterFailed",
        }
    }

    /// Not launched yet
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Idle | Self::MasterBusy | Self::Waiting)
    }

    /// Retired from the queue on the next update
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl fmt::Display for AsyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AsyncState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.name());
    }
}
