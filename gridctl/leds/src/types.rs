//! LED states and control descriptors

use core::fmt;

use crate::{DigitalInput, DigitalOutput, Encoder, RingLedSet};

/// Color of a bicolor pad, one bit per channel
///
/// Monochrome pads only use the green channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PadColor {
    #[default]
    Off = 0x00,
    Green = 0x01,
    Red = 0x02,
    Orange = 0x03,
}

impl PadColor {
    pub const ON: Self = Self::Green;

    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Self::Off,
            0x01 => Self::Green,
            0x02 => Self::Red,
            _ => Self::Orange,
        }
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// `self` lights up one of the channels of `channel`
    pub const fn has(self, channel: PadColor) -> bool {
        self.bits() & channel.bits() != 0
    }

    /// Color with both channels flipped
    pub const fn inverted(self) -> Self {
        Self::from_bits(!self.bits())
    }
}

impl From<bool> for PadColor {
    fn from(on: bool) -> Self {
        if on {
            Self::ON
        } else {
            Self::Off
        }
    }
}

/// Lit arc of an encoder ring
///
/// `start` is the first lit LED and `count` the number of lit LEDs, both
/// kept on 4 bits. A `count` of 0 or a `start` of 15 is a dark ring. Only a
/// single contiguous arc can be expressed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LedRingState {
    start: u8,
    count: u8,
}

impl LedRingState {
    pub const fn new(start: u8, count: u8) -> Self {
        Self {
            start: start & 0x0F,
            count: count & 0x0F,
        }
    }

    pub const fn off() -> Self {
        Self::new(0, 0)
    }

    pub const fn full() -> Self {
        Self::new(0, 15)
    }

    /// Center LED only
    pub const fn center() -> Self {
        Self::new(7, 1)
    }

    pub const fn start(&self) -> u8 {
        self.start
    }

    pub const fn count(&self) -> u8 {
        self.count
    }

    /// One bit per LED, LED `i` on bit `i + 1`; bit 0 is always clear
    pub const fn word(&self) -> u16 {
        let start = self.start as u32;
        let count = self.count as u32;
        let upto = (1u32 << (start + count + 1)) - 1;
        let below = (1u32 << (start + 1)) - 1;
        (upto & !below) as u16
    }

    pub const fn lsb(&self) -> u8 {
        (self.word() & 0x00FE) as u8
    }

    pub const fn msb(&self) -> u8 {
        (self.word() >> 8) as u8
    }
}

impl From<LedRingState> for u16 {
    fn from(state: LedRingState) -> Self {
        state.word()
    }
}

impl fmt::Debug for LedRingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedRingState({}+{} = {:#06x})", self.start, self.count, self.word())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LedRingState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "LedRingState({=u8}+{=u8})", self.start, self.count);
    }
}

/// Button without LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlindPad {
    pub input: DigitalInput,
}

/// Button with a single color LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonochromePad {
    pub input: DigitalInput,
    pub led: DigitalOutput,
}

/// Button with a green and a red LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BicolorPad {
    pub input: DigitalInput,
    pub green: DigitalOutput,
    pub red: DigitalOutput,
}

/// Encoder surrounded by a 15 LED ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingEncoder {
    pub encoder: Encoder,
    pub ring: RingLedSet,
}
