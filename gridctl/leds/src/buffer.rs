//! Pixel buffer and LED addressing

use crate::{
    BicolorPad, DigitalOutput, MonochromePad, PadColor, RingEncoder, RingLedSet, EXPANDERS, MCP_0, MCP_1,
    MULTIPLEX_COLUMNS,
};

const COLUMNS: usize = MULTIPLEX_COLUMNS as usize;
const DEVICES: usize = EXPANDERS as usize;

/// Port A and port B bytes of one expander
pub type PortBytes = [u8; 2];

/// Anode state of every expander for every column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    bytes: [[PortBytes; DEVICES]; COLUMNS],
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [[[0; 2]; DEVICES]; COLUMNS],
        }
    }

    /// Bytes the expander drives while `column` is selected
    pub fn port_bytes(&self, column: u8, expander: u8) -> PortBytes {
        self.bytes[column as usize % COLUMNS][expander as usize % DEVICES]
    }

    pub fn set(&mut self, led: DigitalOutput, on: bool) {
        let byte = self.byte_mut(led);
        let mask = 1 << led.pin_in_port();
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    pub fn get(&self, led: DigitalOutput) -> bool {
        let ports = self.bytes[led.column() as usize][led.expander() as usize];
        ports[led.port().index()] & (1 << led.pin_in_port()) != 0
    }

    pub fn toggle(&mut self, led: DigitalOutput) {
        *self.byte_mut(led) ^= 1 << led.pin_in_port();
    }

    /// Store a ring word; bit 0 of the low byte belongs to another LED
    pub fn set_ring(&mut self, ring: RingLedSet, word: u16) {
        let [low, high] = word.to_le_bytes();
        let column = ring.column() as usize;
        let port = ring.port().index();
        let shared = &mut self.bytes[column][MCP_1 as usize][port];
        *shared = (*shared & 0x01) | (low & 0xFE);
        self.bytes[column][MCP_0 as usize][port] = high;
    }

    pub fn ring(&self, ring: RingLedSet) -> u16 {
        let column = ring.column() as usize;
        let port = ring.port().index();
        let low = self.bytes[column][MCP_1 as usize][port] & 0xFE;
        let high = self.bytes[column][MCP_0 as usize][port];
        u16::from_le_bytes([low, high])
    }

    /// Every LED off
    pub fn clear(&mut self) {
        self.bytes = [[[0; 2]; DEVICES]; COLUMNS];
    }

    fn byte_mut(&mut self, led: DigitalOutput) -> &mut u8 {
        &mut self.bytes[led.column() as usize][led.expander() as usize][led.port().index()]
    }
}

/// Something the driver can light
pub trait LedAddress {
    type State;

    fn store(&self, pixels: &mut PixelBuffer, state: Self::State);

    fn load(&self, pixels: &PixelBuffer) -> Self::State;

    fn toggle(&self, pixels: &mut PixelBuffer);
}

impl LedAddress for DigitalOutput {
    type State = bool;

    fn store(&self, pixels: &mut PixelBuffer, on: bool) {
        pixels.set(*self, on);
    }

    fn load(&self, pixels: &PixelBuffer) -> bool {
        pixels.get(*self)
    }

    fn toggle(&self, pixels: &mut PixelBuffer) {
        pixels.toggle(*self);
    }
}

impl LedAddress for MonochromePad {
    type State = bool;

    fn store(&self, pixels: &mut PixelBuffer, on: bool) {
        self.led.store(pixels, on);
    }

    fn load(&self, pixels: &PixelBuffer) -> bool {
        self.led.load(pixels)
    }

    fn toggle(&self, pixels: &mut PixelBuffer) {
        self.led.toggle(pixels);
    }
}

impl LedAddress for BicolorPad {
    type State = PadColor;

    fn store(&self, pixels: &mut PixelBuffer, color: PadColor) {
        pixels.set(self.green, color.has(PadColor::Green));
        pixels.set(self.red, color.has(PadColor::Red));
    }

    fn load(&self, pixels: &PixelBuffer) -> PadColor {
        let green = pixels.get(self.green) as u8;
        let red = pixels.get(self.red) as u8;
        PadColor::from_bits(green | red << 1)
    }

    fn toggle(&self, pixels: &mut PixelBuffer) {
        pixels.toggle(self.green);
        pixels.toggle(self.red);
    }
}

impl LedAddress for RingLedSet {
    type State = u16;

    fn store(&self, pixels: &mut PixelBuffer, word: u16) {
        pixels.set_ring(*self, word);
    }

    fn load(&self, pixels: &PixelBuffer) -> u16 {
        pixels.ring(*self)
    }

    fn toggle(&self, pixels: &mut PixelBuffer) {
        let word = pixels.ring(*self);
        pixels.set_ring(*self, !word);
    }
}

impl LedAddress for RingEncoder {
    type State = u16;

    fn store(&self, pixels: &mut PixelBuffer, word: u16) {
        self.ring.store(pixels, word);
    }

    fn load(&self, pixels: &PixelBuffer) -> u16 {
        self.ring.load(pixels)
    }

    fn toggle(&self, pixels: &mut PixelBuffer) {
        self.ring.toggle(pixels);
    }
}
