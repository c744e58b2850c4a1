//! MCP23017 16 bit port expander
//!
//! Register addresses assume `IOCON.BANK = 0`, where port A and port B
//! registers are interleaved and a sequential write to `GPIOA` continues
//! into `GPIOB`.

use gridctl_core::{ErrorCode, GridResult};

use crate::BusWrite;

/// Address with A2..A0 tied low
pub const BASE_ADDRESS: u8 = 0x20;

/// Devices one bus can address
pub const MAX_DEVICES: u8 = 8;

pub const PINS: u8 = 16;

/// First pin of port B in the 0..16 pin numbering
pub const PORTB: u8 = 8;

pub mod reg {
    pub const IODIRA: u8 = 0x00;
    pub const IODIRB: u8 = 0x01;
    pub const IOCON: u8 = 0x0A;
    pub const GPIOA: u8 = 0x12;
    pub const GPIOB: u8 = 0x13;
}

pub mod iocon {
    /// Active high interrupt output
    pub const INTPOL: u8 = 0x02;
    /// Open drain interrupt output
    pub const ODR: u8 = 0x04;
    /// Hardware address pins enabled
    pub const HAEN: u8 = 0x08;
    /// Slew rate control disabled on SDA
    pub const DISSLW: u8 = 0x10;
    /// Sequential addressing disabled
    pub const SEQOP: u8 = 0x20;
    /// INTA and INTB mirrored
    pub const MIRROR: u8 = 0x40;
    /// Registers grouped per port
    pub const BANK: u8 = 0x80;
}

/// Bus address of the `index`th expander
pub fn address(index: u8) -> GridResult<u8> {
    if index >= MAX_DEVICES {
        return Err(ErrorCode::InvalidArgument);
    }
    Ok(BASE_ADDRESS + index)
}

/// Program `IOCON`, sequential mode and interleaved banks
pub fn configure(address: u8, flags: u8) -> GridResult<BusWrite> {
    BusWrite::new(address, &[reg::IOCON, flags & !(iocon::BANK | iocon::SEQOP)])
}

/// Set the direction of all 16 pins, a set bit is an input
pub fn set_direction(address: u8, inputs: u16) -> GridResult<BusWrite> {
    let [a, b] = inputs.to_le_bytes();
    BusWrite::new(address, &[reg::IODIRA, a, b])
}

/// Drive both output latches
pub fn write_gpio(address: u8, port_a: u8, port_b: u8) -> GridResult<BusWrite> {
    BusWrite::new(address, &[reg::GPIOA, port_a, port_b])
}

/// Port byte index and bit mask of `pin`
pub const fn pin_mask(pin: u8) -> (usize, u8) {
    let pin = pin & (PINS - 1);
    ((pin / PORTB) as usize, 1 << (pin % PORTB))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_range() {
        assert_eq!(address(0), Ok(0x20));
        assert_eq!(address(7), Ok(0x27));
        assert_eq!(address(8), Err(ErrorCode::InvalidArgument));
    }

    #[test]
    fn test_setup_writes() {
        let write = configure(0x21, iocon::HAEN | iocon::BANK).unwrap();
        assert_eq!(write.payload(), &[0x0A, 0x08]);
        let write = set_direction(0x21, 0x0100).unwrap();
        assert_eq!(write.payload(), &[0x00, 0x00, 0x01]);
        let write = write_gpio(0x22, 0xF0, 0x0F).unwrap();
        assert_eq!(write.address(), 0x22);
        assert_eq!(write.payload(), &[0x12, 0xF0, 0x0F]);
    }

    #[test]
    fn test_pin_mask() {
        assert_eq!(pin_mask(0), (0, 0x01));
        assert_eq!(pin_mask(7), (0, 0x80));
        assert_eq!(pin_mask(PORTB), (1, 0x01));
        assert_eq!(pin_mask(15), (1, 0x80));
    }
}
