//! Hardware addresses of controls and LEDs
//!
//! Every address is range checked on construction. `new` is a `const fn`
//! that panics on a bad value, so tables built in a `const` fail to
//! compile; `try_new` reports `InvalidArgument` instead.

use gridctl_core::{ErrorCode, GridResult};
use gridctl_i2c::mcp23017;

/// Columns shared by the input and output matrices
pub const MULTIPLEX_COLUMNS: u8 = 8;

/// MCP23017 devices driving the LED anodes
pub const EXPANDERS: u8 = 3;

/// Usable MCU pins, the remaining ones belong to the memory and SD card
pub const MCU_PINS: u8 = 42;

/// Expander carrying the high byte of every ring
pub const MCP_0: u8 = 0;
/// Expander carrying the low byte of every ring and the control row LEDs
pub const MCP_1: u8 = 1;
/// Expander carrying the pad matrix
pub const MCP_2: u8 = 2;

/// Push button read through the input matrix
///
/// The column decoder pulls one sink low; the source pin reads low while
/// the button is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DigitalInput {
    source_pin: u8,
    sink_column: u8,
}

impl DigitalInput {
    pub const fn new(source_pin: u8, sink_column: u8) -> Self {
        assert!(source_pin < MCU_PINS, "input source pin out of range");
        assert!(sink_column < MULTIPLEX_COLUMNS, "input sink column out of range");
        Self {
            source_pin,
            sink_column,
        }
    }

    pub const fn try_new(source_pin: u8, sink_column: u8) -> GridResult<Self> {
        if source_pin >= MCU_PINS || sink_column >= MULTIPLEX_COLUMNS {
            return Err(ErrorCode::InvalidArgument);
        }
        Ok(Self::new(source_pin, sink_column))
    }

    pub const fn source_pin(&self) -> u8 {
        self.source_pin
    }

    pub const fn sink_column(&self) -> u8 {
        self.sink_column
    }

    pub const fn sink_a(&self) -> bool {
        self.sink_column & 0x01 != 0
    }

    pub const fn sink_b(&self) -> bool {
        self.sink_column & 0x02 != 0
    }

    pub const fn sink_c(&self) -> bool {
        self.sink_column & 0x04 != 0
    }
}

/// Single LED of the output matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DigitalOutput {
    expander: u8,
    anode_pin: u8,
    cathode_column: u8,
}

impl DigitalOutput {
    /// `anode_pin` counts 0..8 on port A and 8..16 on port B
    pub const fn new(expander: u8, anode_pin: u8, cathode_column: u8) -> Self {
        assert!(expander < EXPANDERS, "output expander out of range");
        assert!(anode_pin < mcp23017::PINS, "output anode pin out of range");
        assert!(cathode_column < MULTIPLEX_COLUMNS, "output cathode column out of range");
        Self {
            expander,
            anode_pin,
            cathode_column,
        }
    }

    pub const fn try_new(expander: u8, anode_pin: u8, cathode_column: u8) -> GridResult<Self> {
        if expander >= EXPANDERS || anode_pin >= mcp23017::PINS || cathode_column >= MULTIPLEX_COLUMNS {
            return Err(ErrorCode::InvalidArgument);
        }
        Ok(Self::new(expander, anode_pin, cathode_column))
    }

    pub const fn expander(&self) -> u8 {
        self.expander
    }

    pub const fn anode_pin(&self) -> u8 {
        self.anode_pin
    }

    pub const fn column(&self) -> u8 {
        self.cathode_column
    }

    pub const fn is_port_a(&self) -> bool {
        self.anode_pin < mcp23017::PORTB
    }

    pub const fn is_port_b(&self) -> bool {
        !self.is_port_a()
    }

    pub const fn port(&self) -> Port {
        if self.is_port_a() {
            Port::A
        } else {
            Port::B
        }
    }

    /// Bit index within the port register
    pub const fn pin_in_port(&self) -> u8 {
        self.anode_pin % mcp23017::PORTB
    }
}

/// Rotary encoder, both quadrature phases read through analog multiplexers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Encoder {
    mux_a: u8,
    pin_a: u8,
    mux_c: u8,
    pin_c: u8,
}

impl Encoder {
    pub const fn new(mux_a: u8, pin_a: u8, mux_c: u8, pin_c: u8) -> Self {
        assert!(mux_a < MULTIPLEX_COLUMNS, "encoder phase A channel out of range");
        assert!(pin_a < MCU_PINS, "encoder phase A pin out of range");
        assert!(mux_c < MULTIPLEX_COLUMNS, "encoder phase C channel out of range");
        assert!(pin_c < MCU_PINS, "encoder phase C pin out of range");
        Self {
            mux_a,
            pin_a,
            mux_c,
            pin_c,
        }
    }

    pub const fn try_new(mux_a: u8, pin_a: u8, mux_c: u8, pin_c: u8) -> GridResult<Self> {
        if mux_a >= MULTIPLEX_COLUMNS || pin_a >= MCU_PINS || mux_c >= MULTIPLEX_COLUMNS || pin_c >= MCU_PINS {
            return Err(ErrorCode::InvalidArgument);
        }
        Ok(Self::new(mux_a, pin_a, mux_c, pin_c))
    }

    pub const fn mux_a(&self) -> u8 {
        self.mux_a
    }

    pub const fn pin_a(&self) -> u8 {
        self.pin_a
    }

    pub const fn mux_c(&self) -> u8 {
        self.mux_c
    }

    pub const fn pin_c(&self) -> u8 {
        self.pin_c
    }
}

/// Analog fader on a multiplexer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fader {
    mux: u8,
    pin: u8,
}

impl Fader {
    pub const fn new(mux: u8, pin: u8) -> Self {
        assert!(mux < MULTIPLEX_COLUMNS, "fader channel out of range");
        assert!(pin < MCU_PINS, "fader pin out of range");
        Self { mux, pin }
    }

    pub const fn try_new(mux: u8, pin: u8) -> GridResult<Self> {
        if mux >= MULTIPLEX_COLUMNS || pin >= MCU_PINS {
            return Err(ErrorCode::InvalidArgument);
        }
        Ok(Self::new(mux, pin))
    }

    pub const fn mux(&self) -> u8 {
        self.mux
    }

    pub const fn pin(&self) -> u8 {
        self.pin
    }
}

/// Expander port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    A,
    B,
}

impl Port {
    /// Index of the port byte in a GPIO write
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// The 15 LEDs of one encoder ring
///
/// LEDs 0..7 sit on pins 1..8 of the given port of [`MCP_1`], LEDs 7..15 on
/// pins 0..8 of the same port of [`MCP_0`], all on one cathode column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingLedSet {
    port: Port,
    column: u8,
}

impl RingLedSet {
    pub const LEDS: u8 = 15;

    pub const fn new(port: Port, column: u8) -> Self {
        assert!(column < MULTIPLEX_COLUMNS, "ring column out of range");
        Self { port, column }
    }

    pub const fn try_new(port: Port, column: u8) -> GridResult<Self> {
        if column >= MULTIPLEX_COLUMNS {
            return Err(ErrorCode::InvalidArgument);
        }
        Ok(Self::new(port, column))
    }

    pub const fn port(&self) -> Port {
        self.port
    }

    pub const fn column(&self) -> u8 {
        self.column
    }

    /// Address of ring LED `index`
    pub const fn led(&self, index: u8) -> GridResult<DigitalOutput> {
        if index >= Self::LEDS {
            return Err(ErrorCode::InvalidArgument);
        }
        let base = match self.port {
            Port::A => 0,
            Port::B => mcp23017::PORTB,
        };
        Ok(if index < 7 {
            DigitalOutput::new(MCP_1, base + index + 1, self.column)
        } else {
            DigitalOutput::new(MCP_0, base + index - 7, self.column)
        })
    }
}
