//! Front panel wiring
//!
//! Every control with its input and LED addresses. Pads of one row share a
//! source pin and an anode pin; the column is the position in the row.
//! Encoder rings use the port given per row on [`MCP_0`] and [`MCP_1`].

use gridctl_i2c::mcp23017::PORTB;

use crate::{
    BicolorPad, BlindPad, DigitalInput, DigitalOutput, Encoder, Fader, MonochromePad, Port, RingEncoder, RingLedSet,
    MCP_1, MCP_2, MULTIPLEX_COLUMNS,
};

pub const CLIP_COLS: usize = MULTIPLEX_COLUMNS as usize;
pub const CLIP_ROWS: usize = 5;

/// Analog inputs A16 and A17
const PIN_A16: u8 = 40;
const PIN_A17: u8 = 41;

const fn blind_row(source: u8) -> [BlindPad; CLIP_COLS] {
    let mut row = [BlindPad {
        input: DigitalInput::new(source, 0),
    }; CLIP_COLS];
    let mut col = 0;
    while col < CLIP_COLS {
        row[col] = BlindPad {
            input: DigitalInput::new(source, col as u8),
        };
        col += 1;
    }
    row
}

const fn monochrome_pad(source: u8, column: u8, expander: u8, anode: u8) -> MonochromePad {
    MonochromePad {
        input: DigitalInput::new(source, column),
        led: DigitalOutput::new(expander, anode, column),
    }
}

const fn monochrome_row(source: u8, expander: u8, anode: u8) -> [MonochromePad; CLIP_COLS] {
    let mut row = [monochrome_pad(source, 0, expander, anode); CLIP_COLS];
    let mut col = 0;
    while col < CLIP_COLS {
        row[col] = monochrome_pad(source, col as u8, expander, anode);
        col += 1;
    }
    row
}

const fn bicolor_pad(source: u8, column: u8, green: u8, red: u8) -> BicolorPad {
    BicolorPad {
        input: DigitalInput::new(source, column),
        green: DigitalOutput::new(MCP_2, green, column),
        red: DigitalOutput::new(MCP_2, red, column),
    }
}

const fn clip_row(row: u8) -> [BicolorPad; CLIP_COLS] {
    let source = 26 + row;
    let green = 3 + row;
    let red = PORTB + 3 + row;
    let mut pads = [bicolor_pad(source, 0, green, red); CLIP_COLS];
    let mut col = 0;
    while col < CLIP_COLS {
        pads[col] = bicolor_pad(source, col as u8, green, red);
        col += 1;
    }
    pads
}

const fn ring_row(pin_a: u8, pin_c: u8, port: Port) -> [RingEncoder; CLIP_COLS] {
    let mut row = [RingEncoder {
        encoder: Encoder::new(0, pin_a, 0, pin_c),
        ring: RingLedSet::new(port, 0),
    }; CLIP_COLS];
    let mut col = 0;
    while col < CLIP_COLS {
        row[col] = RingEncoder {
            encoder: Encoder::new(col as u8, pin_a, col as u8, pin_c),
            ring: RingLedSet::new(port, col as u8),
        };
        col += 1;
    }
    row
}

/// Clip launch grid, `CLIP[row][track]`
pub const CLIP: [[BicolorPad; CLIP_COLS]; CLIP_ROWS] = [clip_row(0), clip_row(1), clip_row(2), clip_row(3), clip_row(4)];

pub const CLIP_STOP: [MonochromePad; CLIP_COLS] = monochrome_row(31, MCP_2, 2);
pub const TRACK_SELECT: [MonochromePad; CLIP_COLS] = monochrome_row(32, MCP_2, 1);

pub const BANK_CONTROL: [BlindPad; CLIP_COLS] = blind_row(34);
pub const SHIFT: BlindPad = BANK_CONTROL[0];
pub const NUDGE_PLUS: BlindPad = BANK_CONTROL[1];
pub const NUDGE_MINUS: BlindPad = BANK_CONTROL[2];
pub const TAP_TEMPO: BlindPad = BANK_CONTROL[3];
pub const BANK_LEFT: BlindPad = BANK_CONTROL[4];
pub const BANK_RIGHT: BlindPad = BANK_CONTROL[5];
pub const BANK_UP: BlindPad = BANK_CONTROL[6];
pub const BANK_DOWN: BlindPad = BANK_CONTROL[7];

pub const PAN: MonochromePad = monochrome_pad(35, 0, MCP_1, 0);
pub const SEND_A: MonochromePad = monochrome_pad(35, 1, MCP_1, 0);
pub const SEND_B: MonochromePad = monochrome_pad(35, 2, MCP_1, 0);
pub const SEND_C: MonochromePad = monochrome_pad(35, 3, MCP_1, 0);
pub const TRACK_CONTROL: [MonochromePad; 4] = [PAN, SEND_A, SEND_B, SEND_C];

/// Track control encoders, rings on port A
pub const TRACK_ENCODERS: [RingEncoder; CLIP_COLS] = ring_row(23, 22, Port::A);

pub const PLAY: BlindPad = BlindPad {
    input: DigitalInput::new(35, 5),
};
pub const STOP: BlindPad = BlindPad {
    input: DigitalInput::new(35, 6),
};
pub const REC: BlindPad = BlindPad {
    input: DigitalInput::new(35, 7),
};

pub const SCENE_LAUNCH: [MonochromePad; CLIP_ROWS] = [
    monochrome_pad(36, 0, MCP_2, 0),
    monochrome_pad(36, 1, MCP_2, 0),
    monochrome_pad(36, 2, MCP_2, 0),
    monochrome_pad(36, 3, MCP_2, 0),
    monochrome_pad(36, 4, MCP_2, 0),
];

pub const STOP_ALL_CLIPS: BlindPad = BlindPad {
    input: DigitalInput::new(36, 5),
};
pub const SELECT_MASTER: MonochromePad = monochrome_pad(36, 6, MCP_2, 0);

pub const CUE_LEVEL: Encoder = Encoder::new(2, PIN_A16, 3, PIN_A16);
pub const MASTER_LEVEL: Fader = Fader::new(0, PIN_A16);
pub const CROSSFADE: Fader = Fader::new(1, PIN_A16);

pub const RECORD_ARM: [MonochromePad; CLIP_COLS] = monochrome_row(37, MCP_2, PORTB);
pub const SOLO_CUE: [MonochromePad; CLIP_COLS] = monochrome_row(38, MCP_2, PORTB + 1);
pub const ACTIVATOR: [MonochromePad; CLIP_COLS] = monochrome_row(39, MCP_2, PORTB + 2);

pub const DEVICE_CONTROL: [MonochromePad; CLIP_COLS] = monochrome_row(33, MCP_1, PORTB);
pub const CLIP_TRACK: MonochromePad = DEVICE_CONTROL[0];
pub const DEVICE_ON_OFF: MonochromePad = DEVICE_CONTROL[1];
pub const LEFT_ARROW: MonochromePad = DEVICE_CONTROL[2];
pub const RIGHT_ARROW: MonochromePad = DEVICE_CONTROL[3];
pub const DETAIL_VIEW: MonochromePad = DEVICE_CONTROL[4];
pub const REC_QUANTIZE: MonochromePad = DEVICE_CONTROL[5];
pub const MIDI_OVERDUB: MonochromePad = DEVICE_CONTROL[6];
pub const METRONOME: MonochromePad = DEVICE_CONTROL[7];

/// Device control encoders, rings on port B
pub const DEVICE_ENCODERS: [RingEncoder; CLIP_COLS] = ring_row(21, 20, Port::B);

pub const TRACK_LEVEL: [Fader; CLIP_COLS] = [
    Fader::new(0, PIN_A17),
    Fader::new(1, PIN_A17),
    Fader::new(2, PIN_A17),
    Fader::new(3, PIN_A17),
    Fader::new(4, PIN_A17),
    Fader::new(5, PIN_A17),
    Fader::new(6, PIN_A17),
    Fader::new(7, PIN_A17),
];
