//! Cathode column selection

use core::cell::RefCell;

use embedded_hal::digital::OutputPin;
use gridctl_core::{ErrorCode, ErrorIndicator, GridResult};

use crate::MULTIPLEX_COLUMNS;

/// Grounds the cathodes of one column at a time
pub trait ColumnSelect {
    fn select(&mut self, column: u8) -> GridResult<()>;

    /// No column lit
    fn disable(&mut self) -> GridResult<()>;
}

impl<S: ColumnSelect + ?Sized> ColumnSelect for &mut S {
    fn select(&mut self, column: u8) -> GridResult<()> {
        (**self).select(column)
    }

    fn disable(&mut self) -> GridResult<()> {
        (**self).disable()
    }
}

/// 3-to-8 decoder with an active low enable
pub struct CathodeDecoder<P: OutputPin> {
    a0: P,
    a1: P,
    a2: P,
    enable: P,
}

impl<P: OutputPin> CathodeDecoder<P> {
    /// Takes the address lines and the enable line, starts disabled
    pub fn new(a0: P, a1: P, a2: P, enable: P) -> GridResult<Self> {
        let mut decoder = Self { a0, a1, a2, enable };
        decoder.disable()?;
        Ok(decoder)
    }

    pub fn release(self) -> (P, P, P, P) {
        (self.a0, self.a1, self.a2, self.enable)
    }
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> GridResult<()> {
    if high {
        pin.set_high().map_err(|_| ErrorCode::HwError)
    } else {
        pin.set_low().map_err(|_| ErrorCode::HwError)
    }
}

impl<P: OutputPin> ColumnSelect for CathodeDecoder<P> {
    fn select(&mut self, column: u8) -> GridResult<()> {
        if column >= MULTIPLEX_COLUMNS {
            return Err(ErrorCode::InvalidArgument);
        }
        // address lines settle while the outputs are off
        self.disable()?;
        drive(&mut self.a0, column & 0x01 != 0)?;
        drive(&mut self.a1, column & 0x02 != 0)?;
        drive(&mut self.a2, column & 0x04 != 0)?;
        drive(&mut self.enable, false)
    }

    fn disable(&mut self) -> GridResult<()> {
        drive(&mut self.enable, true)
    }
}

/// Error indicator on a GPIO driven LED
pub struct ErrorLed<P: OutputPin> {
    pin: RefCell<P>,
}

impl<P: OutputPin> ErrorLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin: RefCell::new(pin) }
    }
}

impl<P: OutputPin> ErrorIndicator for ErrorLed<P> {
    fn set(&self, on: bool) {
        // a dead error LED has nowhere to report to
        let _ = drive(&mut *self.pin.borrow_mut(), on);
    }
}
