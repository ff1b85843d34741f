//! The bit level side of the debug interface.
//!
//! [`GpioTransport`] clocks bytes in and out of the target over DC/DD and
//! implements the RESET_N sequences. Higher layers only talk to it through
//! the [`BitTransport`] trait, so they can be tested against a recording
//! transport without any hardware.

mod sequence;
mod transport;

use std::time::Duration;

pub use transport::{ClaimedLine, GpioTransport};

use crate::gpio::{GpioError, Level};

/// The wait after every individual line transition.
///
/// Host side jitter that drives the link faster than this causes misreads on
/// the target, a longer delay only costs throughput.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_micros(100);

/// Byte level access to the debug link.
///
/// Every method leaves DD released when it returns, including on errors.
pub trait BitTransport {
    /// Clock out one byte, most significant bit first.
    fn write_byte(&mut self, value: u8) -> Result<(), GpioError>;

    /// Clock in one byte, most significant bit first.
    fn read_byte(&mut self) -> Result<u8, GpioError>;

    /// Drive DD high for one settle period, then release it.
    ///
    /// This starts the ready handshake: after the pulse the target pulls DD
    /// low as soon as it has a response available.
    fn pulse_data_high(&mut self) -> Result<(), GpioError>;

    /// Sample DD with the line configured as input.
    fn sample_data(&mut self) -> Result<Level, GpioError>;

    /// Generate clock cycles on DC without touching DD.
    fn clock_cycles(&mut self, cycles: usize) -> Result<(), GpioError>;

    /// Reset the target into debug mode.
    fn enter_debug_mode(&mut self) -> Result<(), GpioError>;

    /// Reset the target and let it run its application.
    fn run_normal_mode(&mut self) -> Result<(), GpioError>;
}

impl<T: BitTransport + ?Sized> BitTransport for &mut T {
    fn write_byte(&mut self, value: u8) -> Result<(), GpioError> {
        (**self).write_byte(value)
    }

    fn read_byte(&mut self) -> Result<u8, GpioError> {
        (**self).read_byte()
    }

    fn pulse_data_high(&mut self) -> Result<(), GpioError> {
        (**self).pulse_data_high()
    }

    fn sample_data(&mut self) -> Result<Level, GpioError> {
        (**self).sample_data()
    }

    fn clock_cycles(&mut self, cycles: usize) -> Result<(), GpioError> {
        (**self).clock_cycles(cycles)
    }

    fn enter_debug_mode(&mut self) -> Result<(), GpioError> {
        (**self).enter_debug_mode()
    }

    fn run_normal_mode(&mut self) -> Result<(), GpioError> {
        (**self).run_normal_mode()
    }
}
