use std::ops::{Deref, DerefMut};
use std::time::Duration;

use super::BitTransport;
use crate::gpio::{Direction, GpioError, GpioPins, Level, Line};

/// Bit-banged debug link on top of a [`GpioPins`] implementation.
///
/// DC is configured as output for the whole lifetime of the transport. DD and
/// RESET_N are only claimed for the duration of a single operation through
/// [`GpioTransport::claim`] and released again afterwards, so the line
/// direction at the start of every operation is well defined.
#[derive(Debug)]
pub struct GpioTransport<G: GpioPins> {
    gpio: G,
    settle_delay: Duration,
}

impl<G: GpioPins> GpioTransport<G> {
    /// Take over the lines. DC starts low and DD is released.
    pub fn new(mut gpio: G, settle_delay: Duration) -> Result<Self, GpioError> {
        gpio.configure(Line::Clock, Direction::Output)?;
        gpio.set(Line::Clock, Level::Low)?;
        gpio.release(Line::Data)?;

        tracing::debug!("Opened GPIO transport with {:?} settle delay", settle_delay);

        Ok(Self { gpio, settle_delay })
    }

    /// The wait after every line transition.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Change the wait after every line transition.
    pub fn set_settle_delay(&mut self, settle_delay: Duration) {
        self.settle_delay = settle_delay;
    }

    /// The underlying GPIO implementation.
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Mutable access to the underlying GPIO implementation.
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    /// Configure `line` for `direction` until the returned guard is dropped.
    ///
    /// The guard releases the line when it goes out of scope, on the success
    /// path as well as on early returns through `?`.
    pub fn claim(
        &mut self,
        line: Line,
        direction: Direction,
    ) -> Result<ClaimedLine<'_, G>, GpioError> {
        if let Err(error) = self.gpio.configure(line, direction) {
            let _ = self.gpio.release(line);
            return Err(error);
        }

        Ok(ClaimedLine {
            transport: self,
            line,
        })
    }

    pub(super) fn drive(&mut self, line: Line, level: Level) -> Result<(), GpioError> {
        self.gpio.set(line, level)
    }

    pub(super) fn settle(&self) {
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }
    }

    /// One full DC period: high, settle, low, settle.
    pub(super) fn clock_flank(&mut self) -> Result<(), GpioError> {
        self.drive(Line::Clock, Level::High)?;
        self.settle();
        self.drive(Line::Clock, Level::Low)?;
        self.settle();
        Ok(())
    }
}

impl<G: GpioPins> BitTransport for GpioTransport<G> {
    fn write_byte(&mut self, value: u8) -> Result<(), GpioError> {
        let mut dd = self.claim(Line::Data, Direction::Output)?;

        for bit in (0..8).rev() {
            // The target captures DD on the falling DC edge.
            dd.drive(Line::Clock, Level::High)?;
            dd.drive(Line::Data, Level::from(value & (1 << bit) != 0))?;
            dd.settle();
            dd.drive(Line::Clock, Level::Low)?;
            dd.settle();
        }

        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, GpioError> {
        let mut dd = self.claim(Line::Data, Direction::Input)?;
        let mut value = 0u8;

        for _ in 0..8 {
            dd.drive(Line::Clock, Level::High)?;
            dd.settle();
            value <<= 1;
            if dd.gpio.get(Line::Data)?.is_high() {
                value |= 1;
            }
            dd.drive(Line::Clock, Level::Low)?;
            dd.settle();
        }

        Ok(value)
    }

    fn pulse_data_high(&mut self) -> Result<(), GpioError> {
        let mut dd = self.claim(Line::Data, Direction::Output)?;
        dd.drive(Line::Data, Level::High)?;
        dd.settle();
        Ok(())
    }

    fn sample_data(&mut self) -> Result<Level, GpioError> {
        let mut dd = self.claim(Line::Data, Direction::Input)?;
        dd.gpio.get(Line::Data)
    }

    fn clock_cycles(&mut self, cycles: usize) -> Result<(), GpioError> {
        for _ in 0..cycles {
            self.clock_flank()?;
        }
        Ok(())
    }

    fn enter_debug_mode(&mut self) -> Result<(), GpioError> {
        self.debug_entry_sequence()
    }

    fn run_normal_mode(&mut self) -> Result<(), GpioError> {
        self.normal_run_sequence()
    }
}

impl<G: GpioPins> Drop for GpioTransport<G> {
    fn drop(&mut self) {
        for line in [Line::Data, Line::Reset, Line::Clock] {
            if let Err(error) = self.gpio.release(line) {
                tracing::warn!("Failed to release {}: {}", line, error);
            }
        }
    }
}

/// A line claimed for one direction, see [`GpioTransport::claim`].
///
/// Dereferences to the transport, so further lines can be claimed through
/// the guard.
pub struct ClaimedLine<'a, G: GpioPins> {
    transport: &'a mut GpioTransport<G>,
    line: Line,
}

impl<G: GpioPins> Deref for ClaimedLine<'_, G> {
    type Target = GpioTransport<G>;

    fn deref(&self) -> &Self::Target {
        self.transport
    }
}

impl<G: GpioPins> DerefMut for ClaimedLine<'_, G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.transport
    }
}

impl<G: GpioPins> Drop for ClaimedLine<'_, G> {
    fn drop(&mut self) {
        if let Err(error) = self.transport.gpio.release(self.line) {
            tracing::warn!("Failed to release {}: {}", self.line, error);
        }
    }
}
