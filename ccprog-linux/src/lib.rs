//! GPIO access through the Linux GPIO character device (`/dev/gpiochipN`).
//!
//! [`LinuxGpio`] requests the three programmer lines from one chip and
//! implements [`ccprog::gpio::GpioPins`] on top of the request. Direction
//! changes reconfigure the request in place, so the lines stay owned by the
//! programmer for the whole run.

use std::path::PathBuf;

use ccprog::gpio::{Direction, Level, Line, PinConfig};

#[cfg(target_os = "linux")]
mod chardev;

#[cfg(target_os = "linux")]
pub use chardev::LinuxGpio;

/// Consumer label shown for the requested lines, e.g. by `gpioinfo`.
pub const CONSUMER: &str = "ccprog";

/// Errors while opening the GPIO lines.
#[derive(thiserror::Error, Debug, docsplay::Display)]
pub enum LinuxGpioError {
    /// Lines {first} and {second} are both mapped to offset {offset}.
    DuplicateOffset {
        /// The first line using the offset.
        first: Line,
        /// The second line using the offset.
        second: Line,
        /// The shared offset.
        offset: u32,
    },
    /// Failed to request the lines from {chip:?}.
    Request {
        /// The GPIO chip.
        chip: PathBuf,
        /// The error reported by the kernel.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Check that every line has its own offset.
pub fn validate_pins(pins: &PinConfig) -> Result<(), LinuxGpioError> {
    let lines = [Line::Clock, Line::Data, Line::Reset];
    for (i, &first) in lines.iter().enumerate() {
        for &second in &lines[i + 1..] {
            if pins.pin(first) == pins.pin(second) {
                return Err(LinuxGpioError::DuplicateOffset {
                    first,
                    second,
                    offset: pins.pin(first),
                });
            }
        }
    }
    Ok(())
}

/// Direction and last driven level of every programmer line.
///
/// A line request is reconfigured as a whole, so every direction change has
/// to restate the levels of the lines that are currently outputs. The kernel
/// does not report back values set after the request was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStates {
    pins: PinConfig,
    clock: (Direction, Level),
    data: (Direction, Level),
    reset: (Direction, Level),
}

impl LineStates {
    /// DC drives low, DD and RESET_N are inputs.
    pub fn new(pins: PinConfig) -> Self {
        Self {
            pins,
            clock: (Direction::Output, Level::Low),
            data: (Direction::Input, Level::Low),
            reset: (Direction::Input, Level::Low),
        }
    }

    /// The line offsets in use.
    pub fn pins(&self) -> &PinConfig {
        &self.pins
    }

    fn state_mut(&mut self, line: Line) -> &mut (Direction, Level) {
        match line {
            Line::Clock => &mut self.clock,
            Line::Data => &mut self.data,
            Line::Reset => &mut self.reset,
        }
    }

    /// Change the direction of a line. A new output starts driving low.
    pub fn configure(&mut self, line: Line, direction: Direction) {
        *self.state_mut(line) = (direction, Level::Low);
    }

    /// Record the level an output line now drives.
    pub fn set(&mut self, line: Line, level: Level) {
        self.state_mut(line).1 = level;
    }

    /// Offset, direction and level of every line, as the request must be
    /// reconfigured.
    pub fn settings(&self) -> [(u32, Direction, Level); 3] {
        [
            (self.pins.clock, self.clock.0, self.clock.1),
            (self.pins.data, self.data.0, self.data.1),
            (self.pins.reset, self.reset.0, self.reset.1),
        ]
    }
}
