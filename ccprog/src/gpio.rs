//! The GPIO capability the bit transport is built on.
//!
//! The programmer only ever touches three lines: the debug clock (DC), the
//! bidirectional debug data line (DD) and the target reset (RESET_N). A
//! platform provides access to them by implementing [`GpioPins`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the logical lines connected to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Line {
    /// Debug clock, always driven by the host.
    Clock,
    /// Debug data, driven by either the host or the target.
    Data,
    /// Active low target reset.
    Reset,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Clock => write!(f, "DC"),
            Line::Data => write!(f, "DD"),
            Line::Reset => write!(f, "RESET_N"),
        }
    }
}

/// The direction a line is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The host drives the line.
    Output,
    /// The host samples the line.
    Input,
}

/// The logical level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Logic zero.
    Low,
    /// Logic one.
    High,
}

impl Level {
    /// Returns `true` if the level is [`Level::High`].
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Errors reported by a GPIO backend.
#[derive(thiserror::Error, Debug, docsplay::Display)]
pub enum GpioError {
    /// The GPIO backend failed while accessing line {line}.
    Backend {
        /// The line that was being accessed.
        line: Line,
        /// The error reported by the backend.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Line {line} is not configured as {expected:?}.
    WrongDirection {
        /// The line that was accessed.
        line: Line,
        /// The direction the access requires.
        expected: Direction,
    },
}

impl GpioError {
    /// Wrap a backend specific error.
    pub fn backend(line: Line, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        GpioError::Backend {
            line,
            source: Box::new(source),
        }
    }
}

/// Access to the lines connected to the target.
///
/// A released line is not driven by the host. Implementations must make sure
/// that a line which is configured as [`Direction::Input`] or released never
/// drives the wire, since the target may be driving DD at the same time.
pub trait GpioPins {
    /// Configure the direction of a line. Outputs start driving [`Level::Low`].
    fn configure(&mut self, line: Line, direction: Direction) -> Result<(), GpioError>;

    /// Drive an output line to the given level.
    fn set(&mut self, line: Line, level: Level) -> Result<(), GpioError>;

    /// Sample the level of an input line.
    fn get(&mut self, line: Line) -> Result<Level, GpioError>;

    /// Stop driving a line.
    fn release(&mut self, line: Line) -> Result<(), GpioError>;
}

impl<T: GpioPins + ?Sized> GpioPins for &mut T {
    fn configure(&mut self, line: Line, direction: Direction) -> Result<(), GpioError> {
        (**self).configure(line, direction)
    }

    fn set(&mut self, line: Line, level: Level) -> Result<(), GpioError> {
        (**self).set(line, level)
    }

    fn get(&mut self, line: Line) -> Result<Level, GpioError> {
        (**self).get(line)
    }

    fn release(&mut self, line: Line) -> Result<(), GpioError> {
        (**self).release(line)
    }
}

impl<T: GpioPins + ?Sized> GpioPins for Box<T> {
    fn configure(&mut self, line: Line, direction: Direction) -> Result<(), GpioError> {
        (**self).configure(line, direction)
    }

    fn set(&mut self, line: Line, level: Level) -> Result<(), GpioError> {
        (**self).set(line, level)
    }

    fn get(&mut self, line: Line) -> Result<Level, GpioError> {
        (**self).get(line)
    }

    fn release(&mut self, line: Line) -> Result<(), GpioError> {
        (**self).release(line)
    }
}

/// Maps the logical lines to platform pin numbers.
///
/// The defaults match the usual Raspberry Pi wiring (BCM numbering): DC on
/// 16, DD on 20 and RESET_N on 19.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
    /// Pin number of the debug clock.
    pub clock: u32,
    /// Pin number of the debug data line.
    pub data: u32,
    /// Pin number of the reset line.
    pub reset: u32,
}

impl PinConfig {
    /// The pin number a logical line is mapped to.
    pub fn pin(&self, line: Line) -> u32 {
        match line {
            Line::Clock => self.clock,
            Line::Data => self.data,
            Line::Reset => self.reset,
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            clock: 16,
            data: 20,
            reset: 19,
        }
    }
}
