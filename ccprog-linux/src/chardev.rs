use std::path::Path;

use ccprog::gpio::{Direction, GpioError, GpioPins, Level, Line, PinConfig};
use gpiocdev::line::Value;
use gpiocdev::Request;

use crate::{validate_pins, LineStates, LinuxGpioError, CONSUMER};

/// The programmer lines, requested from a GPIO character device.
///
/// DC starts as an output driving low. DD and RESET_N start as inputs, so
/// the target is not held in reset before the first sequence.
pub struct LinuxGpio {
    request: Request,
    lines: LineStates,
}

impl LinuxGpio {
    /// Request the lines from `chip`, e.g. `/dev/gpiochip0`.
    pub fn open(chip: impl AsRef<Path>, pins: PinConfig) -> Result<Self, LinuxGpioError> {
        let chip = chip.as_ref();
        validate_pins(&pins)?;

        let request = Request::builder()
            .on_chip(chip)
            .with_consumer(CONSUMER)
            .with_line(pins.clock)
            .as_output(Value::Inactive)
            .with_line(pins.data)
            .as_input()
            .with_line(pins.reset)
            .as_input()
            .request()
            .map_err(|source| LinuxGpioError::Request {
                chip: chip.to_path_buf(),
                source: Box::new(source),
            })?;

        tracing::debug!(
            "Requested lines DC={} DD={} RESET_N={} on {}",
            pins.clock,
            pins.data,
            pins.reset,
            chip.display()
        );

        Ok(Self {
            request,
            lines: LineStates::new(pins),
        })
    }

    // Restates every line, since values set after the request are not part
    // of the stored configuration.
    fn reconfigure(&mut self, lines: &LineStates, line: Line) -> Result<(), GpioError> {
        let mut config = self.request.config();
        for (offset, direction, level) in lines.settings() {
            match direction {
                Direction::Output => config.with_line(offset).as_output(value(level)),
                Direction::Input => config.with_line(offset).as_input(),
            };
        }

        self.request
            .reconfigure(&config)
            .map_err(|e| GpioError::backend(line, e))
    }
}

fn value(level: Level) -> Value {
    match level {
        Level::High => Value::Active,
        Level::Low => Value::Inactive,
    }
}

impl std::fmt::Debug for LinuxGpio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinuxGpio")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl GpioPins for LinuxGpio {
    fn configure(&mut self, line: Line, direction: Direction) -> Result<(), GpioError> {
        let mut lines = self.lines.clone();
        lines.configure(line, direction);

        self.reconfigure(&lines, line)?;
        self.lines = lines;
        Ok(())
    }

    fn set(&mut self, line: Line, level: Level) -> Result<(), GpioError> {
        self.request
            .set_value(self.lines.pins().pin(line), value(level))
            .map_err(|e| GpioError::backend(line, e))?;

        self.lines.set(line, level);
        Ok(())
    }

    fn get(&mut self, line: Line) -> Result<Level, GpioError> {
        let value = self
            .request
            .value(self.lines.pins().pin(line))
            .map_err(|e| GpioError::backend(line, e))?;

        Ok(Level::from(value == Value::Active))
    }

    fn release(&mut self, line: Line) -> Result<(), GpioError> {
        self.configure(line, Direction::Input)
    }
}
