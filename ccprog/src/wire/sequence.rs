use super::GpioTransport;
use crate::gpio::{Direction, GpioError, GpioPins, Level, Line};

impl<G: GpioPins> GpioTransport<G> {
    /// Two DC flanks while RESET_N is held low put the target into debug mode.
    pub(super) fn debug_entry_sequence(&mut self) -> Result<(), GpioError> {
        tracing::debug!("Resetting target into debug mode");
        self.reset_with_flanks(2)
    }

    /// A single flank while in reset lets the target start its application.
    pub(super) fn normal_run_sequence(&mut self) -> Result<(), GpioError> {
        tracing::debug!("Resetting target into normal run mode");
        self.reset_with_flanks(1)
    }

    fn reset_with_flanks(&mut self, flanks: usize) -> Result<(), GpioError> {
        let mut reset = self.claim(Line::Reset, Direction::Output)?;
        let mut lines = reset.claim(Line::Data, Direction::Output)?;

        lines.drive(Line::Reset, Level::Low)?;
        lines.drive(Line::Data, Level::Low)?;
        lines.drive(Line::Clock, Level::Low)?;
        lines.settle();

        for _ in 0..flanks {
            lines.clock_flank()?;
        }

        lines.drive(Line::Reset, Level::High)?;
        lines.settle();

        Ok(())
    }
}
