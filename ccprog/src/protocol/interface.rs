use super::{
    ChipId, DebugCommand, DebugCommands, ProtocolError, MAX_ARGUMENTS, MAX_BURST_LENGTH,
};
use crate::gpio::{GpioError, Level};
use crate::wire::BitTransport;

/// How often DD is sampled after a command before the target is considered
/// unresponsive.
pub const READY_WAIT_ATTEMPTS: usize = 16;

/// Dummy clock cycles between two samples of DD.
const READY_WAIT_CLOCKS: usize = 8;

/// The debug interface of a target, framed on top of a bit transport.
#[derive(Debug)]
pub struct DebugInterface<T> {
    transport: T,
}

impl<T: BitTransport> DebugInterface<T> {
    /// Wrap a transport. The target is not touched until the first command.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The transport the interface talks through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Reset the target into debug mode.
    pub fn enter_debug_mode(&mut self) -> Result<(), GpioError> {
        self.transport.enter_debug_mode()
    }

    /// Reset the target and let it run its application.
    pub fn run_normal_mode(&mut self) -> Result<(), GpioError> {
        self.transport.run_normal_mode()
    }

    /// Wait for the target to pull DD low.
    ///
    /// DD is pulsed high and released first. While the target keeps the line
    /// high, eight dummy clocks are generated before sampling again. Returns
    /// `false` if DD is still high after [`READY_WAIT_ATTEMPTS`] samples.
    pub fn ready_wait(&mut self) -> Result<bool, GpioError> {
        self.transport.pulse_data_high()?;

        for attempt in 0..READY_WAIT_ATTEMPTS {
            if self.transport.sample_data()? == Level::Low {
                if attempt > 0 {
                    tracing::trace!("Target ready after {} attempts", attempt + 1);
                }
                return Ok(true);
            }
            self.transport.clock_cycles(READY_WAIT_CLOCKS)?;
        }

        Ok(false)
    }

    fn wait_for_response(&mut self, command: u8) -> Result<(), ProtocolError> {
        if self.ready_wait()? {
            Ok(())
        } else {
            tracing::warn!("Target did not respond to command {:#04x}", command);
            Err(ProtocolError::Timeout { command })
        }
    }
}

impl<T: BitTransport> DebugCommands for DebugInterface<T> {
    fn issue(&mut self, command: u8, args: &[u8]) -> Result<u8, ProtocolError> {
        if args.len() > MAX_ARGUMENTS {
            return Err(ProtocolError::TooManyArguments { count: args.len() });
        }

        self.transport.write_byte(command)?;
        for &arg in args {
            self.transport.write_byte(arg)?;
        }

        self.wait_for_response(command)?;
        let response = self.transport.read_byte()?;

        tracing::trace!(
            "Command {:#04x} {:02x?} -> {:#04x}",
            command,
            args,
            response
        );

        Ok(response)
    }

    fn burst_write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let len = data.len();
        if !(1..=MAX_BURST_LENGTH).contains(&len) {
            return Err(ProtocolError::InvalidBurstLength { len });
        }

        let command = DebugCommand::BurstWrite.opcode() | (len >> 8) as u8;
        self.transport.write_byte(command)?;
        self.transport.write_byte((len & 0xFF) as u8)?;
        for &byte in data {
            self.transport.write_byte(byte)?;
        }

        self.wait_for_response(command)?;
        // The response is the status byte, which carries nothing of interest
        // after a burst.
        self.transport.read_byte()?;

        tracing::trace!("Burst wrote {} bytes", len);

        Ok(())
    }

    fn read_chip_id(&mut self) -> Result<ChipId, ProtocolError> {
        let command = DebugCommand::GetChipId.opcode();
        self.transport.write_byte(command)?;
        self.wait_for_response(command)?;

        let id = self.transport.read_byte()?;
        let revision = self.transport.read_byte()?;

        Ok(ChipId { id, revision })
    }
}
