//! Debug-ROM command framing.
//!
//! Every exchange with the debug ROM has the same shape: a command byte,
//! zero to three argument bytes, a ready handshake on DD and a single
//! response byte. [`DebugInterface`] implements the framing on top of a
//! [`BitTransport`](crate::wire::BitTransport), while [`DebugCommands`]
//! provides the individual commands on top of the framing.

mod command;
mod instruction;
mod interface;
mod status;

pub use command::DebugCommand;
pub use instruction::{EncodedInstruction, Instruction};
pub use interface::{DebugInterface, READY_WAIT_ATTEMPTS};
pub use status::{ChipFamily, ChipId, ChipStatus, DebugConfig};

use crate::gpio::GpioError;
use crate::poll::{PollTimeout, Poller};

/// The largest payload of a single burst write.
pub const MAX_BURST_LENGTH: usize = 0x1FFF;

/// The largest number of argument bytes a command takes.
pub const MAX_ARGUMENTS: usize = 3;

/// Errors on the command level of the debug interface.
#[derive(thiserror::Error, Debug, docsplay::Display)]
pub enum ProtocolError {
    /// An error occurred on the debug lines.
    Gpio(#[from] GpioError),
    /// The target did not signal ready after command {command:#04x}.
    Timeout {
        /// The command byte that was sent.
        command: u8,
    },
    /// A debug command takes at most 3 argument bytes, got {count}.
    TooManyArguments {
        /// The number of argument bytes passed.
        count: usize,
    },
    /// A burst write takes 1 to 8191 bytes, got {len}.
    InvalidBurstLength {
        /// The payload length passed.
        len: usize,
    },
    /// A debug instruction is 1 to 3 bytes long, got {len}.
    InvalidInstructionLength {
        /// The instruction length passed.
        len: usize,
    },
    /// Waiting for the target failed.
    Poll(#[from] PollTimeout),
}

/// The commands of the debug ROM.
///
/// Implementors provide the framing in [`DebugCommands::issue`] and the two
/// commands that do not follow it. Everything else is built on top.
pub trait DebugCommands {
    /// Send `command` with up to three argument bytes and return the
    /// response byte.
    fn issue(&mut self, command: u8, args: &[u8]) -> Result<u8, ProtocolError>;

    /// Feed `data` into the debug data register, 1 to 8191 bytes.
    fn burst_write(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Read chip ID and revision.
    fn read_chip_id(&mut self) -> Result<ChipId, ProtocolError>;

    /// Read the status byte.
    fn read_status(&mut self) -> Result<ChipStatus, ProtocolError> {
        self.issue(DebugCommand::ReadStatus.opcode(), &[])
            .map(ChipStatus::from_bits_retain)
    }

    /// Read the debug configuration.
    fn read_config(&mut self) -> Result<DebugConfig, ProtocolError> {
        self.issue(DebugCommand::ReadConfig.opcode(), &[])
            .map(DebugConfig::from_bits_retain)
    }

    /// Write the debug configuration.
    fn write_config(&mut self, config: DebugConfig) -> Result<ChipStatus, ProtocolError> {
        tracing::debug!("Writing debug configuration {:?}", config);
        self.issue(DebugCommand::WriteConfig.opcode(), &[config.bits()])
            .map(ChipStatus::from_bits_retain)
    }

    /// Let a halted CPU continue.
    fn resume(&mut self) -> Result<ChipStatus, ProtocolError> {
        self.issue(DebugCommand::Resume.opcode(), &[])
            .map(ChipStatus::from_bits_retain)
    }

    /// Execute the machine code of a single instruction and return the
    /// accumulator afterwards.
    fn debug_instruction(&mut self, code: &[u8]) -> Result<u8, ProtocolError> {
        let len = code.len();
        let len_bits = u8::try_from(len)
            .ok()
            .filter(|_| (1..=MAX_ARGUMENTS).contains(&len))
            .ok_or(ProtocolError::InvalidInstructionLength { len })?;

        self.issue(DebugCommand::DebugInstruction.opcode() | len_bits, code)
    }

    /// Execute a single instruction and return the accumulator afterwards.
    fn execute(&mut self, instruction: Instruction) -> Result<u8, ProtocolError> {
        self.debug_instruction(&instruction.encode())
    }

    /// Erase the whole flash and wait until the erase finished.
    fn chip_erase(&mut self, poller: &Poller) -> Result<(), ProtocolError> {
        tracing::info!("Erasing chip");
        self.issue(DebugCommand::ChipErase.opcode(), &[])?;

        poller.until("chip erase", || {
            let status = self.read_status()?;
            Ok(!status.contains(ChipStatus::CHIP_ERASE_BUSY))
        })
    }
}

impl<T: DebugCommands + ?Sized> DebugCommands for &mut T {
    fn issue(&mut self, command: u8, args: &[u8]) -> Result<u8, ProtocolError> {
        (**self).issue(command, args)
    }

    fn burst_write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        (**self).burst_write(data)
    }

    fn read_chip_id(&mut self) -> Result<ChipId, ProtocolError> {
        (**self).read_chip_id()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test::FakeTarget;

    #[test]
    fn instruction_length_is_encoded_in_opcode() {
        let mut target = FakeTarget::new();

        target.execute(Instruction::MovDptr(0x1234)).unwrap();
        target.execute(Instruction::MovA(0x55)).unwrap();
        target.execute(Instruction::IncDptr).unwrap();

        let opcodes: Vec<u8> = target.commands().iter().map(|(cmd, _)| *cmd).collect();
        assert_eq!(opcodes, vec![0x57, 0x56, 0x55]);
    }

    #[test]
    fn empty_instruction_is_rejected() {
        let mut target = FakeTarget::new();

        let result = target.debug_instruction(&[]);

        assert!(matches!(
            result,
            Err(ProtocolError::InvalidInstructionLength { len: 0 })
        ));
        assert!(target.commands().is_empty());
    }

    #[test]
    fn four_byte_instruction_is_rejected() {
        let mut target = FakeTarget::new();

        let result = target.debug_instruction(&[0x90, 0x12, 0x34, 0x00]);

        assert!(matches!(
            result,
            Err(ProtocolError::InvalidInstructionLength { len: 4 })
        ));
        assert!(target.commands().is_empty());
    }

    #[test]
    fn erase_response_reports_busy_without_ending_it() {
        let mut target = FakeTarget::new();
        target.set_erase_busy_polls(1);

        let response = target.issue(DebugCommand::ChipErase.opcode(), &[]).unwrap();

        assert!(ChipStatus::from_bits_retain(response).contains(ChipStatus::CHIP_ERASE_BUSY));
        assert!(target
            .read_status()
            .unwrap()
            .contains(ChipStatus::CHIP_ERASE_BUSY));
        assert!(!target
            .read_status()
            .unwrap()
            .contains(ChipStatus::CHIP_ERASE_BUSY));
    }

    #[test]
    fn chip_erase_polls_until_done() {
        let mut target = FakeTarget::new();
        target.set_erase_busy_polls(3);

        let poller = Poller::new().with_backoff(Duration::ZERO, Duration::ZERO);
        target.chip_erase(&poller).unwrap();

        let opcodes: Vec<u8> = target.commands().iter().map(|(cmd, _)| *cmd).collect();
        assert_eq!(opcodes, vec![0x10, 0x30, 0x30, 0x30, 0x30]);
        assert_eq!(target.erase_count(), 1);
    }

    #[test]
    fn write_config_sends_bits() {
        let mut target = FakeTarget::new();

        target.write_config(DebugConfig::PROGRAMMING).unwrap();

        assert_eq!(target.commands(), &[(0x19, vec![0x22])]);
        assert_eq!(target.read_config().unwrap(), DebugConfig::PROGRAMMING);
    }
}
