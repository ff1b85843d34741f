//! XDATA access through single-stepped 8051 instructions.
//!
//! The debug ROM has no memory access commands. Instead, the host executes
//! `MOV DPTR`, `MOV A` and `MOVX` instructions on the halted CPU, one debug
//! instruction exchange each.

use crate::protocol::{DebugCommands, Instruction, ProtocolError};

/// Errors while accessing XDATA.
#[derive(thiserror::Error, Debug, docsplay::Display)]
pub enum MemoryError {
    /// The debug interface reported an error.
    Protocol(#[from] ProtocolError),
    /// Accessing {len} bytes at {address:#06x} runs past the end of XDATA.
    OutOfRange {
        /// Start of the access.
        address: u16,
        /// Length of the access.
        len: usize,
    },
}

/// Read and write the XDATA space of a halted target.
///
/// Implemented for every [`DebugCommands`] implementation.
pub trait XdataMemory {
    /// Write a single byte.
    fn write_xdata_byte(&mut self, address: u16, value: u8) -> Result<(), MemoryError>;

    /// Read a single byte.
    fn read_xdata_byte(&mut self, address: u16) -> Result<u8, MemoryError>;

    /// Write consecutive bytes starting at `address`.
    fn write_xdata(&mut self, address: u16, data: &[u8]) -> Result<(), MemoryError>;

    /// Read `len` consecutive bytes starting at `address`.
    fn read_xdata(&mut self, address: u16, len: usize) -> Result<Vec<u8>, MemoryError>;
}

fn check_range(address: u16, len: usize) -> Result<(), MemoryError> {
    if usize::from(address) + len > 0x1_0000 {
        return Err(MemoryError::OutOfRange { address, len });
    }
    Ok(())
}

impl<D: DebugCommands + ?Sized> XdataMemory for D {
    fn write_xdata_byte(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        self.execute(Instruction::MovDptr(address))?;
        self.execute(Instruction::MovA(value))?;
        self.execute(Instruction::MovxStore)?;
        Ok(())
    }

    fn read_xdata_byte(&mut self, address: u16) -> Result<u8, MemoryError> {
        self.execute(Instruction::MovDptr(address))?;
        Ok(self.execute(Instruction::MovxLoad)?)
    }

    fn write_xdata(&mut self, address: u16, data: &[u8]) -> Result<(), MemoryError> {
        check_range(address, data.len())?;
        tracing::trace!("Writing {} bytes to XDATA {:#06x}", data.len(), address);

        self.execute(Instruction::MovDptr(address))?;
        for &byte in data {
            self.execute(Instruction::MovA(byte))?;
            self.execute(Instruction::MovxStore)?;
            self.execute(Instruction::IncDptr)?;
        }
        Ok(())
    }

    fn read_xdata(&mut self, address: u16, len: usize) -> Result<Vec<u8>, MemoryError> {
        check_range(address, len)?;
        tracing::trace!("Reading {} bytes from XDATA {:#06x}", len, address);

        self.execute(Instruction::MovDptr(address))?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(self.execute(Instruction::MovxLoad)?);
            self.execute(Instruction::IncDptr)?;
        }
        Ok(data)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test::FakeTarget;

    #[test]
    fn every_byte_value_reads_back() {
        let mut target = FakeTarget::new();

        for value in 0..=u8::MAX {
            target.write_xdata_byte(0x0100, value).unwrap();
            assert_eq!(target.read_xdata_byte(0x0100).unwrap(), value);
        }
    }

    #[test]
    fn repeated_reads_are_identical() {
        let mut target = FakeTarget::new();
        target.write_xdata_byte(0x0042, 0x99).unwrap();
        target.clear_commands();

        let first = target.read_xdata_byte(0x0042).unwrap();
        let first_commands = target.commands().to_vec();
        target.clear_commands();
        let second = target.read_xdata_byte(0x0042).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_commands, target.commands());
    }

    #[test]
    fn write_byte_instruction_sequence() {
        let mut target = FakeTarget::new();

        target.write_xdata_byte(0x6270, 0x0A).unwrap();

        assert_eq!(
            target.commands(),
            &[
                (0x57, vec![0x90, 0x62, 0x70]),
                (0x56, vec![0x74, 0x0A]),
                (0x55, vec![0xF0]),
            ]
        );
    }

    #[test]
    fn block_sets_pointer_once() {
        let mut target = FakeTarget::new();

        target.write_xdata(0x0200, &[1, 2, 3]).unwrap();
        let pointer_loads = target
            .commands()
            .iter()
            .filter(|(cmd, _)| *cmd == 0x57)
            .count();

        assert_eq!(pointer_loads, 1);
        assert_eq!(target.commands().len(), 1 + 3 * 3);
        assert_eq!(target.read_xdata(0x0200, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn block_past_end_is_rejected() {
        let mut target = FakeTarget::new();

        let result = target.read_xdata(0xFFFF, 2);

        assert!(matches!(
            result,
            Err(MemoryError::OutOfRange {
                address: 0xFFFF,
                len: 2
            })
        ));
        assert!(target.commands().is_empty());
        assert_eq!(target.read_xdata(0xFFFF, 1).unwrap().len(), 1);
    }
}
