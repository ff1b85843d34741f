/// Commands understood by the debug ROM.
///
/// Some commands carry a length in the low bits of the opcode, see
/// [`DebugCommand::DebugInstruction`] and [`DebugCommand::BurstWrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugCommand {
    /// Erase the whole flash. Returns the status byte.
    ChipErase,
    /// Write the debug configuration byte. Returns the status byte.
    WriteConfig,
    /// Read the debug configuration byte.
    ReadConfig,
    /// Read the status byte.
    ReadStatus,
    /// Leave the halted state and continue execution.
    Resume,
    /// Execute one 8051 instruction of 1 to 3 bytes. Returns the accumulator.
    DebugInstruction,
    /// Feed up to 8191 bytes into the debug data register.
    BurstWrite,
    /// Read chip ID and revision.
    GetChipId,
}

impl DebugCommand {
    /// The opcode without any length bits.
    pub const fn opcode(self) -> u8 {
        match self {
            DebugCommand::ChipErase => 0x10,
            DebugCommand::WriteConfig => 0x19,
            DebugCommand::ReadConfig => 0x24,
            DebugCommand::ReadStatus => 0x30,
            DebugCommand::Resume => 0x4C,
            DebugCommand::DebugInstruction => 0x54,
            DebugCommand::BurstWrite => 0x80,
            DebugCommand::GetChipId => 0x68,
        }
    }
}

impl From<DebugCommand> for u8 {
    fn from(command: DebugCommand) -> Self {
        command.opcode()
    }
}

impl TryFrom<u8> for DebugCommand {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let command = match byte {
            0x10 => DebugCommand::ChipErase,
            0x19 => DebugCommand::WriteConfig,
            0x24 => DebugCommand::ReadConfig,
            0x30 => DebugCommand::ReadStatus,
            0x4C => DebugCommand::Resume,
            0x55..=0x57 => DebugCommand::DebugInstruction,
            0x68 => DebugCommand::GetChipId,
            0x80..=0x9F => DebugCommand::BurstWrite,
            other => return Err(other),
        };
        Ok(command)
    }
}
