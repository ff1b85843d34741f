use std::ops::Deref;

/// The 8051 instructions needed to move data in and out of XDATA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `MOV DPTR,#imm16`
    MovDptr(u16),
    /// `MOV A,#imm8`
    MovA(u8),
    /// `MOVX @DPTR,A`
    MovxStore,
    /// `MOVX A,@DPTR`
    MovxLoad,
    /// `INC DPTR`
    IncDptr,
}

impl Instruction {
    /// The machine code of the instruction.
    pub fn encode(self) -> EncodedInstruction {
        match self {
            Instruction::MovDptr(address) => {
                let [high, low] = address.to_be_bytes();
                EncodedInstruction::new([0x90, high, low], 3)
            }
            Instruction::MovA(value) => EncodedInstruction::new([0x74, value, 0], 2),
            Instruction::MovxStore => EncodedInstruction::new([0xF0, 0, 0], 1),
            Instruction::MovxLoad => EncodedInstruction::new([0xE0, 0, 0], 1),
            Instruction::IncDptr => EncodedInstruction::new([0xA3, 0, 0], 1),
        }
    }

    /// Decode machine code produced by [`Instruction::encode`].
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let instruction = match *bytes {
            [0x90, high, low] => Instruction::MovDptr(u16::from_be_bytes([high, low])),
            [0x74, value] => Instruction::MovA(value),
            [0xF0] => Instruction::MovxStore,
            [0xE0] => Instruction::MovxLoad,
            [0xA3] => Instruction::IncDptr,
            _ => return None,
        };
        Some(instruction)
    }
}

/// Machine code of a single instruction, 1 to 3 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedInstruction {
    bytes: [u8; 3],
    len: usize,
}

impl EncodedInstruction {
    fn new(bytes: [u8; 3], len: usize) -> Self {
        Self { bytes, len }
    }
}

impl Deref for EncodedInstruction {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::Instruction;

    #[test_case(Instruction::MovDptr(0x6270), &[0x90, 0x62, 0x70])]
    #[test_case(Instruction::MovA(0x0A), &[0x74, 0x0A])]
    #[test_case(Instruction::MovxStore, &[0xF0])]
    #[test_case(Instruction::MovxLoad, &[0xE0])]
    #[test_case(Instruction::IncDptr, &[0xA3])]
    fn machine_code(instruction: Instruction, bytes: &[u8]) {
        assert_eq!(&*instruction.encode(), bytes);
        assert_eq!(Instruction::decode(bytes), Some(instruction));
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(Instruction::decode(&[0x00]), None);
        assert_eq!(Instruction::decode(&[0x90, 0x00]), None);
    }
}
