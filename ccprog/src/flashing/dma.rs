//! DMA descriptors in the in-memory layout of the DMA controller.

use super::FlashError;
use crate::registers::{DBGDATA, FWDATA};

/// The largest length a descriptor can express.
pub const MAX_DMA_LENGTH: usize = 0x1FFF;

/// How an address changes after every transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressIncrement {
    /// The address stays the same.
    None = 0,
    /// Increment by one.
    One = 1,
    /// Increment by two.
    Two = 2,
    /// Decrement by one.
    MinusOne = 3,
}

impl AddressIncrement {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => AddressIncrement::None,
            1 => AddressIncrement::One,
            2 => AddressIncrement::Two,
            _ => AddressIncrement::MinusOne,
        }
    }
}

/// Priority of a channel against CPU accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DmaPriority {
    /// The CPU always wins.
    Low = 0,
    /// Every second access goes to DMA.
    Normal = 1,
    /// DMA always wins.
    High = 2,
}

impl DmaPriority {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => DmaPriority::Low,
            1 => DmaPriority::Normal,
            _ => DmaPriority::High,
        }
    }
}

/// The event that starts a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaTrigger {
    /// The flash controller is ready for the next word.
    Flash,
    /// A byte arrived in the debug data register through a burst write.
    DebugBurstWrite,
    /// Any other trigger number.
    Other(u8),
}

impl DmaTrigger {
    /// The trigger number.
    pub fn number(self) -> u8 {
        match self {
            DmaTrigger::Flash => 18,
            DmaTrigger::DebugBurstWrite => 31,
            DmaTrigger::Other(number) => number & 0x1F,
        }
    }

    fn from_number(number: u8) -> Self {
        match number & 0x1F {
            18 => DmaTrigger::Flash,
            31 => DmaTrigger::DebugBurstWrite,
            other => DmaTrigger::Other(other),
        }
    }
}

/// A single channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaDescriptor {
    /// Source address.
    pub source: u16,
    /// Destination address.
    pub destination: u16,
    /// Number of bytes to move, at most [`MAX_DMA_LENGTH`].
    pub length: u16,
    /// Start condition of every transfer.
    pub trigger: DmaTrigger,
    /// Source address step.
    pub source_increment: AddressIncrement,
    /// Destination address step.
    pub destination_increment: AddressIncrement,
    /// Arbitration priority.
    pub priority: DmaPriority,
}

impl DmaDescriptor {
    /// Size of a descriptor in XDATA.
    pub const SIZE: usize = 8;

    /// Offset of the length field inside a descriptor.
    pub const LENGTH_OFFSET: u16 = 4;

    /// Move burst written bytes from the debug data register into `buffer`.
    pub fn debug_to_buffer(buffer: u16, length: usize) -> Result<Self, FlashError> {
        Ok(Self {
            source: DBGDATA,
            destination: buffer,
            length: checked_length(length)?,
            trigger: DmaTrigger::DebugBurstWrite,
            source_increment: AddressIncrement::None,
            destination_increment: AddressIncrement::One,
            priority: DmaPriority::Normal,
        })
    }

    /// Move bytes from `buffer` into the flash controller.
    pub fn buffer_to_flash(buffer: u16, length: usize) -> Result<Self, FlashError> {
        Ok(Self {
            source: buffer,
            destination: FWDATA,
            length: checked_length(length)?,
            trigger: DmaTrigger::Flash,
            source_increment: AddressIncrement::One,
            destination_increment: AddressIncrement::None,
            priority: DmaPriority::High,
        })
    }

    /// The descriptor as the DMA controller reads it.
    pub fn to_bytes(&self) -> [u8; 8] {
        let [source_high, source_low] = self.source.to_be_bytes();
        let [destination_high, destination_low] = self.destination.to_be_bytes();
        let [length_high, length_low] = split_length(self.length);
        let config = (self.source_increment as u8) << 6
            | (self.destination_increment as u8) << 4
            | self.priority as u8;

        [
            source_high,
            source_low,
            destination_high,
            destination_low,
            length_high,
            length_low,
            self.trigger.number(),
            config,
        ]
    }

    /// Parse a descriptor. Transfer mode and word size are ignored.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            source: u16::from_be_bytes([bytes[0], bytes[1]]),
            destination: u16::from_be_bytes([bytes[2], bytes[3]]),
            length: u16::from_be_bytes([bytes[4] & 0x1F, bytes[5]]),
            trigger: DmaTrigger::from_number(bytes[6]),
            source_increment: AddressIncrement::from_bits(bytes[7] >> 6),
            destination_increment: AddressIncrement::from_bits(bytes[7] >> 4),
            priority: DmaPriority::from_bits(bytes[7]),
        }
    }

    /// The two length bytes for `length`, VLEN cleared.
    pub fn length_bytes(length: usize) -> Result<[u8; 2], FlashError> {
        checked_length(length).map(split_length)
    }
}

fn checked_length(length: usize) -> Result<u16, FlashError> {
    u16::try_from(length)
        .ok()
        .filter(|_| length <= MAX_DMA_LENGTH)
        .ok_or(FlashError::DmaLengthOutOfRange { len: length })
}

fn split_length(length: u16) -> [u8; 2] {
    [((length >> 8) & 0x1F) as u8, (length & 0xFF) as u8]
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(0, [0x00, 0x00])]
    #[test_case(4, [0x00, 0x04])]
    #[test_case(0x100, [0x01, 0x00])]
    #[test_case(512, [0x02, 0x00])]
    #[test_case(0x1234, [0x12, 0x34])]
    #[test_case(8191, [0x1F, 0xFF])]
    fn length_field(length: usize, bytes: [u8; 2]) {
        assert_eq!(DmaDescriptor::length_bytes(length).unwrap(), bytes);
    }

    #[test]
    fn every_length_is_split_into_13_bits() {
        for length in 0..=MAX_DMA_LENGTH {
            let [high, low] = DmaDescriptor::length_bytes(length).unwrap();
            assert_eq!(high, ((length >> 8) & 0x1F) as u8);
            assert_eq!(low, (length & 0xFF) as u8);
        }
    }

    #[test]
    fn length_beyond_13_bits_is_rejected() {
        assert!(matches!(
            DmaDescriptor::length_bytes(8192),
            Err(FlashError::DmaLengthOutOfRange { len: 8192 })
        ));
    }

    #[test]
    fn debug_to_buffer_layout() {
        let descriptor = DmaDescriptor::debug_to_buffer(0x0000, 0).unwrap();

        assert_eq!(
            descriptor.to_bytes(),
            [0x62, 0x60, 0x00, 0x00, 0x00, 0x00, 31, 0x11]
        );
    }

    #[test]
    fn buffer_to_flash_layout() {
        let descriptor = DmaDescriptor::buffer_to_flash(0x0000, 512).unwrap();

        assert_eq!(
            descriptor.to_bytes(),
            [0x00, 0x00, 0x62, 0x73, 0x02, 0x00, 18, 0x42]
        );
    }

    #[test]
    fn parses_own_layout() {
        let descriptor = DmaDescriptor::buffer_to_flash(0x0100, 0x1FFF).unwrap();

        assert_eq!(DmaDescriptor::from_bytes(descriptor.to_bytes()), descriptor);
    }
}
