use std::fmt;

use super::FlashError;
use crate::registers::{FLASH_BANK_SIZE, FLASH_WINDOW};

/// Size of the largest flash of the family.
pub const FLASH_SIZE: u32 = 0x4_0000;

/// A word aligned byte address in flash.
///
/// The flash controller counts in 32-bit words, while reads go through the
/// bank selected in MEMCTR, mapped into XDATA at `0x8000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlashAddress(u32);

impl FlashAddress {
    /// The first byte of the flash.
    pub const ZERO: FlashAddress = FlashAddress(0);

    /// A byte address, which must be word aligned and inside the flash.
    pub fn new(address: u32) -> Result<Self, FlashError> {
        if address % 4 != 0 {
            return Err(FlashError::UnalignedAddress { address });
        }
        if address >= FLASH_SIZE {
            return Err(FlashError::OutOfFlash { address, len: 0 });
        }
        Ok(Self(address))
    }

    /// The address of a flash controller word.
    pub fn from_word(word: u16) -> Self {
        Self(u32::from(word) * 4)
    }

    /// The byte address.
    pub fn byte_address(self) -> u32 {
        self.0
    }

    /// The word address as written to FADDRH:FADDRL.
    pub fn word_address(self) -> u16 {
        (self.0 >> 2) as u16
    }

    /// The bank to select in MEMCTR for reading this address.
    pub fn bank(self) -> u8 {
        (self.0 / FLASH_BANK_SIZE) as u8
    }

    /// The offset inside the bank.
    pub fn bank_offset(self) -> u16 {
        (self.0 % FLASH_BANK_SIZE) as u16
    }

    /// The XDATA address this flash address is visible at once its bank is
    /// selected.
    pub fn xdata_window(self) -> u16 {
        FLASH_WINDOW + self.bank_offset()
    }

    /// The address `bytes` further, which must stay aligned and inside the
    /// flash.
    pub fn checked_add(self, bytes: usize) -> Result<Self, FlashError> {
        let address = u32::try_from(bytes)
            .ok()
            .and_then(|bytes| self.0.checked_add(bytes))
            .ok_or(FlashError::OutOfFlash {
                address: self.0,
                len: bytes,
            })?;
        Self::new(address)
    }

    /// Check that `len` bytes starting here fit into the flash.
    pub(crate) fn check_fits(self, len: usize) -> Result<(), FlashError> {
        if u64::from(self.0) + len as u64 > u64::from(FLASH_SIZE) {
            return Err(FlashError::OutOfFlash {
                address: self.0,
                len,
            });
        }
        Ok(())
    }
}

impl fmt::Display for FlashAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07x}", self.0)
    }
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;

    #[test_case(0x0_0000, 0x0000, 0, 0x8000)]
    #[test_case(0x0_0200, 0x0080, 0, 0x8200)]
    #[test_case(0x0_8000, 0x2000, 1, 0x8000)]
    #[test_case(0x1_2344, 0x48D1, 2, 0xA344)]
    #[test_case(0x3_FFFC, 0xFFFF, 7, 0xFFFC)]
    fn decomposition(byte: u32, word: u16, bank: u8, window: u16) {
        let address = FlashAddress::new(byte).unwrap();

        assert_eq!(address.word_address(), word);
        assert_eq!(address.bank(), bank);
        assert_eq!(address.xdata_window(), window);
        assert_eq!(FlashAddress::from_word(word), address);
    }

    #[test]
    fn unaligned_address_is_rejected() {
        assert!(matches!(
            FlashAddress::new(0x0002),
            Err(FlashError::UnalignedAddress { address: 2 })
        ));
    }

    #[test]
    fn advancing_by_a_chunk_moves_128_words() {
        let address = FlashAddress::ZERO.checked_add(512).unwrap();

        assert_eq!(address.word_address(), 0x0080);
    }

    #[test]
    fn advancing_past_the_end_fails() {
        let last = FlashAddress::new(FLASH_SIZE - 4).unwrap();

        assert!(last.checked_add(4).is_err());
        assert!(last.check_fits(4).is_ok());
        assert!(last.check_fits(5).is_err());
    }
}
