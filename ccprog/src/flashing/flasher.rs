use super::{DmaDescriptor, FlashAddress, FlashError};
use crate::memory::XdataMemory;
use crate::poll::Poller;
use crate::protocol::{ChipId, DebugCommands, DebugConfig};
use crate::registers::{
    clkcon, fctl, CLKCONCMD, CLKCONSTA, DMA0CFGH, DMA0CFGL, DMA1CFGH, DMA1CFGL, DMAARM, FADDRH,
    FADDRL, FCTL, FLASH_BANK_SIZE, MEMCTR,
};

/// XDATA address of the buffer chunks are staged in.
pub const STAGING_BUFFER: u16 = 0x0000;
/// Size of the staging buffer, and with it the largest chunk.
pub const STAGING_BUFFER_SIZE: usize = 512;

/// XDATA address of the descriptor moving burst data into the staging buffer.
pub const DEBUG_TO_BUFFER_DESCRIPTOR: u16 = 0x0200;
/// XDATA address of the descriptor moving the staging buffer into flash.
pub const BUFFER_TO_FLASH_DESCRIPTOR: u16 = DEBUG_TO_BUFFER_DESCRIPTOR + DmaDescriptor::SIZE as u16;

const DEBUG_TO_BUFFER_CHANNEL: u8 = 0x01;
const BUFFER_TO_FLASH_CHANNEL: u8 = 0x02;

/// 32 MHz crystal as system clock, 32 kHz RC oscillator.
const XOSC_CLOCK: u8 = clkcon::OSC32K;

/// Flash operations of a halted target in debug mode.
///
/// Writes stream a chunk through the debug data register into the staging
/// buffer with DMA channel 0, then let channel 1 feed the flash controller.
/// Reads map a flash bank into XDATA and read it byte by byte.
#[derive(Debug)]
pub struct Flasher<D> {
    target: D,
    poller: Poller,
}

impl<D: DebugCommands> Flasher<D> {
    /// Wrap a target. `poller` bounds every busy wait.
    pub fn new(target: D, poller: Poller) -> Self {
        Self { target, poller }
    }

    /// The wrapped target.
    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    /// Give back the target.
    pub fn into_inner(self) -> D {
        self.target
    }

    /// Read the chip ID and check that the debug link works.
    pub fn identify(&mut self) -> Result<ChipId, FlashError> {
        let chip = self.target.read_chip_id()?;
        if !chip.is_readable() {
            tracing::error!("Chip ID reads as {:#04x}", chip.id);
            return Err(FlashError::ChipIdUnreadable(chip.id));
        }

        if chip.family().is_some() {
            tracing::info!("Found {}", chip);
        } else {
            tracing::warn!("Unknown chip ID {:#04x}, continuing anyway", chip.id);
        }

        Ok(chip)
    }

    /// Erase the whole flash.
    pub fn erase_chip(&mut self) -> Result<(), FlashError> {
        self.target.chip_erase(&self.poller)?;
        Ok(())
    }

    /// Run the system from the external 32 MHz crystal.
    pub fn switch_to_xosc(&mut self) -> Result<(), FlashError> {
        tracing::debug!("Switching to the external crystal oscillator");
        self.target.write_xdata_byte(CLKCONCMD, XOSC_CLOCK)?;

        self.poller.until("oscillator switch", || {
            Ok::<_, FlashError>(self.target.read_xdata_byte(CLKCONSTA)? == XOSC_CLOCK)
        })
    }

    /// Make sure DMA keeps running while the CPU is halted.
    pub fn enable_dma(&mut self) -> Result<(), FlashError> {
        self.target.write_config(DebugConfig::PROGRAMMING)?;
        Ok(())
    }

    /// Write one chunk to flash.
    ///
    /// The flash must be erased. `data` must be a non-zero multiple of four
    /// bytes long and fit into the staging buffer.
    pub fn write_flash_block(
        &mut self,
        address: FlashAddress,
        data: &[u8],
    ) -> Result<(), FlashError> {
        check_chunk_size(data.len())?;
        address.check_fits(data.len())?;

        tracing::debug!("Writing {} bytes at {}", data.len(), address);

        let debug_to_buffer = DmaDescriptor::debug_to_buffer(STAGING_BUFFER, 0)?;
        let buffer_to_flash = DmaDescriptor::buffer_to_flash(STAGING_BUFFER, 0)?;
        self.target
            .write_xdata(DEBUG_TO_BUFFER_DESCRIPTOR, &debug_to_buffer.to_bytes())?;
        self.target
            .write_xdata(BUFFER_TO_FLASH_DESCRIPTOR, &buffer_to_flash.to_bytes())?;

        let length = DmaDescriptor::length_bytes(data.len())?;
        self.target.write_xdata(
            DEBUG_TO_BUFFER_DESCRIPTOR + DmaDescriptor::LENGTH_OFFSET,
            &length,
        )?;
        self.target.write_xdata(
            BUFFER_TO_FLASH_DESCRIPTOR + DmaDescriptor::LENGTH_OFFSET,
            &length,
        )?;

        let [high, low] = DEBUG_TO_BUFFER_DESCRIPTOR.to_be_bytes();
        self.target.write_xdata_byte(DMA0CFGH, high)?;
        self.target.write_xdata_byte(DMA0CFGL, low)?;
        let [high, low] = BUFFER_TO_FLASH_DESCRIPTOR.to_be_bytes();
        self.target.write_xdata_byte(DMA1CFGH, high)?;
        self.target.write_xdata_byte(DMA1CFGL, low)?;

        let [high, low] = address.word_address().to_be_bytes();
        self.target.write_xdata_byte(FADDRH, high)?;
        self.target.write_xdata_byte(FADDRL, low)?;

        self.target
            .write_xdata_byte(DMAARM, DEBUG_TO_BUFFER_CHANNEL)?;
        self.target.burst_write(data)?;

        self.target
            .write_xdata_byte(DMAARM, BUFFER_TO_FLASH_CHANNEL)?;
        self.target
            .write_xdata_byte(FCTL, fctl::WRITE | fctl::CM_PREFETCH)?;

        self.poller.until("flash write", || {
            Ok::<_, FlashError>(self.target.read_xdata_byte(FCTL)? & fctl::BUSY == 0)
        })
    }

    /// Read `len` bytes from a single flash bank.
    pub fn read_flash_block(
        &mut self,
        address: FlashAddress,
        len: usize,
    ) -> Result<Vec<u8>, FlashError> {
        address.check_fits(len)?;
        if usize::from(address.bank_offset()) + len > FLASH_BANK_SIZE as usize {
            return Err(FlashError::CrossesBank {
                address: address.byte_address(),
                len,
            });
        }

        tracing::debug!(
            "Reading {} bytes at {} from bank {}",
            len,
            address,
            address.bank()
        );

        self.target.write_xdata_byte(MEMCTR, address.bank())?;
        Ok(self.target.read_xdata(address.xdata_window(), len)?)
    }

    /// Read `len` bytes, crossing banks as needed.
    pub fn read_flash(&mut self, address: FlashAddress, len: usize) -> Result<Vec<u8>, FlashError> {
        address.check_fits(len)?;

        let mut data = Vec::with_capacity(len);
        let mut address = address;
        while data.len() < len {
            let in_bank = FLASH_BANK_SIZE as usize - usize::from(address.bank_offset());
            let block_len = in_bank.min(len - data.len());
            data.extend(self.read_flash_block(address, block_len)?);

            if data.len() < len {
                address = address.checked_add(block_len)?;
            }
        }

        Ok(data)
    }
}

pub(super) fn check_chunk_size(size: usize) -> Result<(), FlashError> {
    if size == 0 || size % 4 != 0 || size > STAGING_BUFFER_SIZE {
        return Err(FlashError::InvalidChunkSize { size });
    }
    Ok(())
}
