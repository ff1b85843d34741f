//! XDATA addresses of the peripheral registers used while programming.
//!
//! The SFRs are mirrored into XDATA at `0x7080`, the radio and debug
//! registers live at `0x6000`.

/// Debug data register, fed by burst writes.
pub const DBGDATA: u16 = 0x6260;

/// Flash controller control and status.
pub const FCTL: u16 = 0x6270;
/// Flash address, low byte. Counts 32-bit words.
pub const FADDRL: u16 = 0x6271;
/// Flash address, high byte.
pub const FADDRH: u16 = 0x6272;
/// Flash write data.
pub const FWDATA: u16 = 0x6273;

/// Clock control status.
pub const CLKCONSTA: u16 = 0x709E;
/// Clock control command.
pub const CLKCONCMD: u16 = 0x70C6;
/// Memory arbiter control, selects the flash bank mapped at `0x8000`.
pub const MEMCTR: u16 = 0x70C7;

/// DMA channel 1-4 configuration address, low byte.
pub const DMA1CFGL: u16 = 0x70D2;
/// DMA channel 1-4 configuration address, high byte.
pub const DMA1CFGH: u16 = 0x70D3;
/// DMA channel 0 configuration address, low byte.
pub const DMA0CFGL: u16 = 0x70D4;
/// DMA channel 0 configuration address, high byte.
pub const DMA0CFGH: u16 = 0x70D5;
/// DMA channel armed.
pub const DMAARM: u16 = 0x70D6;

/// Bits of [`FCTL`].
pub mod fctl {
    /// Start a flash write.
    pub const WRITE: u8 = 0x02;
    /// Cache mode: prefetch enabled.
    pub const CM_PREFETCH: u8 = 0x08;
    /// A flash write or erase is in progress.
    pub const BUSY: u8 = 0x80;
}

/// Bits of [`CLKCONCMD`] and [`CLKCONSTA`].
pub mod clkcon {
    /// The 32 kHz clock source is the internal RC oscillator when set.
    pub const OSC32K: u8 = 0x80;
}

/// Start of the XDATA window onto the selected flash bank.
pub const FLASH_WINDOW: u16 = 0x8000;
/// Size of one flash bank.
pub const FLASH_BANK_SIZE: u32 = 0x8000;
