use crate::flashing::FlashError;
use crate::gpio::GpioError;
use crate::memory::MemoryError;
use crate::protocol::ProtocolError;

/// The overarching error type which contains all possible errors as variants.
#[derive(thiserror::Error, Debug, docsplay::Display)]
pub enum Error {
    /// An error occurred while toggling the debug lines.
    Gpio(#[from] GpioError),
    /// The debug interface reported an error.
    Protocol(#[from] ProtocolError),
    /// An error occurred while accessing target XDATA memory.
    Memory(#[from] MemoryError),
    /// An error occurred while programming the flash.
    Flash(#[from] FlashError),
}
