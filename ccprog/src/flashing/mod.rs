//! Flash programming operations.
//!
//! [`Flasher`] implements the single-chunk operations: the DMA driven write,
//! the bank mapped read, chip erase and the clock and debug configuration a
//! write needs. [`prepare`] and [`program`] combine them into a complete run.
//!
//! ## Example
//!
//! ```no_run
//! use ccprog::flashing::{prepare, program, FirmwareImage, FlashProgress, ProgramOptions};
//! # use ccprog::DebugCommands;
//! # fn run(target: &mut impl DebugCommands) -> Result<(), ccprog::flashing::FlashError> {
//!
//! let image = FirmwareImage::open("firmware.bin")?;
//! let options = ProgramOptions {
//!     verify: true,
//!     ..ProgramOptions::default()
//! };
//! let progress = FlashProgress::empty();
//!
//! prepare(&mut *target, &options, &progress)?;
//! program(&mut *target, &image, &options, &progress)?;
//! # Ok(())
//! # }
//! ```

mod address;
mod dma;
mod error;
mod flasher;
mod image;
mod programmer;
mod progress;

pub use address::{FlashAddress, FLASH_SIZE};
pub use dma::{AddressIncrement, DmaDescriptor, DmaPriority, DmaTrigger, MAX_DMA_LENGTH};
pub use error::FlashError;
pub use flasher::{
    Flasher, BUFFER_TO_FLASH_DESCRIPTOR, DEBUG_TO_BUFFER_DESCRIPTOR, STAGING_BUFFER,
    STAGING_BUFFER_SIZE,
};
pub use image::{Chunk, Chunks, FirmwareImage, PADDING};
pub use programmer::{prepare, program, ProgramOptions, ProgramSummary};
pub use progress::{FlashProgress, ProgressEvent};
