use std::path::PathBuf;

use crate::memory::MemoryError;
use crate::poll::PollTimeout;
use crate::protocol::ProtocolError;

/// Describes any error that happened during or in preparation for programming.
#[derive(thiserror::Error, Debug, docsplay::Display)]
pub enum FlashError {
    /// The chip ID reads as {0:#04x}. Check the wiring and the power supply of the target.
    ChipIdUnreadable(u8),
    /// Verification failed at flash address {address:#07x}, the chip has been erased again.
    VerifyMismatch {
        /// Byte address of the first differing byte.
        address: u32,
        /// The byte that was written.
        expected: u8,
        /// The byte that was read back.
        actual: u8,
    },
    /// Flash address {address:#07x} is not word aligned.
    UnalignedAddress {
        /// The offending byte address.
        address: u32,
    },
    /// A chunk size of {size} bytes is not supported, it must be a non-zero multiple of 4 of at most 512 bytes.
    InvalidChunkSize {
        /// The requested chunk size.
        size: usize,
    },
    /// Writing {len} bytes at {address:#07x} does not fit into the flash.
    OutOfFlash {
        /// Start of the access.
        address: u32,
        /// Length of the access.
        len: usize,
    },
    /// Reading {len} bytes at {address:#07x} crosses a flash bank boundary.
    CrossesBank {
        /// Start of the access.
        address: u32,
        /// Length of the access.
        len: usize,
    },
    /// A DMA transfer of {len} bytes exceeds the 13 bit length field.
    DmaLengthOutOfRange {
        /// The requested length.
        len: usize,
    },
    /// The firmware image is empty.
    EmptyImage,
    /// The firmware image is {len} bytes large and does not fit into the flash.
    ImageTooLarge {
        /// Size of the image.
        len: usize,
    },
    /// Failed to read the firmware image {path:?}.
    FileRead {
        /// Path of the image.
        path: PathBuf,
        /// The error reported by the file system.
        #[source]
        source: std::io::Error,
    },
    /// Waiting for the target failed.
    Poll(#[from] PollTimeout),
    /// The debug interface reported an error.
    Protocol(#[from] ProtocolError),
    /// An error occurred while accessing target XDATA memory.
    Memory(#[from] MemoryError),
}
