//! # ccprog
//!
//! Flash programming for the TI CC253x/CC254x family over the two-wire debug
//! interface (DC/DD plus RESET_N), bit-banged on general purpose I/O lines.
//!
//! The crate is layered the same way the wire protocol is:
//!
//! * [`gpio`] abstracts the three lines the programmer needs.
//! * [`wire`] turns line toggles into bytes ([`wire::GpioTransport`]) and
//!   implements the reset sequences that enter debug mode or release the
//!   target.
//! * [`protocol`] frames debug-ROM commands on top of the byte transport.
//! * [`memory`] synthesizes single 8051 instructions to read and write the
//!   target's XDATA space.
//! * [`flashing`] drives the DMA based flash write, the bank-mapped read-back
//!   and the chunked programming run.
//!
//! # Example
//!
//! ```no_run
//! # use ccprog::{gpio::GpioPins, wire::{GpioTransport, DEFAULT_SETTLE_DELAY}, protocol::DebugInterface};
//! # use ccprog::flashing::{prepare, program, FirmwareImage, FlashProgress, ProgramOptions};
//! # fn run(gpio: impl GpioPins) -> Result<(), ccprog::Error> {
//! let transport = GpioTransport::new(gpio, DEFAULT_SETTLE_DELAY)?;
//! let mut interface = DebugInterface::new(transport);
//! interface.enter_debug_mode()?;
//!
//! let image = FirmwareImage::open("firmware.bin")?;
//! let options = ProgramOptions::default();
//! let progress = FlashProgress::empty();
//! prepare(&mut interface, &options, &progress)?;
//! program(&mut interface, &image, &options, &progress)?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

pub mod error;
pub mod flashing;
pub mod gpio;
pub mod memory;
pub mod poll;
pub mod wire;
pub mod protocol;
pub mod registers;

#[cfg(any(test, feature = "test"))]
pub mod test;

pub use crate::error::Error;
pub use crate::memory::{MemoryError, XdataMemory};
pub use crate::poll::{PollTimeout, Poller};
pub use crate::protocol::{DebugCommands, DebugInterface, ProtocolError};
