//! Simulated hardware for tests and dry runs.
#![allow(missing_docs)] // Don't require docs for test code

mod recording_transport;

pub use fake_gpio::{FakeGpio, GpioEvent};
pub use fake_target::{FakeTarget, FlashWrite};
pub use recording_transport::{RecordingTransport, TransportEvent};
