use std::time::Duration;

use super::FlashAddress;

/// A structure to manage the flashing procedure progress reporting.
///
/// This struct stores a handler closure which will be called every time an
/// event happens while programming.
///
/// # Example
///
/// ```
/// use ccprog::flashing::FlashProgress;
///
/// // Print events
/// let progress = FlashProgress::new(|event| println!("Event: {:#?}", event));
/// ```
pub struct FlashProgress {
    handler: Box<dyn Fn(ProgressEvent)>,
}

impl FlashProgress {
    /// Create a new `FlashProgress` structure with a given `handler` to be called on events.
    pub fn new(handler: impl Fn(ProgressEvent) + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// A handler that drops every event.
    pub fn empty() -> Self {
        Self::new(|_| {})
    }

    fn emit(&self, event: ProgressEvent) {
        (self.handler)(event);
    }

    pub(super) fn started_erasing(&self) {
        self.emit(ProgressEvent::StartedErasing);
    }

    pub(super) fn finished_erasing(&self, time: Duration) {
        self.emit(ProgressEvent::FinishedErasing { time });
    }

    pub(super) fn failed_erasing(&self) {
        self.emit(ProgressEvent::FailedErasing);
    }

    pub(super) fn started_programming(&self, total_size: u64) {
        self.emit(ProgressEvent::StartedProgramming { total_size });
    }

    pub(super) fn chunk_programmed(&self, address: FlashAddress, size: u32, time: Duration) {
        self.emit(ProgressEvent::ChunkProgrammed {
            address,
            size,
            time,
        });
    }

    pub(super) fn chunk_verified(&self, address: FlashAddress, size: u32) {
        self.emit(ProgressEvent::ChunkVerified { address, size });
    }

    pub(super) fn failed_programming(&self) {
        self.emit(ProgressEvent::FailedProgramming);
    }

    pub(super) fn finished_programming(&self) {
        self.emit(ProgressEvent::FinishedProgramming);
    }
}

impl std::fmt::Debug for FlashProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashProgress").finish_non_exhaustive()
    }
}

/// Possible events while programming.
///
/// If programming works without problems, the events arrive in the
/// following order:
///
/// * `StartedErasing`
/// * `FinishedErasing`
/// * `StartedProgramming`
/// * `ChunkProgrammed` for every chunk, followed by `ChunkVerified` if
///   verification is enabled
/// * `FinishedProgramming`
///
/// If an error occurs in any stage, one of the `Failed*` events is emitted
/// and no further events follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The chip erase has started.
    StartedErasing,
    /// The chip erase has finished.
    FinishedErasing {
        /// The time the erase took.
        time: Duration,
    },
    /// The chip erase failed.
    FailedErasing,
    /// Programming has started.
    StartedProgramming {
        /// Number of bytes that will be written, including padding.
        total_size: u64,
    },
    /// A chunk has been written.
    ChunkProgrammed {
        /// Where the chunk was written.
        address: FlashAddress,
        /// The size of the chunk in bytes.
        size: u32,
        /// The time it took to write the chunk.
        time: Duration,
    },
    /// A chunk has been read back and matched.
    ChunkVerified {
        /// Where the chunk was written.
        address: FlashAddress,
        /// The size of the chunk in bytes.
        size: u32,
    },
    /// Programming failed.
    FailedProgramming,
    /// Programming has finished successfully.
    FinishedProgramming,
}
