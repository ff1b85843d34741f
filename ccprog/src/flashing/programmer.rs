use std::time::Instant;

use serde::Serialize;

use super::flasher::{check_chunk_size, STAGING_BUFFER_SIZE};
use super::{FirmwareImage, FlashAddress, FlashError, FlashProgress, Flasher};
use crate::poll::Poller;
use crate::protocol::{ChipId, DebugCommands};

/// Options for [`prepare`] and [`program`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOptions {
    /// Read every chunk back after writing it.
    pub verify: bool,
    /// Bytes written per DMA transfer.
    pub chunk_size: usize,
    /// Switch to the external crystal before programming.
    pub switch_to_xosc: bool,
    /// Bounds the busy waits. Waits forever by default.
    pub poller: Poller,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            verify: false,
            chunk_size: STAGING_BUFFER_SIZE,
            switch_to_xosc: true,
            poller: Poller::new(),
        }
    }
}

/// A summary of a programming run, for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramSummary {
    /// Number of chunks written.
    pub chunks: usize,
    /// Bytes written, including padding.
    pub bytes: usize,
    /// Whether every chunk was read back.
    pub verified: bool,
}

/// Get a target in debug mode ready for [`program`].
///
/// Reads the chip ID and bails out before touching the flash if it is
/// unreadable. Then erases the chip, optionally switches to the external
/// crystal and keeps DMA running while the CPU is halted.
pub fn prepare<D: DebugCommands>(
    target: D,
    options: &ProgramOptions,
    progress: &FlashProgress,
) -> Result<ChipId, FlashError> {
    let mut flasher = Flasher::new(target, options.poller.clone());
    let chip = flasher.identify()?;

    progress.started_erasing();
    let start = Instant::now();
    if let Err(error) = flasher.erase_chip() {
        progress.failed_erasing();
        return Err(error);
    }
    progress.finished_erasing(start.elapsed());

    if options.switch_to_xosc {
        flasher.switch_to_xosc()?;
    }
    flasher.enable_dma()?;

    Ok(chip)
}

/// Write `image` to the start of the flash, which must be erased.
///
/// With [`ProgramOptions::verify`] set, every chunk is read back right after
/// it was written. On the first difference the chip is erased once and
/// [`FlashError::VerifyMismatch`] is returned without writing further chunks.
pub fn program<D: DebugCommands>(
    target: D,
    image: &FirmwareImage,
    options: &ProgramOptions,
    progress: &FlashProgress,
) -> Result<ProgramSummary, FlashError> {
    let chunk_size = options.chunk_size;
    check_chunk_size(chunk_size)?;

    let chunks = image.chunk_count(chunk_size);
    let total_size = chunks * chunk_size;
    FlashAddress::ZERO.check_fits(total_size)?;

    tracing::info!(
        "Programming {} bytes in {} chunks of {} bytes",
        image.len(),
        chunks,
        chunk_size
    );

    let mut flasher = Flasher::new(target, options.poller.clone());
    progress.started_programming(total_size as u64);

    match program_chunks(&mut flasher, image, options, progress) {
        Ok(()) => {
            progress.finished_programming();
            Ok(ProgramSummary {
                chunks,
                bytes: total_size,
                verified: options.verify,
            })
        }
        Err(error) => {
            progress.failed_programming();
            Err(error)
        }
    }
}

fn program_chunks<D: DebugCommands>(
    flasher: &mut Flasher<D>,
    image: &FirmwareImage,
    options: &ProgramOptions,
    progress: &FlashProgress,
) -> Result<(), FlashError> {
    for chunk in image.chunks(options.chunk_size) {
        let address = FlashAddress::ZERO.checked_add(chunk.offset)?;
        let size = chunk.data.len();

        let start = Instant::now();
        flasher.write_flash_block(address, &chunk.data)?;
        progress.chunk_programmed(address, size as u32, start.elapsed());

        if !options.verify {
            continue;
        }

        let read_back = flasher.read_flash(address, size)?;
        let mismatch = chunk
            .data
            .iter()
            .zip(&read_back)
            .position(|(written, read)| written != read);

        if let Some(offset) = mismatch {
            let address = address.byte_address() + offset as u32;
            tracing::error!(
                "Verification failed at {:#07x}: wrote {:#04x}, read {:#04x}",
                address,
                chunk.data[offset],
                read_back[offset]
            );

            // Leave no partially verified image behind.
            flasher.erase_chip()?;

            return Err(FlashError::VerifyMismatch {
                address,
                expected: chunk.data[offset],
                actual: read_back[offset],
            });
        }

        progress.chunk_verified(address, size as u32);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::flashing::ProgressEvent;
    use crate::test::FakeTarget;

    fn options(verify: bool) -> ProgramOptions {
        ProgramOptions {
            verify,
            poller: Poller::new().with_backoff(Duration::ZERO, Duration::ZERO),
            ..ProgramOptions::default()
        }
    }

    #[test]
    fn prepare_erases_and_enables_dma() {
        let mut target = FakeTarget::new();

        let chip = prepare(&mut target, &options(false), &FlashProgress::empty()).unwrap();

        assert_eq!(chip.id, 0xA5);
        assert_eq!(target.erase_count(), 1);
        assert_eq!(target.debug_config(), 0x22);
        assert_eq!(target.xdata(crate::registers::CLKCONSTA, 1), [0x80]);
    }

    #[test]
    fn prepare_without_xosc_leaves_clock_alone() {
        let mut target = FakeTarget::new();
        let options = ProgramOptions {
            switch_to_xosc: false,
            ..options(false)
        };

        prepare(&mut target, &options, &FlashProgress::empty()).unwrap();

        assert_eq!(target.xdata(crate::registers::CLKCONCMD, 1), [0xC9]);
    }

    #[test]
    fn unreadable_chip_is_never_erased() {
        let mut target = FakeTarget::new();
        target.set_chip_id(0x00, 0x00);

        let result = prepare(&mut target, &options(false), &FlashProgress::empty());

        assert!(matches!(result, Err(FlashError::ChipIdUnreadable(0x00))));
        assert_eq!(target.erase_count(), 0);
    }

    #[test]
    fn short_image_is_padded() {
        let mut target = FakeTarget::new();
        target.fill_flash(0xFF);
        let image = FirmwareImage::from_bytes(vec![0x12; 10]).unwrap();

        let summary =
            program(&mut target, &image, &options(true), &FlashProgress::empty()).unwrap();

        assert_eq!(summary.chunks, 1);
        assert_eq!(summary.bytes, 512);
        assert_eq!(&target.flash()[..10], &[0x12; 10]);
        assert!(target.flash()[10..512].iter().all(|&byte| byte == 0x00));
    }

    #[test]
    fn events_follow_chunks() {
        let mut target = FakeTarget::new();
        let image = FirmwareImage::from_bytes(vec![0x34; 600]).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let progress = {
            let events = events.clone();
            FlashProgress::new(move |event| events.borrow_mut().push(event))
        };

        program(&mut target, &image, &options(true), &progress).unwrap();

        let events = events.borrow();
        let kinds: Vec<&str> = events
            .iter()
            .map(|event| match event {
                ProgressEvent::StartedProgramming { .. } => "started",
                ProgressEvent::ChunkProgrammed { .. } => "programmed",
                ProgressEvent::ChunkVerified { .. } => "verified",
                ProgressEvent::FinishedProgramming => "finished",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["started", "programmed", "verified", "programmed", "verified", "finished"]
        );
    }

    #[test]
    fn rejects_unaligned_chunk_size() {
        let mut target = FakeTarget::new();
        let image = FirmwareImage::from_bytes(vec![0; 16]).unwrap();
        let options = ProgramOptions {
            chunk_size: 10,
            ..options(false)
        };

        let result = program(&mut target, &image, &options, &FlashProgress::empty());

        assert!(matches!(
            result,
            Err(FlashError::InvalidChunkSize { size: 10 })
        ));
        assert!(target.flash_writes().is_empty());
    }
}
