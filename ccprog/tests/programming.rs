use std::time::Duration;

use ccprog::flashing::{prepare, program, FirmwareImage, FlashError, FlashProgress, ProgramOptions};
use ccprog::test::{FakeTarget, FlashWrite};
use ccprog::Poller;
use pretty_assertions::assert_eq;

fn options() -> ProgramOptions {
    ProgramOptions {
        verify: true,
        chunk_size: 512,
        switch_to_xosc: true,
        poller: Poller::new().with_backoff(Duration::ZERO, Duration::ZERO),
    }
}

fn firmware(len: usize) -> FirmwareImage {
    let data: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
    FirmwareImage::from_bytes(data).unwrap()
}

#[test]
fn two_chunks_are_written_and_verified() {
    let mut target = FakeTarget::new();
    let image = firmware(1024);
    let progress = FlashProgress::empty();

    prepare(&mut target, &options(), &progress).unwrap();
    let summary = program(&mut target, &image, &options(), &progress).unwrap();

    assert_eq!(summary.chunks, 2);
    assert_eq!(
        target.flash_writes(),
        &[
            FlashWrite {
                word_address: 0x0000,
                len: 512
            },
            FlashWrite {
                word_address: 0x0080,
                len: 512
            },
        ]
    );
    assert_eq!(&target.flash()[..1024], image.as_bytes());
    assert_eq!(target.erase_count(), 1);
}

#[test]
fn verify_mismatch_erases_once_and_stops() {
    let mut target = FakeTarget::new();
    let image = firmware(1536);
    let progress = FlashProgress::empty();
    target.corrupt_read_back(0x0200 + 17);

    prepare(&mut target, &options(), &progress).unwrap();
    let erases_before = target.erase_count();

    let result = program(&mut target, &image, &options(), &progress);

    match result {
        Err(FlashError::VerifyMismatch {
            address,
            expected,
            actual,
        }) => {
            assert_eq!(address, 0x0211);
            assert_eq!(actual, !expected);
        }
        other => panic!("expected a verify mismatch, got {other:?}"),
    }
    assert_eq!(target.erase_count() - erases_before, 1);
    assert_eq!(target.flash_writes().len(), 2);
    assert!(target.flash().iter().all(|&byte| byte == 0xFF));
}

#[test]
fn unverified_run_ignores_read_back() {
    let mut target = FakeTarget::new();
    let image = firmware(1024);
    target.corrupt_read_back(0x0000);
    let options = ProgramOptions {
        verify: false,
        ..options()
    };

    program(&mut target, &image, &options, &FlashProgress::empty()).unwrap();

    assert_eq!(target.flash_writes().len(), 2);
    assert_eq!(target.erase_count(), 0);
}

#[test]
fn unreadable_chip_stops_before_erase() {
    let mut target = FakeTarget::new();
    target.set_chip_id(0xFF, 0xFF);

    let result = prepare(&mut target, &options(), &FlashProgress::empty());

    assert!(matches!(result, Err(FlashError::ChipIdUnreadable(0xFF))));
    assert_eq!(target.erase_count(), 0);
    assert!(target.flash_writes().is_empty());
}
