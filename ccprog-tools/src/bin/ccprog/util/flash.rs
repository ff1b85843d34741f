use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use ccprog::flashing::{
    prepare, program, FirmwareImage, FlashProgress, ProgramOptions, ProgramSummary, ProgressEvent,
};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::Mutex;

use super::common_options::Programmer;
use super::logging;

/// Erases the chip and programs `image`, rendering progress bars unless disabled.
pub fn run_flash_download(
    programmer: &mut Programmer,
    path: &Path,
    image: &FirmwareImage,
    options: &ProgramOptions,
    disable_progressbars: bool,
) -> anyhow::Result<ProgramSummary> {
    let pb = if disable_progressbars {
        None
    } else {
        Some(CliProgressBars::new(options.verify))
    };

    let progress = FlashProgress::new(move |event| {
        if let Some(ref pb) = pb {
            pb.handle(event);
        }
    });

    let flash_timer = Instant::now();

    let chip = prepare(&mut *programmer, options, &progress)
        .context("Failed to prepare the chip for programming")?;
    tracing::info!("Programming {}", chip);

    let summary = program(&mut *programmer, image, options, &progress)
        .with_context(|| format!("Failed to program {}", path.display()))?;

    // If we don't do this, the progress bars disappear.
    logging::clear_progress_bar();

    logging::eprintln(format!(
        "     {} in {:.02}s",
        "Finished".green().bold(),
        flash_timer.elapsed().as_secs_f32(),
    ));

    Ok(summary)
}

pub struct ProgressBars {
    pub erase: PhaseBar,
    pub program: PhaseBar,
    pub verify: Option<PhaseBar>,
}

/// The progress bar of one programming phase.
pub struct PhaseBar {
    bar: ProgressBar,
    counts_bytes: bool,
}

const TICK_CHARS: &str = "⠁⠁⠉⠙⠚⠒⠂⠂⠒⠲⠴⠤⠄⠄⠤⠠⠠⠤⠦⠖⠒⠐⠐⠒⠓⠋⠉⠈⠈✔";

impl PhaseBar {
    fn new(multi_progress: &MultiProgress, message: &str, counts_bytes: bool) -> Self {
        let bar = multi_progress.add(ProgressBar::new(0));
        bar.set_message(message.to_string());
        bar.set_style(Self::idle());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.reset_elapsed();

        Self { bar, counts_bytes }
    }

    fn style(template: &str, progress_chars: &str) -> ProgressStyle {
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars(TICK_CHARS)
            .progress_chars(progress_chars)
    }

    fn idle() -> ProgressStyle {
        Self::style("{msg:.green.bold} {spinner} {percent:>3}% [{bar:20}]", "--")
    }

    fn active() -> ProgressStyle {
        Self::style(
            "{msg:.green.bold} {spinner} {percent:>3}% [{bar:20}] {bytes:>10} @ {bytes_per_sec:>12} (ETA {eta})",
            "##-",
        )
    }

    fn finished(counts_bytes: bool) -> ProgressStyle {
        if counts_bytes {
            Self::style(
                "{msg:.green.bold} {spinner} {percent:>3}% [{bar:20}] {bytes:>10} @ {bytes_per_sec:>12} (took {elapsed})",
                "##",
            )
        } else {
            Self::style("{msg:.green.bold} {spinner} [{bar:20}] (took {elapsed})", "##")
        }
    }

    pub fn start(&self, length: u64) {
        self.bar.set_length(length);
        self.bar.reset_elapsed();
        self.bar.reset_eta();
    }

    pub fn inc(&self, size: u64) {
        self.bar.set_style(Self::active());
        self.bar.inc(size);
    }

    pub fn finish(&self) {
        self.bar.set_style(Self::finished(self.counts_bytes));
        if let Some(length) = self.bar.length() {
            self.bar.set_position(length);
        }
        self.bar.finish();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

pub struct CliProgressBars {
    progress_bars: Mutex<ProgressBars>,
}

impl CliProgressBars {
    pub fn new(verify: bool) -> Self {
        let multi_progress = MultiProgress::new();
        logging::set_progress_bar(multi_progress.clone());

        let progress_bars = Mutex::new(ProgressBars {
            erase: PhaseBar::new(&multi_progress, "      Erasing", false),
            program: PhaseBar::new(&multi_progress, "  Programming", true),
            verify: verify.then(|| PhaseBar::new(&multi_progress, "    Verifying", true)),
        });

        Self { progress_bars }
    }

    pub fn handle(&self, event: ProgressEvent) {
        let progress_bars = self.progress_bars.lock();
        match event {
            ProgressEvent::StartedErasing => progress_bars.erase.start(1),
            ProgressEvent::FinishedErasing { .. } => progress_bars.erase.finish(),
            ProgressEvent::FailedErasing => {
                progress_bars.erase.abandon();
                progress_bars.program.abandon();
            }
            ProgressEvent::StartedProgramming { total_size } => {
                progress_bars.program.start(total_size);
                if let Some(verify) = &progress_bars.verify {
                    verify.start(total_size);
                }
            }
            ProgressEvent::ChunkProgrammed { size, .. } => {
                progress_bars.program.inc(u64::from(size));
            }
            ProgressEvent::ChunkVerified { size, .. } => {
                if let Some(verify) = &progress_bars.verify {
                    verify.inc(u64::from(size));
                }
            }
            ProgressEvent::FailedProgramming => {
                progress_bars.program.abandon();
                if let Some(verify) = &progress_bars.verify {
                    verify.abandon();
                }
            }
            ProgressEvent::FinishedProgramming => {
                progress_bars.program.finish();
                if let Some(verify) = &progress_bars.verify {
                    verify.finish();
                }
            }
        }
    }
}

impl Drop for CliProgressBars {
    fn drop(&mut self) {
        // If we don't do this, the progress bars disappear.
        logging::clear_progress_bar();
    }
}
