use std::path::PathBuf;

use anyhow::Context;
use ccprog::flashing::{FirmwareImage, ProgramOptions, STAGING_BUFFER_SIZE};

use crate::util::common_options::ProgrammerOptions;
use crate::util::flash::run_flash_download;
use crate::util::logging;
use crate::util::parse_usize;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ProgrammerOptions,

    #[clap(flatten)]
    download: DownloadOptions,

    /// The raw binary image to program, starting at flash address 0.
    #[arg(long, short, value_name = "PATH")]
    file: PathBuf,

    /// Reset the target into its application after programming.
    #[arg(long)]
    run: bool,
}

#[derive(Debug, clap::Parser)]
pub struct DownloadOptions {
    /// Read every chunk back after writing it. On the first difference the
    /// chip is erased again and programming fails.
    #[arg(long, help_heading = "DOWNLOAD CONFIGURATION")]
    pub verify: bool,

    /// Keep the internal RC oscillator instead of switching to the 32 MHz crystal.
    #[arg(long, help_heading = "DOWNLOAD CONFIGURATION")]
    pub no_xosc: bool,

    /// Bytes per flash write. Must be a multiple of 4, at most 512.
    #[arg(
        long,
        env = "CCPROG_CHUNK_SIZE",
        value_parser = parse_usize,
        default_value_t = STAGING_BUFFER_SIZE,
        help_heading = "DOWNLOAD CONFIGURATION"
    )]
    pub chunk_size: usize,

    #[arg(long, help_heading = "DOWNLOAD CONFIGURATION")]
    pub disable_progressbars: bool,
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let image = FirmwareImage::open(&self.file)?;
        tracing::info!("Loaded {} bytes from {}", image.len(), self.file.display());

        let config = self.common.config();
        let options = ProgramOptions {
            verify: self.download.verify,
            chunk_size: self.download.chunk_size,
            switch_to_xosc: !self.download.no_xosc,
            poller: config.poller(),
        };

        let mut programmer = config.attach()?;
        let summary = run_flash_download(
            &mut programmer,
            &self.file,
            &image,
            &options,
            self.download.disable_progressbars,
        )?;
        tracing::info!("Programming summary: {}", serde_json::to_string(&summary)?);

        if self.run {
            programmer
                .run_normal_mode()
                .context("Failed to reset the target into normal mode")?;
            logging::eprintln("Target released into normal mode");
        }

        Ok(())
    }
}
