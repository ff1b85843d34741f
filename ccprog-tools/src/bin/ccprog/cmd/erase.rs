use std::time::Instant;

use anyhow::Context;
use ccprog::flashing::Flasher;
use colored::Colorize;

use crate::util::common_options::ProgrammerOptions;
use crate::util::logging;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ProgrammerOptions,
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.common.config();
        let mut programmer = config.attach()?;
        let mut flasher = Flasher::new(&mut programmer, config.poller());

        flasher.identify()?;

        let timer = Instant::now();
        flasher.erase_chip().context("Failed to erase the chip")?;

        logging::eprintln(format!(
            "     {} in {:.02}s",
            "Erased".green().bold(),
            timer.elapsed().as_secs_f32(),
        ));

        Ok(())
    }
}
