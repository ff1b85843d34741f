use anyhow::Context;

use crate::util::common_options::ProgrammerOptions;
use crate::util::logging;

/// Reset the target and let it run its application.
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ProgrammerOptions,
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let mut programmer = self.common.config().open()?;
        programmer
            .run_normal_mode()
            .context("Failed to reset the target")?;

        logging::eprintln("Target released into normal mode");

        Ok(())
    }
}
