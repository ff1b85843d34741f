use anyhow::Context;
use ccprog::protocol::{ChipId, ChipStatus, DebugConfig};
use ccprog::DebugCommands;
use serde::Serialize;

use crate::util::common_options::ProgrammerOptions;
use crate::util::logging;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ProgrammerOptions,

    /// Print the information as JSON.
    #[arg(long)]
    json: bool,
}

/// What the debug interface reports about a halted target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ChipInfo {
    chip: ChipId,
    family: Option<String>,
    status: Vec<&'static str>,
    config: Vec<&'static str>,
}

impl ChipInfo {
    fn new(chip: ChipId, status: ChipStatus, config: DebugConfig) -> Self {
        Self {
            chip,
            family: chip.family().map(|family| family.to_string()),
            status: status.iter_names().map(|(name, _)| name).collect(),
            config: config.iter_names().map(|(name, _)| name).collect(),
        }
    }

    fn render(&self) -> String {
        let family = self.family.as_deref().unwrap_or("unknown");
        format!(
            "Chip ID:  {:#04x} ({})\nRevision: {:#04x}\nStatus:   {}\nConfig:   {}",
            self.chip.id,
            family,
            self.chip.revision,
            flag_list(&self.status),
            flag_list(&self.config),
        )
    }
}

fn flag_list(names: &[&str]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(" | ")
    }
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let mut programmer = self.common.config().attach()?;

        let chip = programmer
            .read_chip_id()
            .context("Failed to read the chip ID")?;
        if !chip.is_readable() {
            tracing::warn!(
                "Chip ID reads as {:#04x}, check the wiring and the target power",
                chip.id
            );
        }

        let status = programmer
            .read_status()
            .context("Failed to read the debug status")?;
        let config = programmer
            .read_config()
            .context("Failed to read the debug configuration")?;

        let info = ChipInfo::new(chip, status, config);
        if self.json {
            logging::println(serde_json::to_string_pretty(&info)?);
        } else {
            logging::println(info.render());
        }

        Ok(())
    }
}
