use std::path::PathBuf;

use anyhow::Context;
use ccprog::flashing::{FlashAddress, Flasher, FLASH_SIZE};

use crate::util::common_options::ProgrammerOptions;
use crate::util::logging;
use crate::util::parse_u32;

/// Dump flash contents to a file.
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ProgrammerOptions,

    /// The file to write the flash contents to.
    #[arg(long, short, value_name = "PATH")]
    output: PathBuf,

    /// The flash address to start reading at. Must be a multiple of 4.
    #[arg(long, value_parser = parse_u32, default_value_t = 0)]
    address: u32,

    /// The number of bytes to read. Reads to the end of the flash by default.
    #[arg(long, value_parser = parse_u32)]
    length: Option<u32>,
}

impl Cmd {
    fn range(&self) -> anyhow::Result<(FlashAddress, usize)> {
        let address = FlashAddress::new(self.address)?;
        let length = match self.length {
            Some(length) => length,
            None => FLASH_SIZE.saturating_sub(self.address),
        };

        Ok((address, length as usize))
    }

    pub fn run(self) -> anyhow::Result<()> {
        let (address, length) = self.range()?;

        let config = self.common.config();
        let mut programmer = config.attach()?;
        let mut flasher = Flasher::new(&mut programmer, config.poller());
        flasher.identify()?;

        let data = flasher
            .read_flash(address, length)
            .with_context(|| format!("Failed to read {length} bytes at {address}"))?;

        std::fs::write(&self.output, &data)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        logging::eprintln(format!(
            "Read {} bytes at {} into {}",
            data.len(),
            address,
            self.output.display()
        ));

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reads_whole_flash_by_default() {
        let cmd = Cmd::try_parse_from(["read", "--output", "dump.bin"]).unwrap();

        let (address, length) = cmd.range().unwrap();

        assert_eq!(address, FlashAddress::ZERO);
        assert_eq!(length, 0x4_0000);
    }

    #[test]
    fn length_defaults_to_the_rest_of_the_flash() {
        let cmd = Cmd::try_parse_from(["read", "-o", "dump.bin", "--address", "0x38000"]).unwrap();

        let (address, length) = cmd.range().unwrap();

        assert_eq!(address.bank(), 7);
        assert_eq!(length, 0x8000);
    }

    #[test]
    fn unaligned_start_is_rejected() {
        let cmd = Cmd::try_parse_from(["read", "-o", "dump.bin", "--address", "0x101"]).unwrap();

        assert!(cmd.range().is_err());
    }
}
