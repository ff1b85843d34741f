//! Options shared by every subcommand that talks to a target.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ccprog::gpio::{GpioPins, PinConfig};
use ccprog::wire::{GpioTransport, DEFAULT_SETTLE_DELAY};
use ccprog::{DebugInterface, Poller};
use serde::Serialize;

use super::{parse_u32, parse_u64};

/// The debug interface of a target wired to the host GPIO lines.
pub type Programmer = DebugInterface<GpioTransport<Box<dyn GpioPins>>>;

/// How the programmer is wired to the target.
#[derive(clap::Parser, Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerOptions {
    /// The GPIO character device the programmer lines belong to.
    #[arg(
        long,
        env = "CCPROG_GPIO_CHIP",
        default_value = "/dev/gpiochip0",
        help_heading = "PROGRAMMER CONFIGURATION"
    )]
    pub gpio_chip: PathBuf,

    /// Line offset of the debug clock (DC).
    #[arg(
        long = "dc",
        env = "CCPROG_DC",
        value_name = "OFFSET",
        value_parser = parse_u32,
        default_value_t = PinConfig::default().clock,
        help_heading = "PROGRAMMER CONFIGURATION"
    )]
    pub clock: u32,

    /// Line offset of the debug data line (DD).
    #[arg(
        long = "dd",
        env = "CCPROG_DD",
        value_name = "OFFSET",
        value_parser = parse_u32,
        default_value_t = PinConfig::default().data,
        help_heading = "PROGRAMMER CONFIGURATION"
    )]
    pub data: u32,

    /// Line offset of the target reset (RESET_N).
    #[arg(
        long = "reset-n",
        env = "CCPROG_RESET_N",
        value_name = "OFFSET",
        value_parser = parse_u32,
        default_value_t = PinConfig::default().reset,
        help_heading = "PROGRAMMER CONFIGURATION"
    )]
    pub reset: u32,

    /// Wait after every line transition, in microseconds.
    ///
    /// Lower values speed up programming but may cause misreads on slow or
    /// long wiring.
    #[arg(
        long,
        env = "CCPROG_SETTLE_US",
        value_name = "MICROSECONDS",
        value_parser = parse_u64,
        default_value_t = DEFAULT_SETTLE_DELAY.as_micros() as u64,
        help_heading = "PROGRAMMER CONFIGURATION"
    )]
    pub settle_us: u64,

    /// Give up waiting for a busy target after this many milliseconds.
    ///
    /// Without a timeout chip erase and flash writes are waited for forever.
    #[arg(
        long,
        env = "CCPROG_POLL_TIMEOUT_MS",
        value_name = "MILLISECONDS",
        value_parser = parse_u64,
        help_heading = "PROGRAMMER CONFIGURATION"
    )]
    pub poll_timeout_ms: Option<u64>,
}

impl ProgrammerOptions {
    pub fn config(&self) -> ProgrammerConfig {
        ProgrammerConfig {
            gpio_chip: self.gpio_chip.clone(),
            pins: PinConfig {
                clock: self.clock,
                data: self.data,
                reset: self.reset,
            },
            settle_delay: Duration::from_micros(self.settle_us),
            poll_timeout: self.poll_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// The resolved programmer setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgrammerConfig {
    pub gpio_chip: PathBuf,
    pub pins: PinConfig,
    pub settle_delay: Duration,
    pub poll_timeout: Option<Duration>,
}

impl ProgrammerConfig {
    /// The poller for busy waits on the target.
    pub fn poller(&self) -> Poller {
        Poller::new().with_timeout(self.poll_timeout)
    }

    /// Request the lines without touching the target.
    pub fn open(&self) -> anyhow::Result<Programmer> {
        tracing::debug!("Programmer configuration: {}", serde_json::to_string(self)?);

        let gpio = open_gpio(&self.gpio_chip, self.pins)?;
        let transport = GpioTransport::new(gpio, self.settle_delay)
            .context("Failed to set up the debug lines")?;

        Ok(DebugInterface::new(transport))
    }

    /// Request the lines and reset the target into debug mode.
    pub fn attach(&self) -> anyhow::Result<Programmer> {
        let mut programmer = self.open()?;
        programmer
            .enter_debug_mode()
            .context("Failed to reset the target into debug mode")?;

        Ok(programmer)
    }
}

#[cfg(target_os = "linux")]
fn open_gpio(chip: &Path, pins: PinConfig) -> anyhow::Result<Box<dyn GpioPins>> {
    let gpio = ccprog_linux::LinuxGpio::open(chip, pins)?;
    Ok(Box::new(gpio))
}

#[cfg(not(target_os = "linux"))]
fn open_gpio(chip: &Path, _pins: PinConfig) -> anyhow::Result<Box<dyn GpioPins>> {
    anyhow::bail!(
        "Cannot open {}: GPIO access is only supported on Linux",
        chip.display()
    )
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(clap::Parser)]
    struct Cli {
        #[clap(flatten)]
        programmer: ProgrammerOptions,
    }

    #[test]
    fn offsets_and_timings_are_resolved() {
        let cli = Cli::try_parse_from([
            "ccprog",
            "--gpio-chip",
            "/dev/gpiochip4",
            "--dc",
            "0x11",
            "--dd",
            "27",
            "--reset-n",
            "22",
            "--settle-us",
            "20",
            "--poll-timeout-ms",
            "1500",
        ])
        .unwrap();

        assert_eq!(
            cli.programmer.config(),
            ProgrammerConfig {
                gpio_chip: PathBuf::from("/dev/gpiochip4"),
                pins: PinConfig {
                    clock: 17,
                    data: 27,
                    reset: 22,
                },
                settle_delay: Duration::from_micros(20),
                poll_timeout: Some(Duration::from_millis(1500)),
            }
        );
    }

    #[test]
    fn poller_waits_forever_without_timeout() {
        let config = ProgrammerConfig {
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            pins: PinConfig::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_timeout: None,
        };

        assert_eq!(config.poller().timeout(), None);
    }

    #[test]
    fn config_is_logged_as_json() {
        let config = ProgrammerConfig {
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            pins: PinConfig::default(),
            settle_delay: Duration::from_micros(100),
            poll_timeout: None,
        };

        let json: serde_json::Value = serde_json::to_value(&config).unwrap();

        assert_eq!(json["gpio_chip"], "/dev/gpiochip0");
        assert_eq!(json["pins"]["clock"], 16);
        assert_eq!(json["pins"]["data"], 20);
        assert_eq!(json["pins"]["reset"], 19);
        assert_eq!(json["poll_timeout"], serde_json::Value::Null);
    }
}
