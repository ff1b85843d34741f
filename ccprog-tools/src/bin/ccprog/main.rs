mod cmd;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use crate::util::logging::{self, setup_logging, LogLevel};

#[derive(clap::Parser)]
#[clap(
    name = "ccprog",
    about = "Program CC253x/CC254x chips over GPIO lines",
    version
)]
struct Cli {
    /// Location for a JSON log file with every event of the run
    #[clap(long, global = true, help_heading = "LOG CONFIGURATION")]
    log_file: Option<PathBuf>,

    /// Console log level. Overrides RUST_LOG.
    #[clap(long, global = true, value_enum, help_heading = "LOG CONFIGURATION")]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Erase the chip and program a raw binary image
    Flash(cmd::flash::Cmd),
    /// Show the chip ID, debug status and debug configuration
    Info(cmd::info::Cmd),
    /// Erase the whole flash
    Erase(cmd::erase::Cmd),
    /// Dump flash contents to a file
    Read(cmd::read::Cmd),
    /// Reset the target into its application
    Reset(cmd::reset::Cmd),
}

impl Subcommand {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Subcommand::Flash(cmd) => cmd.run(),
            Subcommand::Info(cmd) => cmd.run(),
            Subcommand::Erase(cmd) => cmd.run(),
            Subcommand::Read(cmd) => cmd.run(),
            Subcommand::Reset(cmd) => cmd.run(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match setup_logging(cli.log_file.as_deref(), cli.log_level) {
        Ok(guard) => guard,
        Err(error) => return report(Err(error)),
    };

    report(cli.subcommand.run())
}

/// Prints the error chain of a failed run and maps the result to the exit code.
fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            logging::clear_progress_bar();
            logging::eprintln(render_error(&error));
            ExitCode::FAILURE
        }
    }
}

fn render_error(error: &anyhow::Error) -> String {
    let mut message = format!("{} {}", "Error:".red().bold(), error);
    for cause in error.chain().skip(1) {
        message.push_str(&format!("\n  {} {}", "Caused by:".dimmed(), cause));
    }
    message
}

#[cfg(test)]
mod test {
    use ccprog::flashing::FlashError;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_log_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "ccprog",
            "flash",
            "--file",
            "firmware.bin",
            "--log-level",
            "DEBUG",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert!(matches!(cli.subcommand, Subcommand::Flash(_)));
    }

    #[test]
    fn error_chain_is_rendered() {
        colored::control::set_override(false);
        let error = anyhow::Error::new(FlashError::VerifyMismatch {
            address: 0x0211,
            expected: 0x12,
            actual: 0xED,
        })
        .context("Failed to program firmware.bin");

        let rendered = render_error(&error);

        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.starts_with("Error: Failed to program firmware.bin"));
        assert!(rendered.lines().nth(1).unwrap().contains("Caused by:"));
    }

    #[test]
    fn failures_exit_with_one() {
        assert_eq!(format!("{:?}", report(Ok(()))), format!("{:?}", ExitCode::SUCCESS));
        assert_eq!(
            format!("{:?}", report(Err(anyhow::anyhow!("chip ID unreadable")))),
            format!("{:?}", ExitCode::from(1))
        );
    }
}
