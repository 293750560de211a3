//! Metrc API evaluation harness.
//!
//! Drives create/update/get cycles for locations, strains and items against a
//! Metrc deployment and prints the request/response pairs each step produced,
//! one bundle per resource, for filling in the evaluation spreadsheet.

mod cli;
mod clock;
mod config;
mod exit_codes;
mod items;
mod locations;
mod logging;
mod report;
mod row;
mod strains;
#[cfg(test)]
mod test_support;
mod verify;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use metrc::Resource;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::report::OutputFormat;

#[derive(Parser)]
#[command(name = "eval", version, about = "Metrc API evaluation harness")]
struct Cli {
    /// Evaluation config file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// License number to run under, overriding the config file.
    #[arg(long, global = true)]
    license: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify locations, then strains.
    Run {
        /// Also verify items after strains.
        #[arg(long)]
        with_items: bool,
    },
    /// Verify locations only.
    Locations,
    /// Verify strains only.
    Strains,
    /// Verify items only.
    Items,
    /// Print the effective configuration.
    ShowConfig,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::FAILURE);
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli::load_effective_config(&cli.config, cli.license.as_deref())?;
    match cli.command {
        Command::Run { with_items } => cli::run_live(config, &cli::run_plan(with_items), cli.format),
        Command::Locations => cli::run_live(config, &[Resource::Locations], cli.format),
        Command::Strains => cli::run_live(config, &[Resource::Strains], cli.format),
        Command::Items => cli::run_live(config, &[Resource::Items], cli.format),
        Command::ShowConfig => cli::show_config(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::parse_from(["eval", "run"]);
        assert!(matches!(cli.command, Command::Run { with_items: false }));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.license.is_none());
    }

    #[test]
    fn parse_run_with_items_and_globals() {
        let cli = Cli::parse_from([
            "eval",
            "run",
            "--with-items",
            "--license",
            "C12-0000001-LIC",
            "--format",
            "tsv",
        ]);
        assert!(matches!(cli.command, Command::Run { with_items: true }));
        assert_eq!(cli.license.as_deref(), Some("C12-0000001-LIC"));
        assert_eq!(cli.format, OutputFormat::Tsv);
    }

    #[test]
    fn parse_single_resource_commands() {
        assert!(matches!(
            Cli::parse_from(["eval", "items"]).command,
            Command::Items
        ));
        assert!(matches!(
            Cli::parse_from(["eval", "show-config"]).command,
            Command::ShowConfig
        ));
    }
}
