//! CLI entry point for the batch encoder
//!
//! Parses command line arguments, sets up logging and runs one batch.

use batch_encoder::{BatchFlags, Config};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Encodes every video in ~/.encoder/input with VAAPI HEVC
#[derive(Parser, Debug)]
#[command(name = "encoder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Dry run with no changes
    #[arg(short = 'u', long, global = true)]
    dry_run: bool,

    /// Send notification after encoding is complete
    #[arg(short, long, global = true)]
    notify: bool,

    /// Deletes old file after file has been encoded
    #[arg(short, long, global = true)]
    delete_file: bool,

    /// Deletes new file if it's larger than the old file
    #[arg(short = 'f', long, global = true)]
    delete_large: bool,

    /// Path to a config file (default: <state dir>/config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Start encoding
    Run,
    /// Poweroff system after encoding is complete
    Poweroff,
    /// Shows this usage message
    Usage,
}

impl Cli {
    fn flags(&self) -> BatchFlags {
        BatchFlags {
            dry_run: self.dry_run,
            delete_input_after_success: self.delete_file,
            delete_output_if_larger: self.delete_large,
            notify_on_finish: self.notify,
            power_off: self.command == Some(Commands::Poweroff),
        }
    }
}

/// What the parsed command line asks for
#[derive(Debug)]
enum Invocation {
    Batch(Cli),
    Usage,
    Invalid(clap::Error),
}

fn parse_args<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Run) | Some(Commands::Poweroff) => Invocation::Batch(cli),
            Some(Commands::Usage) | None => Invocation::Usage,
        },
        // Unknown or missing subcommands fall back to the usage text
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            | ErrorKind::InvalidSubcommand
            | ErrorKind::MissingSubcommand => Invocation::Usage,
            _ => Invocation::Invalid(e),
        },
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        Invocation::Batch(cli) => cli,
        Invocation::Usage => {
            let _ = Cli::command().print_help();
            return ExitCode::SUCCESS;
        }
        Invocation::Invalid(e) => {
            let _ = e.print();
            if e.kind() == ErrorKind::DisplayVersion {
                return ExitCode::SUCCESS;
            }
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose);

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let flags = cli.flags();
    if flags.dry_run {
        info!("Dry run: no files will be changed");
    }

    match batch_encoder::run(&config, &flags).await {
        Ok(summary) => {
            info!(
                "Processed {} of {} file(s), {} skipped, {} larger after encoding",
                summary.processed,
                summary.total_items,
                summary.skipped,
                summary.regressions()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(args: &[&str]) -> Cli {
        match parse_args(args.iter().copied()) {
            Invocation::Batch(cli) => cli,
            other => panic!("expected a batch invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_with_long_flags() {
        let cli = batch(&["encoder", "--dry-run", "--notify", "--delete-file", "--delete-large", "run"]);
        assert_eq!(
            cli.flags(),
            BatchFlags {
                dry_run: true,
                delete_input_after_success: true,
                delete_output_if_larger: true,
                notify_on_finish: true,
                power_off: false,
            }
        );
    }

    #[test]
    fn test_short_flags_after_subcommand() {
        let cli = batch(&["encoder", "run", "-u", "-n", "-d", "-f"]);
        let flags = cli.flags();
        assert!(flags.dry_run && flags.notify_on_finish);
        assert!(flags.delete_input_after_success && flags.delete_output_if_larger);
    }

    #[test]
    fn test_poweroff_sets_power_off() {
        let cli = batch(&["encoder", "poweroff"]);
        assert!(cli.flags().power_off);
        assert!(!cli.flags().dry_run);
    }

    #[test]
    fn test_usage_cases() {
        for args in [
            vec!["encoder"],
            vec!["encoder", "usage"],
            vec!["encoder", "help"],
            vec!["encoder", "--help"],
            vec!["encoder", "encode-everything"],
        ] {
            assert!(
                matches!(parse_args(args.clone()), Invocation::Usage),
                "{:?} should show usage",
                args
            );
        }
    }

    #[test]
    fn test_unknown_flag_is_invalid() {
        assert!(matches!(
            parse_args(["encoder", "run", "--turbo"]),
            Invocation::Invalid(_)
        ));
    }
}
