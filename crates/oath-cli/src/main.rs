//! # oath CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, and dispatches to
//! the subcommand handlers in [`oath_cli::commands`].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oath_cli::commands::{run_relay, run_scan, run_serve, run_triggers, run_validate, RelayArgs};

/// OathLayer local host.
///
/// Runs the SLA enforcement workflow against JSON-RPC chains: scans
/// agreements for uptime breaches and relays identity registrations.
#[derive(Parser, Debug)]
#[command(name = "oath", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to the host settings file.
    #[arg(long, global = true, default_value = "oath.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve every trigger binding until Ctrl-C.
    Run,

    /// Run one proactive scan and print the summary.
    Scan,

    /// Relay the registrations emitted by one origin-chain transaction.
    Relay(RelayArgs),

    /// Print the trigger bindings.
    Triggers,

    /// Validate the settings file.
    Validate,
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins when no -v flag is given.
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let result = match &cli.command {
        Commands::Run => run_serve(&cli.config).await,
        Commands::Scan => run_scan(&cli.config).await,
        Commands::Relay(args) => run_relay(&cli.config, args).await,
        Commands::Triggers => run_triggers(&cli.config),
        Commands::Validate => run_validate(&cli.config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oath_core::Role;

    #[test]
    fn parse_scan_with_defaults() {
        let cli = Cli::try_parse_from(["oath", "scan"]).unwrap();
        assert!(matches!(cli.command, Commands::Scan));
        assert_eq!(cli.config, PathBuf::from("oath.yaml"));
        assert!(!cli.json_logs);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_relay() {
        let hash = format!("0x{}", "ab".repeat(32));
        let cli = Cli::try_parse_from(["oath", "relay", "--role", "arbitrator", "--tx-hash", &hash]).unwrap();
        let Commands::Relay(args) = cli.command else {
            panic!("expected relay");
        };
        assert_eq!(args.role, Role::Arbitrator);
        assert_eq!(args.tx_hash, hash);
    }

    #[test]
    fn parse_relay_rejects_unknown_role() {
        assert!(Cli::try_parse_from(["oath", "relay", "--role", "tenant", "--tx-hash", "0x00"]).is_err());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["oath", "run", "-vv", "--json-logs", "--config", "x.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.verbose, 2);
        assert!(cli.json_logs);
        assert_eq!(cli.config, PathBuf::from("x.yaml"));
    }

    #[test]
    fn parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["oath"]).is_err());
    }
}
