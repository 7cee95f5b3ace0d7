//! beacon: status page and synthetic-monitoring automation.
//!
//! # Usage
//!
//! ```text
//! beacon reconcile            # converge checks and components with beacon.toml
//! beacon monitor              # classify metrics into github-pages/status.json
//! beacon sync                 # push statuses and run incident automation
//! beacon manage list-components
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

mod commands;

use commands::{PrometheusArgs, StatuspageArgs, SyntheticArgs};

#[derive(Parser)]
#[command(
    name = "beacon",
    about = "Beacon: keep a status page and synthetic monitoring in step with beacon.toml",
    version,
    propagate_version = true
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    paths: Paths,

    #[command(subcommand)]
    command: Command,
}

/// Locations of the declarative config and the generated documents.
#[derive(clap::Args, Debug, Clone)]
pub struct Paths {
    /// Declarative endpoint configuration.
    #[arg(long, global = true, default_value = "beacon.toml")]
    pub config: PathBuf,

    /// Generated status-source document.
    #[arg(long, global = true, default_value = "config/checks.json")]
    pub checks: PathBuf,

    /// Component mapping document.
    #[arg(long, global = true, default_value = "config/statuspage.json")]
    pub mapping: PathBuf,

    /// Published status report.
    #[arg(long, global = true, default_value = "github-pages/status.json")]
    pub status: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Query metrics and write the status report.
    Monitor {
        #[command(flatten)]
        prometheus: PrometheusArgs,
    },
    /// Push component statuses and latency to the status page, then run
    /// incident automation.
    Sync {
        #[command(flatten)]
        statuspage: StatuspageArgs,
    },
    /// Converge monitoring checks and status-page components with
    /// beacon.toml and regenerate the derived documents.
    Reconcile {
        #[command(flatten)]
        statuspage: StatuspageArgs,
        #[command(flatten)]
        synthetic: SyntheticArgs,
        /// Delete remote checks and components that are no longer declared.
        #[arg(
            long,
            env = "ALLOW_DELETIONS",
            action = ArgAction::Set,
            num_args = 0..=1,
            default_value = "false",
            default_missing_value = "true",
            value_parser = parse_allow_deletions
        )]
        allow_deletions: bool,
    },
    /// Create missing monitoring checks from checks.json.
    Provision {
        #[command(flatten)]
        synthetic: SyntheticArgs,
    },
    /// Inspect and edit status-page components, metrics, and checks by hand.
    Manage {
        #[command(flatten)]
        statuspage: StatuspageArgs,
        #[command(flatten)]
        synthetic: SyntheticArgs,
        #[command(subcommand)]
        action: commands::manage::ManageAction,
    },
}

/// Only `true`, in any case, enables deletions. Anything else leaves them off.
fn parse_allow_deletions(raw: &str) -> Result<bool, std::convert::Infallible> {
    Ok(raw.eq_ignore_ascii_case("true"))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,beacon=debug"))?;
    if cli.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Monitor { prometheus } => commands::monitor::run(&cli.paths, &prometheus),
        Command::Sync { statuspage } => commands::sync::run(&cli.paths, &statuspage),
        Command::Reconcile {
            statuspage,
            synthetic,
            allow_deletions,
        } => commands::reconcile::run(&cli.paths, &statuspage, &synthetic, allow_deletions),
        Command::Provision { synthetic } => commands::provision::run(&cli.paths, &synthetic),
        Command::Manage {
            statuspage,
            synthetic,
            action,
        } => commands::manage::run(&cli.paths, &statuspage, &synthetic, action),
    }
}
