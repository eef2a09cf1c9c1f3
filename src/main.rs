mod caldav;
mod commands;
mod credentials;
mod remote;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use remdav_core::constants::{DEFAULT_MONTHS, DEFAULT_ZONE};

#[derive(Parser)]
#[command(name = "remdav")]
#[command(about = "Sync a Remind file with a CalDAV calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload local Remind events to the CalDAV calendar
    Push(PushArgs),
    /// Download remote events into the Remind file
    Pull(PullArgs),
}

#[derive(Args)]
pub struct PushArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Delete remote events that are no longer present locally
    #[arg(short = 'd', long)]
    pub delete: bool,

    /// Remind file of the previous run, scoping which remote events may
    /// be deleted
    #[arg(short = 'o', long, value_name = "FILE")]
    pub old: Option<std::path::PathBuf>,

    /// The Remind file to process, '-' for standard input
    /// (default: ~/.reminders)
    #[arg(value_name = "FILE")]
    pub infile: Option<String>,
}

#[derive(Args)]
pub struct PullArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Delete local events that are no longer present remotely
    #[arg(short = 'd', long)]
    pub delete: bool,

    /// The Remind file to process (default: ~/.reminders)
    #[arg(value_name = "FILE")]
    pub remfile: Option<String>,
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// The URL of the CalDAV server
    #[arg(short = 'r', long, value_name = "URL")]
    pub davurl: String,

    /// The username for the CalDAV server
    #[arg(short = 'u', long)]
    pub davuser: Option<String>,

    /// The password for the CalDAV server
    #[arg(short = 'p', long)]
    pub davpass: Option<String>,

    /// Skip TLS certificate verification
    #[arg(short = 'i', long)]
    pub insecure: bool,
}

#[derive(Args)]
pub struct WindowArgs {
    /// Timezone of the Remind file
    #[arg(short = 'z', long, default_value = DEFAULT_ZONE)]
    pub zone: String,

    /// Start of the expansion window (default: today minus 12 weeks)
    #[arg(short = 's', long, value_name = "YYYY-MM-DD")]
    pub startdate: Option<NaiveDate>,

    /// Number of months to expand, beginning at the start date
    #[arg(short = 'm', long, default_value_t = DEFAULT_MONTHS)]
    pub month: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Push(args) => commands::push::run(args).await,
        Commands::Pull(args) => commands::pull::run(args).await,
    }
}
