//! bestfit — pick the best-fitting instance types from a provider snapshot.
//!
//! # Usage
//!
//! ```text
//! bestfit select --snapshot snap.json --vcpu 4 --memory-gb 16 --best-price
//! bestfit select --snapshot snap.json --request req.json --format json
//! bestfit storage --snapshot snap.json --instance-type m5d.large
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod snapshot;

#[derive(Parser)]
#[command(
    name = "bestfit",
    about = "bestfit — instance type selection by resources and price",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select instance types matching resource constraints.
    ///
    /// Constraints come from a JSON request file (--request) or from
    /// individual flags; --vcpu and --memory-gb are required without one.
    Select(commands::select::SelectArgs),
    /// Report whether an instance type supports instance-store volumes.
    Storage {
        /// Provider snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Instance type name, e.g. m5d.large
        #[arg(short, long)]
        instance_type: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logs = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bestfit=info".parse()?),
        )
        .with_writer(std::io::stderr);
    if cli.global.log_json {
        logs.json().init();
    } else {
        logs.init();
    }

    match cli.command {
        Commands::Select(args) => commands::select::run(&cli.global, args).await,
        Commands::Storage {
            snapshot,
            instance_type,
            format,
        } => commands::storage::run(&cli.global, &snapshot, &instance_type, &format).await,
    }
}
