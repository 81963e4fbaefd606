pub mod select;
pub mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::debug;

use bestfit_catalog::InterruptionTable;
use bestfit_core::{Providers, SelectorConfig};
use bestfit_selector::Selector;

use crate::snapshot::SnapshotProvider;

/// Options shared by every subcommand.
#[derive(Args)]
pub struct GlobalOptions {
    /// Selector configuration (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Region override
    #[arg(short, long, global = true)]
    pub region: Option<String>,

    /// Interruption-frequency overlay (JSON) merged over the built-in table
    #[arg(long, global = true)]
    pub interruption_table: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Build a selector over the snapshot at `snapshot`.
pub fn build_selector(options: &GlobalOptions, snapshot: &Path) -> anyhow::Result<Selector> {
    let mut config = match &options.config {
        Some(path) => SelectorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SelectorConfig::default(),
    };
    if let Some(region) = &options.region {
        config.region = region.clone();
    }

    let provider = SnapshotProvider::from_file(snapshot)
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    debug!(instance_types = provider.instance_type_count(), region = %config.region, "snapshot loaded");

    let mut table = InterruptionTable::builtin();
    if let Some(path) = &options.interruption_table {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading interruption table {}", path.display()))?;
        table.merge_json(&json)?;
    }

    let selector = Selector::new(config, Providers::from_single(Arc::new(provider)))?
        .with_interruption_table(table);
    Ok(selector)
}
