use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;

use bestfit_core::{
    Architecture, ProductDescription, SelectionRequest, SelectionResult, SpotPriceStrategy, UsageClass,
};

use super::{GlobalOptions, build_selector};

#[derive(Args)]
pub struct SelectArgs {
    /// Provider snapshot (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Selection request (JSON); replaces the constraint flags below
    #[arg(long, conflicts_with_all = ["vcpu", "memory_gb"])]
    request: Option<PathBuf>,

    /// Minimum vCPU count
    #[arg(long)]
    vcpu: Option<f64>,

    /// Minimum memory in GiB
    #[arg(long)]
    memory_gb: Option<f64>,

    /// on-demand or spot
    #[arg(long)]
    usage_class: Option<UsageClass>,

    /// i386, x86_64, arm64 or x86_64_mac
    #[arg(long)]
    architecture: Option<Architecture>,

    #[arg(long)]
    burstable: Option<bool>,

    #[arg(long)]
    current_generation: Option<bool>,

    #[arg(long)]
    instance_storage: Option<bool>,

    /// Product description, e.g. "Linux/UNIX" (repeatable)
    #[arg(long = "product-description")]
    product_descriptions: Vec<ProductDescription>,

    /// Availability zone (repeatable)
    #[arg(long = "zone")]
    zones: Vec<String>,

    /// Price candidates and sort cheapest first
    #[arg(long)]
    best_price: bool,

    /// Highest acceptable spot interruption percentage (0-100)
    #[arg(long)]
    max_interruption_frequency: Option<u32>,

    /// min, max or average over spot price history
    #[arg(long)]
    strategy: Option<SpotPriceStrategy>,

    /// Return at most this many instance types
    #[arg(long)]
    limit: Option<usize>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,
}

impl SelectArgs {
    fn to_request(&self) -> anyhow::Result<SelectionRequest> {
        if let Some(path) = &self.request {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading request {}", path.display()))?;
            return Ok(SelectionRequest::from_json(&json)?);
        }

        let (Some(vcpu), Some(memory_gb)) = (self.vcpu, self.memory_gb) else {
            bail!("--vcpu and --memory-gb are required unless --request is given");
        };

        let mut request = SelectionRequest::new(vcpu, memory_gb);
        if let Some(usage_class) = self.usage_class {
            request.usage_class = usage_class;
        }
        request.architecture = self.architecture;
        request.burstable = self.burstable;
        request.is_current_generation = self.current_generation;
        request.is_instance_storage_supported = self.instance_storage;
        if !self.product_descriptions.is_empty() {
            request.product_descriptions = self.product_descriptions.iter().copied().collect();
        }
        if !self.zones.is_empty() {
            request.availability_zones = Some(self.zones.iter().cloned().collect::<BTreeSet<_>>());
        }
        request.is_best_price = self.best_price;
        request.max_interruption_frequency = self.max_interruption_frequency;
        if let Some(strategy) = self.strategy {
            request.final_spot_price_determination_strategy = strategy;
        }
        request.limit = self.limit;
        Ok(request)
    }
}

pub async fn run(global: &GlobalOptions, args: SelectArgs) -> anyhow::Result<()> {
    let request = args.to_request()?;
    let selector = build_selector(global, &args.snapshot)?;
    let results = selector.get_best_instance_types(&request).await?;

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        _ => {
            print!("{}", format_results(&results));
        }
    }

    Ok(())
}

fn format_results(results: &[SelectionResult]) -> String {
    if results.is_empty() {
        return "no matching instance types\n".to_string();
    }

    let mut out = String::new();
    for result in results {
        let mut line = format!("{:<24}", result.instance_type);
        if let Some(price) = result.price {
            line.push_str(&format!(" {price:>12.6}"));
        }
        if let Some(freq) = result.interruption_frequency {
            line.push_str(&format!("  interruption {}", freq.rate));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
