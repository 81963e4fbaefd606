use std::path::Path;

use super::{GlobalOptions, build_selector};

pub async fn run(
    global: &GlobalOptions,
    snapshot: &Path,
    instance_type: &str,
    format: &str,
) -> anyhow::Result<()> {
    let selector = build_selector(global, snapshot)?;
    let supported = selector
        .is_instance_storage_supported_for_instance_type(instance_type)
        .await?;

    match format {
        "json" => {
            let body = serde_json::json!({
                "instance_type": instance_type,
                "instance_storage_supported": supported,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            let verdict = if supported { "supports" } else { "does not support" };
            println!("{instance_type} {verdict} instance storage");
        }
    }

    Ok(())
}
