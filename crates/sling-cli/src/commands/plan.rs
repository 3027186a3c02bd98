use sling_core::{StoredArtifact, Variant};
use sling_remote::{Plan, SecretStore};

use crate::args::{CommonArgs, OptionArgs};
use crate::output::Style;

/// Print the stages `deploy` would run, without writing or connecting.
pub async fn plan(common: &CommonArgs, flags: &OptionArgs) -> anyhow::Result<()> {
    let resolved = super::resolve(common, flags, non_secret_requirements)?;
    let style = Style::detect();

    // Paths the artifacts would be written to; nothing touches the disk here.
    let artifacts = sling_render::render_variant(resolved.variant, &resolved.options)?;
    let stored: Vec<StoredArtifact> = artifacts
        .iter()
        .map(|a| StoredArtifact {
            kind: a.kind,
            path: common.out_dir.join(&a.file_name),
        })
        .collect();

    let plan = Plan::for_variant(resolved.variant, &resolved.options, &stored)?;

    println!(
        "{} variant, {} stages:",
        style.bold(&resolved.variant.to_string()),
        plan.len()
    );
    for (offset, stage) in plan.stages().iter().enumerate() {
        println!("{:>3}. {}", offset + 1, stage.label);
        println!("     {}", style.dim(&stage.describe()));
    }

    if let Err(e) = plan.validate(&SecretStore::from_options(&resolved.options)) {
        println!();
        println!("Warning: {e}; deploy will refuse to run");
    }
    Ok(())
}

fn non_secret_requirements(variant: Variant) -> Vec<sling_core::OptionKey> {
    variant
        .deploy_requirements()
        .iter()
        .copied()
        .filter(|k| !k.is_secret())
        .collect()
}
