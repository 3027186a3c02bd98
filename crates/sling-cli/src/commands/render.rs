use crate::args::{CommonArgs, OptionArgs};

/// Render the variant's artifacts and write them to `--out-dir`.
pub async fn render(common: &CommonArgs, flags: &OptionArgs) -> anyhow::Result<()> {
    let resolved = super::resolve(common, flags, |v| v.render_requirements().to_vec())?;

    let artifacts = sling_render::render_variant(resolved.variant, &resolved.options)?;
    let stored = sling_render::write_all(&common.out_dir, &artifacts)?;

    for artifact in &stored {
        println!("Wrote {} ({})", artifact.path.display(), artifact.kind);
    }
    Ok(())
}
