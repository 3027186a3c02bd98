mod deploy;
mod plan;
mod render;

pub use deploy::deploy;
pub use plan::plan;
pub use render::render;

use std::path::Path;

use anyhow::Context;
use sling_core::{DeploymentOptions, OptionKey, SlingConfig, Variant};

use crate::args::{CommonArgs, OptionArgs};

/// Configuration is read from the working directory.
const PROJECT_DIR: &str = ".";

pub(crate) struct Resolved {
    pub config: SlingConfig,
    pub variant: Variant,
    pub options: DeploymentOptions,
}

/// Load `sling.toml`, pick the variant, and layer the command-line flags
/// over the file's `[options]`.
pub(crate) fn resolve(
    common: &CommonArgs,
    flags: &OptionArgs,
    required: impl Fn(Variant) -> Vec<OptionKey>,
) -> anyhow::Result<Resolved> {
    let config = SlingConfig::load(Path::new(PROJECT_DIR))?;
    let variant = common.variant.unwrap_or(config.remote.variant);

    let file_layer = config.option_overrides()?;
    let cli_layer = flags.overrides();
    let options = DeploymentOptions::resolve(&[&file_layer, &cli_layer], &required(variant))
        .with_context(|| format!("cannot resolve options for the {variant} variant"))?;

    tracing::debug!(%variant, options = ?options.display_pairs(), "options resolved");
    Ok(Resolved {
        config,
        variant,
        options,
    })
}
