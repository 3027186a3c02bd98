//! Artifact rendering and local storage for sling.
//!
//! # Artifacts
//!
//! ```text
//! build-file    ── Dockerfile        (container variant)
//! compose-file  ── docker-compose    (container variant)
//! proxy-config  ── nginx server block (static variant)
//! ```
//!
//! Rendering is a pure function of [`DeploymentOptions`]: the same options
//! always produce byte-identical artifacts. Secrets never reach an artifact;
//! the build file takes the repository token as a build argument instead.

pub mod compose;
pub mod dockerfile;
pub mod proxy;
pub mod store;

pub use dockerfile::DockerfileGenerator;
pub use store::{StoreError, write_all};

use sling_core::{Artifact, ArtifactKind, DeploymentOptions, Variant};

/// Render one artifact.
pub fn render(kind: ArtifactKind, options: &DeploymentOptions) -> Result<Artifact, RenderError> {
    let contents = match kind {
        ArtifactKind::BuildFile => DockerfileGenerator::new(options).render()?,
        ArtifactKind::ComposeFile => compose::render(options)?,
        ArtifactKind::ProxyConfig => proxy::render(options)?,
    };
    let file_name = options.require(kind.file_name_option())?.to_owned();

    Ok(Artifact {
        kind,
        file_name,
        contents,
    })
}

/// Render every artifact the variant needs, in the variant's order.
pub fn render_variant(
    variant: Variant,
    options: &DeploymentOptions,
) -> Result<Vec<Artifact>, RenderError> {
    variant
        .artifacts()
        .iter()
        .map(|kind| render(*kind, options))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot render artifact")]
    Option(#[from] sling_core::Error),
}
