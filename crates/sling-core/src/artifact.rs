use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::options::OptionKey;

/// Logical identity of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Container build recipe (Dockerfile).
    BuildFile,
    /// Container orchestration document (docker-compose).
    ComposeFile,
    /// Reverse-proxy virtual host (nginx).
    ProxyConfig,
}

impl ArtifactKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::BuildFile => "build-file",
            Self::ComposeFile => "compose-file",
            Self::ProxyConfig => "proxy-config",
        }
    }

    /// Option holding this artifact's local file name.
    pub fn file_name_option(self) -> OptionKey {
        match self {
            Self::BuildFile => OptionKey::DockerfileName,
            Self::ComposeFile => OptionKey::DockerComposeFilename,
            Self::ProxyConfig => OptionKey::ProxyConfigFilename,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendered artifact text and its file name, before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub contents: String,
}

/// An artifact that exists in local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Deployment flavour. Each variant has its own artifacts and stage list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Build and run the app with docker-compose on the target host.
    #[default]
    Container,
    /// Build the app on the target host and serve it from nginx.
    Static,
}

impl Variant {
    pub fn artifacts(self) -> &'static [ArtifactKind] {
        match self {
            Self::Container => &[ArtifactKind::BuildFile, ArtifactKind::ComposeFile],
            Self::Static => &[ArtifactKind::ProxyConfig],
        }
    }

    /// Options that must be set to render this variant's artifacts.
    pub fn render_requirements(self) -> &'static [OptionKey] {
        match self {
            Self::Container => &[OptionKey::GitUser, OptionKey::GitAccount, OptionKey::RepoName],
            Self::Static => &[OptionKey::Host],
        }
    }

    /// Options that must be set to deploy this variant.
    pub fn deploy_requirements(self) -> &'static [OptionKey] {
        &[
            OptionKey::GitUser,
            OptionKey::GitToken,
            OptionKey::GitAccount,
            OptionKey::RepoName,
            OptionKey::Host,
        ]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Container => "container",
            Self::Static => "static",
        })
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "container" => Ok(Self::Container),
            "static" => Ok(Self::Static),
            other => Err(format!(
                "unknown variant '{other}' (expected 'container' or 'static')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_parses_its_display_form() {
        for v in [Variant::Container, Variant::Static] {
            assert_eq!(v.to_string().parse::<Variant>().unwrap(), v);
        }
        assert!("bare-metal".parse::<Variant>().is_err());
    }

    #[test]
    fn deploy_requirements_cover_render_requirements() {
        for v in [Variant::Container, Variant::Static] {
            for key in v.render_requirements() {
                assert!(v.deploy_requirements().contains(key), "{v}: {key}");
            }
        }
    }
}
