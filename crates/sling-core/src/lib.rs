//! Core types and configuration for sling.
//!
//! This crate defines deployment option resolution ([`DeploymentOptions`]),
//! the `sling.toml` schema ([`SlingConfig`]), the deploy target
//! ([`RemoteTarget`]), artifact identities, and shared error types.

pub mod artifact;
pub mod config;
pub mod error;
pub mod options;
pub mod target;

pub use artifact::{Artifact, ArtifactKind, StoredArtifact, Variant};
pub use config::{PromptRule, RemoteConfig, SlingConfig};
pub use error::{Error, Result};
pub use options::{DeploymentOptions, OptionKey, Overrides};
pub use target::{Credential, HostKeyPolicy, RemoteTarget};
