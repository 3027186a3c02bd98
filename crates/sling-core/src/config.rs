use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact::Variant;
use crate::options::Overrides;
use crate::target::HostKeyPolicy;

/// sling.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlingConfig {
    /// Option overrides keyed by flag name (e.g. `nodeVersion`)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Extra interactive-prompt answers
    #[serde(default)]
    pub prompts: Vec<PromptRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Deployment variant (defaults to container)
    #[serde(default)]
    pub variant: Variant,
    /// Per-stage timeout in seconds
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
    /// SSH connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Host key verification policy
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
    /// OpenSSH client used to create remote directories for transfers
    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,
    /// scp binary used for transfers
    #[serde(default = "default_scp_program")]
    pub scp_program: String,
}

/// A best-effort answer to an interactive prompt seen in remote output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRule {
    /// Literal text to look for
    pub pattern: String,
    /// Bytes written to the remote process's stdin when `pattern` is seen
    pub response: String,
}

impl PromptRule {
    pub fn new(pattern: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            response: response.into(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            stage_timeout_secs: default_stage_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            host_key_policy: HostKeyPolicy::default(),
            ssh_program: default_ssh_program(),
            scp_program: default_scp_program(),
        }
    }
}

impl RemoteConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// A zero timeout would expire every stage or connection immediately.
    fn validate(&self, path: &std::path::Path) -> crate::Result<()> {
        for (key, value) in [
            ("stage_timeout_secs", self.stage_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
        ] {
            if value == 0 {
                return Err(crate::Error::InvalidSetting {
                    path: path.to_path_buf(),
                    key,
                    value,
                    reason: "must be at least 1 second",
                });
            }
        }
        Ok(())
    }
}

impl SlingConfig {
    /// Load from sling.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join("sling.toml");
        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading config");
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            let config: Self =
                toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                    path: config_path.clone(),
                    source: e,
                })?;
            config.remote.validate(&config_path)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// The `[options]` table as an override layer.
    pub fn option_overrides(&self) -> crate::Result<Overrides> {
        Overrides::from_named(
            self.options
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }
}

fn default_stage_timeout_secs() -> u64 {
    30 * 60
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_ssh_program() -> String {
    "ssh".to_owned()
}

fn default_scp_program() -> String {
    "scp".to_owned()
}
