//! Deployment option resolution.
//!
//! Every option has a fixed key and, for most keys, a built-in default.
//! Values are layered: built-in default, then `[options]` from `sling.toml`,
//! then the command line. The last layer that sets a key wins.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::SecretString;

/// A known deployment option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    NodeVersion,
    WorkDirectory,
    DockerComposeFilename,
    DockerfileName,
    ProxyConfigFilename,
    DockerVersion,
    ContainerName,
    ContainerPort,
    HostPort,
    GitUser,
    GitToken,
    GitAccount,
    RepoName,
    Host,
    ServerName,
    SshUser,
    SshPort,
    SshKey,
    RemoteDir,
}

impl OptionKey {
    pub const ALL: [OptionKey; 19] = [
        OptionKey::NodeVersion,
        OptionKey::WorkDirectory,
        OptionKey::DockerComposeFilename,
        OptionKey::DockerfileName,
        OptionKey::ProxyConfigFilename,
        OptionKey::DockerVersion,
        OptionKey::ContainerName,
        OptionKey::ContainerPort,
        OptionKey::HostPort,
        OptionKey::GitUser,
        OptionKey::GitToken,
        OptionKey::GitAccount,
        OptionKey::RepoName,
        OptionKey::Host,
        OptionKey::ServerName,
        OptionKey::SshUser,
        OptionKey::SshPort,
        OptionKey::SshKey,
        OptionKey::RemoteDir,
    ];

    /// Canonical flag name (`--<flag>=<value>`), also the key used in `sling.toml`.
    pub fn flag(self) -> &'static str {
        match self {
            Self::NodeVersion => "nodeVersion",
            Self::WorkDirectory => "workDirectory",
            Self::DockerComposeFilename => "dockerComposeFilename",
            Self::DockerfileName => "dockerfileName",
            Self::ProxyConfigFilename => "proxyConfigFilename",
            Self::DockerVersion => "dockerVersion",
            Self::ContainerName => "containerName",
            Self::ContainerPort => "containerPort",
            Self::HostPort => "hostPort",
            Self::GitUser => "gitUser",
            Self::GitToken => "gitToken",
            Self::GitAccount => "gitAccount",
            Self::RepoName => "repoName",
            Self::Host => "host",
            Self::ServerName => "serverName",
            Self::SshUser => "sshUser",
            Self::SshPort => "sshPort",
            Self::SshKey => "sshKey",
            Self::RemoteDir => "remoteDir",
        }
    }

    pub fn from_flag(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.flag() == name)
    }

    pub fn flag_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.flag()).collect()
    }

    /// Built-in default. `None` means the key must be supplied when required.
    ///
    /// `serverName` has no static default; it falls back to the resolved `host`.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            Self::NodeVersion => Some("node:16-alpine"),
            Self::WorkDirectory => Some("/app"),
            Self::DockerComposeFilename => Some("docker.compose.yml"),
            Self::DockerfileName => Some("Dockerfile"),
            Self::ProxyConfigFilename => Some("nginx.conf"),
            Self::DockerVersion => Some("3.3"),
            Self::ContainerName => Some("my-app"),
            Self::ContainerPort => Some("80"),
            Self::HostPort => Some("80"),
            Self::SshUser => Some("root"),
            Self::SshPort => Some("22"),
            Self::SshKey => Some("~/.ssh/id_rsa"),
            Self::RemoteDir => Some("deploy"),
            Self::GitUser
            | Self::GitToken
            | Self::GitAccount
            | Self::RepoName
            | Self::Host
            | Self::ServerName => None,
        }
    }

    /// Secret values are held as [`SecretString`] and never displayed.
    pub fn is_secret(self) -> bool {
        matches!(self, Self::GitToken)
    }

    fn is_port(self) -> bool {
        matches!(self, Self::ContainerPort | Self::HostPort | Self::SshPort)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// One layer of caller-supplied option values.
#[derive(Clone, Default)]
pub struct Overrides {
    values: BTreeMap<OptionKey, String>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. Empty values are treated as not supplied.
    pub fn set(&mut self, key: OptionKey, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.insert(key, value);
        }
        self
    }

    /// Build a layer from `name = value` pairs, rejecting unknown names.
    pub fn from_named<'a, I>(pairs: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut overrides = Self::new();
        for (name, value) in pairs {
            let key = OptionKey::from_flag(name).ok_or_else(|| crate::Error::UnknownOption {
                name: name.to_owned(),
            })?;
            overrides.set(key, value);
        }
        Ok(overrides)
    }

    pub fn get(&self, key: OptionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| {
                let shown = if k.is_secret() { "***" } else { v.as_str() };
                (k.flag(), shown)
            }))
            .finish()
    }
}

/// Fully resolved deployment options. Immutable once built.
#[derive(Debug, Clone)]
pub struct DeploymentOptions {
    values: BTreeMap<OptionKey, String>,
    secrets: BTreeMap<OptionKey, SecretString>,
}

impl DeploymentOptions {
    /// Merge `layers` (lowest precedence first) over the built-in defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingOption`](crate::Error::MissingOption) if a key in
    ///   `required` has neither a supplied value nor a default
    /// - [`Error::InvalidOption`](crate::Error::InvalidOption) if a port key
    ///   is not a valid TCP port
    pub fn resolve(layers: &[&Overrides], required: &[OptionKey]) -> crate::Result<Self> {
        let mut values = BTreeMap::new();
        let mut secrets = BTreeMap::new();

        for key in OptionKey::ALL {
            let supplied = layers.iter().rev().find_map(|layer| layer.get(key));
            let Some(value) = supplied.or_else(|| key.default_value()) else {
                continue;
            };

            if key.is_port() {
                validate_port(key, value)?;
            }

            if key.is_secret() {
                secrets.insert(key, SecretString::from(value.to_owned()));
            } else {
                values.insert(key, value.to_owned());
            }
        }

        if !values.contains_key(&OptionKey::ServerName)
            && let Some(host) = values.get(&OptionKey::Host).cloned()
        {
            values.insert(OptionKey::ServerName, host);
        }

        let options = Self { values, secrets };
        for key in required {
            if !options.is_set(*key) {
                return Err(crate::Error::MissingOption { key: *key });
            }
        }

        tracing::debug!(
            set = options.values.len() + options.secrets.len(),
            "deployment options resolved"
        );
        Ok(options)
    }

    /// Value of a non-secret key. Secret keys always return `None`.
    pub fn get(&self, key: OptionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Value of a non-secret key that must be present.
    pub fn require(&self, key: OptionKey) -> crate::Result<&str> {
        self.get(key).ok_or(crate::Error::MissingOption { key })
    }

    pub fn secret(&self, key: OptionKey) -> Option<&SecretString> {
        self.secrets.get(&key)
    }

    pub fn is_set(&self, key: OptionKey) -> bool {
        self.values.contains_key(&key) || self.secrets.contains_key(&key)
    }

    /// Parse a port option.
    pub fn port(&self, key: OptionKey) -> crate::Result<u16> {
        let value = self.require(key)?;
        validate_port(key, value)
    }

    /// All set keys with display-safe values, in key order.
    pub fn display_pairs(&self) -> Vec<(OptionKey, String)> {
        OptionKey::ALL
            .into_iter()
            .filter_map(|key| {
                if self.secrets.contains_key(&key) {
                    Some((key, "***".to_owned()))
                } else {
                    self.get(key).map(|v| (key, v.to_owned()))
                }
            })
            .collect()
    }
}

fn validate_port(key: OptionKey, value: &str) -> crate::Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) => Err(crate::Error::InvalidOption {
            key,
            value: value.to_owned(),
            reason: "port must be between 1 and 65535",
        }),
        Ok(port) => Ok(port),
        Err(_) => Err(crate::Error::InvalidOption {
            key,
            value: value.to_owned(),
            reason: "expected a TCP port number",
        }),
    }
}
