use std::fmt;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::options::{DeploymentOptions, OptionKey};

/// How the target host's key is verified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// The host must already be present in `known_hosts` with a matching key.
    Strict,
    /// Unknown hosts are learned; a changed key is rejected.
    #[default]
    AcceptNew,
    /// Any key is accepted.
    AcceptAny,
}

impl HostKeyPolicy {
    /// Value for OpenSSH's `StrictHostKeyChecking` option.
    pub fn openssh_value(self) -> &'static str {
        match self {
            Self::Strict => "yes",
            Self::AcceptNew => "accept-new",
            Self::AcceptAny => "no",
        }
    }
}

/// Private key used for both the command session and file transfers.
#[derive(Debug, Clone)]
pub struct Credential {
    pub key_path: PathBuf,
    pub passphrase: Option<SecretString>,
}

/// Host the pipeline deploys to.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credential: Credential,
    pub host_key_policy: HostKeyPolicy,
}

impl RemoteTarget {
    /// Build the target from resolved options (`host`, `sshPort`, `sshUser`, `sshKey`).
    ///
    /// A leading `~/` in the key path is expanded to the home directory.
    pub fn from_options(
        options: &DeploymentOptions,
        host_key_policy: HostKeyPolicy,
        passphrase: Option<SecretString>,
    ) -> crate::Result<Self> {
        let host = options.require(OptionKey::Host)?.to_owned();
        let port = options.port(OptionKey::SshPort)?;
        let username = options.require(OptionKey::SshUser)?.to_owned();
        let key_path = expand_home(options.require(OptionKey::SshKey)?)?;

        Ok(Self {
            host,
            port,
            username,
            credential: Credential {
                key_path,
                passphrase,
            },
            host_key_policy,
        })
    }

    /// `user@host` as used by scp/ssh, with IPv6 literals bracketed.
    pub fn login(&self) -> String {
        if self.host.contains(':') {
            format!("{}@[{}]", self.username, self.host)
        } else {
            format!("{}@{}", self.username, self.host)
        }
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.login(), self.port)
    }
}

fn expand_home(path: &str) -> crate::Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or_else(|| crate::Error::HomeDir {
                path: path.to_owned(),
            }),
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Overrides;

    fn options(pairs: &[(OptionKey, &str)]) -> DeploymentOptions {
        let mut layer = Overrides::new();
        for (k, v) in pairs {
            layer.set(*k, *v);
        }
        DeploymentOptions::resolve(&[&layer], &[]).unwrap()
    }

    #[test]
    fn target_uses_ssh_defaults() {
        let opts = options(&[(OptionKey::Host, "203.0.113.7"), (OptionKey::SshKey, "/keys/id")]);
        let target = RemoteTarget::from_options(&opts, HostKeyPolicy::default(), None).unwrap();

        assert_eq!(target.host, "203.0.113.7");
        assert_eq!(target.port, 22);
        assert_eq!(target.username, "root");
        assert_eq!(target.credential.key_path, PathBuf::from("/keys/id"));
        assert_eq!(target.to_string(), "root@203.0.113.7:22");
    }

    #[test]
    fn target_requires_host() {
        let opts = options(&[]);
        let err = RemoteTarget::from_options(&opts, HostKeyPolicy::Strict, None).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::MissingOption {
                key: OptionKey::Host
            }
        ));
    }

    #[test]
    fn ipv6_login_is_bracketed() {
        let opts = options(&[(OptionKey::Host, "2001:db8::1"), (OptionKey::SshUser, "deploy")]);
        let target = RemoteTarget::from_options(&opts, HostKeyPolicy::AcceptAny, None).unwrap();
        assert_eq!(target.login(), "deploy@[2001:db8::1]");
    }

    #[test]
    fn tilde_is_expanded() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.ssh/id_rsa").unwrap(), home.join(".ssh/id_rsa"));
        }
        assert_eq!(expand_home("relative/key").unwrap(), PathBuf::from("relative/key"));
    }

    #[test]
    fn policy_maps_to_openssh_values() {
        assert_eq!(HostKeyPolicy::Strict.openssh_value(), "yes");
        assert_eq!(HostKeyPolicy::AcceptNew.openssh_value(), "accept-new");
        assert_eq!(HostKeyPolicy::AcceptAny.openssh_value(), "no");
    }
}
