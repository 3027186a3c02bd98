//! SSH session to the target host.
//!
//! One connection is authenticated per deployment run; each remote command
//! gets its own exec channel on that connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use secrecy::ExposeSecret;
use sling_core::{HostKeyPolicy, PromptRule, RemoteTarget};

use crate::error::{ConnectionError, SessionError};
use crate::prompt::{PromptResponder, default_rules};
use crate::session::{CommandOutput, Connector, OutputSink, OutputStream, RemoteSession};

/// Default time allowed for TCP connect plus key exchange.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extended-data stream number SSH uses for stderr.
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Opens [`SshSession`]s with public-key authentication.
#[derive(Debug, Clone)]
pub struct SshConnector {
    connect_timeout: Duration,
    prompts: Vec<PromptRule>,
}

impl SshConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            prompts: default_rules(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Add prompt rules after the built-in ones.
    pub fn with_prompts(mut self, extra: impl IntoIterator<Item = PromptRule>) -> Self {
        self.prompts.extend(extra);
        self
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, target: &RemoteTarget) -> Result<SshSession, ConnectionError> {
        let credential = &target.credential;
        let key = russh_keys::load_secret_key(
            &credential.key_path,
            credential.passphrase.as_ref().map(|p| p.expose_secret()),
        )
        .map_err(|e| ConnectionError::KeyLoad {
            path: credential.key_path.clone(),
            source: e,
        })?;

        let config = Arc::new(client::Config::default());
        let handler = HostKeyCheck {
            host: target.host.clone(),
            port: target.port,
            policy: target.host_key_policy,
        };

        tracing::debug!(%target, "connecting");
        let mut handle = tokio::time::timeout(
            self.connect_timeout,
            client::connect(config, (target.host.as_str(), target.port), handler),
        )
        .await
        .map_err(|_| ConnectionError::Timeout {
            target: target.to_string(),
            after: self.connect_timeout,
        })?
        .map_err(|e| match e {
            russh::Error::UnknownKey => ConnectionError::HostKeyRejected {
                target: target.to_string(),
                policy: target.host_key_policy.openssh_value(),
            },
            other => ConnectionError::Connect {
                target: target.to_string(),
                source: other,
            },
        })?;

        tracing::debug!(user = %target.username, "authenticating with public key");
        let authenticated = handle
            .authenticate_publickey(&target.username, Arc::new(key))
            .await
            .map_err(|e| ConnectionError::Connect {
                target: target.to_string(),
                source: e,
            })?;

        if !authenticated {
            return Err(ConnectionError::AuthRejected {
                target: target.to_string(),
            });
        }

        tracing::info!(%target, "session established");
        Ok(SshSession {
            handle,
            prompts: self.prompts.clone(),
        })
    }
}

/// An authenticated SSH connection.
pub struct SshSession {
    handle: Handle<HostKeyCheck>,
    prompts: Vec<PromptRule>,
}

impl SshSession {
    fn ssh_error(action: &'static str) -> impl FnOnce(russh::Error) -> SessionError {
        move |source| SessionError::Ssh { action, source }
    }
}

impl RemoteSession for SshSession {
    async fn run_command(
        &mut self,
        command: &str,
        sink: &mut dyn OutputSink,
    ) -> Result<CommandOutput, SessionError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(Self::ssh_error("open channel"))?;
        channel
            .exec(true, command)
            .await
            .map_err(Self::ssh_error("exec"))?;

        let mut output = CommandOutput::default();
        let mut stdout_prompts = PromptResponder::new(self.prompts.clone());
        let mut stderr_prompts = PromptResponder::new(self.prompts.clone());

        // The channel yields `None` once the remote side has closed it.
        while let Some(msg) = channel.wait().await {
            let (stream, data, prompts) = match msg {
                ChannelMsg::Data { data } => (OutputStream::Stdout, data, &mut stdout_prompts),
                ChannelMsg::ExtendedData { data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    (OutputStream::Stderr, data, &mut stderr_prompts)
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    output.exit_code = Some(exit_status);
                    continue;
                }
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    output.signal = Some(format!("{signal_name:?}"));
                    continue;
                }
                _ => continue,
            };

            sink.output(stream, &data);
            match stream {
                OutputStream::Stdout => output.stdout.extend_from_slice(&data),
                OutputStream::Stderr => output.stderr.extend_from_slice(&data),
            }

            for reply in prompts.observe(&data) {
                tracing::info!("answering interactive prompt");
                channel
                    .data(reply.as_bytes())
                    .await
                    .map_err(Self::ssh_error("prompt reply"))?;
            }
        }

        Ok(output)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Self::ssh_error("disconnect"))
    }
}

/// Verifies the server key against `known_hosts` according to the policy.
struct HostKeyCheck {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        tracing::debug!(host = %self.host, %fingerprint, "server host key");

        if self.policy == HostKeyPolicy::AcceptAny {
            return Ok(true);
        }

        match russh_keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) if self.policy == HostKeyPolicy::AcceptNew => {
                tracing::info!(host = %self.host, %fingerprint, "learning new host key");
                if let Err(e) =
                    russh_keys::learn_known_hosts(&self.host, self.port, server_public_key)
                {
                    tracing::warn!(error = %e, "could not record host key in known_hosts");
                }
                Ok(true)
            }
            Ok(false) => {
                tracing::warn!(host = %self.host, "host is not in known_hosts");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(host = %self.host, error = %e, "host key does not match known_hosts");
                Ok(false)
            }
        }
    }
}
