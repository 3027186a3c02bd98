use std::path::PathBuf;
use std::time::Duration;

use sling_core::{ArtifactKind, OptionKey};

/// Failure to open or authenticate the SSH session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to load private key {path}")]
    KeyLoad {
        path: PathBuf,
        #[source]
        source: russh_keys::Error,
    },

    #[error("connection to {target} timed out after {}s", after.as_secs())]
    Timeout { target: String, after: Duration },

    #[error("failed to connect to {target}")]
    Connect {
        target: String,
        #[source]
        source: russh::Error,
    },

    #[error("host key for {target} was rejected (policy: {policy})")]
    HostKeyRejected { target: String, policy: &'static str },

    #[error("authentication rejected for {target}")]
    AuthRejected { target: String },
}

/// Connection-level failure on an open session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("ssh {action} failed")]
    Ssh {
        action: &'static str,
        #[source]
        source: russh::Error,
    },

    #[error("connection lost: {reason}")]
    Disconnected { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{artifact} not found at {path}; artifacts must be written before transfer")]
    MissingArtifact {
        artifact: ArtifactKind,
        path: PathBuf,
    },

    #[error("failed to launch {program}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{step} failed ({program} exited with {status})\n{stderr}")]
    Failed {
        step: &'static str,
        program: String,
        status: String,
        stderr: String,
    },
}

/// Problems with a plan detected before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("plan needs {0}, but it was not rendered")]
    MissingArtifact(ArtifactKind),

    #[error("plan needs secret option '{}', but it is not set", .0.flag())]
    MissingSecret(OptionKey),

    #[error(transparent)]
    Option(#[from] sling_core::Error),
}

/// Why a single stage failed.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("remote command exited with status {code}")]
    ExitStatus { code: u32 },

    #[error("remote command terminated by signal {signal}")]
    Signal { signal: String },

    #[error("remote command ended without reporting an exit status")]
    NoExitStatus,

    #[error("stage timed out after {}s", after.as_secs())]
    TimedOut { after: Duration },

    #[error("transfer failed")]
    Transfer(#[source] TransferError),

    #[error("session failed")]
    Session(#[source] SessionError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// The first failure of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("deployment plan is invalid")]
    Plan(#[source] PlanError),

    #[error("could not open session to {target}")]
    Connect {
        target: String,
        #[source]
        source: ConnectionError,
    },

    #[error("stage {index} ({label}) failed")]
    Stage {
        index: usize,
        label: String,
        #[source]
        source: StageError,
    },
}

impl PipelineError {
    /// 1-based index of the failing stage, if a stage failed.
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Stage { index, .. } => Some(*index),
            Self::Plan(_) | Self::Connect { .. } => None,
        }
    }
}
