//! Remote side of a sling deployment.
//!
//! A [`Plan`] is an ordered list of [`Stage`]s, each either a remote shell
//! command or an artifact upload. The [`Orchestrator`] opens one session
//! through a [`Connector`], runs the stages strictly in order, stops at the
//! first failure, and always closes the session it opened.
//!
//! Production code pairs [`SshConnector`] (russh) with [`ScpTransfer`]
//! (OpenSSH `scp`); tests substitute fakes for both seams.

pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod ssh;
pub mod stage;
pub mod transfer;

pub use error::{
    ConnectionError, PipelineError, PlanError, SessionError, StageError, TransferError,
};
pub use orchestrator::{DEFAULT_STAGE_TIMEOUT, Orchestrator, PipelineResult, PipelineState};
pub use plan::Plan;
pub use prompt::{PromptResponder, default_rules};
pub use session::{CommandOutput, Connector, NullSink, OutputSink, OutputStream, RemoteSession};
pub use ssh::{SshConnector, SshSession};
pub use stage::{RemoteCommand, SecretStore, Stage, StageKind, StageResult, shell_quote};
pub use transfer::{ScpTransfer, TransferAgent, TransferRequest};
