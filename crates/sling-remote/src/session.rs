use sling_core::RemoteTarget;

use crate::error::{ConnectionError, SessionError};
use crate::stage::{Stage, StageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives remote output as it arrives, plus stage progress.
pub trait OutputSink: Send {
    /// A chunk of output from the running command.
    fn output(&mut self, stream: OutputStream, chunk: &[u8]);

    fn stage_started(&mut self, _index: usize, _total: usize, _stage: &Stage) {}

    fn stage_finished(&mut self, _result: &StageResult) {}
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn output(&mut self, _stream: OutputStream, _chunk: &[u8]) {}
}

/// Outcome of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, if the remote side reported one.
    pub exit_code: Option<u32>,
    /// Terminating signal, if the remote process was killed.
    pub signal: Option<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && self.signal.is_none()
    }
}

/// One authenticated connection to the target host.
///
/// Production code uses [`SshSession`](crate::ssh::SshSession); tests use
/// scripted fakes.
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    /// Run `command` and wait until the remote side closes the channel.
    ///
    /// Output is forwarded to `sink` chunk by chunk. A non-zero exit is
    /// reported in the returned [`CommandOutput`], not as an error; errors
    /// are reserved for connection-level failures.
    async fn run_command(
        &mut self,
        command: &str,
        sink: &mut dyn OutputSink,
    ) -> Result<CommandOutput, SessionError>;

    /// Release the connection.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens [`RemoteSession`]s. Never retries.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Session: RemoteSession;

    async fn connect(&self, target: &RemoteTarget) -> Result<Self::Session, ConnectionError>;
}
