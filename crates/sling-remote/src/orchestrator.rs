//! Fail-fast execution of a [`Plan`] over one session.
//!
//! ```text
//! Init ─▶ Connecting ─┬─▶ Connected ─▶ RunningStage(1) ─▶ … ─▶ RunningStage(k) ─▶ Closing ─▶ Done
//!                     │                       │ stage failed                         ▲
//!                     │                       └──────────────────────────▶ Closing ──┴─▶ Aborted
//!                     │                       │ session error
//!                     │                       └──────────────────────────▶ Closing ────▶ Failed
//!                     └─▶ Failed (no session opened)
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sling_core::RemoteTarget;
use tokio::time::Instant;

use crate::error::{PipelineError, StageError};
use crate::plan::Plan;
use crate::session::{CommandOutput, Connector, OutputSink, RemoteSession};
use crate::stage::{SecretStore, Stage, StageKind, StageResult};
use crate::transfer::TransferAgent;

/// Default upper bound on a single stage.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Number of stderr lines kept in log events for a failed stage.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Connecting,
    Connected,
    /// 1-based index of the running stage.
    RunningStage(usize),
    Closing,
    Done,
    Aborted,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted | Self::Failed)
    }
}

/// Aggregate outcome of one run.
#[derive(Debug)]
pub struct PipelineResult {
    pub state: PipelineState,
    /// Every stage that was attempted, in order.
    pub stages: Vec<StageResult>,
    /// First failure, if any.
    pub failure: Option<PipelineError>,
}

impl PipelineResult {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// 1-based index of the failing stage.
    pub fn failed_stage(&self) -> Option<usize> {
        self.failure.as_ref().and_then(PipelineError::stage_index)
    }

    fn failed(failure: PipelineError) -> Self {
        Self {
            state: PipelineState::Failed,
            stages: Vec::new(),
            failure: Some(failure),
        }
    }
}

/// Runs plans stage by stage, stopping at the first failure.
///
/// Generic over the [`Connector`] and [`TransferAgent`] so tests can swap
/// in fakes.
pub struct Orchestrator<C: Connector, T: TransferAgent> {
    connector: C,
    transfer: T,
    stage_timeout: Duration,
}

/// What ended the stage loop.
enum Halt {
    Completed,
    StageFailed(PipelineError),
    SessionLost(PipelineError),
}

impl<C: Connector, T: TransferAgent> Orchestrator<C, T> {
    pub fn new(connector: C, transfer: T) -> Self {
        Self {
            connector,
            transfer,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Connect, run every stage in order, then close the session.
    ///
    /// The session, once opened, is closed exactly once on every path.
    /// Secrets are substituted into commands only at the moment of execution.
    pub async fn run(
        &self,
        target: &RemoteTarget,
        plan: &Plan,
        secrets: &SecretStore,
        sink: &mut dyn OutputSink,
    ) -> PipelineResult {
        let mut state = PipelineState::Init;

        if let Err(e) = plan.validate(secrets) {
            tracing::error!(error = %e, "plan rejected before connecting");
            return PipelineResult::failed(PipelineError::Plan(e));
        }

        transition(&mut state, PipelineState::Connecting);
        let mut session = match self.connector.connect(target).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(%target, error = %e, "connection failed");
                transition(&mut state, PipelineState::Failed);
                return PipelineResult::failed(PipelineError::Connect {
                    target: target.to_string(),
                    source: e,
                });
            }
        };
        transition(&mut state, PipelineState::Connected);

        let mut stages = Vec::with_capacity(plan.len());
        let halt = self
            .run_stages(&mut session, target, plan, secrets, sink, &mut state, &mut stages)
            .await;

        transition(&mut state, PipelineState::Closing);
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close session cleanly");
        }

        let (terminal, failure) = match halt {
            Halt::Completed => (PipelineState::Done, None),
            Halt::StageFailed(e) => (PipelineState::Aborted, Some(e)),
            Halt::SessionLost(e) => (PipelineState::Failed, Some(e)),
        };
        transition(&mut state, terminal);

        PipelineResult {
            state,
            stages,
            failure,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_stages(
        &self,
        session: &mut C::Session,
        target: &RemoteTarget,
        plan: &Plan,
        secrets: &SecretStore,
        sink: &mut dyn OutputSink,
        state: &mut PipelineState,
        results: &mut Vec<StageResult>,
    ) -> Halt {
        let total = plan.len();

        for (offset, stage) in plan.stages().iter().enumerate() {
            let index = offset + 1;
            transition(state, PipelineState::RunningStage(index));
            tracing::info!(index, total, label = %stage.label, step = %stage.describe(), "stage started");
            sink.stage_started(index, total, stage);

            let started = Instant::now();
            let outcome = self.run_stage(session, target, stage, secrets, sink).await;
            let elapsed = started.elapsed();

            let (result, error) = match outcome {
                Ok(StageOutcome::Command(output)) => {
                    let error = if output.success() {
                        None
                    } else if let Some(signal) = &output.signal {
                        Some(StageError::Signal {
                            signal: signal.clone(),
                        })
                    } else if let Some(code) = output.exit_code {
                        Some(StageError::ExitStatus { code })
                    } else {
                        Some(StageError::NoExitStatus)
                    };
                    (
                        StageResult::from_output(index, &stage.label, output, elapsed),
                        error,
                    )
                }
                Ok(StageOutcome::Transferred) => {
                    (StageResult::transferred(index, &stage.label, elapsed), None)
                }
                Err(e) => (
                    StageResult::failed(index, &stage.label, error_chain(&e), elapsed),
                    Some(e),
                ),
            };

            sink.stage_finished(&result);

            let Some(source) = error else {
                tracing::info!(index, elapsed_ms = elapsed.as_millis() as u64, "stage succeeded");
                results.push(result);
                continue;
            };

            tracing::error!(
                index,
                label = %stage.label,
                error = %source,
                stderr = %result.stderr_tail(STDERR_TAIL_LINES),
                "stage failed"
            );
            results.push(result);

            let session_lost = matches!(source, StageError::Session(_));
            let failure = PipelineError::Stage {
                index,
                label: stage.label.clone(),
                source,
            };
            return if session_lost {
                Halt::SessionLost(failure)
            } else {
                Halt::StageFailed(failure)
            };
        }

        Halt::Completed
    }

    async fn run_stage(
        &self,
        session: &mut C::Session,
        target: &RemoteTarget,
        stage: &Stage,
        secrets: &SecretStore,
        sink: &mut dyn OutputSink,
    ) -> Result<StageOutcome, StageError> {
        let timed_out = |_: tokio::time::error::Elapsed| StageError::TimedOut {
            after: self.stage_timeout,
        };

        match &stage.kind {
            StageKind::Command(command) => {
                let exposed = command.expose(secrets)?;
                let output = tokio::time::timeout(
                    self.stage_timeout,
                    session.run_command(exposed.expose_secret(), sink),
                )
                .await
                .map_err(timed_out)?
                .map_err(StageError::Session)?;
                Ok(StageOutcome::Command(output))
            }
            StageKind::Transfer(request) => {
                tokio::time::timeout(self.stage_timeout, self.transfer.transfer(request, target))
                    .await
                    .map_err(timed_out)?
                    .map_err(StageError::Transfer)?;
                Ok(StageOutcome::Transferred)
            }
        }
    }
}

enum StageOutcome {
    Command(CommandOutput),
    Transferred,
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    let from = *state;
    tracing::debug!(?from, to = ?next, "pipeline state");
    *state = next;
}

/// Render an error and its sources on one line each.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push('\n');
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
