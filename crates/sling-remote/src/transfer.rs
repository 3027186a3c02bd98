use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use sling_core::{ArtifactKind, RemoteTarget};

use crate::error::TransferError;
use crate::stage::shell_quote;

/// Copy one local artifact to a path on the target host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub artifact: ArtifactKind,
    pub local_path: PathBuf,
    /// Destination; relative paths are resolved against the login user's home.
    pub remote_path: String,
    /// Create the destination's parent directory first.
    pub create_parents: bool,
}

/// Abstraction over file transfer for testability.
///
/// Production code uses [`ScpTransfer`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait TransferAgent: Send + Sync {
    /// Copy the artifact, creating or overwriting the destination file.
    ///
    /// Returns once the copy has fully completed.
    async fn transfer(
        &self,
        request: &TransferRequest,
        target: &RemoteTarget,
    ) -> Result<(), TransferError>;
}

/// Transfers files with the OpenSSH `scp` client, using the target's key.
#[derive(Debug, Clone)]
pub struct ScpTransfer {
    ssh_program: String,
    scp_program: String,
}

impl ScpTransfer {
    pub fn new() -> Self {
        Self::with_programs("ssh", "scp")
    }

    pub fn with_programs(ssh_program: impl Into<String>, scp_program: impl Into<String>) -> Self {
        Self {
            ssh_program: ssh_program.into(),
            scp_program: scp_program.into(),
        }
    }

    async fn exec(
        &self,
        step: &'static str,
        program: &str,
        args: Vec<OsString>,
    ) -> Result<(), TransferError> {
        // Dropping the future on a stage timeout must take the child with it.
        let output = tokio::process::Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TransferError::Spawn {
                program: program.to_owned(),
                source: e,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TransferError::Failed {
                step,
                program: program.to_owned(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

impl Default for ScpTransfer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferAgent for ScpTransfer {
    async fn transfer(
        &self,
        request: &TransferRequest,
        target: &RemoteTarget,
    ) -> Result<(), TransferError> {
        if !request.local_path.is_file() {
            return Err(TransferError::MissingArtifact {
                artifact: request.artifact,
                path: request.local_path.clone(),
            });
        }

        if request.create_parents
            && let Some(dir) = remote_parent(&request.remote_path)
        {
            tracing::debug!(dir, "creating remote directory");
            let command = format!("mkdir -p -- {}", shell_quote(dir));
            self.exec("create remote directory", &self.ssh_program, ssh_args(target, &command))
                .await?;
        }

        tracing::debug!(
            artifact = %request.artifact,
            local = %request.local_path.display(),
            remote = %request.remote_path,
            "copying artifact"
        );
        self.exec(
            "copy",
            &self.scp_program,
            scp_args(target, &request.local_path, &request.remote_path),
        )
        .await
    }
}

fn common_args(target: &RemoteTarget, port_flag: &str) -> Vec<OsString> {
    vec![
        port_flag.into(),
        target.port.to_string().into(),
        "-i".into(),
        target.credential.key_path.clone().into(),
        "-o".into(),
        "BatchMode=yes".into(),
        "-o".into(),
        format!(
            "StrictHostKeyChecking={}",
            target.host_key_policy.openssh_value()
        )
        .into(),
    ]
}

fn ssh_args(target: &RemoteTarget, command: &str) -> Vec<OsString> {
    let mut args = common_args(target, "-p");
    args.push(target.login().into());
    args.push(command.into());
    args
}

fn scp_args(target: &RemoteTarget, local: &Path, remote: &str) -> Vec<OsString> {
    let mut args = vec![OsString::from("-q")];
    args.extend(common_args(target, "-P"));
    args.push(local.as_os_str().to_owned());
    // The remote side expands the path through a shell, like the mkdir step.
    args.push(format!("{}:{}", target.login(), shell_quote(remote)).into());
    args
}

/// Parent directory of a remote path, if it has a non-root one.
fn remote_parent(path: &str) -> Option<&str> {
    match path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => Some(parent),
        _ => None,
    }
}
