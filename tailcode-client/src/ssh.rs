//! Remote execution over Tailscale SSH or plain OpenSSH.

use std::process::Stdio;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tailcode_shared::{config::SshConfig, device::Device};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::util::subprocess::SubprocessBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one command on a remote host and waits for it, bounded by `timeout`.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn execute(
        &self,
        target: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError>;
}

/// `tailscale ssh <target> <command>` or `ssh <target> <command>`.
#[derive(Debug, Clone)]
pub struct SshTransport {
    program: Vec<String>,
}

impl SshTransport {
    pub fn tailscale() -> Self {
        Self {
            program: vec!["tailscale".to_string(), "ssh".to_string()],
        }
    }

    pub fn openssh() -> Self {
        Self {
            program: vec!["ssh".to_string()],
        }
    }

    pub fn from_config(ssh: &SshConfig) -> Self {
        if ssh.use_tailscale_ssh {
            Self::tailscale()
        } else {
            Self::openssh()
        }
    }

    /// Full argv for running `extra` against `target`.
    pub fn argv<'a>(&self, target: &str, extra: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut argv = self.program.clone();
        argv.push(target.to_string());
        argv.extend(extra.into_iter().map(str::to_string));
        argv
    }

    #[cfg(test)]
    pub(crate) fn with_program(program: &[&str]) -> Self {
        Self {
            program: program.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl RemoteTransport for SshTransport {
    async fn execute(
        &self,
        target: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        let argv = self.argv(target, [command]);
        debug!("Executing {:?} (timeout {:?})", argv, timeout);

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // dropping the output future on timeout must not leave the child behind
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(TransportError::Spawn {
                    program: argv[0].clone(),
                    source,
                });
            }
            Err(_) => return Err(TransportError::Timeout(timeout)),
        };

        Ok(ExecOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Command line for an SSH session to `device`. With `with_session` the
/// remote side attaches to (or creates) the configured tmux session,
/// optionally running `command` in it.
pub fn build_ssh_command(
    device: &Device,
    ssh: &SshConfig,
    command: Option<&str>,
    with_session: bool,
) -> Vec<String> {
    let transport = SshTransport::from_config(ssh);
    let target = device.ssh_target();

    if with_session {
        let session = &ssh.session_name;
        let remote = match command {
            Some(command) => format!("tmux new-session -A -s {session} '{command}'"),
            None => format!("tmux new-session -A -s {session}"),
        };
        return transport.argv(&target, [remote.as_str()]);
    }

    transport.argv(&target, command)
}

pub async fn ssh_exec(
    transport: &dyn RemoteTransport,
    device: &Device,
    command: &str,
    timeout: Duration,
) -> Result<ExecOutput, TransportError> {
    transport.execute(&device.ssh_target(), command, timeout).await
}

/// Interactive session on the caller's terminal. Returns the exit code.
pub async fn ssh_connect(
    device: &Device,
    ssh: &SshConfig,
    command: Option<&str>,
    with_session: bool,
) -> Result<i32> {
    let argv = build_ssh_command(device, ssh, command, with_session);
    SubprocessBuilder::new(&argv[0]).args(&argv[1..]).run().await
}

/// Bound on a single `is_reachable` round trip.
pub const REACHABLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cheap `echo ok` round trip; false on any error or timeout.
pub async fn is_reachable(transport: &dyn RemoteTransport, device: &Device, timeout: Duration) -> bool {
    match ssh_exec(transport, device, "echo ok", timeout).await {
        Ok(output) => output.success() && output.stdout.contains("ok"),
        Err(e) => {
            debug!("{} not reachable: {e}", device.name);
            false
        }
    }
}
