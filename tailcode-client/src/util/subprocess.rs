//! Foreground child processes that own the terminal (interactive SSH).
//!
//! The child shares the terminal's process group, so Ctrl+C reaches it
//! directly and we only wait for it to finish.

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
}

impl SubprocessBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Run with inherited stdio and return the exit code (1 if killed by a signal).
    pub async fn run(self) -> Result<i32> {
        debug!("Running {} {:?}", self.program, self.args);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed waiting for {}", self.program))?;

        Ok(status.code().unwrap_or(1))
    }
}
