//! Local command execution using `tokio::process`
//!
//! Every "host" maps to the local machine. Useful for trying out a column set
//! without touching the fleet.

use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::result::{CommandResult, ExitState, signal_name};
use crate::traits::{Connector, RemoteSession};

/// Connector that runs commands through the local shell
#[derive(Debug, Clone, Default)]
pub struct LocalConnector;

impl LocalConnector {
    /// Create a new local connector
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteSession>, ExecError> {
        if host.trim().is_empty() {
            return Err(ExecError::InvalidHost(host.to_string()));
        }
        Ok(Box::new(LocalSession {
            host: host.to_string(),
            open: true,
        }))
    }

    fn transport(&self) -> &'static str {
        "local"
    }
}

/// Local "connection" labelled with the host it stands in for
#[derive(Debug)]
pub struct LocalSession {
    host: String,
    open: bool,
}

#[async_trait]
impl RemoteSession for LocalSession {
    #[instrument(skip(self), fields(host = %self.host), level = "debug")]
    async fn run(&mut self, cmd: &str) -> Result<CommandResult, ExecError> {
        if !self.open {
            return Err(ExecError::NotConnected);
        }

        let start = Instant::now();

        debug!(command = %cmd, "executing local command");

        // Use shell to support pipes, redirections, etc.
        let child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::SessionOpen(e.to_string()))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();
        let exit = exit_state(output.status);

        if !output.status.success() {
            warn!(command = %cmd, exit = ?exit, "command failed");
        }

        Ok(CommandResult {
            exit,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration,
        })
    }

    async fn close(&mut self) -> Result<(), ExecError> {
        self.open = false;
        Ok(())
    }
}

fn exit_state(status: std::process::ExitStatus) -> ExitState {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => ExitState::Code(code.cast_unsigned()),
        (None, Some(signal)) => ExitState::Signal {
            name: signal_name(signal),
            message: String::new(),
        },
        (None, None) => ExitState::Missing,
    }
}
