//! Connector and session traits

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// Opens a [`RemoteSession`] to one host
///
/// Implementations hold only read-only, shareable state so one connector can
/// serve every concurrent host task.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and authenticate to `host`
    ///
    /// # Errors
    /// Returns a host-level `ExecError` if the host cannot be used at all
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteSession>, ExecError>;

    /// Transport name for logging
    fn transport(&self) -> &'static str;
}

/// One established connection that runs single commands
#[async_trait]
pub trait RemoteSession: Send {
    /// Run `cmd` on a fresh channel and capture its output
    ///
    /// A command that runs but fails is still `Ok`; inspect
    /// [`CommandResult::failure_detail`].
    ///
    /// # Errors
    /// Returns `ExecError::SessionOpen` if the channel could not be opened
    async fn run(&mut self, cmd: &str) -> Result<CommandResult, ExecError>;

    /// Release the connection. Calling it twice is a no-op.
    ///
    /// # Errors
    /// Returns `ExecError::IoError` if the disconnect could not be sent
    async fn close(&mut self) -> Result<(), ExecError>;
}
