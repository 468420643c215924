//! Per-host execution: one connection, every column in order

use std::sync::Arc;

use inspector_exec::{Connector, ExecError, RemoteSession};
use tracing::{debug, instrument, warn};

use crate::column::{ColumnSpec, Row};

/// Runs a column set against one host
#[derive(Clone)]
pub struct HostExecutor {
    connector: Arc<dyn Connector>,
}

impl std::fmt::Debug for HostExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostExecutor")
            .field("transport", &self.connector.transport())
            .finish()
    }
}

impl HostExecutor {
    /// Create an executor using `connector` for every host
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Connect to `host` and resolve every column
    ///
    /// Column-level failures end up in the column's value; only failing to
    /// get a usable connection is an error. The connection is closed after
    /// the last column.
    ///
    /// # Errors
    /// Returns a host-level `ExecError` if the host cannot be contacted
    #[instrument(skip(self, columns), fields(transport = self.connector.transport(), columns = columns.len()))]
    pub async fn execute(&self, host: &str, columns: Vec<ColumnSpec>) -> Result<Row, ExecError> {
        if host.trim().is_empty() {
            return Err(ExecError::InvalidHost(host.to_string()));
        }

        let mut session = self.connector.connect(host).await?;

        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            let value = if column.is_static() {
                column.value.clone().unwrap_or_default()
            } else {
                run_column(session.as_mut(), &column.command).await
            };
            row.push(column.resolve(value));
        }

        if let Err(e) = session.close().await {
            debug!(host, error = %e, "error closing connection");
        }

        Ok(row)
    }
}

async fn run_column(session: &mut dyn RemoteSession, command: &str) -> String {
    match session.run(command).await {
        Ok(result) => column_value(&result.stdout, result.failure_detail().as_deref()),
        Err(e) => {
            warn!(command, error = %e, "command could not be started");
            e.to_string().trim_end().to_string()
        }
    }
}

/// Build a column value from captured stdout and an optional failure detail
///
/// The detail is separated by a newline only when there is output before it.
/// Trailing whitespace is trimmed, leading whitespace kept.
#[must_use]
pub fn column_value(stdout: &str, failure: Option<&str>) -> String {
    let mut value = stdout.to_string();
    if let Some(detail) = failure {
        if !value.is_empty() {
            value.push('\n');
        }
        value.push_str(detail);
    }
    value.truncate(value.trim_end().len());
    value
}
