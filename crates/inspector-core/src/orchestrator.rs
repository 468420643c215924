//! Fleet-wide fan-out
//!
//! One task per host, results collected by an `AggregatorActor`, joined before
//! returning.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use inspector_exec::{Connector, ExecError};
use kameo::error::SendError;
use kameo::prelude::*;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::actor::aggregator::{AggregatorActor, AggregatorActorArgs};
use crate::column::ColumnSpec;
use crate::error::CoreError;
use crate::executor::HostExecutor;
use crate::message::{RecordRow, ResultAggregate, TakeAggregate};

/// Optional limits; the defaults reproduce unbounded fan-out with no deadline
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    /// Maximum hosts executing at once
    pub max_concurrency: Option<usize>,
    /// Deadline per host covering connect and every column
    pub host_timeout: Option<Duration>,
}

/// A host that produced no row
#[derive(Debug, Clone, Serialize)]
pub struct HostFailure {
    /// Host address
    pub host: String,
    /// Error text
    pub error: String,
    /// When the failure was observed
    pub failed_at: DateTime<Utc>,
}

impl HostFailure {
    /// Record a failure observed now
    pub fn new(host: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            error: error.into(),
            failed_at: Utc::now(),
        }
    }
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error for {}: {}", self.host, self.error)
    }
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct InspectionReport {
    /// Rows of every host that could be contacted
    pub aggregate: ResultAggregate,
    /// Hosts that could not be contacted, in host-list order
    pub failures: Vec<HostFailure>,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Join completion
    pub finished_at: DateTime<Utc>,
}

/// Runs a column set on every host concurrently
#[derive(Debug, Clone)]
pub struct Orchestrator {
    executor: Arc<HostExecutor>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Create an orchestrator connecting through `connector`
    pub fn new(connector: Arc<dyn Connector>, options: OrchestratorOptions) -> Self {
        Self {
            executor: Arc::new(HostExecutor::new(connector)),
            options,
        }
    }

    /// Inspect every host once and wait for all of them
    ///
    /// Each host gets its own copy of `template`. Hosts that cannot be
    /// contacted are reported in `failures` and have no row; column-level
    /// failures stay inside the row.
    ///
    /// # Errors
    /// Returns `CoreError::Aggregator` if the collected rows cannot be
    /// retrieved
    pub async fn run_all(
        &self,
        hosts: &[String],
        template: &[ColumnSpec],
    ) -> Result<InspectionReport, CoreError> {
        let started_at = Utc::now();

        let mut seen = HashSet::new();
        let hosts: Vec<&String> = hosts
            .iter()
            .filter(|host| {
                let first = seen.insert(host.as_str());
                if !first {
                    warn!(host = %host, "skipping duplicate host");
                }
                first
            })
            .collect();

        info!(
            total_hosts = hosts.len(),
            columns = template.len(),
            max_concurrency = ?self.options.max_concurrency,
            host_timeout = ?self.options.host_timeout,
            "starting inspection"
        );

        let aggregator = AggregatorActor::spawn(AggregatorActorArgs {
            expected_hosts: hosts.len(),
        });
        let limiter = self
            .options
            .max_concurrency
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut handles = Vec::with_capacity(hosts.len());

        for host in hosts {
            let host_name = host.clone();
            let columns = template.to_vec();
            let executor = Arc::clone(&self.executor);
            let aggregator = aggregator.clone();
            let limiter = limiter.clone();
            let host_timeout = self.options.host_timeout;

            let handle = tokio::spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => Some(
                        semaphore
                            .acquire_owned()
                            .await
                            .map_err(|e| e.to_string())?,
                    ),
                    None => None,
                };

                let outcome = match host_timeout {
                    Some(limit) => tokio::time::timeout(limit, executor.execute(&host_name, columns))
                        .await
                        .unwrap_or(Err(ExecError::Timeout { timeout: limit })),
                    None => executor.execute(&host_name, columns).await,
                };

                match outcome {
                    Ok(row) => aggregator
                        .ask(RecordRow {
                            host: host_name,
                            row,
                        })
                        .await
                        .map_err(|e| match e {
                            SendError::HandlerError(e) => e.to_string(),
                            other => CoreError::Aggregator(other.to_string()).to_string(),
                        }),
                    Err(e) => Err(e.to_string()),
                }
            });

            handles.push((host.clone(), handle));
        }

        let mut failures = Vec::new();

        for (host, handle) in handles {
            match handle.await {
                Ok(Ok(())) => {}
                // the caller reports each failure once; keep this out of the default log
                Ok(Err(e)) => {
                    debug!(host = %host, error = %e, "host unreachable");
                    failures.push(HostFailure::new(host, e));
                }
                Err(e) => {
                    debug!(host = %host, error = %e, "task panicked");
                    failures.push(HostFailure::new(host, format!("task failed: {e}")));
                }
            }
        }

        let aggregate = aggregator
            .ask(TakeAggregate)
            .await
            .map_err(|e| CoreError::Aggregator(e.to_string()))?;
        aggregator.stop_gracefully().await.ok();

        let finished_at = Utc::now();

        info!(
            reachable = aggregate.len(),
            failed = failures.len(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "inspection finished"
        );

        Ok(InspectionReport {
            aggregate,
            failures,
            started_at,
            finished_at,
        })
    }
}
